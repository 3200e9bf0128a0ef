use crate::model::Category;

/// Tag rules, most specific first. The first rule with a matching tag decides.
pub const RULES: &[(Category, &[&str])] = &[
    (Category::Game, &["Game"]),
    (Category::Development, &["Development", "IDE"]),
    (Category::Graphics, &["Graphics"]),
    (Category::AudioVideo, &["AudioVideo", "Audio", "Video"]),
    (Category::Office, &["Office"]),
    (Category::InternetAndNetwork, &["Network", "WebBrowser", "Email"]),
    (Category::SystemTools, &["System", "Settings", "Monitor"]),
    (Category::Utility, &["Utility", "Accessories"]),
];

pub fn categorize<S: AsRef<str>>(tags: &[S]) -> Category {
    categorize_with(RULES, tags)
}

pub fn categorize_with<S: AsRef<str>>(rules: &[(Category, &[&str])], tags: &[S]) -> Category {
    rules
        .iter()
        .find(|(_, keys)| tags.iter().any(|t| keys.contains(&t.as_ref())))
        .map(|(cat, _)| *cat)
        .unwrap_or(Category::Other)
}
