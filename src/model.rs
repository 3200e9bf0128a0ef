use serde::Serialize;

/// One launchable application, parsed from a `.desktop` descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesktopEntry {
    pub id: String,            // Desktop file id, e.g. "firefox.desktop" or "kde4-kate.desktop"
    pub name: String,          // Unlocalized Name, empty when absent
    pub name_loc: String,      // Localized Name, falls back to `name`
    pub comment: String,
    pub comment_loc: String,   // Localized Comment, falls back to `comment`, then ""
    pub icon: Option<String>,  // Icon name/path, resolved by the icon theme
    pub exec: String,          // Raw command template, field codes included
    pub terminal: bool,
    pub no_display: bool,
    pub hidden: bool,
    pub categories: Vec<String>,
}

impl DesktopEntry {
    pub fn new(id: String) -> Self {
        Self {
            id,
            name: String::new(),
            name_loc: String::new(),
            comment: String::new(),
            comment_loc: String::new(),
            icon: None,
            exec: String::new(),
            terminal: false,
            no_display: false,
            hidden: false,
            categories: Vec::new(),
        }
    }

    /// Whether the entry shows up in category lists and search results.
    /// Unlisted entries stay addressable by id, e.g. when pinned.
    pub fn is_listed(&self) -> bool {
        !self.no_display && !self.hidden && !self.name.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Utility,
    Development,
    Game,
    Graphics,
    InternetAndNetwork,
    Office,
    AudioVideo,
    SystemTools,
    Other,
}

impl Category {
    /// Display order of the browse view.
    pub const ALL: [Category; 9] = [
        Category::Utility,
        Category::Development,
        Category::Game,
        Category::Graphics,
        Category::InternetAndNetwork,
        Category::Office,
        Category::AudioVideo,
        Category::SystemTools,
        Category::Other,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Utility => "utility",
            Category::Development => "development",
            Category::Game => "game",
            Category::Graphics => "graphics",
            Category::InternetAndNetwork => "internet-and-network",
            Category::Office => "office",
            Category::AudioVideo => "audio-video",
            Category::SystemTools => "system-tools",
            Category::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Utility => "Utility",
            Category::Development => "Development",
            Category::Game => "Game",
            Category::Graphics => "Graphics",
            Category::InternetAndNetwork => "Internet and network",
            Category::Office => "Office",
            Category::AudioVideo => "Audio & Video",
            Category::SystemTools => "System Tools",
            Category::Other => "Other",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Category::Utility => "applications-utilities",
            Category::Development => "applications-development",
            Category::Game => "applications-games",
            Category::Graphics => "applications-graphics",
            Category::InternetAndNetwork => "applications-internet",
            Category::Office => "applications-office",
            Category::AudioVideo => "applications-multimedia",
            Category::SystemTools => "applications-system",
            Category::Other => "applications-other",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}
