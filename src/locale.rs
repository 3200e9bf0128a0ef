use std::env;

/// A language tag of the form `lang_COUNTRY.ENCODING@MODIFIER`.
/// Everything but `lang` is optional and the encoding never takes part in lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    pub lang: String,
    pub country: Option<String>,
    pub modifier: Option<String>,
}

impl Locale {
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        let (rest, modifier) = match tag.split_once('@') {
            Some((rest, m)) if !m.is_empty() => (rest, Some(m.to_string())),
            Some((rest, _)) => (rest, None),
            None => (tag, None),
        };
        let rest = rest.split('.').next().unwrap_or_default();
        let (lang, country) = match rest.split_once('_') {
            Some((l, c)) if !c.is_empty() => (l, Some(c.to_string())),
            Some((l, _)) => (l, None),
            None => (rest, None),
        };

        // "C" and "POSIX" carry no translations
        if lang.is_empty() || lang == "C" || lang == "POSIX" {
            return None;
        }

        Some(Self {
            lang: lang.to_string(),
            country,
            modifier,
        })
    }

    /// Locale from `LC_ALL`, `LC_MESSAGES` or `LANG`, first non-empty wins.
    pub fn from_env() -> Option<Self> {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| env::var(var).ok())
            .find(|v| !v.is_empty())
            .and_then(|v| Self::parse(&v))
    }

    /// Locale suffixes to try, most specific first.
    pub fn fallback_chain(&self) -> Vec<String> {
        let mut chain = Vec::with_capacity(4);
        if let (Some(country), Some(modifier)) = (&self.country, &self.modifier) {
            chain.push(format!("{}_{}@{}", self.lang, country, modifier));
        }
        if let Some(country) = &self.country {
            chain.push(format!("{}_{}", self.lang, country));
        }
        if let Some(modifier) = &self.modifier {
            chain.push(format!("{}@{}", self.lang, modifier));
        }
        chain.push(self.lang.clone());
        chain
    }
}
