use crate::catalog::Catalog;
use serde::Serialize;

/// Which field matched. Name matches rank above comment matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchField {
    Name,
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppMatch {
    pub id: String,
    pub field: MatchField,
    pub rank: usize,
}

/// Case-insensitive substring search over localized names and comments.
///
/// Keeps the candidates of the previous query so that typing one more
/// character only re-tests what matched before.
#[derive(Default)]
pub struct AppMatcher {
    last_query: String,
    candidates: Option<Vec<usize>>,
}

impl AppMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget cached candidates, e.g. after the catalog was rebuilt.
    pub fn reset(&mut self) {
        self.last_query.clear();
        self.candidates = None;
    }

    pub fn match_entries(&mut self, query: &str, catalog: &Catalog) -> Vec<AppMatch> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            self.reset();
            return Vec::new();
        }

        let entries = catalog.entries();
        let pool: Vec<usize> = match &self.candidates {
            Some(prev) if query.starts_with(&self.last_query) => prev.clone(),
            _ => (0..entries.len()).collect(),
        };

        let mut names = Vec::new();
        let mut comments = Vec::new();
        for i in pool {
            let entry = &entries[i];
            if !entry.is_listed() {
                continue;
            }
            if entry.name_loc.to_lowercase().contains(&query) {
                names.push(i);
            } else if entry.comment_loc.to_lowercase().contains(&query) {
                comments.push(i);
            }
        }

        let mut candidates = names.clone();
        candidates.extend_from_slice(&comments);
        candidates.sort_unstable();
        self.candidates = Some(candidates);
        self.last_query = query;

        names
            .into_iter()
            .map(|i| (i, MatchField::Name))
            .chain(comments.into_iter().map(|i| (i, MatchField::Comment)))
            .enumerate()
            .map(|(rank, (i, field))| AppMatch {
                id: entries[i].id.clone(),
                field,
                rank,
            })
            .collect()
    }
}
