use crate::category;
use crate::model::{Category, DesktopEntry};
use crate::sources::Source;
use anyhow::Result;
use log::info;
use std::collections::HashMap;

/// Category -> entry ids, in scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryIndex {
    lists: [Vec<String>; 9],
}

impl CategoryIndex {
    pub fn ids(&self, category: Category) -> &[String] {
        &self.lists[category.index()]
    }

    fn push(&mut self, category: Category, id: String) {
        self.lists[category.index()].push(id);
    }
}

/// Immutable snapshot of every parsed entry plus its category index.
/// A rebuild creates a new snapshot; nothing mutates one after `build`.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<DesktopEntry>,
    by_id: HashMap<String, usize>,
    index: CategoryIndex,
}

impl Catalog {
    pub fn build(source: &dyn Source) -> Result<Self> {
        Ok(Self::from_entries(source.scan()?))
    }

    /// Assembles a catalog from entries in scan order. A repeated id replaces
    /// the earlier entry in place.
    pub fn from_entries(scanned: Vec<DesktopEntry>) -> Self {
        let mut entries: Vec<DesktopEntry> = Vec::with_capacity(scanned.len());
        let mut by_id = HashMap::with_capacity(scanned.len());

        for entry in scanned {
            match by_id.get(&entry.id) {
                Some(&i) => entries[i] = entry,
                None => {
                    by_id.insert(entry.id.clone(), entries.len());
                    entries.push(entry);
                }
            }
        }

        let mut index = CategoryIndex::default();
        for entry in &entries {
            index.push(category::categorize(entry.categories.as_slice()), entry.id.clone());
        }

        info!("Catalog: {} entries", entries.len());
        Self {
            entries,
            by_id,
            index,
        }
    }

    pub fn get(&self, id: &str) -> Option<&DesktopEntry> {
        self.by_id.get(id).map(|&i| &self.entries[i])
    }

    /// All entries in scan order, listed or not.
    pub fn entries(&self) -> &[DesktopEntry] {
        &self.entries
    }

    pub fn index(&self) -> &CategoryIndex {
        &self.index
    }

    /// Listed entries of one category, for the browse view.
    pub fn listed_in(&self, category: Category) -> impl Iterator<Item = &DesktopEntry> {
        self.index()
            .ids(category)
            .iter()
            .filter_map(|id| self.get(id))
            .filter(|e| e.is_listed())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
