use crate::catalog::Catalog;
use crate::model::DesktopEntry;
use directories::BaseDirs;
use log::{debug, warn};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PinError {
    #[error("invalid desktop id {0:?}")]
    InvalidId(String),
    #[error("new order is not a permutation of the pinned ids")]
    InvalidOrder,
    #[error("cannot write pinned list: {0}")]
    PersistFailed(#[from] io::Error),
}

/// Shared with the other nwg tools, one desktop id per line.
pub fn default_pin_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.cache_dir().join("nwg-pin-cache"))
}

/// Ordered set of pinned desktop ids, written back on every change.
///
/// Ids are kept even when the catalog no longer has them; [`PinnedStore::visible`]
/// filters them at render time.
///
/// A failed write leaves the in-memory list changed; the next successful
/// write brings storage back in sync.
#[derive(Debug)]
pub struct PinnedStore {
    path: PathBuf,
    ids: Vec<String>,
}

impl PinnedStore {
    /// Reads the list at `path`. Missing, unreadable or corrupt files give an empty list.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ids = match fs::read(&path) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => parse_ids(&text),
                Err(_) => {
                    warn!("Pinned list {:?} is not valid UTF-8, starting empty", path);
                    Vec::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!("Cannot read pinned list {:?}: {}", path, e);
                Vec::new()
            }
        };
        debug!("Loaded {} pinned ids from {:?}", ids.len(), path);
        Self { path, ids }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|p| p == id)
    }

    /// Appends `id` unless already pinned. Surrounding whitespace is dropped;
    /// empty ids and ids spanning lines are rejected, since neither could be
    /// read back from the one-id-per-line file.
    pub fn pin(&mut self, id: &str) -> Result<(), PinError> {
        let id = id.trim();
        if id.is_empty() || id.contains(['\n', '\r']) {
            return Err(PinError::InvalidId(id.to_string()));
        }
        if self.contains(id) {
            return Ok(());
        }
        self.ids.push(id.to_string());
        self.save()
    }

    pub fn unpin(&mut self, id: &str) -> Result<(), PinError> {
        let id = id.trim();
        let before = self.ids.len();
        self.ids.retain(|p| p != id);
        if self.ids.len() == before {
            return Ok(());
        }
        self.save()
    }

    /// Replaces the order. `order` must hold exactly the pinned ids.
    pub fn reorder(&mut self, order: &[String]) -> Result<(), PinError> {
        if !is_permutation(&self.ids, order) {
            return Err(PinError::InvalidOrder);
        }
        self.ids = order.to_vec();
        self.save()
    }

    /// Pinned entries present in the catalog and listable, in pinned order.
    pub fn visible<'a>(&self, catalog: &'a Catalog) -> Vec<&'a DesktopEntry> {
        self.ids
            .iter()
            .filter_map(|id| catalog.get(id))
            .filter(|e| e.is_listed())
            .collect()
    }

    fn save(&self) -> Result<(), PinError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut content = self.ids.join("\n");
        content.push('\n');

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        debug!("Saved {} pinned ids to {:?}", self.ids.len(), self.path);
        Ok(())
    }
}

fn parse_ids(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter(|l| seen.insert(*l))
        .map(str::to_string)
        .collect()
}

fn is_permutation(current: &[String], order: &[String]) -> bool {
    if current.len() != order.len() {
        return false;
    }
    let wanted: HashSet<&String> = current.iter().collect();
    let given: HashSet<&String> = order.iter().collect();
    given.len() == order.len() && wanted == given
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::entry;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> PinnedStore {
        PinnedStore::load(dir.path().join("pins"))
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(store(&dir).ids().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pins"), [0xff, 0xfe, 0x00, 0x9f]).unwrap();
        assert!(store(&dir).ids().is_empty());
    }

    #[test]
    fn test_load_trims_and_dedups() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pins"), "a.desktop\n\n  b.desktop \na.desktop\n").unwrap();
        assert_eq!(store(&dir).ids(), ids(&["a.desktop", "b.desktop"]));
    }

    #[test]
    fn test_pin_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut once = store(&dir);
        once.pin("x.desktop").unwrap();
        let snapshot = once.ids().to_vec();
        once.pin("x.desktop").unwrap();
        assert_eq!(once.ids(), snapshot);
    }

    #[test]
    fn test_pin_unpin_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut pins = store(&dir);
        pins.pin("a.desktop").unwrap();
        let original = pins.ids().to_vec();

        pins.pin("x.desktop").unwrap();
        pins.unpin("x.desktop").unwrap();
        assert_eq!(pins.ids(), original);

        pins.unpin("never-pinned.desktop").unwrap();
        assert_eq!(pins.ids(), original);
    }

    #[test]
    fn test_pin_survives_restart() {
        let dir = TempDir::new().unwrap();
        {
            let mut pins = store(&dir);
            pins.pin("a.desktop").unwrap();
            pins.pin("b.desktop").unwrap();
        }
        let reloaded = store(&dir);
        assert_eq!(reloaded.ids(), ids(&["a.desktop", "b.desktop"]));
    }

    #[test]
    fn test_pinned_ids_read_back_unchanged() {
        let dir = TempDir::new().unwrap();
        let mut pins = store(&dir);
        pins.pin(" spaced.desktop\t").unwrap();
        for bad in ["a.desktop\nb.desktop", "c\r.desktop", "", "   "] {
            assert!(matches!(pins.pin(bad), Err(PinError::InvalidId(_))), "{bad:?}");
        }
        assert_eq!(pins.ids(), ids(&["spaced.desktop"]));
        assert_eq!(store(&dir).ids(), pins.ids());

        pins.unpin("spaced.desktop ").unwrap();
        assert!(store(&dir).ids().is_empty());
    }

    #[test]
    fn test_save_creates_parent_dir() {
        let dir = TempDir::new().unwrap();
        let mut pins = PinnedStore::load(dir.path().join("cache/nested/pins"));
        pins.pin("a.desktop").unwrap();
        assert!(dir.path().join("cache/nested/pins").exists());
    }

    #[test]
    fn test_reorder() {
        let dir = TempDir::new().unwrap();
        let mut pins = store(&dir);
        for id in ["a", "b", "c"] {
            pins.pin(id).unwrap();
        }

        pins.reorder(&ids(&["c", "a", "b"])).unwrap();
        assert_eq!(pins.ids(), ids(&["c", "a", "b"]));
        assert_eq!(store(&dir).ids(), ids(&["c", "a", "b"]));
    }

    #[test]
    fn test_reorder_rejects_non_permutations() {
        let dir = TempDir::new().unwrap();
        let mut pins = store(&dir);
        for id in ["a", "b", "c"] {
            pins.pin(id).unwrap();
        }

        for bad in [
            ids(&["a", "b"]),
            ids(&["a", "b", "c", "d"]),
            ids(&["a", "a", "b"]),
            ids(&["a", "b", "x"]),
        ] {
            assert!(matches!(pins.reorder(&bad), Err(PinError::InvalidOrder)));
            assert_eq!(pins.ids(), ids(&["a", "b", "c"]));
        }
        assert_eq!(store(&dir).ids(), ids(&["a", "b", "c"]));
    }

    #[test]
    fn test_persist_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        // a regular file where the parent dir should be
        fs::write(dir.path().join("blocker"), "").unwrap();
        let mut pins = PinnedStore::load(dir.path().join("blocker/pins"));

        let err = pins.pin("a.desktop").unwrap_err();
        assert!(matches!(err, PinError::PersistFailed(_)));
        assert!(pins.contains("a.desktop"));
    }

    #[test]
    fn test_visible_filters_but_keeps_storage() {
        let dir = TempDir::new().unwrap();
        let mut pins = store(&dir);
        for id in ["gone.desktop", "b.desktop", "hidden.desktop", "a.desktop"] {
            pins.pin(id).unwrap();
        }

        let mut hidden = entry("hidden.desktop", "Hidden", "", &[]);
        hidden.no_display = true;
        let catalog = Catalog::from_entries(vec![
            entry("a.desktop", "A", "", &[]),
            entry("b.desktop", "B", "", &[]),
            hidden,
        ]);

        let shown: Vec<&str> = pins.visible(&catalog).iter().map(|e| e.id.as_str()).collect();
        assert_eq!(shown, vec!["b.desktop", "a.desktop"]);
        assert_eq!(store(&dir).ids().len(), 4);
    }
}
