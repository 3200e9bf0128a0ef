use anyhow::Result;
use directories::{BaseDirs, UserDirs};
use log::{debug, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use walkdir::WalkDir;

/// A file search to run off the UI thread, tagged with the query it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRequest {
    pub token: u64,
    pub phrase: String,
    pub scope: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBatch {
    pub token: u64,
    pub paths: Vec<PathBuf>,
}

/// Runs the lookup on its own thread and sends the batch back. Lookup errors
/// become an empty batch so the requester still hears back.
pub fn spawn_lookup(
    request: FileRequest,
    lookup: Arc<dyn PathLookup>,
    tx: calloop::channel::Sender<FileBatch>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let paths = match lookup.lookup(&request.phrase, &request.scope) {
            Ok(paths) => paths,
            Err(e) => {
                warn!("File search for {:?} failed: {}", request.phrase, e);
                Vec::new()
            }
        };
        let _ = tx.send(FileBatch {
            token: request.token,
            paths,
        });
    })
}

/// Resolves a phrase to matching paths under a set of directories.
/// Implementations may be slow and may fail; callers treat failure as no results.
pub trait PathLookup: Send + Sync {
    fn lookup(&self, phrase: &str, scope: &[PathBuf]) -> Result<Vec<PathBuf>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathMatch {
    pub path: PathBuf,
    pub label: String,
}

impl PathMatch {
    pub fn new(path: PathBuf, home: Option<&Path>) -> Self {
        let label = display_label(&path, home);
        Self { path, label }
    }
}

/// `path` with the home dir shown as `~`.
pub fn display_label(path: &Path, home: Option<&Path>) -> String {
    match home.and_then(|h| path.strip_prefix(h).ok()) {
        Some(rel) if rel.as_os_str().is_empty() => "~".to_string(),
        Some(rel) => format!("~/{}", rel.display()),
        None => path.display().to_string(),
    }
}

/// A labelled directory of the places panel, opened in the file manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDir {
    pub label: String,
    pub path: PathBuf,
}

/// Home followed by the XDG user dirs that exist: desktop, documents,
/// downloads, music, pictures, videos.
pub fn user_dirs() -> Vec<UserDir> {
    let Some(dirs) = UserDirs::new() else {
        return Vec::new();
    };
    let candidates = [
        ("Desktop", dirs.desktop_dir()),
        ("Documents", dirs.document_dir()),
        ("Downloads", dirs.download_dir()),
        ("Music", dirs.audio_dir()),
        ("Pictures", dirs.picture_dir()),
        ("Videos", dirs.video_dir()),
    ];
    collect_user_dirs(dirs.home_dir(), &candidates)
}

fn collect_user_dirs(home: &Path, candidates: &[(&str, Option<&Path>)]) -> Vec<UserDir> {
    let mut found = vec![UserDir {
        label: "Home".to_string(),
        path: home.to_path_buf(),
    }];
    for (label, dir) in candidates {
        let Some(dir) = dir else { continue };
        // unset XDG dirs fall back to $HOME
        if !dir.is_dir() || found.iter().any(|d| d.path == *dir) {
            continue;
        }
        found.push(UserDir {
            label: label.to_string(),
            path: dir.to_path_buf(),
        });
    }
    found
}

/// Default file search scope: the user dirs without Home, which is too broad to walk.
pub fn search_scope(dirs: &[UserDir]) -> Vec<PathBuf> {
    dirs.iter()
        .skip_while(|d| d.label == "Home")
        .map(|d| d.path.clone())
        .collect()
}

pub fn home_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

/// Walks each scope dir looking for file names containing the phrase.
pub struct WalkLookup {
    pub max_depth: usize,
    pub max_results: usize,
}

impl Default for WalkLookup {
    fn default() -> Self {
        Self {
            max_depth: 4,
            max_results: 50,
        }
    }
}

impl PathLookup for WalkLookup {
    fn lookup(&self, phrase: &str, scope: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let needle = phrase.trim().to_lowercase();
        let mut found = Vec::new();
        if needle.is_empty() {
            return Ok(found);
        }

        for root in scope {
            let walker = WalkDir::new(root)
                .min_depth(1)
                .max_depth(self.max_depth)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| !is_hidden(e.file_name().to_str()));

            for entry in walker.filter_map(|e| e.ok()) {
                let matches = entry
                    .file_name()
                    .to_str()
                    .is_some_and(|n| n.to_lowercase().contains(&needle));
                if !matches {
                    continue;
                }
                let path = entry.into_path();
                let path = if path.is_absolute() {
                    path
                } else {
                    std::path::absolute(&path)?
                };
                found.push(path);
                if found.len() >= self.max_results {
                    debug!("File search for {:?} hit the {} result cap", phrase, self.max_results);
                    return Ok(found);
                }
            }
        }

        debug!("File search for {:?}: {} results", phrase, found.len());
        Ok(found)
    }
}

fn is_hidden(name: Option<&str>) -> bool {
    name.is_some_and(|n| n.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        for rel in [
            "Documents/report-2024.pdf",
            "Documents/notes/Report draft.txt",
            "Documents/.secret/report.txt",
            "Music/a/b/c/d/report.ogg",
            "Music/song.ogg",
        ] {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }
        dir
    }

    #[test]
    fn test_lookup_matches_names_case_insensitively() {
        let dir = tree();
        let scope = vec![dir.path().join("Documents"), dir.path().join("Music")];
        let found = WalkLookup::default().lookup("REPORT", &scope).unwrap();
        assert_eq!(
            found,
            vec![
                dir.path().join("Documents/notes/Report draft.txt"),
                dir.path().join("Documents/report-2024.pdf"),
            ]
        );
        assert!(found.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn test_lookup_depth_and_result_caps() {
        let dir = tree();
        let scope = vec![dir.path().join("Music")];
        let deep = WalkLookup { max_depth: 5, max_results: 50 };
        assert_eq!(deep.lookup("report", &scope).unwrap().len(), 1);

        let capped = WalkLookup { max_depth: 5, max_results: 1 };
        let scope = vec![dir.path().join("Documents"), dir.path().join("Music")];
        assert_eq!(capped.lookup("report", &scope).unwrap().len(), 1);
    }

    #[test]
    fn test_lookup_tolerates_missing_dirs_and_empty_phrase() {
        let dir = tree();
        let lookup = WalkLookup::default();
        assert!(lookup.lookup("x", &[dir.path().join("nope")]).unwrap().is_empty());
        assert!(lookup.lookup("  ", &[dir.path().to_path_buf()]).unwrap().is_empty());
    }

    struct Failing;

    impl PathLookup for Failing {
        fn lookup(&self, _: &str, _: &[PathBuf]) -> Result<Vec<PathBuf>> {
            anyhow::bail!("permission denied")
        }
    }

    #[test]
    fn test_failed_lookup_sends_empty_batch() {
        let (tx, rx) = calloop::channel::channel();
        let mut event_loop: calloop::EventLoop<Vec<FileBatch>> =
            calloop::EventLoop::try_new().unwrap();
        event_loop
            .handle()
            .insert_source(rx, |event, _, batches: &mut Vec<FileBatch>| {
                if let calloop::channel::Event::Msg(batch) = event {
                    batches.push(batch);
                }
            })
            .unwrap();

        let request = FileRequest {
            token: 7,
            phrase: "x".to_string(),
            scope: vec![PathBuf::from("/")],
        };
        spawn_lookup(request, Arc::new(Failing), tx).join().unwrap();

        let mut batches = Vec::new();
        event_loop
            .dispatch(Some(std::time::Duration::from_secs(5)), &mut batches)
            .unwrap();
        assert_eq!(batches, vec![FileBatch { token: 7, paths: vec![] }]);
    }

    #[test]
    fn test_user_dirs_start_at_home_and_skip_missing() {
        let home = TempDir::new().unwrap();
        let docs = home.path().join("Docs");
        let music = home.path().join("Music");
        fs::create_dir(&docs).unwrap();
        fs::create_dir(&music).unwrap();
        let missing = home.path().join("Videos");

        let candidates = [
            ("Desktop", Some(home.path())),
            ("Documents", Some(docs.as_path())),
            ("Downloads", None),
            ("Music", Some(music.as_path())),
            ("Pictures", Some(docs.as_path())),
            ("Videos", Some(missing.as_path())),
        ];
        let dirs = collect_user_dirs(home.path(), &candidates);
        let labels: Vec<&str> = dirs.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["Home", "Documents", "Music"]);
        assert_eq!(dirs[0].path, home.path());

        assert_eq!(search_scope(&dirs), vec![docs, music]);
    }

    #[test]
    fn test_display_label() {
        let home = Path::new("/home/ann");
        assert_eq!(display_label(Path::new("/home/ann/Music/x.ogg"), Some(home)), "~/Music/x.ogg");
        assert_eq!(display_label(home, Some(home)), "~");
        assert_eq!(display_label(Path::new("/tmp/x"), Some(home)), "/tmp/x");
        assert_eq!(display_label(Path::new("/tmp/x"), None), "/tmp/x");
    }
}
