use crate::catalog::Catalog;
use crate::config::Config;
use crate::executor::{self, LaunchCommand};
use crate::files::{self, FileBatch, FileRequest, PathMatch, UserDir};
use crate::matcher::{AppMatch, AppMatcher};
use crate::model::{Category, DesktopEntry};
use crate::pinned::{PinError, PinnedStore};
use log::debug;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SearchResult {
    App(AppMatch),
    Path(PathMatch),
}

/// Session state driven by one thread: the current catalog snapshot, the
/// pinned list and the results of the latest query.
pub struct AppState {
    pub config: Config,
    catalog: Arc<Catalog>,
    pinned: PinnedStore,
    matcher: AppMatcher,
    pub query: String,
    app_results: Vec<AppMatch>,
    path_results: Vec<PathMatch>,
    latest_token: u64,
    file_scope: Vec<PathBuf>,
    user_dirs: Vec<UserDir>,
    home: Option<PathBuf>,
}

impl AppState {
    pub fn new(config: Config, catalog: Arc<Catalog>, pinned: PinnedStore) -> Self {
        let user_dirs = files::user_dirs();
        let file_scope = if config.search.file_roots.is_empty() {
            files::search_scope(&user_dirs)
        } else {
            config.search.file_roots.clone()
        };
        debug!("File search scope: {:?}", file_scope);

        Self {
            config,
            catalog,
            pinned,
            matcher: AppMatcher::new(),
            query: String::new(),
            app_results: Vec::new(),
            path_results: Vec::new(),
            latest_token: 0,
            file_scope,
            user_dirs,
            home: files::home_dir(),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Swaps in a rebuilt catalog and re-runs the current query against it.
    pub fn set_catalog(&mut self, catalog: Arc<Catalog>) -> Option<FileRequest> {
        self.catalog = catalog;
        self.matcher.reset();
        let query = self.query.clone();
        self.update_query(&query)
    }

    /// Runs the application search for `query` and invalidates every file
    /// search still in flight. Returns the file search to dispatch, if any.
    ///
    /// Queries starting with the file prefix search files only. Otherwise files
    /// are searched when no application matched and the query is long enough.
    pub fn update_query(&mut self, query: &str) -> Option<FileRequest> {
        self.query = query.to_string();
        self.latest_token += 1;
        self.path_results.clear();

        let trimmed = query.trim();
        let prefix = self.config.search.file_prefix.as_str();

        let phrase = if !prefix.is_empty() && trimmed.starts_with(prefix) {
            self.app_results.clear();
            self.matcher.reset();
            trimmed[prefix.len()..].trim()
        } else {
            self.app_results = self.matcher.match_entries(trimmed, &self.catalog);
            let long_enough = trimmed.chars().count() >= self.config.search.min_file_query_len;
            if !self.app_results.is_empty() || !long_enough {
                ""
            } else {
                trimmed
            }
        };

        log::info!(
            "AppState: query='{}', app_results={}",
            self.query,
            self.app_results.len()
        );

        if phrase.is_empty() || self.file_scope.is_empty() {
            return None;
        }
        Some(FileRequest {
            token: self.latest_token,
            phrase: phrase.to_string(),
            scope: self.file_scope.clone(),
        })
    }

    /// Applies a file batch if it belongs to the latest query. Returns whether
    /// it was applied; stale batches are dropped.
    pub fn accept_file_batch(&mut self, batch: FileBatch) -> bool {
        if batch.token != self.latest_token {
            debug!(
                "Dropping stale file batch {} (latest is {})",
                batch.token, self.latest_token
            );
            return false;
        }
        let home = self.home.as_deref();
        self.path_results = batch
            .paths
            .into_iter()
            .map(|p| PathMatch::new(p, home))
            .collect();
        true
    }

    /// No query means the browse view is shown instead of results.
    pub fn is_searching(&self) -> bool {
        !self.query.trim().is_empty()
    }

    /// Application matches first, then path matches.
    pub fn results(&self) -> Vec<SearchResult> {
        self.app_results
            .iter()
            .cloned()
            .map(SearchResult::App)
            .chain(self.path_results.iter().cloned().map(SearchResult::Path))
            .collect()
    }

    /// Non-empty categories with their listed entries, for the browse view.
    pub fn browse(&self) -> Vec<(Category, Vec<&DesktopEntry>)> {
        Category::ALL
            .iter()
            .map(|&cat| (cat, self.catalog.listed_in(cat).collect::<Vec<_>>()))
            .filter(|(_, entries)| !entries.is_empty())
            .collect()
    }

    /// Home and the XDG user dirs, shown next to the categories.
    pub fn user_dirs(&self) -> &[UserDir] {
        &self.user_dirs
    }

    pub fn pinned_entries(&self) -> Vec<&DesktopEntry> {
        self.pinned.visible(&self.catalog)
    }

    pub fn pinned(&self) -> &PinnedStore {
        &self.pinned
    }

    pub fn pin(&mut self, id: &str) -> Result<(), PinError> {
        self.pinned.pin(id)
    }

    pub fn unpin(&mut self, id: &str) -> Result<(), PinError> {
        self.pinned.unpin(id)
    }

    pub fn reorder_pinned(&mut self, order: &[String]) -> Result<(), PinError> {
        self.pinned.reorder(order)
    }

    pub fn command_for_entry(&self, id: &str) -> Option<LaunchCommand> {
        let entry = self.catalog.get(id)?;
        executor::resolve_entry(entry, &self.config.general)
    }

    pub fn command_for(&self, result: &SearchResult) -> Option<LaunchCommand> {
        match result {
            SearchResult::App(m) => self.command_for_entry(&m.id),
            SearchResult::Path(p) => Some(executor::resolve_path(&p.path, &self.config.general)),
        }
    }

    /// Opens the `n`-th user dir (from 0) in the file manager.
    pub fn command_for_user_dir(&self, n: usize) -> Option<LaunchCommand> {
        let dir = self.user_dirs.get(n)?;
        Some(executor::resolve_path(&dir.path, &self.config.general))
    }
}
