use crate::model::DesktopEntry;
use anyhow::Result;
use directories::BaseDirs;
use std::env;
use std::path::PathBuf;

pub trait Source {
    fn scan(&self) -> Result<Vec<DesktopEntry>>;
}

pub mod desktop;

/// Application dirs in XDG priority order: `extra` first, then the user data
/// dir, then every entry of `$XDG_DATA_DIRS`. Duplicates are dropped.
pub fn app_dirs(extra: &[PathBuf]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = extra.to_vec();

    match env::var("XDG_DATA_HOME") {
        Ok(home) if !home.is_empty() => dirs.push(PathBuf::from(home).join("applications")),
        _ => {
            if let Some(base_dirs) = BaseDirs::new() {
                dirs.push(base_dirs.data_dir().join("applications"));
            }
        }
    }

    let data_dirs = env::var("XDG_DATA_DIRS")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());
    dirs.extend(
        data_dirs
            .split(':')
            .filter(|d| !d.is_empty())
            .map(|d| PathBuf::from(d).join("applications")),
    );

    let mut unique = Vec::with_capacity(dirs.len());
    for dir in dirs {
        if !unique.contains(&dir) {
            unique.push(dir);
        }
    }
    unique
}
