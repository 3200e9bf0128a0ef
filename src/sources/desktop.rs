use crate::locale::Locale;
use crate::model::DesktopEntry;
use crate::sources::Source;
use anyhow::Result;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Scans descriptor roots in priority order. When two roots provide the same
/// desktop file id, the first root wins.
pub struct DesktopSource {
    pub roots: Vec<PathBuf>,
    pub locale: Option<Locale>,
}

impl DesktopSource {
    pub fn new(roots: Vec<PathBuf>, locale: Option<Locale>) -> Self {
        Self { roots, locale }
    }
}

impl Source for DesktopSource {
    fn scan(&self) -> Result<Vec<DesktopEntry>> {
        let mut entries = Vec::new();
        let mut seen = HashSet::new();

        for root in &self.roots {
            if !root.is_dir() {
                debug!("Skipping missing application dir {:?}", root);
                continue;
            }
            debug!("Scanning desktop files in {:?}", root);

            for file in descriptor_files(root) {
                let Some(id) = desktop_file_id(root, &file) else { continue };
                if seen.contains(&id) {
                    debug!("{} in {:?} shadowed by an earlier root", id, root);
                    continue;
                }

                let content = match fs::read_to_string(&file) {
                    Ok(c) => c,
                    Err(e) => {
                        warn!("Cannot read {:?}: {}", file, e);
                        continue;
                    }
                };

                match parse_desktop_entry(&id, &content, self.locale.as_ref()) {
                    Ok(entry) => {
                        seen.insert(id);
                        entries.push(entry);
                    }
                    Err(e) => warn!("Skipping {:?}: {}", file, e),
                }
            }
        }

        info!("DesktopSource: found {} entries", entries.len());
        Ok(entries)
    }
}

/// `.desktop` files directly under `root` or one directory below it, sorted by name.
fn descriptor_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| !e.file_type().is_dir())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("desktop"))
        .collect()
}

/// Desktop file id: the path below the root with `/` replaced by `-`.
pub fn desktop_file_id(root: &Path, file: &Path) -> Option<String> {
    let rel = file.strip_prefix(root).ok()?;
    let parts: Vec<&str> = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("-"))
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("no [Desktop Entry] group")]
    MissingGroup,
    #[error("line {0}: expected key=value, got {1:?}")]
    InvalidLine(usize, String),
}

/// Parses the `[Desktop Entry]` group of a descriptor.
///
/// A missing `Name` is not an error: the entry is kept so it stays
/// addressable by id, but [`DesktopEntry::is_listed`] reports it as hidden.
pub fn parse_desktop_entry(
    id: &str,
    content: &str,
    locale: Option<&Locale>,
) -> Result<DesktopEntry, ParseError> {
    let mut fields: HashMap<&str, &str> = HashMap::new();
    let mut is_desktop_entry = false;
    let mut seen_group = false;

    for (n, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }

        if line == "[Desktop Entry]" {
            is_desktop_entry = true;
            seen_group = true;
            continue;
        }

        if line.starts_with('[') {
            is_desktop_entry = false;
            continue;
        }

        if !is_desktop_entry { continue; }

        let Some((key, value)) = line.split_once('=') else {
            return Err(ParseError::InvalidLine(n + 1, line.to_string()));
        };
        fields.entry(key.trim()).or_insert(value.trim());
    }

    if !seen_group {
        return Err(ParseError::MissingGroup);
    }

    let chain = locale.map(Locale::fallback_chain).unwrap_or_default();
    let localized = |key: &str| {
        chain
            .iter()
            .find_map(|suffix| fields.get(format!("{key}[{suffix}]").as_str()).copied())
    };
    let plain = |key: &str| fields.get(key).copied();
    let flag = |key: &str| plain(key) == Some("true");

    let mut entry = DesktopEntry::new(id.to_string());
    entry.name = plain("Name").unwrap_or_default().to_string();
    entry.name_loc = localized("Name").unwrap_or(&entry.name).to_string();
    entry.comment = plain("Comment").unwrap_or_default().to_string();
    entry.comment_loc = localized("Comment").unwrap_or(&entry.comment).to_string();
    entry.icon = plain("Icon").filter(|s| !s.is_empty()).map(str::to_string);
    entry.exec = plain("Exec").unwrap_or_default().to_string();
    entry.terminal = flag("Terminal");
    entry.no_display = flag("NoDisplay");
    entry.hidden = flag("Hidden");
    entry.categories = plain("Categories")
        .map(|c| {
            c.split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(entry)
}
