use serde::Deserialize;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;
use anyhow::{Context, Result};
use std::fs;

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub sources: SourceConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct GeneralConfig {
    /// Forced language tag, e.g. "pl" or "pt_BR". Unset means the environment decides.
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default = "default_terminal")]
    pub terminal: String,
    #[serde(default = "default_file_manager")]
    pub file_manager: String,
}

fn default_terminal() -> String { "alacritty".to_string() }
fn default_file_manager() -> String { "thunar".to_string() }

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            lang: None,
            terminal: default_terminal(),
            file_manager: default_file_manager(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SourceConfig {
    /// Scanned before the XDG application dirs.
    #[serde(default)]
    pub app_dirs: Vec<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SearchConfig {
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    #[serde(default = "default_min_file_query_len")]
    pub min_file_query_len: usize,
    /// Replaces the XDG user dirs as file search scope when non-empty.
    #[serde(default)]
    pub file_roots: Vec<PathBuf>,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_file_prefix() -> String { "/".to_string() }
fn default_min_file_query_len() -> usize { 3 }
fn default_max_depth() -> usize { 4 }
fn default_max_results() -> usize { 50 }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            file_prefix: default_file_prefix(),
            min_file_query_len: default_min_file_query_len(),
            file_roots: Vec::new(),
            max_depth: default_max_depth(),
            max_results: default_max_results(),
        }
    }
}

pub fn config_path() -> PathBuf {
    match ProjectDirs::from("org", "menu-start", "menu-start") {
        Some(dirs) => dirs.config_dir().join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(config_path);

    if !config_path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("parsing {}", config_path.display()))?;
    Ok(config)
}
