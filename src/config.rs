// ABOUTME: Immutable export configuration loaded from TOML with defaults
// ABOUTME: Resolves platform paths for the cache, session, and manifest

use crate::{Error, Result};
use clap::ValueEnum;
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://api.granola.ai/v1";
const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Docx,
    Md,
    Txt,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Docx => ".docx",
            ExportFormat::Md => ".md",
            ExportFormat::Txt => ".txt",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory receiving one file per exported meeting
    pub destination: PathBuf,
    /// Explicit cache file; discovery in `snapshot_dir` is used when it is absent
    pub snapshot_path: Option<PathBuf>,
    pub snapshot_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub format: ExportFormat,
    pub auth_path: PathBuf,
    pub api_base: String,
    /// Bearer token that takes precedence over the session file
    pub token: Option<String>,
    /// Re-export meetings already present in the manifest
    pub force: bool,
    pub ids: Option<Vec<String>>,
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        let snapshot_dir = granola_data_dir();
        Self {
            destination: PathBuf::new(),
            snapshot_path: None,
            auth_path: snapshot_dir.join("supabase.json"),
            snapshot_dir,
            manifest_path: project_data_dir().join("manifest.json"),
            format: ExportFormat::default(),
            api_base: DEFAULT_API_BASE.to_string(),
            token: None,
            force: false,
            ids: None,
            progress: false,
        }
    }
}

impl Config {
    /// Loads the config file when present, falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path(),
        };

        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

pub fn default_config_path() -> PathBuf {
    ProjectDirs::from("", "", "granola-export")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME))
}

fn project_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "granola-export")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Granola keeps its cache and session under the platform data dir
/// (`~/Library/Application Support/Granola` on macOS).
fn granola_data_dir() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.data_dir().join("Granola"))
        .unwrap_or_else(|| PathBuf::from("Granola"))
}
