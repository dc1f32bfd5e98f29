//! Runtime configuration.
//!
//! Loaded from `$XDG_CONFIG_HOME/vesper/config.toml` when present. The
//! `VESPER_EXTENSIONS_DIR` environment variable overrides the extensions
//! root; the CLI flag overrides both.

use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use directories::{BaseDirs, ProjectDirs};
use serde::Deserialize;

use crate::diagnostics::{Result, VesperError};

pub const EXTENSIONS_DIR_ENV: &str = "VESPER_EXTENSIONS_DIR";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one subdirectory per extension.
    pub extensions_dir: PathBuf,
    /// Where the REPL keeps its history; `None` disables persistence.
    pub history_file: Option<PathBuf>,
    pub prompt: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extensions_dir: default_extensions_dir(),
            history_file: default_history_file(),
            prompt: ">>> ".to_string(),
        }
    }
}

impl Config {
    /// Loads the default config file, falling back to defaults if it does not
    /// exist, then applies the environment override.
    pub fn load() -> Result<Self> {
        let config = match Self::config_path() {
            Some(path) if path.is_file() => Self::load_from(&path)?,
            Some(path) => {
                tracing::debug!("no config file at {}, using defaults", path.display());
                Self::default()
            }
            None => Self::default(),
        };
        Ok(config.with_extensions_override(std::env::var_os(EXTENSIONS_DIR_ENV)))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|message| VesperError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    fn from_toml(content: &str) -> std::result::Result<Self, String> {
        let mut config: Config = toml::from_str(content).map_err(|err| err.message().to_string())?;
        config.extensions_dir = expand_home(&config.extensions_dir);
        config.history_file = config.history_file.as_deref().map(expand_home);
        Ok(config)
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "vesper").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn with_extensions_override(mut self, dir: Option<OsString>) -> Self {
        if let Some(dir) = dir.filter(|dir| !dir.is_empty()) {
            self.extensions_dir = expand_home(Path::new(&dir));
        }
        self
    }
}

/// The user's home directory, or `/tmp` when none can be determined.
pub fn home_dir() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .or_else(|| std::env::var_os("HOME").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}

pub fn default_extensions_dir() -> PathBuf {
    home_dir().join(".vesper").join("extensions")
}

fn default_history_file() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.data_dir().join("vesper").join("history.txt"))
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home_dir().join(rest),
        Err(_) => path.to_path_buf(),
    }
}
