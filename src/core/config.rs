//! Application configuration loaded from `pdf-section-editor.json`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::constants::{
    DEFAULT_CATALOG_PATH, DEFAULT_CONFIG_FILE, DEFAULT_GITHUB_BRANCH, DEFAULT_HISTORY_LIMIT,
    DEFAULT_INPUT_ROOT, DEFAULT_OUTPUT_ROOT, DEFAULT_STORE_ROOT, DEFAULT_UPLOAD_DELAY_MS,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where published section PDFs go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    Github {
        owner: String,
        repo: String,
        #[serde(default = "default_branch")]
        branch: String,
    },
    Directory {
        root: PathBuf,
        /// Prefix for returned urls; defaults to a `file://` url of `root`
        #[serde(default)]
        base_url: Option<String>,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Directory {
            root: PathBuf::from(DEFAULT_STORE_ROOT),
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Raw PDFs, one folder per subject
    #[serde(default = "default_input_root")]
    pub input_root: PathBuf,
    /// Compressed PDFs and extracted sections, one folder per subject
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
    /// Undo depth; 0 keeps every snapshot
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_upload_delay_ms")]
    pub upload_delay_ms: u64,
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_input_root() -> PathBuf {
    PathBuf::from(DEFAULT_INPUT_ROOT)
}

fn default_output_root() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_ROOT)
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from(DEFAULT_CATALOG_PATH)
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_upload_delay_ms() -> u64 {
    DEFAULT_UPLOAD_DELAY_MS
}

fn default_branch() -> String {
    DEFAULT_GITHUB_BRANCH.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input_root: default_input_root(),
            output_root: default_output_root(),
            catalog_path: default_catalog_path(),
            history_limit: default_history_limit(),
            upload_delay_ms: default_upload_delay_ms(),
            store: StoreConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from the default file in the working directory
    /// when it exists, or fall back to defaults. Environment overrides apply
    /// last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None if default_path.is_file() => Some(default_path),
            None => None,
        };

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("no config file, using defaults");
                Self::default()
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Apply `GITHUB_OWNER`, `GITHUB_REPO` and `GITHUB_BRANCH` to a GitHub store.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let StoreConfig::Github { owner, repo, branch } = &mut self.store {
            if let Some(value) = lookup("GITHUB_OWNER") {
                *owner = value;
            }
            if let Some(value) = lookup("GITHUB_REPO") {
                *repo = value;
            }
            if let Some(value) = lookup("GITHUB_BRANCH") {
                *branch = value;
            }
        }
    }

    pub fn subject_input_dir(&self, subject: &str) -> PathBuf {
        self.input_root.join(subject)
    }

    pub fn subject_output_dir(&self, subject: &str) -> PathBuf {
        self.output_root.join(subject)
    }

    /// Local file shown when previewing a section's source document.
    pub fn preview_path(&self, subject: &str, source_document: &str) -> PathBuf {
        self.subject_output_dir(subject).join(source_document)
    }
}
