//! Backend configuration.
//!
//! ```toml
//! [[backend]]
//! kind = "local"
//! selector = "file"
//! root = "/srv/pod"
//! read_only = true
//!
//! [[backend]]
//! kind = "memory"
//! selector = "mem"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::storage::{BackendRegistry, LocalBackend, MemoryBackend};
use crate::uri::FILE_SELECTOR;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("selector registered twice: {0}")]
    DuplicateSelector(String),
}

/// Configuration result type.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Kind of storage a backend entry describes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Ephemeral in-memory store.
    #[default]
    Memory,
    /// Local filesystem under `root`.
    Local,
}

/// One `[[backend]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,
    /// Selector the backend answers to.
    pub selector: String,
    /// Filesystem root (local only; default `/`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Refuse writes (local only).
    #[serde(default)]
    pub read_only: bool,
    /// Display name override (memory only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl BackendConfig {
    /// In-memory backend answering to `selector`.
    pub fn memory(selector: impl Into<String>) -> Self {
        Self {
            kind: BackendKind::Memory,
            selector: selector.into(),
            root: None,
            read_only: false,
            name: None,
        }
    }

    /// Filesystem backend rooted at `root`.
    pub fn local(selector: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            kind: BackendKind::Local,
            selector: selector.into(),
            root: Some(root.into()),
            read_only: false,
            name: None,
        }
    }

    /// Set read-only mode.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }
}

/// Full configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LdpConfig {
    #[serde(rename = "backend", default)]
    pub backends: Vec<BackendConfig>,
}

impl Default for LdpConfig {
    /// The filesystem on `file` plus a memory store on `mem`.
    fn default() -> Self {
        Self {
            backends: vec![
                BackendConfig::local(FILE_SELECTOR, "/"),
                BackendConfig::memory("mem"),
            ],
        }
    }
}

impl LdpConfig {
    /// `$XDG_CONFIG_HOME/ldpfs/config.toml`, if a config directory is known.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ldpfs").join("config.toml"))
    }

    /// Parse TOML text.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a config file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), backends = config.backends.len(), "loaded config");
        Ok(config)
    }

    /// Load from [`default_path`](Self::default_path) if it exists, else the default.
    pub fn load_or_default() -> ConfigResult<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Build the registry these entries describe.
    pub fn build_registry(&self) -> ConfigResult<BackendRegistry> {
        let mut registry = BackendRegistry::new();

        for entry in &self.backends {
            if registry.contains(&entry.selector) {
                return Err(ConfigError::DuplicateSelector(entry.selector.clone()));
            }

            match entry.kind {
                BackendKind::Memory => {
                    if entry.root.is_some() || entry.read_only {
                        tracing::warn!(selector = %entry.selector, "root and read_only are ignored for memory backends");
                    }
                    let backend = match &entry.name {
                        Some(name) => MemoryBackend::named(name),
                        None => MemoryBackend::new(),
                    };
                    registry.register(&entry.selector, backend);
                }
                BackendKind::Local => {
                    let root = entry.root.clone().unwrap_or_else(|| PathBuf::from("/"));
                    let mut backend = LocalBackend::new(root);
                    backend.set_read_only(entry.read_only);
                    registry.register(&entry.selector, backend);
                }
            }
            tracing::debug!(selector = %entry.selector, kind = ?entry.kind, "registered backend");
        }

        Ok(registry)
    }
}
