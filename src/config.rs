//! Server configuration.
//!
//! Loaded from an optional YAML file, then overridden from the environment.
//! Every field has a default so an empty file is valid.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::files::FileServerConfig;
use crate::http::connection::{DEFAULT_MAX_UPLOAD_SIZE, SessionConfig};

/// Environment variable naming a YAML config file.
pub const CONFIG_ENV: &str = "NANOSERVE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid value {value:?} for {var}")]
    Env { var: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind; all interfaces when unset
    pub host: Option<String>,
    pub port: u16,
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 80,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub root: PathBuf,
    pub listing: bool,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            listing: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Reads the file named by `NANOSERVE_CONFIG` (defaults otherwise), then
    /// applies `LISTEN_HOST`, `LISTEN_PORT`, `SERVE_ROOT` and `MAX_UPLOAD_SIZE`.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    /// Overrides fields from `LISTEN_HOST`, `LISTEN_PORT`, `SERVE_ROOT` and
    /// `MAX_UPLOAD_SIZE` when they are set.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var("LISTEN_HOST") {
            self.server.host = Some(host);
        }
        if let Ok(port) = std::env::var("LISTEN_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::Env {
                var: "LISTEN_PORT",
                value: port,
            })?;
        }
        if let Ok(root) = std::env::var("SERVE_ROOT") {
            self.static_files.root = PathBuf::from(root);
        }
        if let Ok(max) = std::env::var("MAX_UPLOAD_SIZE") {
            self.server.max_upload_size = max.parse().map_err(|_| ConfigError::Env {
                var: "MAX_UPLOAD_SIZE",
                value: max,
            })?;
        }
        Ok(())
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            max_upload_size: self.server.max_upload_size,
        }
    }

    pub fn file_server(&self) -> FileServerConfig {
        FileServerConfig {
            root: self.static_files.root.clone(),
            listing: self.static_files.listing,
        }
    }
}
