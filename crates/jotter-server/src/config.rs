//! Server configuration: optional TOML file, environment overrides, validation.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use jotter_core::{ServiceSettings, DEFAULT_MAX_TITLE_CHARS};
use serde::Deserialize;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://notesapp.db";
pub const DEFAULT_HTTP_BIND: &str = "127.0.0.1:3000";

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to read config file at {path:?}.")]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file at {path:?}.")]
    ParseConfig {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{message}")]
    Validation { message: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: Service,
    pub storage: Storage,
    pub notes: Notes,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Service {
    pub http_bind: String,
    pub log_level: String,
}

impl Default for Service {
    fn default() -> Self {
        Self {
            http_bind: DEFAULT_HTTP_BIND.to_string(),
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Storage {
    /// `sqlite://<path>`, `sqlite::memory:`, `files://<dir>` or `memory://`.
    pub database_url: String,
    pub connect_timeout_ms: u64,
    pub op_timeout_ms: u64,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            connect_timeout_ms: 5_000,
            op_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Notes {
    pub max_title_chars: usize,
}

impl Default for Notes {
    fn default() -> Self {
        Self {
            max_title_chars: DEFAULT_MAX_TITLE_CHARS,
        }
    }
}

impl Config {
    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            max_title_chars: self.notes.max_title_chars,
            connect_timeout: Duration::from_millis(self.storage.connect_timeout_ms),
            op_timeout: Duration::from_millis(self.storage.op_timeout_ms),
        }
    }
}

/// Load the config file if given, apply `JOTTER_*` environment overrides, and validate.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let mut cfg = match path {
        Some(path) => parse_file(path)?,
        None => Config::default(),
    };

    apply_overrides(&mut cfg, |key| env::var(key).ok());

    validate(&cfg)?;

    Ok(cfg)
}

fn parse_file(path: &Path) -> Result<Config> {
    let raw = fs::read_to_string(path)
        .map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

    toml::from_str(&raw).map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })
}

/// Override file values with environment variables, looked up through `lookup`.
pub fn apply_overrides(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("JOTTER_DATABASE_URL") {
        cfg.storage.database_url = url;
    }
    if let Some(bind) = lookup("JOTTER_HTTP_BIND") {
        cfg.service.http_bind = bind;
    }
    if let Some(level) = lookup("JOTTER_LOG_LEVEL") {
        cfg.service.log_level = level;
    }
}

pub fn validate(cfg: &Config) -> Result<()> {
    if cfg.service.http_bind.trim().is_empty() {
        return Err(Error::Validation {
            message: "service.http_bind must be non-empty.".to_string(),
        });
    }
    if cfg.service.http_bind.parse::<SocketAddr>().is_err() {
        return Err(Error::Validation {
            message: format!(
                "service.http_bind must be a socket address, got {:?}.",
                cfg.service.http_bind
            ),
        });
    }
    if cfg.storage.database_url.trim().is_empty() {
        return Err(Error::Validation {
            message: "storage.database_url must be non-empty.".to_string(),
        });
    }
    if cfg.storage.connect_timeout_ms == 0 {
        return Err(Error::Validation {
            message: "storage.connect_timeout_ms must be greater than zero.".to_string(),
        });
    }
    if cfg.storage.op_timeout_ms == 0 {
        return Err(Error::Validation {
            message: "storage.op_timeout_ms must be greater than zero.".to_string(),
        });
    }
    if cfg.notes.max_title_chars == 0 {
        return Err(Error::Validation {
            message: "notes.max_title_chars must be greater than zero.".to_string(),
        });
    }

    Ok(())
}
