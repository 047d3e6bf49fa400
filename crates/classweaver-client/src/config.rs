//! Client configuration.
//!
//! The only required setting is the backend base URL. Resolution order:
//! the `CLASSWEAVER_API_BASE` environment variable, then an optional
//! `config.toml` next to the user's other ClassWeaver configuration, then
//! the local development default. Resolution never fails; an unreadable
//! config file falls through to the default.

use serde::Deserialize;
use std::path::Path;

/// Backend origin used when nothing else is configured.
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

const API_BASE_ENV: &str = "CLASSWEAVER_API_BASE";

/// Shape of the optional on-disk configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    api_base: Option<String>,
}

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin, without a trailing slash.
    pub api_base: String,
}

impl ClientConfig {
    /// Builds a configuration with an explicit base URL.
    pub fn with_base(api_base: impl Into<String>) -> Self {
        Self {
            api_base: normalize_base(api_base.into()),
        }
    }

    /// Resolves the configuration from the environment, the config file,
    /// then the default.
    pub fn resolve() -> Self {
        let env_value = std::env::var(API_BASE_ENV).ok();
        let file_value = config_file_path().and_then(|path| load_file(&path));
        Self::from_sources(env_value, file_value)
    }

    fn from_sources(env_value: Option<String>, file_value: Option<String>) -> Self {
        let api_base = env_value
            .or(file_value)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self::with_base(api_base)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_base(DEFAULT_API_BASE)
    }
}

fn normalize_base(mut base: String) -> String {
    while base.ends_with('/') {
        base.pop();
    }
    base
}

fn config_file_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|dir| dir.join("classweaver").join("config.toml"))
}

fn load_file(path: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(path).ok()?;
    let parsed: FileConfig = toml::from_str(&raw).ok()?;
    parsed.api_base
}
