//! Client configuration for the Hookflow CLI/TUI.
//!
//! Settings live in a small JSON file in the standard configuration directory
//! (`~/.config/hookflow/config.json` on most platforms). Environment
//! variables override the file, and the API token is resolved separately
//! from a command-line flag, the environment, or the OS keyring.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dirs_next::config_dir;
use hookflow_types::BearerToken;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::expand_tilde;

/// Environment variable allowing callers to override the config file path.
pub const CONFIG_PATH_ENV: &str = "HOOKFLOW_CONFIG_PATH";
/// Environment variable overriding the configured API base URL.
pub const API_BASE_ENV: &str = "HOOKFLOW_API_BASE";
/// Environment variable supplying the API token.
pub const API_TOKEN_ENV: &str = "HOOKFLOW_API_TOKEN";

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";

const KEYRING_SERVICE: &str = "hookflow";
const KEYRING_ACCOUNT: &str = "api-token";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("no API token found; pass --token, set {API_TOKEN_ENV}, or run `hookflow auth login`")]
    MissingToken,
    #[error("keyring error: {0}")]
    Keyring(String),
}

/// Persisted client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Chat backend API root, e.g. `https://chat.example.com/api/v1`.
    pub base_url: String,
    /// Permit plain HTTP for non-localhost hosts.
    pub allow_insecure: bool,
    /// Chat associated with invocations when none is given on the command line.
    pub chat_id: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            allow_insecure: false,
            chat_id: None,
        }
    }
}

impl ClientConfig {
    /// Load from the default path and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&default_config_path())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from `path`. A missing file yields defaults; an unparseable one
    /// is logged and ignored.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(config) => Ok(config),
                Err(error) => {
                    warn!(
                        path = %path.display(),
                        error = %error,
                        "Failed to parse config file; using defaults"
                    );
                    Ok(Self::default())
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(ConfigError::Io(error)),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(base_url) = non_empty_env(API_BASE_ENV) {
            debug!(%base_url, "using API base from environment");
            self.base_url = base_url;
        }
    }
}

/// Config file location: `HOOKFLOW_CONFIG_PATH` or the platform config dir.
pub fn default_config_path() -> PathBuf {
    if let Some(path) = non_empty_env(CONFIG_PATH_ENV) {
        return expand_tilde(&path);
    }
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hookflow")
        .join(CONFIG_FILE_NAME)
}

/// Resolve the API token: explicit flag, then `HOOKFLOW_API_TOKEN`, then the
/// OS keyring.
pub fn resolve_token(flag: Option<&str>) -> Result<BearerToken, ConfigError> {
    if let Some(token) = flag.map(BearerToken::new).filter(|token| !token.is_empty()) {
        return Ok(token);
    }
    if let Some(token) = non_empty_env(API_TOKEN_ENV) {
        return Ok(BearerToken::new(token));
    }
    match stored_token() {
        Ok(Some(token)) => Ok(BearerToken::new(token)),
        Ok(None) => Err(ConfigError::MissingToken),
        Err(error) => {
            warn!("keyring error: {}", error);
            Err(ConfigError::MissingToken)
        }
    }
}

/// Token saved by `hookflow auth login`, if any.
pub fn stored_token() -> Result<Option<String>, ConfigError> {
    match keyring_entry()?.get_password() {
        Ok(token) => Ok(Some(token)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(error) => Err(ConfigError::Keyring(error.to_string())),
    }
}

pub fn store_token(token: &BearerToken) -> Result<(), ConfigError> {
    keyring_entry()?
        .set_password(token.as_str())
        .map_err(|error| ConfigError::Keyring(error.to_string()))?;
    debug!("stored API token in keychain");
    Ok(())
}

/// Remove the stored token. Returns `false` when there was none.
pub fn delete_stored_token() -> Result<bool, ConfigError> {
    match keyring_entry()?.delete_credential() {
        Ok(()) => Ok(true),
        Err(keyring::Error::NoEntry) => Ok(false),
        Err(error) => Err(ConfigError::Keyring(error.to_string())),
    }
}

fn keyring_entry() -> Result<keyring::Entry, ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT).map_err(|error| ConfigError::Keyring(error.to_string()))
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{ "chat_id": "chat-1" }"#).unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config.chat_id.as_deref(), Some("chat-1"));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(!config.allow_insecure);
    }

    #[test]
    fn malformed_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(ClientConfig::load_from(&path).unwrap(), ClientConfig::default());
    }

    #[test]
    fn save_then_load_from_override_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let config = ClientConfig {
            base_url: "https://chat.example.com/api/v1".into(),
            allow_insecure: false,
            chat_id: None,
        };
        config.save_to(&path).unwrap();

        temp_env::with_vars(
            [(CONFIG_PATH_ENV, Some(path.to_str().unwrap())), (API_BASE_ENV, None)],
            || {
                assert_eq!(default_config_path(), path);
                assert_eq!(ClientConfig::load().unwrap(), config);
            },
        );
    }

    #[test]
    fn env_base_url_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        temp_env::with_vars(
            [
                (CONFIG_PATH_ENV, Some(path.to_str().unwrap())),
                (API_BASE_ENV, Some("https://override.example.com/api/v1")),
            ],
            || {
                let config = ClientConfig::load().unwrap();
                assert_eq!(config.base_url, "https://override.example.com/api/v1");
            },
        );
    }

    #[test]
    fn flag_token_wins_over_environment() {
        temp_env::with_var(API_TOKEN_ENV, Some("from-env"), || {
            assert_eq!(resolve_token(Some(" from-flag ")).unwrap().as_str(), "from-flag");
            assert_eq!(resolve_token(None).unwrap().as_str(), "from-env");
            assert_eq!(resolve_token(Some("  ")).unwrap().as_str(), "from-env");
        });
    }
}
