use crate::errors::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Directory name under `~/.config`
pub const APP_NAME: &str = "unhcr-demographics";

pub const DEFAULT_API_URL: &str = "https://api.unhcr.org/population/v1/demographics/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SOCKET_URL: &str = "ws://127.0.0.1:8765";

/// Server configuration. Every field is optional so layers can be merged;
/// the accessors fall back to the built-in defaults.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub default_limit: Option<i64>,
    pub socket_url: Option<String>,
    pub user_agent: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_url: Some(DEFAULT_API_URL.to_string()),
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            default_limit: Some(crate::types::DEFAULT_LIMIT),
            socket_url: Some(DEFAULT_SOCKET_URL.to_string()),
            user_agent: Some(format!("{}-mcp/{}", APP_NAME, env!("CARGO_PKG_VERSION"))),
        }
    }
}

impl ServerConfig {
    /// An all-`None` layer, used as the base for overrides
    pub fn empty() -> Self {
        Self {
            api_url: None,
            timeout_secs: None,
            default_limit: None,
            socket_url: None,
            user_agent: None,
        }
    }

    /// Load the full configuration: defaults, then the config file (explicit
    /// path or the default location), then `.env` and the environment.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let file = match path {
            Some(p) => Self::load_from_file(p)?,
            None => match get_default_config_file() {
                Ok(p) => Self::load_from_file(&p)?,
                Err(e) => {
                    log::debug!("{}, skipping config file", e);
                    Self::empty()
                }
            },
        };
        let env = Self::from_env()?;
        Ok(Self::default().merge(&file).merge(&env))
    }

    /// Loads a config layer from a TOML file; a missing file yields an empty layer
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::empty());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Config layer from `.env` and the process environment
    pub fn from_env() -> ConfigResult<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Config layer from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            api_url: lookup("UNHCR_API_URL"),
            timeout_secs: parse_number(&lookup, "UNHCR_TIMEOUT_SECS")?,
            default_limit: parse_number(&lookup, "UNHCR_DEFAULT_LIMIT")?,
            socket_url: lookup("UNHCR_SOCKET_URL"),
            user_agent: None,
        })
    }

    /// Merges this config with another config, preferring values from the other config if present
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            api_url: other.api_url.clone().or_else(|| self.api_url.clone()),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            default_limit: other.default_limit.or(self.default_limit),
            socket_url: other.socket_url.clone().or_else(|| self.socket_url.clone()),
            user_agent: other.user_agent.clone().or_else(|| self.user_agent.clone()),
        }
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn default_limit(&self) -> i64 {
        self.default_limit.unwrap_or(crate::types::DEFAULT_LIMIT)
    }

    pub fn socket_url(&self) -> &str {
        self.socket_url.as_deref().unwrap_or(DEFAULT_SOCKET_URL)
    }

    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("{}-mcp/{}", APP_NAME, env!("CARGO_PKG_VERSION")))
    }
}

fn parse_number<F, N>(lookup: &F, key: &str) -> ConfigResult<Option<N>>
where
    F: Fn(&str) -> Option<String>,
    N: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
    }
}

/// Helper function to get default config directory
pub fn get_default_config_dir() -> ConfigResult<PathBuf> {
    let home_dir = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home_dir.join(".config").join(APP_NAME))
}

/// Helper function to get default config file path
pub fn get_default_config_file() -> ConfigResult<PathBuf> {
    Ok(get_default_config_dir()?.join("config.toml"))
}
