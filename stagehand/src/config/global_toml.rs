use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{ConfigError, Result};

pub const DEFAULT_API_URL: &str = "https://platform.stagehand.dev/api";
pub const DEFAULT_EVENTS_URL: &str = "wss://platform.stagehand.dev/events";

/// Global config from ~/.stagehand/config.toml.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GlobalConfig {
    /// [login] section - written by the login flow
    #[serde(default)]
    pub login: Option<LoginSection>,

    /// Access key used when no per-org key exists
    #[serde(default)]
    pub default_access_key: Option<String>,

    /// [access_keys] section - access key per org name
    #[serde(default)]
    pub access_keys: HashMap<String, String>,

    /// [platform] section - endpoint overrides
    #[serde(default)]
    pub platform: PlatformSection,
}

/// Stored identity of the logged-in user.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoginSection {
    pub user: Option<String>,
    pub id_token: Option<String>,
}

impl std::fmt::Debug for LoginSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginSection")
            .field("user", &self.user)
            .field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlatformSection {
    pub api_url: Option<String>,
    pub events_url: Option<String>,
}

/// Resolved platform endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformEndpoints {
    pub api_url: String,
    pub events_url: String,
}

impl GlobalConfig {
    /// Get the default path for global config (~/.stagehand/config.toml).
    pub fn default_path() -> Result<PathBuf> {
        let home = crate::paths::stagehand_home_dir().map_err(ConfigError::Home)?;
        Ok(home.join("config.toml"))
    }

    /// Load global config from the default location; a missing file is empty config.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_path()?;
        Self::load_from_path(&config_path)
    }

    fn load_from_path(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            return Self::load_from_file(config_path);
        }

        Ok(Self::default())
    }

    /// Load global config from a specific file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(path.as_ref().to_path_buf(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(toml::from_str(content)?)
    }

    /// Whether a login session has been stored.
    pub fn has_login(&self) -> bool {
        self.login
            .as_ref()
            .and_then(|login| login.id_token.as_deref())
            .is_some_and(|token| !token.trim().is_empty())
    }

    /// Access key for `org`, falling back to the default key.
    pub fn access_key_for(&self, org: Option<&str>) -> Option<&str> {
        let usable = |key: &&String| !key.trim().is_empty();
        org.and_then(|org| self.access_keys.get(org).filter(usable))
            .or(self.default_access_key.as_ref().filter(usable))
            .map(String::as_str)
    }

    /// Endpoints with `STAGEHAND_API_URL` / `STAGEHAND_EVENTS_URL` applied on top.
    pub fn endpoints(&self) -> PlatformEndpoints {
        self.endpoints_with_env(|name| std::env::var(name).ok())
    }

    fn endpoints_with_env(&self, env: impl Fn(&str) -> Option<String>) -> PlatformEndpoints {
        let pick = |var: &str, configured: &Option<String>, default: &str| {
            env(var)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| configured.clone())
                .unwrap_or_else(|| default.to_string())
        };
        PlatformEndpoints {
            api_url: pick("STAGEHAND_API_URL", &self.platform.api_url, DEFAULT_API_URL),
            events_url: pick(
                "STAGEHAND_EVENTS_URL",
                &self.platform.events_url,
                DEFAULT_EVENTS_URL,
            ),
        }
    }
}
