use std::collections::HashMap;
use std::path::{Path, PathBuf};

use stagehand_core::InstanceCredentials;

use super::error::{ConfigError, Result};
use super::global_toml::GlobalConfig;

/// Environment variable that supplies an access key without a stored login.
pub const ACCESS_KEY_ENV: &str = "STAGEHAND_ACCESS_KEY";

/// Provider credential variables: (env var, provider, field).
const PROVIDER_ENV_KEYS: &[(&str, &str, &str)] = &[
    ("AWS_ACCESS_KEY_ID", "aws", "accessKeyId"),
    ("AWS_SECRET_ACCESS_KEY", "aws", "secretAccessKey"),
    ("AWS_SESSION_TOKEN", "aws", "sessionToken"),
    ("AWS_REGION", "aws", "region"),
];

/// Platform access key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessKey(String);

impl AccessKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessKey(<redacted>)")
    }
}

/// Access key from `STAGEHAND_ACCESS_KEY`, if set and non-blank.
pub fn env_access_key() -> Option<String> {
    std::env::var(ACCESS_KEY_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Where the caller's identity and instance credentials come from.
pub trait IdentityStore: Send + Sync {
    /// Whether any login session (stored or from the environment) exists.
    fn is_logged_in(&self) -> bool;

    /// Access key to use for `org`, if one can be resolved.
    fn token_id(&self, org: &str) -> Option<AccessKey>;

    /// Provider credentials for `stage`.
    fn load_instance_credentials(&self, stage: &str) -> Result<InstanceCredentials>;
}

/// Identity backed by the global config, the process environment and the
/// working directory's dotenv files.
#[derive(Debug)]
pub struct FileIdentityStore {
    global: GlobalConfig,
    env_access_key: Option<String>,
    working_dir: PathBuf,
}

impl FileIdentityStore {
    pub fn new(global: GlobalConfig, working_dir: &Path) -> Self {
        Self {
            global,
            env_access_key: env_access_key(),
            working_dir: working_dir.to_path_buf(),
        }
    }

    #[cfg(test)]
    fn with_env_access_key(mut self, key: Option<&str>) -> Self {
        self.env_access_key = key.map(str::to_string);
        self
    }
}

impl IdentityStore for FileIdentityStore {
    fn is_logged_in(&self) -> bool {
        self.env_access_key.is_some() || self.global.has_login()
    }

    fn token_id(&self, org: &str) -> Option<AccessKey> {
        if let Some(key) = &self.env_access_key {
            return Some(AccessKey::new(key.clone()));
        }
        self.global.access_key_for(Some(org)).map(AccessKey::new)
    }

    fn load_instance_credentials(&self, stage: &str) -> Result<InstanceCredentials> {
        load_instance_credentials_with_env(&self.working_dir, stage, |name| {
            std::env::var(name).ok()
        })
    }
}

/// Collect provider credentials from `.env.<stage>` (or `.env`), with the
/// process environment taking precedence.
pub fn load_instance_credentials_with_env(
    dir: &Path,
    stage: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<InstanceCredentials> {
    let mut vars = HashMap::new();
    if let Some(path) = crate::paths::stage_env_files(dir, stage)
        .into_iter()
        .find(|p| p.is_file())
    {
        vars = read_env_file(&path)?;
        tracing::debug!(path = %path.display(), "loaded stage env file");
    }

    let mut credentials = InstanceCredentials::new();
    for &(var, provider, field) in PROVIDER_ENV_KEYS {
        let value = env(var)
            .filter(|v| !v.is_empty())
            .or_else(|| vars.get(var).cloned());
        if let Some(value) = value {
            credentials.insert(provider, field, value);
        }
    }
    Ok(credentials)
}

/// Read a dotenv file. Unquoted values lose inline ` #` comments; quoted
/// values are kept as written.
fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let env_file_error = |e: dotenvy::Error| ConfigError::EnvFile(path.to_path_buf(), e);
    dotenvy::from_path_iter(path)
        .map_err(env_file_error)?
        .collect::<std::result::Result<HashMap<_, _>, _>>()
        .map_err(env_file_error)
}
