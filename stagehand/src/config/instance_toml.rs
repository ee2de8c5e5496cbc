use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use stagehand_core::InstanceConfig;

use super::error::{ConfigError, Result};

/// Stage used when neither the file nor the command line names one.
pub const DEFAULT_STAGE: &str = "dev";

/// Instance configuration from stagehand.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InstanceToml {
    /// Organization owning the instance (required)
    pub org: Option<String>,

    /// Application the instance belongs to (defaults to the instance name)
    pub app: Option<String>,

    /// Stage to target (defaults to "dev")
    pub stage: Option<String>,

    /// Instance name (required)
    pub name: Option<String>,

    /// Component backing the instance, e.g. "express@1.2.0"
    pub component: Option<String>,

    /// [inputs] section - forwarded to the platform unchanged
    #[serde(default)]
    pub inputs: serde_json::Map<String, serde_json::Value>,
}

impl InstanceToml {
    /// Load stagehand.toml from a directory
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let path = crate::paths::instance_config_path(dir.as_ref());
        if !path.exists() {
            return Err(ConfigError::MissingInstanceConfig(path));
        }

        Self::load_from_file(&path)
    }

    /// Load stagehand.toml from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(path.as_ref().to_path_buf(), e))?;
        Self::parse(&content)
    }

    /// Parse stagehand.toml content
    pub fn parse(content: &str) -> Result<Self> {
        let config: InstanceToml = toml::from_str(content)?;
        Ok(config)
    }

    /// Resolve defaults and validate into the record sent to the platform.
    ///
    /// `stage_override` (from `--stage`) replaces the file's stage.
    pub fn resolve(self, stage_override: Option<&str>) -> Result<InstanceConfig> {
        let name = required(self.name, "name")?;
        let org = required(self.org, "org")?;
        let app = match self.app {
            Some(app) => app,
            None => name.clone(),
        };
        let stage = stage_override
            .map(str::to_string)
            .or(self.stage)
            .unwrap_or_else(|| DEFAULT_STAGE.to_string());

        validate_identifier("org", &org)?;
        validate_identifier("app", &app)?;
        validate_identifier("stage", &stage)?;
        validate_identifier("name", &name)?;

        Ok(InstanceConfig {
            org,
            app,
            stage,
            name,
            component: self.component,
            inputs: self.inputs,
        })
    }
}

/// Load and resolve the instance config found in `dir`.
pub fn load_instance_config(dir: &Path, stage_override: Option<&str>) -> Result<InstanceConfig> {
    InstanceToml::load_from_dir(dir)?.resolve(stage_override)
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value.ok_or_else(|| {
        ConfigError::Validation(format!(
            "'{}' is required in {}",
            field,
            crate::paths::INSTANCE_CONFIG_FILE
        ))
    })
}

fn validate_identifier(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("'{}' cannot be empty", field)));
    }
    if let Some(c) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(ConfigError::Validation(format!(
            "'{}' contains invalid character '{}': {}",
            field, c, value
        )));
    }
    Ok(())
}
