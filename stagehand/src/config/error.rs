use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file {0}: {1}")]
    FileRead(PathBuf, std::io::Error),

    #[error("Missing {0}. Run this command from an instance directory.")]
    MissingInstanceConfig(PathBuf),

    #[error("Failed to parse {0}: {1}")]
    EnvFile(PathBuf, dotenvy::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Could not determine stagehand home directory: {0}")]
    Home(std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
