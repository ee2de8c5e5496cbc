use thiserror::Error;

use crate::config::ConfigError;
use crate::platform::PlatformError;

/// Everything that can end a run before `Success`.
#[derive(Debug, Error)]
pub enum RunError {
    /// No stored identity; the caller is sent to onboarding instead of failing.
    #[error("Not logged in")]
    NotAuthenticated,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Run 'stagehand login' first to run your instance.")]
    MissingAccessKey,

    #[error(transparent)]
    Remote(#[from] PlatformError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl RunError {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RunError::NotAuthenticated)
    }
}

/// A run that failed after the failure was already shown to the user.
#[derive(Debug, Error)]
#[error("run failed")]
pub struct RunFailed;
