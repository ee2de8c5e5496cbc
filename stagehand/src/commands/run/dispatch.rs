use std::fmt;
use std::sync::Arc;

use stagehand_core::RunOptions;

use super::bootstrap::Target;
use super::error::RunError;
use super::stream;
use crate::platform::Platform;
use crate::status::{CloseKind, StatusSink, Tint};

const DEV_AGENT_NOTICE: &str = "\"--dev\" option detected. Dev Agent will be added to your code. \
                                Do not deploy this in your production stage.";

/// The remote operation a run performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunCommand {
    Deploy,
    Remove,
    /// Any other method, forwarded to the instance by name.
    Custom(String),
}

impl RunCommand {
    pub fn parse(name: &str) -> Self {
        match name {
            "deploy" => RunCommand::Deploy,
            "remove" => RunCommand::Remove,
            other => RunCommand::Custom(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            RunCommand::Deploy => "deploy",
            RunCommand::Remove => "remove",
            RunCommand::Custom(name) => name,
        }
    }
}

impl From<&str> for RunCommand {
    fn from(name: &str) -> Self {
        RunCommand::parse(name)
    }
}

impl fmt::Display for RunCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Perform exactly one remote operation for `target` and report it.
///
/// With `options.debug` the live log stream is started first and left
/// running; it never decides the outcome.
pub async fn dispatch(
    command: &RunCommand,
    target: &Target,
    options: RunOptions,
    platform: &dyn Platform,
    sink: &Arc<dyn StatusSink>,
) -> Result<(), RunError> {
    let instance = &target.instance;
    let session = platform.open_session(&instance.org, &target.access_key)?;

    if options.debug {
        let _stream =
            stream::spawn_log_stream(session.clone(), instance.event_filter(), sink.clone()).await;
    }

    match command {
        RunCommand::Deploy => {
            if options.dev {
                sink.log(None, Tint::Default);
                sink.log(Some(DEV_AGENT_NOTICE), Tint::Grey);
            }
            sink.status("Deploying", None, Tint::White);
            let response = session
                .deploy(instance, &target.credentials, options)
                .await?;
            tracing::debug!(outputs = response.outputs.len(), "deploy finished");
            sink.log(None, Tint::Default);
            sink.log_outputs(&response.outputs);
        }
        RunCommand::Remove => {
            sink.status("Removing", None, Tint::White);
            session
                .remove(instance, &target.credentials, options)
                .await?;
        }
        RunCommand::Custom(method) => {
            sink.status("Running", None, Tint::White);
            session
                .run(method, instance, &target.credentials, options)
                .await?;
        }
    }

    sink.close(CloseKind::Success, "Success");
    Ok(())
}
