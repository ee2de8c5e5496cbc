//! `stagehand run <command>`: one orchestrated remote operation per
//! invocation.
//!
//! [`bootstrap`] resolves identity and the instance, [`dispatch`] performs the
//! remote call (with the live log stream alongside in debug mode) and
//! [`report`] turns the outcome into exactly one terminal result on the
//! status sink.

mod bootstrap;
mod dispatch;
mod error;
mod stream;

#[cfg(test)]
mod testing;

pub use dispatch::RunCommand;
pub use error::{RunError, RunFailed};

use std::path::PathBuf;
use std::sync::Arc;

use stagehand_core::RunOptions;

use crate::config::{self, FileIdentityStore, GlobalConfig, IdentityStore, env_access_key};
use crate::platform::{HttpPlatform, Platform};
use crate::status::{StatusSink, TerminalSink};

/// One parsed `run` invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: RunCommand,
    pub options: RunOptions,
    pub stage: Option<String>,
    pub working_dir: PathBuf,
}

pub fn run(
    command: &str,
    debug: bool,
    dev: bool,
    stage: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let invocation = Invocation {
        command: RunCommand::parse(command),
        options: RunOptions { debug, dev },
        stage: stage.map(str::to_string),
        working_dir: std::env::current_dir()?,
    };
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_async(invocation))?;
    Ok(())
}

async fn run_async(invocation: Invocation) -> Result<(), RunFailed> {
    let sink: Arc<dyn StatusSink> = Arc::new(TerminalSink::new(invocation.options.debug));
    let result = match wire_up(&invocation, sink.as_ref()) {
        Ok((identity, platform)) => execute(&invocation, &identity, &platform, &sink).await,
        Err(e) => {
            sink.start("Initializing", true);
            Err(e)
        }
    };
    report(result, sink.as_ref())
}

fn wire_up(
    invocation: &Invocation,
    sink: &dyn StatusSink,
) -> Result<(FileIdentityStore, HttpPlatform), RunError> {
    let global = usable_global_config(GlobalConfig::load(), env_access_key().is_some(), sink)?;
    let platform = HttpPlatform::new(global.endpoints())?;
    let identity = FileIdentityStore::new(global, &invocation.working_dir);
    Ok((identity, platform))
}

/// An unreadable global config holds no usable login. Without an access key
/// in the environment the caller goes to onboarding; with one the load error
/// is fatal.
fn usable_global_config(
    loaded: config::Result<GlobalConfig>,
    env_key: bool,
    sink: &dyn StatusSink,
) -> Result<GlobalConfig, RunError> {
    match loaded {
        Ok(global) => Ok(global),
        Err(e) if !env_key => {
            tracing::warn!("global config unreadable, treating caller as logged out: {e}");
            sink.error(&format!("Ignoring global config: {e}"), false);
            Err(RunError::NotAuthenticated)
        }
        Err(e) => Err(e.into()),
    }
}

/// Bootstrap then dispatch. Any error is returned unreported.
pub async fn execute(
    invocation: &Invocation,
    identity: &dyn IdentityStore,
    platform: &dyn Platform,
    sink: &Arc<dyn StatusSink>,
) -> Result<(), RunError> {
    let target = bootstrap::bootstrap(
        &invocation.command,
        &invocation.working_dir,
        invocation.stage.as_deref(),
        invocation.options,
        identity,
        sink.as_ref(),
    )?;
    dispatch::dispatch(
        &invocation.command,
        &target,
        invocation.options,
        platform,
        sink,
    )
    .await
}

/// Single terminal-result boundary for a run.
///
/// An anonymous caller is sent to onboarding and the run counts as handled.
/// Every other error is shown once through the sink's fatal path.
pub fn report(result: Result<(), RunError>, sink: &dyn StatusSink) -> Result<(), RunFailed> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if !e.is_fatal() => {
            tracing::info!("no login session, showing onboarding");
            sink.advertise();
            Ok(())
        }
        Err(e) => {
            tracing::debug!("run failed: {e:?}");
            sink.error(&e.to_string(), true);
            Err(RunFailed)
        }
    }
}
