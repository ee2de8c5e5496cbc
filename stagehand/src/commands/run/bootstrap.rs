use std::path::Path;

use stagehand_core::{InstanceConfig, InstanceCredentials, RunOptions};

use super::dispatch::RunCommand;
use super::error::RunError;
use crate::config::{AccessKey, IdentityStore, load_instance_config};
use crate::output;
use crate::status::{StatusSink, Tint};

/// Everything a dispatch needs: the instance, who is calling and with which
/// provider credentials.
#[derive(Debug)]
pub struct Target {
    pub instance: InstanceConfig,
    pub access_key: AccessKey,
    pub credentials: InstanceCredentials,
}

/// Resolve identity and instance config for a run.
///
/// Identity is checked before anything is read from disk, so an anonymous
/// caller never loads credentials. The banner is shown once the instance is
/// known and before any network call.
pub fn bootstrap(
    command: &RunCommand,
    working_dir: &Path,
    stage: Option<&str>,
    options: RunOptions,
    identity: &dyn IdentityStore,
    sink: &dyn StatusSink,
) -> Result<Target, RunError> {
    sink.start("Initializing", true);

    if !identity.is_logged_in() {
        return Err(RunError::NotAuthenticated);
    }

    let instance = load_instance_config(working_dir, stage)?;
    tracing::debug!(
        org = %instance.org,
        app = %instance.app,
        stage = %instance.stage,
        instance = %instance.name,
        "loaded instance config"
    );

    let summary = output::run_summary(
        command.name(),
        &instance.stage,
        &instance.app,
        &instance.name,
    );
    if options.debug {
        sink.log(Some(&summary), Tint::Default);
    } else {
        sink.logo();
        sink.log(Some(&summary), Tint::Grey);
    }
    sink.status("Initializing", Some(&instance.name), Tint::Default);

    let access_key = identity
        .token_id(&instance.org)
        .ok_or(RunError::MissingAccessKey)?;
    let credentials = identity.load_instance_credentials(&instance.stage)?;

    Ok(Target {
        instance,
        access_key,
        credentials,
    })
}
