//! Instance platform client
//!
//! A [`Platform`] opens an org-scoped [`RemoteSession`]. The session performs
//! the remote deploy/remove/run calls and opens the live event subscription.

mod client;
mod error;
mod events;

pub use client::*;
pub use error::*;

use std::sync::Arc;

use async_trait::async_trait;
use stagehand_core::{
    DeployResponse, Event, EventFilter, InstanceConfig, InstanceCredentials, RunOptions,
};
use tokio::sync::mpsc;

use crate::config::AccessKey;

/// Opens sessions against the platform.
pub trait Platform: Send + Sync {
    fn open_session(
        &self,
        org: &str,
        access_key: &AccessKey,
    ) -> PlatformResult<Arc<dyn RemoteSession>>;
}

/// One org-scoped connection to the platform.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Subscribe to instance events matching `filter`.
    ///
    /// Returns once the subscription is established; events are then pushed
    /// onto the returned channel until the stream ends.
    async fn subscribe(&self, filter: EventFilter) -> PlatformResult<mpsc::Receiver<Event>>;

    async fn deploy(
        &self,
        instance: &InstanceConfig,
        credentials: &InstanceCredentials,
        options: RunOptions,
    ) -> PlatformResult<DeployResponse>;

    /// Remove the instance. Returns the raw response body, if any.
    async fn remove(
        &self,
        instance: &InstanceConfig,
        credentials: &InstanceCredentials,
        options: RunOptions,
    ) -> PlatformResult<serde_json::Value>;

    /// Run a custom method on the instance. Returns the raw response body, if any.
    async fn run(
        &self,
        method: &str,
        instance: &InstanceConfig,
        credentials: &InstanceCredentials,
        options: RunOptions,
    ) -> PlatformResult<serde_json::Value>;
}
