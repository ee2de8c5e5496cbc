//! Instance platform protocol types
//!
//! Requests sent to the platform HTTP API and events received over the live
//! event socket.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PROTOCOL_VERSION: u32 = 1;

/// Event type carrying captured instance logs.
pub const RUN_LOGS_EVENT: &str = "instance.run.logs";

/// Fully resolved instance target, as read from the instance config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceConfig {
    pub org: String,
    pub app: String,
    pub stage: String,
    pub name: String,

    /// Component (and optional version) backing the instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,

    /// Component inputs, forwarded verbatim.
    #[serde(default)]
    pub inputs: serde_json::Map<String, serde_json::Value>,
}

impl InstanceConfig {
    /// Filter selecting events produced by this instance.
    pub fn event_filter(&self) -> EventFilter {
        EventFilter {
            stage_name: self.stage.clone(),
            app_name: self.app.clone(),
            instance_name: self.name.clone(),
        }
    }
}

/// Flags passed through to the remote operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Stream live logs while the operation runs.
    pub debug: bool,
    /// Attach the development agent to the deployed code.
    pub dev: bool,
}

/// Provider credentials for an instance, grouped by provider
/// (for example `aws` -> `accessKeyId`, `secretAccessKey`).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceCredentials(BTreeMap<String, BTreeMap<String, String>>);

impl InstanceCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, provider: &str, key: &str, value: impl Into<String>) {
        self.0
            .entry(provider.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    pub fn provider(&self, provider: &str) -> Option<&BTreeMap<String, String>> {
        self.0.get(provider)
    }

    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Values are secrets; only provider names are printable.
impl std::fmt::Debug for InstanceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.providers()).finish()
    }
}

/// Body of `POST /instances/{deploy,remove,run}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRequest {
    /// Custom method name; only set for `/instances/run`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub instance: InstanceConfig,
    pub credentials: InstanceCredentials,
    pub options: RunOptions,
}

/// Successful deploy response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployResponse {
    #[serde(default)]
    pub outputs: serde_json::Map<String, serde_json::Value>,
}

/// Error body returned with a non-success HTTP status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Selects which instance's events the socket should deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    pub stage_name: String,
    pub app_name: String,
    pub instance_name: String,
}

/// Frames sent by the client over the event socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SocketFrame {
    Subscribe {
        protocol_version: u32,
        filter: EventFilter,
    },
}

/// Event received over the event socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "event")]
    pub event_type: String,

    #[serde(default)]
    pub data: serde_json::Value,
}

impl Event {
    /// Log entries of a run-logs event.
    ///
    /// `None` for other event types and for run-logs events whose `data.logs`
    /// is missing or not an array.
    pub fn run_logs(&self) -> Option<&[serde_json::Value]> {
        if self.event_type != RUN_LOGS_EVENT {
            return None;
        }
        self.data
            .get("logs")
            .and_then(|logs| logs.as_array())
            .map(Vec::as_slice)
    }
}
