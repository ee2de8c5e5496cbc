//! Recording fakes for the run orchestrator's collaborators.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use stagehand_core::{
    DeployResponse, Event, EventFilter, InstanceConfig, InstanceCredentials, RunOptions,
};
use tokio::sync::mpsc;

use crate::config::{self, AccessKey, IdentityStore};
use crate::platform::{Platform, PlatformError, PlatformResult, RemoteSession};
use crate::status::{CloseKind, StatusSink, Tint};

#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Start(String, bool),
    Status(String, Option<String>, Tint),
    Log(Option<String>, Tint),
    LogData(serde_json::Value),
    LogOutputs(serde_json::Map<String, serde_json::Value>),
    Logo,
    Error(String, bool),
    Close(CloseKind, String),
    Advertise,
}

/// One observed interaction, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Sink(SinkCall),
    Remote(String),
}

#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Entry>>>);

impl Journal {
    fn push(&self, entry: Entry) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.0.lock().unwrap().clone()
    }

    pub fn sink_calls(&self) -> Vec<SinkCall> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Sink(call) => Some(call),
                Entry::Remote(_) => None,
            })
            .collect()
    }

    pub fn remote_calls(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Remote(call) => Some(call),
                Entry::Sink(_) => None,
            })
            .collect()
    }

    /// Position of the first entry matching `pred`.
    pub fn position(&self, pred: impl Fn(&Entry) -> bool) -> Option<usize> {
        self.entries().iter().position(pred)
    }
}

pub struct RecordingSink {
    journal: Journal,
}

impl RecordingSink {
    pub fn new(journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            journal: journal.clone(),
        })
    }

    fn record(&self, call: SinkCall) {
        self.journal.push(Entry::Sink(call));
    }
}

impl StatusSink for RecordingSink {
    fn start(&self, label: &str, timer: bool) {
        self.record(SinkCall::Start(label.to_string(), timer));
    }

    fn status(&self, label: &str, target: Option<&str>, tint: Tint) {
        self.record(SinkCall::Status(
            label.to_string(),
            target.map(str::to_string),
            tint,
        ));
    }

    fn log(&self, message: Option<&str>, tint: Tint) {
        self.record(SinkCall::Log(message.map(str::to_string), tint));
    }

    fn log_data(&self, data: &serde_json::Value) {
        self.record(SinkCall::LogData(data.clone()));
    }

    fn log_outputs(&self, outputs: &serde_json::Map<String, serde_json::Value>) {
        self.record(SinkCall::LogOutputs(outputs.clone()));
    }

    fn logo(&self) {
        self.record(SinkCall::Logo);
    }

    fn error(&self, message: &str, fatal: bool) {
        self.record(SinkCall::Error(message.to_string(), fatal));
    }

    fn close(&self, kind: CloseKind, message: &str) {
        self.record(SinkCall::Close(kind, message.to_string()));
    }

    fn advertise(&self) {
        self.record(SinkCall::Advertise);
    }
}

pub struct StubIdentity {
    pub logged_in: bool,
    pub token: Option<&'static str>,
    pub credential_loads: AtomicUsize,
}

impl StubIdentity {
    pub fn new(logged_in: bool, token: Option<&'static str>) -> Self {
        Self {
            logged_in,
            token,
            credential_loads: AtomicUsize::new(0),
        }
    }

    pub fn loads(&self) -> usize {
        self.credential_loads.load(Ordering::SeqCst)
    }
}

impl IdentityStore for StubIdentity {
    fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    fn token_id(&self, _org: &str) -> Option<AccessKey> {
        self.token.map(AccessKey::new)
    }

    fn load_instance_credentials(&self, _stage: &str) -> config::Result<InstanceCredentials> {
        self.credential_loads.fetch_add(1, Ordering::SeqCst);
        let mut credentials = InstanceCredentials::new();
        credentials.insert("aws", "accessKeyId", "AKIA-TEST");
        Ok(credentials)
    }
}

/// Scripted remote session.
pub struct MockSession {
    journal: Journal,
    pub events: Mutex<Vec<Event>>,
    pub outputs: serde_json::Map<String, serde_json::Value>,
    pub remove_payload: serde_json::Value,
    pub fail_with: Option<String>,
    pub fail_subscribe: bool,
    pub filters: Mutex<Vec<EventFilter>>,
    /// Pushed onto the live subscription while a remote call is in flight.
    pub during_call: Vec<Event>,
    live: Mutex<Option<mpsc::Sender<Event>>>,
}

impl MockSession {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            events: Mutex::new(Vec::new()),
            outputs: serde_json::Map::new(),
            remove_payload: serde_json::Value::Null,
            fail_with: None,
            fail_subscribe: false,
            filters: Mutex::new(Vec::new()),
            during_call: Vec::new(),
            live: Mutex::new(None),
        }
    }

    async fn call(&self, name: String) -> PlatformResult<()> {
        self.journal.push(Entry::Remote(name));
        let live = self.live.lock().unwrap().take();
        if let Some(tx) = live {
            for event in self.during_call.clone() {
                tx.send(event).await.unwrap();
            }
            drop(tx);
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        match &self.fail_with {
            Some(message) => Err(PlatformError::Remote {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteSession for MockSession {
    async fn subscribe(&self, filter: EventFilter) -> PlatformResult<mpsc::Receiver<Event>> {
        self.journal.push(Entry::Remote("subscribe".to_string()));
        self.filters.lock().unwrap().push(filter);
        if self.fail_subscribe {
            return Err(PlatformError::EventStream("connection refused".to_string()));
        }
        let events: Vec<Event> = self.events.lock().unwrap().drain(..).collect();
        let (tx, rx) = mpsc::channel((events.len() + self.during_call.len()).max(1));
        for event in events {
            tx.try_send(event).unwrap();
        }
        if !self.during_call.is_empty() {
            *self.live.lock().unwrap() = Some(tx);
        }
        Ok(rx)
    }

    async fn deploy(
        &self,
        _instance: &InstanceConfig,
        _credentials: &InstanceCredentials,
        options: RunOptions,
    ) -> PlatformResult<DeployResponse> {
        self.call(format!("deploy dev={}", options.dev)).await?;
        Ok(DeployResponse {
            outputs: self.outputs.clone(),
        })
    }

    async fn remove(
        &self,
        _instance: &InstanceConfig,
        _credentials: &InstanceCredentials,
        _options: RunOptions,
    ) -> PlatformResult<serde_json::Value> {
        self.call("remove".to_string()).await?;
        Ok(self.remove_payload.clone())
    }

    async fn run(
        &self,
        method: &str,
        _instance: &InstanceConfig,
        _credentials: &InstanceCredentials,
        _options: RunOptions,
    ) -> PlatformResult<serde_json::Value> {
        self.call(format!("run {method}")).await?;
        Ok(serde_json::Value::Null)
    }
}

pub struct MockPlatform {
    pub session: Arc<MockSession>,
    pub opened: Mutex<Vec<String>>,
}

impl MockPlatform {
    pub fn new(session: MockSession) -> Self {
        Self {
            session: Arc::new(session),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }
}

impl Platform for MockPlatform {
    fn open_session(
        &self,
        org: &str,
        _access_key: &AccessKey,
    ) -> PlatformResult<Arc<dyn RemoteSession>> {
        self.opened.lock().unwrap().push(org.to_string());
        Ok(self.session.clone())
    }
}

pub fn write_instance_config(dir: &Path) {
    std::fs::write(
        dir.join("stagehand.toml"),
        "org = \"acme\"\napp = \"shop\"\nstage = \"dev\"\nname = \"api\"\n",
    )
    .unwrap();
}

pub fn instance() -> InstanceConfig {
    InstanceConfig {
        org: "acme".to_string(),
        app: "shop".to_string(),
        stage: "dev".to_string(),
        name: "api".to_string(),
        ..Default::default()
    }
}

pub fn run_logs(logs: serde_json::Value) -> Event {
    Event {
        event_type: stagehand_core::RUN_LOGS_EVENT.to_string(),
        data: serde_json::json!({ "logs": logs }),
    }
}
