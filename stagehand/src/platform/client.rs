use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stagehand_core::{
    DeployResponse, ErrorResponse, Event, EventFilter, InstanceConfig, InstanceCredentials,
    InstanceRequest, RunOptions,
};
use tokio::sync::mpsc;
use url::Url;

use super::error::{PlatformError, PlatformResult};
use super::{Platform, RemoteSession, events};
use crate::config::{AccessKey, PlatformEndpoints};

/// Header carrying the org a session is scoped to.
pub const ORG_HEADER: &str = "x-stagehand-org";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Platform reached over HTTP (operations) and WebSocket (events).
#[derive(Debug, Clone)]
pub struct HttpPlatform {
    endpoints: PlatformEndpoints,
    http: reqwest::Client,
}

impl HttpPlatform {
    pub fn new(endpoints: PlatformEndpoints) -> PlatformResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("stagehand/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { endpoints, http })
    }
}

impl Platform for HttpPlatform {
    fn open_session(
        &self,
        org: &str,
        access_key: &AccessKey,
    ) -> PlatformResult<Arc<dyn RemoteSession>> {
        let api_url = parse_url(&self.endpoints.api_url, &["http", "https"])?;
        let events_url = parse_url(&self.endpoints.events_url, &["ws", "wss"])?;
        tracing::debug!(org, api = %api_url, events = %events_url, "opening platform session");
        Ok(Arc::new(PlatformSession {
            http: self.http.clone(),
            api_url,
            events_url,
            org: org.to_string(),
            access_key: access_key.clone(),
        }))
    }
}

fn parse_url(raw: &str, schemes: &[&str]) -> PlatformResult<Url> {
    let url = Url::parse(raw).map_err(|e| PlatformError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !schemes.contains(&url.scheme()) {
        return Err(PlatformError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("expected one of {}", schemes.join(", ")),
        });
    }
    Ok(url)
}

/// Org-scoped session against the platform.
#[derive(Debug)]
pub struct PlatformSession {
    http: reqwest::Client,
    api_url: Url,
    events_url: Url,
    org: String,
    access_key: AccessKey,
}

impl PlatformSession {
    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/instances/{}",
            self.api_url.as_str().trim_end_matches('/'),
            action
        )
    }

    async fn post_instance(
        &self,
        action: &str,
        request: &InstanceRequest,
    ) -> PlatformResult<serde_json::Value> {
        let url = self.endpoint(action);
        tracing::debug!(
            %url,
            org = %self.org,
            instance = %request.instance.name,
            stage = %request.instance.stage,
            "platform request"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.access_key.expose())
            .header(ORG_HEADER, &self.org)
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        tracing::debug!(%url, status = status.as_u16(), "platform response");

        if !status.is_success() {
            return Err(remote_error(status.as_u16(), &body));
        }
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_slice(&body).map_err(|e| PlatformError::InvalidResponse(e.to_string()))
    }
}

fn remote_error(status: u16, body: &[u8]) -> PlatformError {
    let message = match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(error) => error.message,
        Err(_) => {
            let text = String::from_utf8_lossy(body).trim().to_string();
            if text.is_empty() {
                format!("Platform request failed with status {}", status)
            } else {
                text
            }
        }
    };
    PlatformError::Remote { status, message }
}

fn instance_request(
    method: Option<&str>,
    instance: &InstanceConfig,
    credentials: &InstanceCredentials,
    options: RunOptions,
) -> InstanceRequest {
    InstanceRequest {
        method: method.map(str::to_string),
        instance: instance.clone(),
        credentials: credentials.clone(),
        options,
    }
}

#[async_trait]
impl RemoteSession for PlatformSession {
    async fn subscribe(&self, filter: EventFilter) -> PlatformResult<mpsc::Receiver<Event>> {
        events::subscribe(&self.events_url, &self.org, &self.access_key, filter).await
    }

    async fn deploy(
        &self,
        instance: &InstanceConfig,
        credentials: &InstanceCredentials,
        options: RunOptions,
    ) -> PlatformResult<DeployResponse> {
        let request = instance_request(None, instance, credentials, options);
        let body = self.post_instance("deploy", &request).await?;
        if body.is_null() {
            return Ok(DeployResponse::default());
        }
        serde_json::from_value(body).map_err(|e| PlatformError::InvalidResponse(e.to_string()))
    }

    async fn remove(
        &self,
        instance: &InstanceConfig,
        credentials: &InstanceCredentials,
        options: RunOptions,
    ) -> PlatformResult<serde_json::Value> {
        let request = instance_request(None, instance, credentials, options);
        self.post_instance("remove", &request).await
    }

    async fn run(
        &self,
        method: &str,
        instance: &InstanceConfig,
        credentials: &InstanceCredentials,
        options: RunOptions,
    ) -> PlatformResult<serde_json::Value> {
        let request = instance_request(Some(method), instance, credentials, options);
        self.post_instance("run", &request).await
    }
}
