//! Live event subscription over the platform's event socket.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use stagehand_core::{Event, EventFilter, PROTOCOL_VERSION, SocketFrame};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use super::client::ORG_HEADER;
use super::error::{PlatformError, PlatformResult};
use crate::config::AccessKey;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const EVENT_BUFFER: usize = 256;

type EventSocket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Connect, send the subscribe frame and start pumping events onto a channel.
pub(super) async fn subscribe(
    events_url: &Url,
    org: &str,
    access_key: &AccessKey,
    filter: EventFilter,
) -> PlatformResult<mpsc::Receiver<Event>> {
    let mut request = events_url.as_str().into_client_request()?;
    let headers = request.headers_mut();
    headers.insert(
        "authorization",
        header_value(&format!("Bearer {}", access_key.expose()))?,
    );
    headers.insert(ORG_HEADER, header_value(org)?);

    let (mut socket, _) = tokio::time::timeout(CONNECT_TIMEOUT, connect_async(request))
        .await
        .map_err(|_| PlatformError::EventStream("timed out connecting to event socket".into()))??;

    let frame = SocketFrame::Subscribe {
        protocol_version: PROTOCOL_VERSION,
        filter,
    };
    let frame =
        serde_json::to_string(&frame).map_err(|e| PlatformError::EventStream(e.to_string()))?;
    socket.send(Message::Text(frame.into())).await?;
    tracing::debug!(url = %events_url, "event subscription established");

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    tokio::spawn(pump_events(socket, tx));
    Ok(rx)
}

fn header_value(value: &str) -> PlatformResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| PlatformError::EventStream(format!("invalid header value: {e}")))
}

/// Forward decoded events until the socket closes or the receiver goes away.
async fn pump_events(mut socket: EventSocket, tx: mpsc::Sender<Event>) {
    while let Some(message) = socket.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let Some(event) = decode_event(text.as_str()) else {
                    continue;
                };
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("event socket error: {e}");
                break;
            }
        }
    }
    tracing::debug!("event subscription ended");
    let _ = socket.close(None).await;
}

/// Frames that are not a JSON event are dropped.
fn decode_event(text: &str) -> Option<Event> {
    match serde_json::from_str(text) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::trace!("discarding undecodable event frame: {e}");
            None
        }
    }
}
