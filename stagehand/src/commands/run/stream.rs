//! Live log streaming for `--debug` runs.
//!
//! Runs as a detached task next to the primary operation. Nothing in here can
//! fail the run: a subscription that cannot be opened is reported as a
//! warning, and undecodable or irrelevant events are dropped.

use std::sync::Arc;

use stagehand_core::{Event, EventFilter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::platform::RemoteSession;
use crate::status::StatusSink;

/// Subscribe to the instance's events and forward its run logs to `sink`.
///
/// Returns the consumer task, or `None` when the subscription could not be
/// opened. Callers normally drop the handle; the task ends when the event
/// stream does or when the runtime shuts down.
pub async fn spawn_log_stream(
    session: Arc<dyn RemoteSession>,
    filter: EventFilter,
    sink: Arc<dyn StatusSink>,
) -> Option<JoinHandle<()>> {
    match session.subscribe(filter).await {
        Ok(events) => Some(tokio::spawn(forward_logs(events, sink))),
        Err(e) => {
            tracing::warn!("live log stream unavailable: {e}");
            sink.error(&format!("Live logs unavailable: {e}"), false);
            None
        }
    }
}

async fn forward_logs(mut events: mpsc::Receiver<Event>, sink: Arc<dyn StatusSink>) {
    while let Some(event) = events.recv().await {
        for data in log_payloads(&event) {
            sink.log_data(&data);
        }
    }
    tracing::debug!("live log stream closed");
}

/// Normalized log payloads carried by `event`, in order.
///
/// Empty for anything but a run-logs event with a `data.logs` array. Entries
/// without a `data` field are skipped.
pub fn log_payloads(event: &Event) -> Vec<serde_json::Value> {
    let Some(logs) = event.run_logs() else {
        return Vec::new();
    };
    logs.iter()
        .filter_map(|entry| entry.get("data"))
        .map(|data| match data {
            serde_json::Value::String(line) => {
                serde_json::Value::String(normalize_log_line(line).to_string())
            }
            other => other.clone(),
        })
        .collect()
}

/// Undo the quoting the platform adds around captured stderr: one leading
/// `'`, then one trailing `'`, then a trailing literal `\n`.
pub fn normalize_log_line(line: &str) -> &str {
    let line = line.strip_prefix('\'').unwrap_or(line);
    let line = line.strip_suffix('\'').unwrap_or(line);
    line.strip_suffix("\\n").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::run::testing::{Journal, MockSession, RecordingSink, SinkCall, run_logs};
    use serde_json::json;

    #[test]
    fn normalize_strips_quotes_and_escaped_newline() {
        assert_eq!(normalize_log_line("'abc\\n'"), "abc");
        assert_eq!(normalize_log_line("'abc'"), "abc");
        assert_eq!(normalize_log_line("abc\\n"), "abc");
        assert_eq!(normalize_log_line("abc"), "abc");
    }

    #[test]
    fn normalize_strips_at_most_one_of_each() {
        assert_eq!(normalize_log_line("''abc''"), "'abc'");
        assert_eq!(normalize_log_line("abc\\n\\n"), "abc\\n");
    }

    #[test]
    fn normalize_handles_strings_shorter_than_patterns() {
        assert_eq!(normalize_log_line("'"), "");
        assert_eq!(normalize_log_line("''"), "");
        assert_eq!(normalize_log_line(""), "");
        assert_eq!(normalize_log_line("\\"), "\\");
        assert_eq!(normalize_log_line("\\n"), "");
        assert_eq!(normalize_log_line("'\\n"), "");
    }

    #[test]
    fn normalize_keeps_real_newlines() {
        assert_eq!(normalize_log_line("abc\n"), "abc\n");
    }

    #[test]
    fn normalize_is_char_boundary_safe() {
        assert_eq!(normalize_log_line("'héllo wörld'"), "héllo wörld");
        assert_eq!(normalize_log_line("'✓\\n'"), "✓");
    }

    #[test]
    fn log_payloads_normalizes_strings_and_passes_other_values_through() {
        let event = run_logs(json!([
            {"data": "'abc\\n'"},
            {"data": {"level": "info", "msg": "'kept'"}},
            {"data": 7},
            {"type": "stdout"},
            {"data": "plain"}
        ]));
        assert_eq!(
            log_payloads(&event),
            vec![
                json!("abc"),
                json!({"level": "info", "msg": "'kept'"}),
                json!(7),
                json!("plain"),
            ]
        );
    }

    #[test]
    fn log_payloads_ignores_other_event_types() {
        let event = Event {
            event_type: "instance.deployment.started".to_string(),
            data: json!({"logs": [{"data": "hello"}]}),
        };
        assert!(log_payloads(&event).is_empty());
    }

    #[test]
    fn log_payloads_ignores_missing_or_malformed_logs() {
        let missing = Event {
            event_type: stagehand_core::RUN_LOGS_EVENT.to_string(),
            data: json!({"other": true}),
        };
        let malformed = run_logs(json!({"data": "not an array"}));
        assert!(log_payloads(&missing).is_empty());
        assert!(log_payloads(&malformed).is_empty());
    }

    fn filter() -> EventFilter {
        EventFilter {
            stage_name: "dev".to_string(),
            app_name: "shop".to_string(),
            instance_name: "api".to_string(),
        }
    }

    #[tokio::test]
    async fn stream_forwards_logs_in_arrival_order() {
        let journal = Journal::default();
        let session = MockSession::new(&journal);
        session.events.lock().unwrap().extend([
            run_logs(json!([{"data": "'first\\n'"}, {"data": "second"}])),
            Event {
                event_type: "instance.metrics".to_string(),
                data: json!({"logs": [{"data": "ignored"}]}),
            },
            run_logs(json!([{"data": {"n": 3}}])),
        ]);
        let sink = RecordingSink::new(&journal);

        let handle = spawn_log_stream(Arc::new(session), filter(), sink)
            .await
            .expect("stream task");
        handle.await.unwrap();

        let logged: Vec<_> = journal
            .sink_calls()
            .into_iter()
            .filter_map(|call| match call {
                SinkCall::LogData(data) => Some(data),
                _ => None,
            })
            .collect();
        assert_eq!(logged, vec![json!("first"), json!("second"), json!({"n": 3})]);
    }

    #[tokio::test]
    async fn stream_with_only_foreign_events_logs_nothing() {
        let journal = Journal::default();
        let session = MockSession::new(&journal);
        session.events.lock().unwrap().push(Event {
            event_type: "instance.deployment.succeeded".to_string(),
            data: json!({"logs": [{"data": "x"}]}),
        });
        let sink = RecordingSink::new(&journal);

        let handle = spawn_log_stream(Arc::new(session), filter(), sink)
            .await
            .expect("stream task");
        handle.await.unwrap();

        assert!(journal.sink_calls().is_empty());
    }

    #[tokio::test]
    async fn failed_subscription_is_a_warning_not_an_error() {
        let journal = Journal::default();
        let mut session = MockSession::new(&journal);
        session.fail_subscribe = true;
        let sink = RecordingSink::new(&journal);

        let handle = spawn_log_stream(Arc::new(session), filter(), sink).await;
        assert!(handle.is_none());

        let calls = journal.sink_calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], SinkCall::Error(message, false) if message.contains("Live logs unavailable")));
    }
}
