//! Status reporting capability.
//!
//! The run orchestrator never writes to the terminal itself; everything goes
//! through a [`StatusSink`]. [`TerminalSink`] renders a persistent status line
//! on interactive terminals and plain lines everywhere else.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

use crate::output;

/// Colour hint for status and log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tint {
    #[default]
    Default,
    Grey,
    White,
}

/// How a run finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseKind {
    Success,
    Error,
}

pub trait StatusSink: Send + Sync {
    /// Begin the persistent status line, optionally timing the run.
    fn start(&self, label: &str, timer: bool);

    /// Update the status line.
    fn status(&self, label: &str, target: Option<&str>, tint: Tint);

    /// Print a line above the status line; `None` prints a blank line.
    fn log(&self, message: Option<&str>, tint: Tint);

    /// Print one streamed log entry payload.
    fn log_data(&self, data: &serde_json::Value);

    /// Present the outputs returned by a deploy.
    fn log_outputs(&self, outputs: &serde_json::Map<String, serde_json::Value>);

    fn logo(&self);

    fn error(&self, message: &str, fatal: bool);

    /// Stop the status line with a final message.
    fn close(&self, kind: CloseKind, message: &str);

    /// Show the onboarding path for callers who are not logged in.
    fn advertise(&self);
}

const LOGO: &str = r"
     _                    _                     _
 ___| |_ __ _  __ _  ___ | |__   __ _ _ __   __| |
/ __| __/ _` |/ _` |/ _ \| '_ \ / _` | '_ \ / _` |
\__ \ || (_| | (_| |  __/| | | | (_| | | | | (_| |
|___/\__\__,_|\__, |\___||_| |_|\__,_|_| |_|\__,_|
              |___/
";

const DOCS_URL: &str = "https://stagehand.dev/docs/getting-started";

fn advertisement() -> [String; 3] {
    [
        "You are not logged in to the instance platform.".to_string(),
        format!(
            "Run {} or set STAGEHAND_ACCESS_KEY, then run this command again.",
            output::emphasized("stagehand login")
        ),
        format!("Docs: {}", output::brand_accent(DOCS_URL)),
    ]
}

#[derive(Default)]
struct SinkState {
    bar: Option<ProgressBar>,
    started: Option<Instant>,
}

/// Terminal renderer for [`StatusSink`].
///
/// Every write happens under one lock, so lines from the orchestrator and the
/// log streamer never interleave mid-line.
pub struct TerminalSink {
    live: bool,
    state: Mutex<SinkState>,
}

impl TerminalSink {
    /// Plain line output in debug or verbose mode and off a terminal.
    pub fn new(debug: bool) -> Self {
        Self {
            live: !debug && !output::is_verbose() && output::is_interactive(),
            state: Mutex::new(SinkState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn println(state: &SinkState, line: &str) {
        match &state.bar {
            Some(bar) => bar.println(line),
            None => println!("{line}"),
        }
    }

    fn clear_bar(state: &mut SinkState) {
        if let Some(bar) = state.bar.take() {
            bar.finish_and_clear();
        }
    }

    fn spinner(timer: bool) -> ProgressBar {
        let template = if timer {
            "{spinner:.cyan} {msg} {elapsed:.dim}"
        } else {
            "{spinner:.cyan} {msg}"
        };
        let style = ProgressStyle::with_template(template)
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let bar = ProgressBar::new_spinner().with_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    }
}

fn tinted(message: &str, tint: Tint) -> String {
    match tint {
        Tint::Default => message.to_string(),
        Tint::Grey => output::brand_muted(message).to_string(),
        Tint::White => output::brand_fg(message).white().to_string(),
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

fn status_message(label: &str, target: Option<&str>) -> String {
    match target {
        Some(target) => format!("{} {}", label, output::brand_muted(format!("› {target}"))),
        None => label.to_string(),
    }
}

impl StatusSink for TerminalSink {
    fn start(&self, label: &str, timer: bool) {
        let mut state = self.lock();
        if timer {
            state.started = Some(Instant::now());
        }
        if self.live {
            let bar = Self::spinner(timer);
            bar.set_message(label.to_string());
            state.bar = Some(bar);
        }
    }

    fn status(&self, label: &str, target: Option<&str>, tint: Tint) {
        let state = self.lock();
        let message = tinted(&status_message(label, target), tint);
        match &state.bar {
            Some(bar) => bar.set_message(message),
            None => Self::println(
                &state,
                &format!("{} {}", output::brand_accent("•").bold(), message),
            ),
        }
    }

    fn log(&self, message: Option<&str>, tint: Tint) {
        let state = self.lock();
        Self::println(&state, &tinted(message.unwrap_or_default(), tint));
    }

    fn log_data(&self, data: &serde_json::Value) {
        let state = self.lock();
        Self::println(&state, &output::format_log_data(data));
    }

    fn log_outputs(&self, outputs: &serde_json::Map<String, serde_json::Value>) {
        let state = self.lock();
        for line in output::format_outputs(outputs) {
            Self::println(&state, &line);
        }
    }

    fn logo(&self) {
        let state = self.lock();
        Self::println(&state, &output::brand_accent(LOGO).to_string());
    }

    fn error(&self, message: &str, fatal: bool) {
        if fatal {
            self.close(CloseKind::Error, message);
            return;
        }
        let state = self.lock();
        Self::println(
            &state,
            &format!("{} {}", output::brand_warning("!").bold(), message),
        );
    }

    fn close(&self, kind: CloseKind, message: &str) {
        let mut state = self.lock();
        Self::clear_bar(&mut state);
        let elapsed = state
            .started
            .map(|started| {
                format!(" {}", output::brand_muted(format_elapsed(started.elapsed())))
            })
            .unwrap_or_default();
        match kind {
            CloseKind::Success => println!(
                "{} {}{}",
                output::brand_success("✓").bold(),
                message,
                elapsed
            ),
            CloseKind::Error => eprintln!(
                "{} {}{}",
                output::brand_error("✗").bold(),
                message,
                elapsed
            ),
        }
    }

    fn advertise(&self) {
        let mut state = self.lock();
        Self::clear_bar(&mut state);
        for line in advertisement() {
            println!("{line}");
        }
    }
}
