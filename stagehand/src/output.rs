use std::fmt::Display;
use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};

use console::{colors_enabled, style};

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn brand_accent<D: Display>(value: D) -> console::StyledObject<D> {
    style(value).cyan()
}

pub fn brand_fg<D: Display>(value: D) -> console::StyledObject<D> {
    style(value)
}

pub fn brand_muted<D: Display>(value: D) -> console::StyledObject<D> {
    style(value).dim()
}

pub fn brand_success<D: Display>(value: D) -> console::StyledObject<D> {
    style(value).green()
}

pub fn brand_warning<D: Display>(value: D) -> console::StyledObject<D> {
    style(value).yellow()
}

pub fn brand_error<D: Display>(value: D) -> console::StyledObject<D> {
    style(value).red()
}

pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}

pub fn error_stderr(message: &str) {
    eprintln!("{} {}", brand_error("✗").bold(), brand_fg(message));
}

pub fn emphasized(value: &str) -> String {
    if std::io::stdout().is_terminal() && colors_enabled() {
        // Use italic on/off (3/23) instead of a full reset so surrounding styles
        // (like dim hints) stay active after emphasized text.
        format!("\x1b[3m{}\x1b[23m", value)
    } else {
        format!("'{}'", value)
    }
}

/// Banner summary: `Action: "deploy" - Stage: "dev" - App: "shop" - Instance: "api"`.
pub fn run_summary(command: &str, stage: &str, app: &str, instance: &str) -> String {
    format!(
        "Action: \"{}\" - Stage: \"{}\" - App: \"{}\" - Instance: \"{}\"",
        command, stage, app, instance
    )
}

/// Render a log entry payload: strings verbatim, anything else as compact JSON.
pub fn format_log_data(data: &serde_json::Value) -> String {
    match data {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render an outputs map as an indented tree, one line per entry.
pub fn format_outputs(outputs: &serde_json::Map<String, serde_json::Value>) -> Vec<String> {
    let mut lines = Vec::new();
    push_map(&mut lines, outputs, 0);
    lines
}

fn push_map(
    lines: &mut Vec<String>,
    map: &serde_json::Map<String, serde_json::Value>,
    depth: usize,
) {
    let pad = "  ".repeat(depth);
    for (key, value) in map {
        match value {
            serde_json::Value::Object(nested) if !nested.is_empty() => {
                lines.push(format!("{pad}{key}:"));
                push_map(lines, nested, depth + 1);
            }
            serde_json::Value::Array(items) if !items.is_empty() => {
                lines.push(format!("{pad}{key}:"));
                for item in items {
                    lines.push(format!("{pad}  - {}", format_log_data(item)));
                }
            }
            scalar => lines.push(format!("{pad}{key}: {}", format_log_data(scalar))),
        }
    }
}
