//! Terminal output helpers: styled text for humans, JSON lines for machines.
//!
//! The live transcript goes straight to stdout through the transcript sink.
//! These helpers cover everything around it: banners, summaries, tables and
//! the waiting spinner.

use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::cli::OutputFormat;

// ── Global format flag ─────────────────────────────────────────────

static JSON_MODE: AtomicBool = AtomicBool::new(false);

pub fn init(format: OutputFormat) {
    if matches!(format, OutputFormat::Json) {
        JSON_MODE.store(true, Ordering::Relaxed);
    }
}

pub fn is_json() -> bool {
    JSON_MODE.load(Ordering::Relaxed)
}

// ── JSON envelope ──────────────────────────────────────────────────

#[derive(Serialize)]
struct Msg<'a> {
    level: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a JsonValue>,
}

fn envelope(level: &str, message: &str, data: Option<&JsonValue>) -> String {
    let msg = Msg { level, message, data };
    serde_json::to_string(&msg).unwrap_or_else(|_| serde_json::json!({ "level": level, "message": message }).to_string())
}

fn emit_json(level: &str, message: &str, data: Option<&JsonValue>) {
    println!("{}", envelope(level, message, data));
}

// ── Public helpers ─────────────────────────────────────────────────

pub fn header(text: &str) {
    if is_json() {
        emit_json("info", text, None);
    } else {
        println!("{}", style(text).bold().cyan());
    }
}

pub fn error(text: &str) {
    if is_json() {
        eprintln!("{}", envelope("error", text, None));
    } else {
        eprintln!("{} {}", style("✗").red(), style(text).bright());
    }
}

pub fn warning(text: &str) {
    if is_json() {
        emit_json("warning", text, None);
    } else {
        println!("{} {}", style("!").yellow(), style(text).bright());
    }
}

pub fn dim(text: &str) {
    if is_json() {
        emit_json("info", text, None);
    } else {
        println!("{}", style(text).dim());
    }
}

/// Emit an arbitrary serializable value as structured output.
pub fn data<T: Serialize>(label: &str, value: &T) {
    if is_json() {
        let json_val = serde_json::to_value(value).unwrap_or(JsonValue::Null);
        emit_json("data", label, Some(&json_val));
    } else {
        let formatted = serde_json::to_string_pretty(value).unwrap_or_else(|_| format!("{label}: <?>"));
        println!("{formatted}");
    }
}

/// Print a key-value pair with styled key.
pub fn kv(key: &str, value: &str) {
    if is_json() {
        let data = serde_json::json!({ key: value });
        emit_json("info", key, Some(&data));
    } else {
        println!("  {} {}", style(key).cyan().bold(), value);
    }
}

// ── Tables ─────────────────────────────────────────────────────────

/// Create a styled table for listing items.
pub fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Add a header row to the table.
pub fn table_header(table: &mut Table, columns: &[&str]) {
    table.set_header(
        columns
            .iter()
            .map(|col| Cell::new(col).fg(Color::Cyan).add_attribute(Attribute::Bold)),
    );
}

/// Add a row to the table. The first column is highlighted.
pub fn table_row<S: AsRef<str>>(table: &mut Table, cells: &[S]) {
    table.add_row(cells.iter().enumerate().map(|(i, cell)| {
        let cell = Cell::new(cell.as_ref());
        if i == 0 { cell.fg(Color::Green) } else { cell }
    }));
}

/// Print a table (JSON mode emits the items array instead).
pub fn table_print<T: Serialize>(table: &Table, label: &str, items: &[T]) {
    if is_json() {
        let items = serde_json::to_value(items).unwrap_or(JsonValue::Null);
        let data = serde_json::json!({ "items": items });
        emit_json("list", label, Some(&data));
    } else {
        println!("{table}");
    }
}

// ── Spinners ───────────────────────────────────────────────────────

/// Spinner shown while waiting for the first response block.
///
/// Hidden in JSON mode and when stderr is not a terminal.
pub fn spinner(message: &str) -> ProgressBar {
    if is_json() || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_skips_missing_data() {
        let line = envelope("info", "hello", None);
        assert_eq!(line, r#"{"level":"info","message":"hello"}"#);
    }

    #[test]
    fn test_envelope_embeds_data() {
        let data = serde_json::json!({ "completed": 3 });
        let value: JsonValue = serde_json::from_str(&envelope("data", "stats", Some(&data))).unwrap();
        assert_eq!(value["data"]["completed"], 3);
        assert_eq!(value["message"], "stats");
    }

    #[test]
    fn test_table_rows() {
        let mut t = table();
        table_header(&mut t, &["Agent", "Tools"]);
        table_row(&mut t, &["researcher", "WebSearch, Write"]);
        let rendered = t.to_string();
        assert!(rendered.contains("researcher"));
        assert!(rendered.contains("WebSearch, Write"));
    }
}
