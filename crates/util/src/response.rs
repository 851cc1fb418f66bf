//! Classification of webhook response payloads.
//!
//! The shape of `data` decides how a response is displayed. Both the TUI
//! renderer and the CLI's plain-text output go through [`classify`] so the
//! two front ends agree on what a payload looks like.

use hookflow_types::WebhookResponse;
use serde_json::Value;
use unicode_width::UnicodeWidthStr;
use url::Url;

use crate::markdown::markdown_to_plain;

/// Shown for null values and for table cells a row does not have.
pub const PLACEHOLDER: &str = "—";

/// Label used when a response links a file without naming it.
pub const DEFAULT_DOWNLOAD_LABEL: &str = "Download File";

/// Display form of a response's `data` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseView {
    Empty,
    /// Array of objects. Every row has one cell per column.
    Table { columns: Vec<String>, rows: Vec<Vec<String>> },
    /// Array of scalars (or mixed values whose first element is not an object).
    List(Vec<String>),
    /// Object fields in server order.
    KeyValue(Vec<(String, String)>),
    /// Preformatted block for anything else.
    Raw(String),
}

/// Decide how a `data` payload is displayed.
pub fn classify(data: Option<&Value>) -> ResponseView {
    match data {
        None | Some(Value::Null) => ResponseView::Empty,
        Some(Value::Array(items)) if items.first().is_some_and(Value::is_object) => table_view(items),
        Some(Value::Array(items)) if !items.is_empty() => ResponseView::List(items.iter().map(format_scalar).collect()),
        Some(Value::Object(map)) => ResponseView::KeyValue(map.iter().map(|(key, value)| (key.clone(), format_scalar(value))).collect()),
        Some(Value::String(text)) => ResponseView::Raw(text.clone()),
        Some(other) => ResponseView::Raw(serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string())),
    }
}

fn table_view(items: &[Value]) -> ResponseView {
    let mut columns: Vec<String> = Vec::new();
    for item in items {
        if let Value::Object(map) = item {
            for key in map.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
    }
    let rows = items
        .iter()
        .map(|item| {
            columns
                .iter()
                .map(|column| match item.get(column) {
                    Some(value) => format_scalar(value),
                    None => PLACEHOLDER.to_string(),
                })
                .collect()
        })
        .collect();
    ResponseView::Table { columns, rows }
}

/// Render a single JSON value for a table cell, list item, or key/value row.
pub fn format_scalar(value: &Value) -> String {
    match value {
        Value::Null => PLACEHOLDER.to_string(),
        Value::Bool(true) => "✓".to_string(),
        Value::Bool(false) => "✗".to_string(),
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Download affordance for a response that links a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub url: String,
    pub label: String,
}

impl DownloadLink {
    /// Present only when the response carries a `file_url`.
    pub fn from_response(response: &WebhookResponse) -> Option<Self> {
        let url = response.file_url.as_deref().map(str::trim).filter(|url| !url.is_empty())?;
        let label = response
            .file_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_DOWNLOAD_LABEL);
        Some(Self {
            url: url.to_string(),
            label: label.to_string(),
        })
    }

    /// Absolute form of the link, resolving relative URLs against the API
    /// base URL. Unresolvable input is returned unchanged.
    pub fn resolve(&self, base_url: &str) -> String {
        Url::parse(&format!("{}/", base_url.trim_end_matches('/')))
            .and_then(|base| base.join(&self.url))
            .map(String::from)
            .unwrap_or_else(|_| self.url.clone())
    }
}

/// Text rendering of a whole response for terminals without the TUI.
///
/// Sections (message, data, download link) are separated by a blank line.
/// Returns an empty string when there is nothing to show.
pub fn render_plain(response: &WebhookResponse) -> String {
    let mut sections = Vec::new();
    if let Some(message) = response.message.as_deref().filter(|message| !message.trim().is_empty()) {
        sections.push(markdown_to_plain(message).trim_end().to_string());
    }
    match classify(response.data.as_ref()) {
        ResponseView::Empty => {}
        ResponseView::Table { columns, rows } => sections.push(plain_table(&columns, &rows)),
        ResponseView::List(items) => sections.push(items.iter().map(|item| format!("• {item}")).collect::<Vec<_>>().join("\n")),
        ResponseView::KeyValue(pairs) => {
            let key_width = pairs.iter().map(|(key, _)| key.width()).max().unwrap_or(0);
            let lines: Vec<String> = pairs
                .iter()
                .map(|(key, value)| format!("{}:{} {value}", key, " ".repeat(key_width - key.width())))
                .collect();
            sections.push(lines.join("\n"));
        }
        ResponseView::Raw(text) => sections.push(text),
    }
    if let Some(link) = DownloadLink::from_response(response) {
        sections.push(format!("{}: {}", link.label, link.url));
    }
    sections.join("\n\n")
}

fn plain_table(columns: &[String], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.width())
                .chain(std::iter::once(column.width()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_row = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell}{}", " ".repeat(width.saturating_sub(cell.width()))))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![format_row(columns)];
    lines.push(widths.iter().map(|width| "─".repeat(*width)).collect::<Vec<_>>().join("  "));
    lines.extend(rows.iter().map(|row| format_row(row)));
    lines.join("\n")
}
