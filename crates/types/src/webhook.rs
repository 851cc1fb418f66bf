//! Webhook workflow definitions exchanged with the chat backend.
//!
//! A chat model may carry a webhook configuration describing an external
//! automation (for example an n8n flow). The backend exposes that
//! configuration without the target URL; clients use it to render a form,
//! collect parameters, and forward them through the backend proxy.
//!
//! Field order is significant everywhere in this module: forms render and
//! validate in the order the backend supplied.

pub mod arguments;
pub mod validation;

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Input control type for a single workflow form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Select,
    Textarea,
    File,
}

impl FieldType {
    /// Every type except `file` collects a single string value.
    pub fn is_text_like(self) -> bool {
        !matches!(self, FieldType::File)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Select => "select",
            FieldType::Textarea => "textarea",
            FieldType::File => "file",
        }
    }
}

/// Declarative descriptor for one input of a workflow form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowFormField {
    /// Unique key within the form; used as the key in submitted form data.
    pub name: String,
    /// Display text shown next to the control and in validation messages.
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Choices for `select` fields, in display order.
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Initial value of any JSON type; see [`WorkflowFormField::initial_text`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
    /// MIME/extension filter; only meaningful for `file` fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,
    /// Whether several files may be attached; only meaningful for `file` fields.
    #[serde(default, deserialize_with = "null_as_default")]
    pub multiple: bool,
}

impl WorkflowFormField {
    pub fn is_file(&self) -> bool {
        self.field_type == FieldType::File
    }

    /// Accept filter for file fields. Always `None` for other types.
    pub fn accept_filter(&self) -> Option<&str> {
        if self.is_file() { self.accept.as_deref() } else { None }
    }

    /// Multiple selection flag for file fields. Always `false` for other types.
    pub fn allows_multiple(&self) -> bool {
        self.is_file() && self.multiple
    }

    /// Value a text-like control starts with when the form opens.
    ///
    /// Strings are used verbatim, other scalars in their JSON spelling.
    /// `null`, arrays and objects start empty.
    pub fn initial_text(&self) -> String {
        match &self.default {
            Some(JsonValue::String(text)) => text.clone(),
            Some(value @ (JsonValue::Number(_) | JsonValue::Bool(_))) => value.to_string(),
            _ => String::new(),
        }
    }
}

/// Per-model webhook configuration as returned by `GET /webhooks/config/{model_id}`.
///
/// Disabled models are reported as `{"enabled": false}`, so every other field
/// falls back to its default when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default, deserialize_with = "null_as_default")]
    pub enabled: bool,
    /// When set, selecting the owning model always routes to the form.
    #[serde(default, deserialize_with = "null_as_default")]
    pub workflow_only: bool,
    #[serde(default)]
    pub slash_command: Option<String>,
    #[serde(default)]
    pub form_title: Option<String>,
    #[serde(default)]
    pub form_description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub form_fields: Vec<WorkflowFormField>,
}

/// Treat an explicit `null` like an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl WebhookConfig {
    pub fn has_file_fields(&self) -> bool {
        self.form_fields.iter().any(WorkflowFormField::is_file)
    }

    /// Title for the form, falling back to the provided label (usually the model name).
    pub fn display_title<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.form_title.as_deref().filter(|title| !title.trim().is_empty()).unwrap_or(fallback)
    }

    pub fn field(&self, name: &str) -> Option<&WorkflowFormField> {
        self.form_fields.iter().find(|field| field.name == name)
    }
}

/// Summary record returned in bulk by `GET /webhooks/models`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookModel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slash_command: Option<String>,
    #[serde(default)]
    pub form_title: Option<String>,
}

impl WebhookModel {
    /// Slash command without its conventional leading `/`.
    pub fn command_keyword(&self) -> Option<&str> {
        self.slash_command
            .as_deref()
            .map(|command| command.trim().trim_start_matches('/'))
            .filter(|command| !command.is_empty())
    }

    /// Case-insensitive substring match against the slash command or the name.
    ///
    /// `needle` must already be lowercase. A leading `/` in the needle is
    /// ignored so `/rep` and `rep` behave the same.
    pub fn matches_query(&self, needle: &str) -> bool {
        let needle = needle.trim().trim_start_matches('/');
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(needle)
            || self
                .command_keyword()
                .is_some_and(|command| command.to_lowercase().contains(needle))
    }
}

/// Result of a webhook invocation relayed by the backend proxy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub success: bool,
    /// Markdown text from the external automation service (untrusted).
    #[serde(default)]
    pub message: Option<String>,
    /// Arbitrary payload; its shape decides how it is rendered.
    #[serde(default)]
    pub data: Option<JsonValue>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl WebhookResponse {
    /// Whether anything would be rendered for this response.
    pub fn has_content(&self) -> bool {
        self.message.as_deref().is_some_and(|message| !message.trim().is_empty())
            || self.data.as_ref().is_some_and(|data| !data.is_null())
            || self.file_url.is_some()
    }
}

/// What selecting a model should do once its configuration is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionRoute {
    /// The webhook is disabled; nothing is offered.
    Ignore,
    /// Open the workflow form instead of starting a chat turn.
    Form,
    /// Regular chat model; the workflow stays reachable via menu or slash command.
    Chat,
}

pub fn route_for_selection(config: &WebhookConfig) -> SelectionRoute {
    if !config.enabled {
        SelectionRoute::Ignore
    } else if config.workflow_only {
        SelectionRoute::Form
    } else {
        SelectionRoute::Chat
    }
}

/// Structural problems in a form schema supplied by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("form field #{index} has an empty name")]
    EmptyName { index: usize },
    #[error("form field name '{name}' is used more than once")]
    DuplicateName { name: String },
    #[error("select field '{name}' has no options")]
    SelectWithoutOptions { name: String },
}

/// Check the invariants of a form schema.
///
/// Returns every problem found, in schema order. Renderers still cope with
/// invalid schemas (a select without options degrades to free text); this is
/// used to warn about misconfigured models.
pub fn validate_form_schema(fields: &[WorkflowFormField]) -> Result<(), Vec<SchemaError>> {
    let mut problems = Vec::new();
    let mut seen = HashSet::new();
    for (index, field) in fields.iter().enumerate() {
        if field.name.trim().is_empty() {
            problems.push(SchemaError::EmptyName { index });
        } else if !seen.insert(field.name.as_str()) {
            problems.push(SchemaError::DuplicateName { name: field.name.clone() });
        }
        if field.field_type == FieldType::Select && field.options.is_empty() {
            problems.push(SchemaError::SelectWithoutOptions { name: field.name.clone() });
        }
    }
    if problems.is_empty() { Ok(()) } else { Err(problems) }
}

/// HTML-style `accept` matching.
///
/// The filter is a comma separated list of `.ext`, `type/*`, or exact MIME
/// entries. An empty filter accepts everything.
pub fn matches_accept(file_name: &str, content_type: &str, accept: &str) -> bool {
    let file_name = file_name.to_ascii_lowercase();
    let content_type = content_type.to_ascii_lowercase();
    let mut saw_entry = false;
    for entry in accept.split(',').map(|entry| entry.trim().to_ascii_lowercase()) {
        if entry.is_empty() {
            continue;
        }
        saw_entry = true;
        let matched = if entry.starts_with('.') {
            file_name.ends_with(&entry)
        } else if let Some(major) = entry.strip_suffix("/*") {
            content_type.split('/').next() == Some(major)
        } else {
            content_type == entry
        };
        if matched {
            return true;
        }
    }
    !saw_entry
}
