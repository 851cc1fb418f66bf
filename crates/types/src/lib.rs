//! Shared type definitions for Hookflow.
//!
//! This crate holds the webhook data model consumed from the chat backend,
//! the form helpers both front ends share, and the message/effect vocabulary
//! the TUI uses to separate pure state updates from side effects.

mod attachment;
pub mod webhook;

use std::fmt;
use std::path::PathBuf;

use serde_json::{Map, Value};

pub use attachment::{AttachmentError, FileAttachment, format_size, guess_content_type};
pub use webhook::arguments::{InlineArguments, apply_inline_arguments, normalize_date, parse_inline_arguments};
pub use webhook::validation::{
    FieldErrors, FieldValue, FormValues, SubmissionMode, collect_files, collect_form_data, seed_form_values, submission_mode,
    validate_required,
};
pub use webhook::{
    FieldType, SchemaError, SelectionRoute, WebhookConfig, WebhookModel, WebhookResponse, WorkflowFormField, matches_accept,
    route_for_selection, validate_form_schema,
};

/// Bearer credential supplied by the caller for every backend request.
///
/// The token is never printed through `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Error,
}

/// Which surface asked for a model's webhook configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// The workflow dropdown menu.
    Menu,
    /// The slash-command palette in the composer, with whatever followed
    /// the command word (`/report protocol=MK1 last_month`).
    Slash { arguments: String },
    /// The model chosen at startup; routed by [`route_for_selection`].
    ActiveModel,
}

/// A validated form ready to be sent to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitRequest {
    /// Form session that produced the request; results for stale sessions are dropped.
    pub session: u64,
    pub model_id: String,
    /// Title shown on the transcript entry.
    pub title: String,
    pub mode: SubmissionMode,
    pub form_data: Map<String, Value>,
    pub files: Vec<FileAttachment>,
    pub chat_id: Option<String>,
}

/// Messages that can be sent to update the application state.
///
/// Input events are handled by components directly; these cover ticks and
/// the results of background work.
#[derive(Debug, Clone)]
pub enum Msg {
    /// Periodic UI tick (toast expiry, throbbers)
    Tick,
    /// Terminal resized
    Resize(u16, u16),
    /// The enabled-model listing completed (possibly empty on failure)
    WebhookModelsLoaded(Vec<WebhookModel>),
    /// A model's configuration arrived
    WebhookConfigLoaded {
        model_id: String,
        model_name: Option<String>,
        origin: ConfigOrigin,
        config: WebhookConfig,
    },
    /// Fetching a model's configuration failed
    WebhookConfigFailed { model_id: String, message: String },
    /// A form submission resolved
    SubmissionFinished {
        session: u64,
        title: String,
        outcome: Result<WebhookResponse, String>,
    },
    /// A response file download resolved
    DownloadFinished(Result<PathBuf, String>),
    /// Writing to the system clipboard resolved
    ClipboardFinished(Result<(), String>),
    /// Handing a link to the system browser resolved
    LinkOpened(Result<(), String>),
}

/// Side effects requested by state changes.
///
/// The runtime turns these into background tasks; each task resolves to a
/// [`Msg`].
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Fetch the enabled-model listing
    LoadWebhookModels,
    /// Fetch the configuration for a model
    FetchWebhookConfig {
        model_id: String,
        model_name: Option<String>,
        origin: ConfigOrigin,
    },
    /// Send a validated form
    SubmitForm(SubmitRequest),
    /// Write text into the system clipboard
    CopyToClipboard(String),
    /// Open an absolute URL in the system browser
    OpenLink(String),
    /// Save a response file locally
    DownloadFile { url: String, file_name: Option<String> },
}
