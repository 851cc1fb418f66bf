use thiserror::Error;

/// Failures surfaced by [`crate::WebhookClient`].
///
/// `Display` is the human-readable message alone, so front ends can show it
/// directly in a toast or on stderr.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookApiError {
    /// `GET /webhooks/config/{model_id}` failed.
    #[error("{message}")]
    ConfigFetch { status: Option<u16>, message: String },

    /// `POST /webhooks/invoke` or `/webhooks/invoke-with-files` failed.
    #[error("{message}")]
    Invocation { status: Option<u16>, message: String },

    /// Fetching a response file failed.
    #[error("{message}")]
    Download { status: Option<u16>, message: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl WebhookApiError {
    /// HTTP status of the failed call, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ConfigFetch { status, .. } | Self::Invocation { status, .. } | Self::Download { status, .. } => *status,
            Self::InvalidBaseUrl { .. } | Self::Client(_) => None,
        }
    }
}
