//! Hookflow webhook API client.
//!
//! This crate talks to the chat backend's webhook router (base path
//! `/webhooks`). It focuses on:
//!
//! - Validating the configured base URL
//! - Building requests with consistent `Authorization`, `Accept`, and
//!   `User-Agent` headers
//! - Normalizing every failure into [`WebhookApiError`] with the best
//!   available human-readable message
//!
//! Credentials are never read from ambient state: every operation takes the
//! caller's [`BearerToken`]. [`AuthenticatedBackend`] binds a token once for
//! front ends that work against the [`WorkflowBackend`] trait.
//!
//! # Example
//!
//! ```ignore
//! use hookflow_api::WebhookClient;
//! use hookflow_types::BearerToken;
//!
//! async fn list() -> Result<(), hookflow_api::WebhookApiError> {
//!     let client = WebhookClient::new("http://localhost:8080/api/v1")?;
//!     let token = BearerToken::new("sk-...");
//!     for model in client.get_webhook_enabled_models(&token).await {
//!         println!("{} {:?}", model.name, model.slash_command);
//!     }
//!     Ok(())
//! }
//! ```

mod backend;
mod error;

use std::env;

use hookflow_types::{BearerToken, FileAttachment, WebhookConfig, WebhookModel, WebhookResponse};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, Url, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

pub use backend::{AuthenticatedBackend, WorkflowBackend};
pub use error::WebhookApiError;

/// Base path of the webhook router relative to the API base URL.
pub const WEBHOOKS_PATH: &str = "/webhooks";

/// Hostnames allowed over plain HTTP regardless of configuration.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1", "[::1]"];

/// Characters escaped when a model id is placed in a path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

const CONFIG_FETCH_FALLBACK: &str = "Failed to fetch webhook config";
const INVOCATION_FALLBACK: &str = "Failed to invoke webhook";
const DOWNLOAD_FALLBACK: &str = "Failed to download file";

/// Options applied when constructing a [`WebhookClient`].
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Permit plain `http://` for hosts other than localhost.
    pub allow_insecure: bool,
}

/// Thin wrapper around a configured `reqwest::Client` for the webhook router.
///
/// No request timeout is configured here; the backend proxy enforces its own
/// limit (120 seconds) and reports it as an ordinary failure.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    base_url: String,
    http: Client,
    user_agent: String,
}

/// Error payload shape used by the backend (`{"detail": ...}`), plus the
/// `message` field the proxy sets on gateway failures.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

impl WebhookClient {
    /// Construct a client for `base_url` with default options.
    ///
    /// Non-localhost hosts must use HTTPS.
    pub fn new(base_url: &str) -> Result<Self, WebhookApiError> {
        Self::with_options(base_url, ClientOptions::default())
    }

    pub fn with_options(base_url: &str, options: ClientOptions) -> Result<Self, WebhookApiError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        validate_base_url(&base_url, options.allow_insecure)?;

        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        let http = Client::builder()
            .default_headers(default_headers)
            .build()
            .map_err(|error| WebhookApiError::Client(error.to_string()))?;

        Ok(Self {
            base_url,
            http,
            user_agent: format!("hookflow/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request against a path relative to the webhook router.
    fn request(&self, token: &BearerToken, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}{}", self.base_url, WEBHOOKS_PATH, path);
        debug!(%url, %method, "building webhook request");
        self.http
            .request(method, url)
            .bearer_auth(token.as_str())
            .header(header::USER_AGENT, &self.user_agent)
    }

    /// Fetch the webhook configuration for a model.
    ///
    /// Any non-success status is an error carrying the server's `detail`; a
    /// default configuration is never substituted.
    pub async fn get_webhook_config(&self, token: &BearerToken, model_id: &str) -> Result<WebhookConfig, WebhookApiError> {
        let path = format!("/config/{}", utf8_percent_encode(model_id, PATH_SEGMENT));
        let to_error = |status, message| WebhookApiError::ConfigFetch { status, message };

        let response = self
            .request(token, Method::GET, &path)
            .send()
            .await
            .map_err(|error| to_error(None, transport_message(&error, CONFIG_FETCH_FALLBACK)))?;
        decode_success(response, CONFIG_FETCH_FALLBACK, to_error).await
    }

    /// Invoke a model's webhook with JSON form data.
    pub async fn invoke_webhook(
        &self,
        token: &BearerToken,
        model_id: &str,
        form_data: Map<String, Value>,
        chat_id: Option<&str>,
    ) -> Result<WebhookResponse, WebhookApiError> {
        info!(model_id, "invoking webhook");
        let body = json!({
            "model_id": model_id,
            "form_data": form_data,
            "chat_id": chat_id,
        });

        let response = self
            .request(token, Method::POST, "/invoke")
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(invocation_transport_error)?;
        decode_success(response, INVOCATION_FALLBACK, invocation_error).await
    }

    /// Invoke a model's webhook with multipart form data and file uploads.
    ///
    /// The transport chooses the multipart boundary, so no explicit
    /// `Content-Type` is set.
    pub async fn invoke_webhook_with_files(
        &self,
        token: &BearerToken,
        model_id: &str,
        form_data: Map<String, Value>,
        files: Vec<FileAttachment>,
        chat_id: Option<&str>,
    ) -> Result<WebhookResponse, WebhookApiError> {
        info!(model_id, file_count = files.len(), "invoking webhook with files");
        let form_data_json = serde_json::to_string(&form_data).map_err(|error| invocation_error(None, error.to_string()))?;

        let mut form = Form::new().text("model_id", model_id.to_string()).text("form_data_json", form_data_json);
        if let Some(chat_id) = chat_id {
            form = form.text("chat_id", chat_id.to_string());
        }
        for file in files {
            form = form.part("files", file_part(file)?);
        }

        let response = self
            .request(token, Method::POST, "/invoke-with-files")
            .multipart(form)
            .send()
            .await
            .map_err(invocation_transport_error)?;
        decode_success(response, INVOCATION_FALLBACK, invocation_error).await
    }

    /// List models with an enabled webhook.
    ///
    /// Unlike the other operations this never fails: any error is logged and
    /// an empty list is returned, so callers see an empty workflow menu.
    pub async fn get_webhook_enabled_models(&self, token: &BearerToken) -> Vec<WebhookModel> {
        let to_error = |status, message| WebhookApiError::ConfigFetch { status, message };
        let result = match self.request(token, Method::GET, "/models").send().await {
            Ok(response) => decode_success::<Vec<WebhookModel>, _>(response, "Failed to list webhook models", to_error).await,
            Err(error) => Err(to_error(None, transport_message(&error, "Failed to list webhook models"))),
        };
        result.unwrap_or_else(|error| {
            warn!(status = ?error.status(), "listing webhook models failed: {}", error);
            Vec::new()
        })
    }

    /// Download a file referenced by a webhook response.
    ///
    /// Relative URLs resolve against the base URL. The bearer token is only
    /// attached when the file shares the backend's origin (scheme, host and port).
    pub async fn download_file(&self, token: &BearerToken, file_url: &str) -> Result<Vec<u8>, WebhookApiError> {
        let to_error = |status, message| WebhookApiError::Download { status, message };
        let base = Url::parse(&format!("{}/", self.base_url)).map_err(|error| to_error(None, error.to_string()))?;
        let url = base.join(file_url).map_err(|error| to_error(None, format!("invalid file URL '{file_url}': {error}")))?;

        let mut builder = self.http.get(url.clone()).header(header::USER_AGENT, &self.user_agent);
        if url.origin() == base.origin() {
            builder = builder.bearer_auth(token.as_str());
        }
        debug!(url = %url, "downloading response file");

        let response = builder
            .send()
            .await
            .map_err(|error| to_error(None, transport_message(&error, DOWNLOAD_FALLBACK)))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(to_error(Some(status.as_u16()), error_message(&text, DOWNLOAD_FALLBACK)));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|error| to_error(Some(status.as_u16()), error.to_string()))?;
        Ok(bytes.to_vec())
    }
}

fn invocation_error(status: Option<u16>, message: String) -> WebhookApiError {
    WebhookApiError::Invocation { status, message }
}

fn invocation_transport_error(error: reqwest::Error) -> WebhookApiError {
    invocation_error(None, transport_message(&error, INVOCATION_FALLBACK))
}

fn file_part(file: FileAttachment) -> Result<Part, WebhookApiError> {
    let FileAttachment {
        file_name,
        content_type,
        bytes,
    } = file;
    let label = file_name.clone();
    Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(&content_type)
        .map_err(|error| invocation_error(None, format!("invalid content type '{content_type}' for {label}: {error}")))
}

/// Decode a JSON success body, or map a failure status to an error using the
/// server-supplied message.
async fn decode_success<T, F>(response: Response, fallback: &str, to_error: F) -> Result<T, WebhookApiError>
where
    T: DeserializeOwned,
    F: Fn(Option<u16>, String) -> WebhookApiError,
{
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|error| to_error(Some(status.as_u16()), transport_message(&error, fallback)))?;

    if !status.is_success() {
        debug!(status = status.as_u16(), "webhook request failed");
        return Err(to_error(Some(status.as_u16()), error_message(&text, fallback)));
    }

    serde_json::from_str(&text).map_err(|error| to_error(Some(status.as_u16()), format!("invalid response body: {error}")))
}

/// Best human-readable message from an error body: `detail`, then
/// `message`, then the fallback.
fn error_message(body: &str, fallback: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let detail = parsed.detail.and_then(|detail| match detail {
        Value::String(text) => Some(text),
        Value::Null => None,
        other => Some(other.to_string()),
    });
    detail
        .or(parsed.message)
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

fn transport_message(error: &reqwest::Error, fallback: &str) -> String {
    let message = error.to_string();
    if message.trim().is_empty() { fallback.to_string() } else { message }
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost`, `127.0.0.1`, `[::1]`: any scheme is allowed
/// - otherwise: the scheme must be HTTPS unless `allow_insecure` is set
fn validate_base_url(base: &str, allow_insecure: bool) -> Result<(), WebhookApiError> {
    let invalid = |reason: String| WebhookApiError::InvalidBaseUrl {
        url: base.to_string(),
        reason,
    };
    let parsed_base_url = Url::parse(base).map_err(|error| invalid(error.to_string()))?;

    if !matches!(parsed_base_url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed_base_url.scheme())));
    }
    let host_name = parsed_base_url
        .host_str()
        .ok_or_else(|| invalid("the URL must include a host".to_string()))?;

    if LOCALHOST_DOMAINS.iter().any(|&allowed| host_name.eq_ignore_ascii_case(allowed)) {
        return Ok(());
    }
    if parsed_base_url.scheme() != "https" && !allow_insecure {
        return Err(invalid(format!(
            "https is required for non-localhost hosts; got '{}://'",
            parsed_base_url.scheme()
        )));
    }
    Ok(())
}
