use async_trait::async_trait;
use hookflow_types::{BearerToken, FileAttachment, SubmissionMode, SubmitRequest, WebhookConfig, WebhookModel, WebhookResponse};
use serde_json::{Map, Value};

use crate::{WebhookApiError, WebhookClient};

/// The webhook operations front ends depend on.
///
/// The TUI holds an `Arc<dyn WorkflowBackend>` so tests can substitute an
/// in-memory implementation for the HTTP client.
#[async_trait]
pub trait WorkflowBackend: Send + Sync {
    /// Enabled webhook models; empty on failure.
    async fn webhook_models(&self) -> Vec<WebhookModel>;

    async fn webhook_config(&self, model_id: &str) -> Result<WebhookConfig, WebhookApiError>;

    async fn invoke(
        &self,
        model_id: &str,
        form_data: Map<String, Value>,
        chat_id: Option<&str>,
    ) -> Result<WebhookResponse, WebhookApiError>;

    async fn invoke_with_files(
        &self,
        model_id: &str,
        form_data: Map<String, Value>,
        files: Vec<FileAttachment>,
        chat_id: Option<&str>,
    ) -> Result<WebhookResponse, WebhookApiError>;

    async fn download(&self, file_url: &str) -> Result<Vec<u8>, WebhookApiError>;

    /// Send a validated form using the transport its schema calls for.
    async fn submit(&self, request: SubmitRequest) -> Result<WebhookResponse, WebhookApiError> {
        let SubmitRequest {
            model_id,
            mode,
            form_data,
            files,
            chat_id,
            ..
        } = request;
        match mode {
            SubmissionMode::Json => self.invoke(&model_id, form_data, chat_id.as_deref()).await,
            SubmissionMode::Multipart => self.invoke_with_files(&model_id, form_data, files, chat_id.as_deref()).await,
        }
    }
}

/// A [`WebhookClient`] paired with the credential of the signed-in user.
#[derive(Debug, Clone)]
pub struct AuthenticatedBackend {
    client: WebhookClient,
    token: BearerToken,
}

impl AuthenticatedBackend {
    pub fn new(client: WebhookClient, token: BearerToken) -> Self {
        Self { client, token }
    }

    pub fn client(&self) -> &WebhookClient {
        &self.client
    }
}

#[async_trait]
impl WorkflowBackend for AuthenticatedBackend {
    async fn webhook_models(&self) -> Vec<WebhookModel> {
        self.client.get_webhook_enabled_models(&self.token).await
    }

    async fn webhook_config(&self, model_id: &str) -> Result<WebhookConfig, WebhookApiError> {
        self.client.get_webhook_config(&self.token, model_id).await
    }

    async fn invoke(
        &self,
        model_id: &str,
        form_data: Map<String, Value>,
        chat_id: Option<&str>,
    ) -> Result<WebhookResponse, WebhookApiError> {
        self.client.invoke_webhook(&self.token, model_id, form_data, chat_id).await
    }

    async fn invoke_with_files(
        &self,
        model_id: &str,
        form_data: Map<String, Value>,
        files: Vec<FileAttachment>,
        chat_id: Option<&str>,
    ) -> Result<WebhookResponse, WebhookApiError> {
        self.client
            .invoke_webhook_with_files(&self.token, model_id, form_data, files, chat_id)
            .await
    }

    async fn download(&self, file_url: &str) -> Result<Vec<u8>, WebhookApiError> {
        self.client.download_file(&self.token, file_url).await
    }
}
