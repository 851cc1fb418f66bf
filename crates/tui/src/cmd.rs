//! # Command Execution Layer
//!
//! The boundary where the pure state of [`App`] meets side effects. Each
//! [`Effect`] becomes a tokio task that talks to the backend, the clipboard,
//! or the filesystem and resolves to exactly one [`Msg`] for
//! [`App::update`].
//!
//! This follows a **functional core, imperative shell** pattern: state updates
//! are pure, tasks here perform the I/O.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hookflow_api::WorkflowBackend;
use hookflow_types::{Effect, Msg};
use hookflow_util::{download_file_name, unique_destination};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::App;

/// Everything a background task needs, detached from `App` so tasks can
/// outlive the borrow.
#[derive(Clone)]
pub struct EffectContext {
    backend: Arc<dyn WorkflowBackend>,
    download_dir: Option<PathBuf>,
}

impl EffectContext {
    pub fn from_app(app: &App) -> Self {
        Self {
            backend: Arc::clone(&app.backend),
            download_dir: app.download_dir.clone(),
        }
    }
}

/// Spawn one task per effect.
pub fn spawn_effects(app: &App, effects: Vec<Effect>) -> Vec<JoinHandle<Msg>> {
    let context = EffectContext::from_app(app);
    effects
        .into_iter()
        .map(|effect| tokio::spawn(run_effect(context.clone(), effect)))
        .collect()
}

/// Perform a single effect and report its result.
pub async fn run_effect(context: EffectContext, effect: Effect) -> Msg {
    match effect {
        Effect::LoadWebhookModels => {
            let models = context.backend.webhook_models().await;
            debug!(count = models.len(), "loaded webhook models");
            Msg::WebhookModelsLoaded(models)
        }
        Effect::FetchWebhookConfig {
            model_id,
            model_name,
            origin,
        } => match context.backend.webhook_config(&model_id).await {
            Ok(config) => Msg::WebhookConfigLoaded {
                model_id,
                model_name,
                origin,
                config,
            },
            Err(error) => Msg::WebhookConfigFailed {
                model_id,
                message: error.to_string(),
            },
        },
        Effect::SubmitForm(request) => {
            let session = request.session;
            let title = request.title.clone();
            info!(model_id = %request.model_id, session, mode = ?request.mode, "invoking workflow");
            let outcome = context.backend.submit(request).await.map_err(|error| error.to_string());
            Msg::SubmissionFinished { session, title, outcome }
        }
        Effect::CopyToClipboard(text) => Msg::ClipboardFinished(copy_to_clipboard(text).await),
        Effect::OpenLink(url) => Msg::LinkOpened(open_link(url).await),
        Effect::DownloadFile { url, file_name } => {
            let result = download(&context, &url, file_name.as_deref()).await;
            if let Err(error) = &result {
                warn!("download failed: {error}");
            }
            Msg::DownloadFinished(result)
        }
    }
}

async fn copy_to_clipboard(text: String) -> Result<(), String> {
    let joined = tokio::task::spawn_blocking(move || {
        let mut clipboard = arboard::Clipboard::new().map_err(|error| error.to_string())?;
        clipboard.set_text(text).map_err(|error| error.to_string())
    })
    .await;
    joined.unwrap_or_else(|error| Err(error.to_string()))
}

async fn open_link(url: String) -> Result<(), String> {
    debug!(%url, "opening link in browser");
    let joined = tokio::task::spawn_blocking(move || opener::open_browser(&url).map_err(|error| error.to_string())).await;
    joined.unwrap_or_else(|error| Err(error.to_string()))
}

async fn download(context: &EffectContext, url: &str, file_name: Option<&str>) -> Result<PathBuf, String> {
    let bytes = context.backend.download(url).await.map_err(|error| error.to_string())?;
    let directory = download_directory(context.download_dir.as_deref());
    tokio::fs::create_dir_all(&directory)
        .await
        .map_err(|error| format!("Failed to create {}: {error}", directory.display()))?;
    let destination = unique_destination(&directory, &download_file_name(file_name, url));
    tokio::fs::write(&destination, &bytes)
        .await
        .map_err(|error| format!("Failed to write {}: {error}", destination.display()))?;
    info!(path = %destination.display(), bytes = bytes.len(), "saved response file");
    Ok(destination)
}

fn download_directory(configured: Option<&Path>) -> PathBuf {
    configured
        .map(Path::to_path_buf)
        .or_else(dirs_next::download_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}
