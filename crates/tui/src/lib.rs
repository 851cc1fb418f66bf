//! # Hookflow TUI Library
//!
//! Terminal front end for webhook-backed workflows: a discovery menu
//! (`Ctrl+W`), a slash-command palette in the composer, a form modal built from
//! the model's schema, and a transcript that renders workflow responses.
//!
//! ## Architecture
//!
//! State changes are pure (`App::update` / `App::handle_key`) and return
//! `Effect`s; `cmd` runs each effect as a tokio task that resolves to a
//! `Msg`, and `ui::runtime` feeds those messages back into the app.

mod app;
mod cmd;
mod theme;
mod ui;

use std::sync::Arc;

use anyhow::Result;
use hookflow_api::WorkflowBackend;

pub use app::TuiOptions;

/// Runs the TUI until the user quits.
///
/// # Errors
///
/// Terminal setup failures (raw mode, alternate screen) and rendering errors.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use hookflow_api::{AuthenticatedBackend, WebhookClient};
/// use hookflow_types::BearerToken;
/// use hookflow_tui::{TuiOptions, run};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = WebhookClient::new("http://localhost:8080/api/v1")?;
///     let backend = Arc::new(AuthenticatedBackend::new(client, BearerToken::new("token")));
///     run(backend, TuiOptions::default()).await
/// }
/// ```
pub async fn run(backend: Arc<dyn WorkflowBackend>, options: TuiOptions) -> Result<()> {
    let app = app::App::new(backend, &options);
    let startup_effects = app.startup_effects(options.startup_model.as_deref());
    ui::runtime::run_app(app, startup_effects).await
}
