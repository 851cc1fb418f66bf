//! Application state and logic for the Hookflow TUI.
//!
//! `App` owns every surface (menu, slash palette, composer, form modal,
//! transcript, toasts) and the shared model catalog. [`App::update`] and
//! [`App::handle_key`] are pure state transitions: they never touch the
//! network or the terminal, and instead return [`Effect`]s that `cmd` turns
//! into background tasks resolving to [`Msg`]s.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use hookflow_api::WorkflowBackend;
use hookflow_types::{
    ConfigOrigin, Effect, Msg, SelectionRoute, WebhookConfig, parse_inline_arguments, route_for_selection, validate_form_schema,
};
use tracing::{debug, warn};

use crate::ui::components::common::TextInputState;
use crate::ui::components::form::SubmissionResolution;
use crate::ui::components::transcript::TranscriptEntry;
use crate::ui::components::{FormModalState, ModelCatalog, SlashPaletteState, ToastStack, TranscriptState, WorkflowMenuState};

/// Frames of the busy indicator shown while background work is in flight.
pub const THROBBER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const TRANSCRIPT_PAGE: u16 = 10;

/// Startup options for a TUI session.
#[derive(Debug, Clone, Default)]
pub struct TuiOptions {
    /// Chat the workflow results are attached to, forwarded on every invocation.
    pub chat_id: Option<String>,
    /// Model whose configuration is fetched at startup and routed by its
    /// `workflow_only` flag.
    pub startup_model: Option<String>,
    /// API base URL, used to resolve relative download links.
    pub base_url: String,
    /// Where `Alt+S` saves response files. Defaults to the user's download
    /// directory, then the current directory.
    pub download_dir: Option<PathBuf>,
}

pub struct App {
    pub backend: Arc<dyn WorkflowBackend>,
    pub catalog: ModelCatalog,
    pub menu: WorkflowMenuState,
    pub slash: SlashPaletteState,
    pub composer: TextInputState,
    pub form: FormModalState,
    pub transcript: TranscriptState,
    pub toasts: ToastStack,
    pub chat_id: Option<String>,
    pub base_url: String,
    pub download_dir: Option<PathBuf>,
    /// Background tasks are in flight
    pub executing: bool,
    pub throbber_idx: usize,
}

impl App {
    pub fn new(backend: Arc<dyn WorkflowBackend>, options: &TuiOptions) -> Self {
        Self {
            backend,
            catalog: ModelCatalog::default(),
            menu: WorkflowMenuState::default(),
            slash: SlashPaletteState::default(),
            composer: TextInputState::default(),
            form: FormModalState::default(),
            transcript: TranscriptState::default(),
            toasts: ToastStack::default(),
            chat_id: options.chat_id.clone(),
            base_url: options.base_url.clone(),
            download_dir: options.download_dir.clone(),
            executing: false,
            throbber_idx: 0,
        }
    }

    /// Effects to run before the first input arrives.
    pub fn startup_effects(&self, startup_model: Option<&str>) -> Vec<Effect> {
        startup_model
            .map(str::trim)
            .filter(|model_id| !model_id.is_empty())
            .map(|model_id| Effect::FetchWebhookConfig {
                model_id: model_id.to_string(),
                model_name: None,
                origin: ConfigOrigin::ActiveModel,
            })
            .into_iter()
            .collect()
    }

    /// Whether ticks should come quickly (throbber or toasts are animating).
    pub fn needs_animation(&self) -> bool {
        self.executing || !self.toasts.is_empty() || self.catalog.is_loading()
    }

    /// Apply a message produced by the runtime or a finished background task.
    pub fn update(&mut self, msg: &Msg) -> Vec<Effect> {
        match msg {
            Msg::Tick => {
                self.toasts.tick();
                if self.executing {
                    self.throbber_idx = (self.throbber_idx + 1) % THROBBER.len();
                }
                Vec::new()
            }
            Msg::Resize(..) => Vec::new(),
            Msg::WebhookModelsLoaded(models) => {
                self.catalog.populate(models.clone());
                self.menu.models_loaded(&self.catalog);
                self.slash.clamp(&self.catalog);
                Vec::new()
            }
            Msg::WebhookConfigLoaded {
                model_id,
                model_name,
                origin,
                config,
            } => {
                self.config_loaded(model_id, model_name.as_deref(), origin, config);
                Vec::new()
            }
            Msg::WebhookConfigFailed { model_id, message } => {
                warn!(%model_id, "failed to load webhook config: {message}");
                self.toasts.error(message.clone());
                Vec::new()
            }
            Msg::SubmissionFinished { session, title, outcome } => {
                match self.form.submission_finished(*session, outcome) {
                    SubmissionResolution::Stale => debug!(session, %title, "dropped result of a closed form"),
                    SubmissionResolution::Completed { title, response, toast } => {
                        self.transcript.push(TranscriptEntry::new(title, response));
                        self.toasts.success(toast);
                    }
                    SubmissionResolution::Rejected { message } => self.toasts.error(message),
                }
                Vec::new()
            }
            Msg::DownloadFinished(result) => {
                match result {
                    Ok(path) => self.toasts.success(format!("Saved {}", path.display())),
                    Err(error) => self.toasts.error(error.clone()),
                }
                Vec::new()
            }
            Msg::ClipboardFinished(result) => {
                match result {
                    Ok(()) => self.toasts.success("Download link copied to clipboard"),
                    Err(error) => self.toasts.error(format!("Clipboard unavailable: {error}")),
                }
                Vec::new()
            }
            Msg::LinkOpened(result) => {
                match result {
                    Ok(()) => self.toasts.info("Opened download link in the browser"),
                    Err(error) => self.toasts.error(format!("Could not open link: {error}. Alt+C copies it instead.")),
                }
                Vec::new()
            }
        }
    }

    fn config_loaded(&mut self, model_id: &str, model_name: Option<&str>, origin: &ConfigOrigin, config: &WebhookConfig) {
        let route = route_for_selection(config);
        if route == SelectionRoute::Ignore {
            debug!(model_id, "webhook disabled; ignoring selection");
            return;
        }
        if let Err(problems) = validate_form_schema(&config.form_fields) {
            for problem in problems {
                warn!(model_id, "form schema problem: {problem}");
            }
        }

        let fallback = model_name
            .or_else(|| self.catalog.find(model_id).map(|model| model.name.as_str()))
            .unwrap_or(model_id)
            .to_string();
        let title = config.display_title(&fallback).to_string();

        match (origin, route) {
            (ConfigOrigin::ActiveModel, SelectionRoute::Chat) => {
                self.toasts.info(format!(
                    "{fallback} handles chat turns in the chat client. Press Ctrl+W or type / to run its workflow."
                ));
            }
            _ => {
                self.menu.close();
                self.slash.dismiss();
                self.form.open(model_id, &title, config, self.chat_id.clone());
                if let ConfigOrigin::Slash { arguments } = origin {
                    self.prefill_form(arguments);
                }
            }
        }
    }

    fn prefill_form(&mut self, text: &str) {
        let arguments = parse_inline_arguments(text, Local::now().date_naive());
        if arguments.is_empty() {
            return;
        }
        let mut ignored = self.form.prefill(&arguments);
        ignored.extend(arguments.unrecognized);
        if !ignored.is_empty() {
            debug!(?ignored, "inline arguments not applied");
            self.toasts.info(format!("Ignored: {}", ignored.join(", ")));
        }
    }

    /// Route a key press to the topmost surface.
    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if self.form.is_open() {
            return self.handle_form_key(key);
        }
        if self.menu.is_open() {
            return self.handle_menu_key(key);
        }
        if self.slash.is_active()
            && let Some(effects) = self.handle_slash_key(key)
        {
            return effects;
        }
        self.handle_composer_key(key)
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        if key.code == KeyCode::Esc {
            self.form.close();
            return Vec::new();
        }
        if self.form.is_submitting() {
            return Vec::new();
        }
        let on_file_field = self.form.focused_field().is_some_and(|field| field.is_file());

        match key.code {
            KeyCode::Char('s') if control => return self.submit_form(),
            KeyCode::Char('d') if control && on_file_field => {
                self.form.remove_last_file();
            }
            KeyCode::Tab | KeyCode::Down => self.form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.form.focus_prev(),
            KeyCode::Enter => {
                if self.form.is_submit_focused() {
                    return self.submit_form();
                }
                if on_file_field {
                    self.form.add_file_from_entry();
                } else if !self.form.insert_newline() {
                    self.form.focus_next();
                }
            }
            KeyCode::Left => {
                if !self.form.cycle_option(false) {
                    self.form.move_cursor_left();
                }
            }
            KeyCode::Right => {
                if !self.form.cycle_option(true) {
                    self.form.move_cursor_right();
                }
            }
            KeyCode::Backspace => self.form.backspace(),
            KeyCode::Delete if on_file_field => {
                self.form.remove_last_file();
            }
            KeyCode::Delete => self.form.delete_char(),
            KeyCode::Char(character) if !control => self.form.insert_char(character),
            _ => {}
        }
        Vec::new()
    }

    fn submit_form(&mut self) -> Vec<Effect> {
        match self.form.submit() {
            Some(request) => vec![Effect::SubmitForm(request)],
            None => Vec::new(),
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.menu.close(),
            KeyCode::Char('w') if control => self.menu.close(),
            KeyCode::Down => self.menu.select_next(&self.catalog),
            KeyCode::Up => self.menu.select_prev(&self.catalog),
            KeyCode::Enter => return self.menu.choose(&self.catalog).into_iter().collect(),
            KeyCode::Backspace => self.menu.pop_filter_char(&self.catalog),
            KeyCode::Char(character) if !control => self.menu.push_filter_char(character, &self.catalog),
            _ => {}
        }
        Vec::new()
    }

    /// Keys the palette consumes. Anything else falls through to the composer.
    fn handle_slash_key(&mut self, key: KeyEvent) -> Option<Vec<Effect>> {
        match key.code {
            KeyCode::Esc => {
                self.slash.dismiss();
                Some(Vec::new())
            }
            KeyCode::Up => {
                self.slash.move_up();
                Some(Vec::new())
            }
            KeyCode::Down => {
                self.slash.move_down(&self.catalog);
                Some(Vec::new())
            }
            KeyCode::Enter => {
                let effect = self.slash.choose(&self.catalog)?;
                self.composer.clear();
                self.slash.dismiss();
                Some(vec![effect])
            }
            _ => None,
        }
    }

    fn handle_composer_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::Char('w') if control => return self.menu.toggle(&mut self.catalog),
            KeyCode::Char('o') if alt => return self.open_latest_link(),
            KeyCode::Char('c') if alt => return self.copy_latest_link(),
            KeyCode::Char('s') if alt => return self.save_latest_file(),
            KeyCode::PageUp => self.transcript.scroll_up(TRANSCRIPT_PAGE),
            KeyCode::PageDown => self.transcript.scroll_down(TRANSCRIPT_PAGE),
            KeyCode::Enter if !self.composer.is_empty() => {
                self.toasts
                    .info("Chat messages are sent from the chat client. Start with / to run a workflow.");
                self.composer.clear();
            }
            KeyCode::Left => self.composer.move_left(),
            KeyCode::Right => self.composer.move_right(),
            KeyCode::Home => self.composer.move_home(),
            KeyCode::End => self.composer.move_end(),
            KeyCode::Backspace => self.composer.backspace(),
            KeyCode::Delete => self.composer.delete(),
            KeyCode::Esc => self.composer.clear(),
            KeyCode::Char(character) if !control && !alt => self.composer.insert_char(character),
            _ => return Vec::new(),
        }
        self.slash.sync(self.composer.input(), &mut self.catalog)
    }

    fn open_latest_link(&mut self) -> Vec<Effect> {
        match self.transcript.latest_download().and_then(|entry| entry.download.as_ref()) {
            Some(link) => vec![Effect::OpenLink(link.resolve(&self.base_url))],
            None => {
                self.toasts.info("No file to open yet");
                Vec::new()
            }
        }
    }

    fn copy_latest_link(&mut self) -> Vec<Effect> {
        match self.transcript.latest_download().and_then(|entry| entry.download.as_ref()) {
            Some(link) => vec![Effect::CopyToClipboard(link.resolve(&self.base_url))],
            None => {
                self.toasts.info("No link to copy yet");
                Vec::new()
            }
        }
    }

    fn save_latest_file(&mut self) -> Vec<Effect> {
        let Some(entry) = self.transcript.latest_download() else {
            self.toasts.info("No file to save yet");
            return Vec::new();
        };
        match entry.download.as_ref() {
            Some(link) => vec![Effect::DownloadFile {
                url: link.url.clone(),
                file_name: entry.response.file_name.clone(),
            }],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd;
    use crate::ui::components::form::FormPhase;
    use crate::ui::components::menu::MenuPhase;
    use async_trait::async_trait;
    use hookflow_api::WebhookApiError;
    use hookflow_types::{FieldValue, FileAttachment, Severity, WebhookModel, WebhookResponse};
    use serde_json::{Map, Value, json};
    use std::sync::Mutex;

    type Invocation = (String, Map<String, Value>, usize, Option<String>);

    /// In-memory backend recording every invocation.
    #[derive(Default)]
    struct FakeBackend {
        models: Vec<WebhookModel>,
        config: Option<WebhookConfig>,
        response: Option<WebhookResponse>,
        invocations: Mutex<Vec<Invocation>>,
        model_requests: Mutex<usize>,
    }

    #[async_trait]
    impl WorkflowBackend for FakeBackend {
        async fn webhook_models(&self) -> Vec<WebhookModel> {
            *self.model_requests.lock().unwrap() += 1;
            self.models.clone()
        }

        async fn webhook_config(&self, model_id: &str) -> Result<WebhookConfig, WebhookApiError> {
            self.config.clone().ok_or_else(|| WebhookApiError::ConfigFetch {
                status: Some(404),
                message: format!("Model {model_id} not found"),
            })
        }

        async fn invoke(
            &self,
            model_id: &str,
            form_data: Map<String, Value>,
            chat_id: Option<&str>,
        ) -> Result<WebhookResponse, WebhookApiError> {
            self.record(model_id, form_data, 0, chat_id);
            self.respond()
        }

        async fn invoke_with_files(
            &self,
            model_id: &str,
            form_data: Map<String, Value>,
            files: Vec<FileAttachment>,
            chat_id: Option<&str>,
        ) -> Result<WebhookResponse, WebhookApiError> {
            self.record(model_id, form_data, files.len(), chat_id);
            self.respond()
        }

        async fn download(&self, _url: &str) -> Result<Vec<u8>, WebhookApiError> {
            Ok(b"report".to_vec())
        }
    }

    impl FakeBackend {
        fn record(&self, model_id: &str, form_data: Map<String, Value>, files: usize, chat_id: Option<&str>) {
            self.invocations
                .lock()
                .unwrap()
                .push((model_id.to_string(), form_data, files, chat_id.map(str::to_string)));
        }

        fn respond(&self) -> Result<WebhookResponse, WebhookApiError> {
            self.response.clone().ok_or_else(|| WebhookApiError::Invocation {
                status: Some(400),
                message: "bad input".into(),
            })
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(character: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(character), KeyModifiers::CONTROL)
    }

    fn alt(character: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(character), KeyModifiers::ALT)
    }

    fn model(id: &str, name: &str, command: Option<&str>) -> WebhookModel {
        WebhookModel {
            id: id.into(),
            name: name.into(),
            slash_command: command.map(str::to_string),
            form_title: None,
        }
    }

    fn config(workflow_only: bool) -> WebhookConfig {
        serde_json::from_value(json!({
            "enabled": true,
            "workflow_only": workflow_only,
            "form_title": "Run X",
            "form_fields": [{ "name": "x", "label": "X", "type": "text", "required": true }]
        }))
        .unwrap()
    }

    fn app_with(backend: FakeBackend) -> (App, Arc<FakeBackend>) {
        let backend = Arc::new(backend);
        let options = TuiOptions {
            chat_id: Some("chat-9".into()),
            base_url: "https://chat.example.com/api/v1".into(),
            ..Default::default()
        };
        (App::new(backend.clone(), &options), backend)
    }

    /// Run effects through `cmd` and feed results back until nothing is pending.
    async fn settle(app: &mut App, mut effects: Vec<Effect>) {
        while !effects.is_empty() {
            let context = cmd::EffectContext::from_app(app);
            let mut next = Vec::new();
            for effect in effects.drain(..) {
                let msg = cmd::run_effect(context.clone(), effect).await;
                next.extend(app.update(&msg));
            }
            effects = next;
        }
    }

    fn type_text(app: &mut App, text: &str) -> Vec<Effect> {
        text.chars().flat_map(|c| app.handle_key(key(KeyCode::Char(c)))).collect()
    }

    #[tokio::test]
    async fn required_field_blocks_then_submits_and_closes() {
        let (mut app, backend) = app_with(FakeBackend {
            models: vec![model("m", "Model M", None)],
            config: Some(config(false)),
            response: Some(WebhookResponse {
                success: true,
                message: Some("ok".into()),
                ..Default::default()
            }),
            ..Default::default()
        });

        let effects = app.handle_key(ctrl('w'));
        assert_eq!(effects, vec![Effect::LoadWebhookModels]);
        assert_eq!(app.menu.phase(), MenuPhase::Loading);
        settle(&mut app, effects).await;
        assert_eq!(app.menu.phase(), MenuPhase::Populated);

        let effects = app.handle_key(key(KeyCode::Enter));
        settle(&mut app, effects).await;
        assert_eq!(app.form.phase(), FormPhase::Editing);
        assert_eq!(app.form.title(), "Run X");

        let effects = app.handle_key(ctrl('s'));
        assert!(effects.is_empty());
        assert_eq!(app.form.errors().get("x").map(String::as_str), Some("X is required"));
        assert!(backend.invocations.lock().unwrap().is_empty());

        type_text(&mut app, "5");
        let effects = app.handle_key(ctrl('s'));
        assert_eq!(app.form.phase(), FormPhase::Submitting);
        settle(&mut app, effects).await;

        let invocations = backend.invocations.lock().unwrap().clone();
        assert_eq!(invocations.len(), 1);
        let (model_id, form_data, files, chat_id) = &invocations[0];
        assert_eq!(model_id, "m");
        assert_eq!(Value::Object(form_data.clone()), json!({ "x": "5" }));
        assert_eq!(*files, 0);
        assert_eq!(chat_id.as_deref(), Some("chat-9"));

        assert!(!app.form.is_open());
        let toast = app.toasts.latest().unwrap();
        assert_eq!((toast.severity, toast.message.as_str()), (Severity::Success, "ok"));
        assert_eq!(app.transcript.entries().len(), 1);
        assert_eq!(app.transcript.entries()[0].title, "Run X");
    }

    #[tokio::test]
    async fn backend_errors_keep_the_form_open() {
        let (mut app, _backend) = app_with(FakeBackend {
            config: Some(config(true)),
            ..Default::default()
        });
        let effects = app.startup_effects(Some("m"));
        settle(&mut app, effects).await;
        assert!(app.form.is_open());

        type_text(&mut app, "5");
        let effects = app.handle_key(ctrl('s'));
        settle(&mut app, effects).await;

        assert_eq!(app.form.phase(), FormPhase::Editing);
        let toast = app.toasts.latest().unwrap();
        assert_eq!((toast.severity, toast.message.as_str()), (Severity::Error, "bad input"));
        assert!(app.transcript.is_empty());
    }

    #[tokio::test]
    async fn model_list_is_fetched_once() {
        let (mut app, backend) = app_with(FakeBackend {
            models: vec![model("m", "Model M", Some("/report"))],
            ..Default::default()
        });
        let effects = app.handle_key(ctrl('w'));
        settle(&mut app, effects).await;
        app.handle_key(key(KeyCode::Esc));
        assert!(app.handle_key(ctrl('w')).is_empty());
        app.handle_key(key(KeyCode::Esc));

        assert!(type_text(&mut app, "/rep").is_empty());
        assert_eq!(app.slash.matches(&app.catalog).len(), 1);
        assert_eq!(*backend.model_requests.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn slash_selection_opens_the_form_and_clears_the_composer() {
        let (mut app, _backend) = app_with(FakeBackend {
            models: vec![model("m", "Model M", Some("/report")), model("n", "Other", None)],
            config: Some(config(false)),
            ..Default::default()
        });
        let effects = type_text(&mut app, "/");
        assert_eq!(effects, vec![Effect::LoadWebhookModels]);
        settle(&mut app, effects).await;
        type_text(&mut app, "rep");

        let effects = app.handle_key(key(KeyCode::Enter));
        assert!(matches!(
            effects.as_slice(),
            [Effect::FetchWebhookConfig { model_id, origin: ConfigOrigin::Slash { .. }, .. }] if model_id == "m"
        ));
        assert!(app.composer.is_empty());
        settle(&mut app, effects).await;
        assert!(app.form.is_open());
    }

    #[tokio::test]
    async fn slash_arguments_prefill_the_form() {
        let (mut app, _backend) = app_with(FakeBackend {
            models: vec![model("m", "Model M", Some("/report"))],
            config: Some(config(false)),
            ..Default::default()
        });
        let effects = type_text(&mut app, "/");
        settle(&mut app, effects).await;
        type_text(&mut app, "report x=42 colour=red");
        assert_eq!(app.slash.matches(&app.catalog).len(), 1);

        let effects = app.handle_key(key(KeyCode::Enter));
        settle(&mut app, effects).await;
        assert!(app.form.is_open());
        assert_eq!(app.form.value("x"), Some(&FieldValue::Text("42".into())));
        assert_eq!(app.toasts.latest().unwrap().message, "Ignored: colour");

        let Some(Effect::SubmitForm(request)) = app.handle_key(ctrl('s')).pop() else { panic!("expected a submission") };
        assert_eq!(request.form_data["x"], Value::String("42".into()));
    }

    #[tokio::test]
    async fn active_chat_model_only_shows_a_hint() {
        let (mut app, _backend) = app_with(FakeBackend {
            config: Some(config(false)),
            ..Default::default()
        });
        let effects = app.startup_effects(Some("m"));
        settle(&mut app, effects).await;
        assert!(!app.form.is_open());
        assert_eq!(app.toasts.latest().unwrap().severity, Severity::Info);
    }

    #[test]
    fn disabled_configs_are_ignored() {
        let (mut app, _backend) = app_with(FakeBackend::default());
        app.update(&Msg::WebhookConfigLoaded {
            model_id: "m".into(),
            model_name: None,
            origin: ConfigOrigin::Menu,
            config: WebhookConfig::default(),
        });
        assert!(!app.form.is_open());
        assert!(app.toasts.is_empty());
    }

    #[test]
    fn config_failures_surface_as_toasts() {
        let (mut app, _backend) = app_with(FakeBackend::default());
        app.update(&Msg::WebhookConfigFailed {
            model_id: "m".into(),
            message: "Model not found".into(),
        });
        let toast = app.toasts.latest().unwrap();
        assert_eq!((toast.severity, toast.message.as_str()), (Severity::Error, "Model not found"));
    }

    #[test]
    fn escape_during_submission_makes_the_result_stale() {
        let (mut app, _backend) = app_with(FakeBackend::default());
        app.update(&Msg::WebhookConfigLoaded {
            model_id: "m".into(),
            model_name: Some("Model M".into()),
            origin: ConfigOrigin::Menu,
            config: config(false),
        });
        type_text(&mut app, "5");
        let effects = app.handle_key(ctrl('s'));
        let [Effect::SubmitForm(request)] = effects.as_slice() else {
            panic!("expected a submission");
        };
        assert!(app.handle_key(ctrl('s')).is_empty());

        app.handle_key(key(KeyCode::Esc));
        app.update(&Msg::SubmissionFinished {
            session: request.session,
            title: request.title.clone(),
            outcome: Ok(WebhookResponse {
                success: true,
                ..Default::default()
            }),
        });
        assert!(app.transcript.is_empty());
        assert!(app.toasts.is_empty());
    }

    #[test]
    fn download_keys_use_the_latest_link() {
        let (mut app, _backend) = app_with(FakeBackend::default());
        assert!(app.handle_key(alt('o')).is_empty());
        assert_eq!(app.toasts.latest().unwrap().severity, Severity::Info);

        app.transcript.push(TranscriptEntry::new(
            "Report",
            WebhookResponse {
                success: true,
                file_url: Some("/files/r.pdf".into()),
                file_name: Some("r.pdf".into()),
                ..Default::default()
            },
        ));
        assert_eq!(
            app.handle_key(alt('o')),
            vec![Effect::OpenLink("https://chat.example.com/files/r.pdf".into())]
        );
        assert_eq!(
            app.handle_key(alt('c')),
            vec![Effect::CopyToClipboard("https://chat.example.com/files/r.pdf".into())]
        );
        assert_eq!(
            app.handle_key(alt('s')),
            vec![Effect::DownloadFile {
                url: "/files/r.pdf".into(),
                file_name: Some("r.pdf".into()),
            }]
        );
        assert!(app.composer.is_empty());
    }

    #[test]
    fn plain_letters_always_reach_the_composer() {
        let (mut app, _backend) = app_with(FakeBackend::default());
        app.transcript.push(TranscriptEntry::new(
            "Report",
            WebhookResponse {
                success: true,
                file_url: Some("/files/r.pdf".into()),
                ..Default::default()
            },
        ));
        assert!(app.handle_key(key(KeyCode::Char('o'))).is_empty());
        assert!(app.handle_key(key(KeyCode::Char('s'))).is_empty());
        assert_eq!(app.composer.input(), "os");
    }

    #[test]
    fn browser_failures_suggest_copying_the_link() {
        let (mut app, _backend) = app_with(FakeBackend::default());
        app.update(&Msg::LinkOpened(Err("no browser".into())));
        let toast = app.toasts.latest().unwrap();
        assert_eq!(toast.severity, Severity::Error);
        assert!(toast.message.contains("no browser"));

        app.update(&Msg::LinkOpened(Ok(())));
        assert_eq!(app.toasts.latest().unwrap().severity, Severity::Info);
    }

    #[tokio::test]
    async fn downloads_land_in_the_configured_directory() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::default());
        let options = TuiOptions {
            base_url: "http://localhost".into(),
            download_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let mut app = App::new(backend, &options);
        settle(
            &mut app,
            vec![Effect::DownloadFile {
                url: "/files/out.txt".into(),
                file_name: None,
            }],
        )
        .await;
        assert_eq!(std::fs::read(dir.path().join("out.txt")).unwrap(), b"report");
        assert_eq!(app.toasts.latest().unwrap().severity, Severity::Success);
    }
}
