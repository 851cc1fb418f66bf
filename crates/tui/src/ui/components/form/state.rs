//! Explicit state machine behind the form modal.
//!
//! ```text
//! Closed ──open──▶ Initializing ──seeded──▶ Editing ──submit (valid)──▶ Submitting
//!   ▲                                         ▲  │                          │
//!   │                                         │  └─submit (invalid)─┐       │
//!   │                                         └─────────────────────┘       │
//!   │                                         ◀── success=false / error ────┤
//!   └──────────────────────── close / success=true ◀────────────────────────┘
//! ```
//!
//! Every `open` allocates a new session number. Submission results carry the
//! session they were issued for, so a response that arrives after the modal
//! was closed or reopened is recognized as stale and dropped.

use hookflow_types::{
    FieldErrors, FieldType, FieldValue, FileAttachment, FormValues, InlineArguments, SubmissionMode, SubmitRequest, WebhookConfig,
    WebhookResponse, WorkflowFormField, apply_inline_arguments, collect_files, collect_form_data, matches_accept, seed_form_values,
    submission_mode, validate_required,
};
use hookflow_util::expand_tilde;
use tracing::{debug, info};

use crate::ui::components::common::TextInputState;

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Workflow executed successfully";
pub const DEFAULT_FAILURE_MESSAGE: &str = "Workflow failed";
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormPhase {
    #[default]
    Closed,
    Initializing,
    Editing,
    Submitting,
}

/// What the app should do with a finished submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionResolution {
    /// The result belongs to a closed or replaced form session.
    Stale,
    /// The workflow succeeded; the modal closed.
    Completed {
        title: String,
        response: WebhookResponse,
        toast: String,
    },
    /// The workflow or the transport failed; the modal is editable again.
    Rejected { message: String },
}

#[derive(Debug, Default)]
pub struct FormModalState {
    phase: FormPhase,
    session: u64,
    model_id: String,
    title: String,
    description: Option<String>,
    fields: Vec<WorkflowFormField>,
    values: FormValues,
    /// One editor per field: the value of text-like fields, the path being
    /// typed for file fields. Unused for selects.
    editors: Vec<TextInputState>,
    errors: FieldErrors,
    /// Index into `fields`; `fields.len()` is the submit row.
    focus: usize,
    mode: Option<SubmissionMode>,
    chat_id: Option<String>,
}

impl FormModalState {
    /// Open the modal for a model, discarding anything left from a previous
    /// session.
    pub fn open(&mut self, model_id: &str, title: &str, config: &WebhookConfig, chat_id: Option<String>) {
        self.phase = FormPhase::Initializing;
        self.session += 1;
        self.model_id = model_id.to_string();
        self.title = title.to_string();
        self.description = config.form_description.clone().filter(|text| !text.trim().is_empty());
        self.fields = config.form_fields.clone();
        self.values = seed_form_values(&self.fields);
        self.editors = self
            .fields
            .iter()
            .map(|field| {
                if field.is_file() {
                    TextInputState::default()
                } else {
                    TextInputState::with_text(field.initial_text())
                }
            })
            .collect();
        self.errors.clear();
        self.focus = 0;
        self.mode = Some(submission_mode(&self.fields));
        self.chat_id = chat_id;
        self.phase = FormPhase::Editing;
        debug!(model_id, session = self.session, fields = self.fields.len(), "opened workflow form");
    }

    /// Overwrite seeded values with arguments typed after a slash command.
    /// Returns the argument keys that matched no usable field.
    pub fn prefill(&mut self, arguments: &InlineArguments) -> Vec<String> {
        if self.phase != FormPhase::Editing {
            return Vec::new();
        }
        let skipped = apply_inline_arguments(&self.fields, &mut self.values, arguments);
        for (field, editor) in self.fields.iter().zip(self.editors.iter_mut()) {
            if let Some(text) = self.values.get(&field.name).and_then(FieldValue::as_text) {
                *editor = TextInputState::with_text(text.to_string());
            }
        }
        skipped
    }

    /// Discard the form. A submission still in flight becomes stale.
    pub fn close(&mut self) {
        self.phase = FormPhase::Closed;
        self.fields.clear();
        self.values.clear();
        self.editors.clear();
        self.errors.clear();
        self.mode = None;
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase != FormPhase::Closed
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == FormPhase::Submitting
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn fields(&self) -> &[WorkflowFormField] {
        &self.fields
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn editor(&self, index: usize) -> Option<&TextInputState> {
        self.editors.get(index)
    }

    pub fn mode(&self) -> Option<SubmissionMode> {
        self.mode
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn is_submit_focused(&self) -> bool {
        self.focus == self.fields.len()
    }

    pub fn focused_field(&self) -> Option<&WorkflowFormField> {
        self.fields.get(self.focus)
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % (self.fields.len() + 1);
    }

    pub fn focus_prev(&mut self) {
        let slots = self.fields.len() + 1;
        self.focus = (self.focus + slots - 1) % slots;
    }

    /// Type a character into the focused field.
    pub fn insert_char(&mut self, character: char) {
        let Some(field_type) = self.editable_field_type() else { return };
        let accepted = match field_type {
            FieldType::Select => false,
            FieldType::Number => character.is_ascii_digit() || matches!(character, '.' | '-' | '+' | 'e' | 'E'),
            FieldType::Date => character.is_ascii_digit() || matches!(character, '-' | '/' | '.'),
            FieldType::Text | FieldType::Textarea | FieldType::File => !character.is_control(),
        };
        if accepted {
            self.edit_focused(|editor| editor.insert_char(character));
        }
    }

    /// Insert a line break into a focused textarea. Returns `false` for other
    /// field types.
    pub fn insert_newline(&mut self) -> bool {
        if self.editable_field_type() != Some(FieldType::Textarea) {
            return false;
        }
        self.edit_focused(|editor| editor.insert_char('\n'));
        true
    }

    pub fn backspace(&mut self) {
        if self.editable_field_type().is_some_and(|kind| kind != FieldType::Select) {
            self.edit_focused(TextInputState::backspace);
        }
    }

    pub fn delete_char(&mut self) {
        if self.editable_field_type().is_some_and(|kind| kind != FieldType::Select) {
            self.edit_focused(TextInputState::delete);
        }
    }

    pub fn move_cursor_left(&mut self) {
        if let Some(editor) = self.editors.get_mut(self.focus) {
            editor.move_left();
        }
    }

    pub fn move_cursor_right(&mut self) {
        if let Some(editor) = self.editors.get_mut(self.focus) {
            editor.move_right();
        }
    }

    /// Step through a select field's options. Selects without options are
    /// edited as free text instead.
    pub fn cycle_option(&mut self, forward: bool) -> bool {
        if self.phase != FormPhase::Editing {
            return false;
        }
        let Some(field) = self.fields.get(self.focus).filter(|field| field.field_type == FieldType::Select) else {
            return false;
        };
        if field.options.is_empty() {
            return false;
        }
        let options = &field.options;
        let current = self
            .values
            .get(&field.name)
            .and_then(FieldValue::as_text)
            .and_then(|value| options.iter().position(|option| option == value));
        let next = match (current, forward) {
            (Some(index), true) => (index + 1) % options.len(),
            (Some(index), false) => (index + options.len() - 1) % options.len(),
            (None, true) => 0,
            (None, false) => options.len() - 1,
        };
        let name = field.name.clone();
        let value = options[next].clone();
        self.errors.shift_remove(&name);
        self.values.insert(name, FieldValue::Text(value));
        true
    }

    /// Attach the file whose path was typed into the focused file field.
    pub fn add_file_from_entry(&mut self) -> bool {
        if self.phase != FormPhase::Editing || !self.focused_field().is_some_and(WorkflowFormField::is_file) {
            return false;
        }
        let Some(entry) = self.editors.get(self.focus).map(|editor| editor.input().trim().to_string()) else {
            return false;
        };
        if entry.is_empty() {
            return false;
        }
        let path = expand_tilde(&entry);
        match FileAttachment::from_path(&path) {
            Ok(attachment) => {
                let index = self.focus;
                if self.attach(index, attachment).is_ok()
                    && let Some(editor) = self.editors.get_mut(index)
                {
                    editor.clear();
                }
            }
            Err(error) => {
                let name = self.fields[self.focus].name.clone();
                self.errors.insert(name, error.to_string());
            }
        }
        true
    }

    /// Attach a file to the file field at `index`, enforcing its accept
    /// filter. Single-file fields replace their current file.
    pub fn attach(&mut self, index: usize, attachment: FileAttachment) -> Result<(), String> {
        let Some(field) = self.fields.get(index).filter(|field| field.is_file()) else {
            return Err("not a file field".to_string());
        };
        let name = field.name.clone();
        if let Some(accept) = field.accept_filter()
            && !matches_accept(&attachment.file_name, &attachment.content_type, accept)
        {
            let message = format!("{} is not an accepted file type ({accept})", attachment.file_name);
            self.errors.insert(name, message.clone());
            return Err(message);
        }
        let multiple = field.allows_multiple();
        let slot = self.values.entry(name.clone()).or_insert_with(|| FieldValue::Files(Vec::new()));
        if !matches!(slot, FieldValue::Files(_)) {
            *slot = FieldValue::Files(Vec::new());
        }
        if let FieldValue::Files(files) = slot {
            if !multiple {
                files.clear();
            }
            files.push(attachment);
        }
        self.errors.shift_remove(&name);
        Ok(())
    }

    /// Remove the most recently attached file of the focused file field.
    pub fn remove_last_file(&mut self) -> bool {
        if self.phase != FormPhase::Editing {
            return false;
        }
        let Some(name) = self.focused_field().filter(|field| field.is_file()).map(|field| field.name.clone()) else {
            return false;
        };
        match self.values.get_mut(&name) {
            Some(FieldValue::Files(files)) => files.pop().is_some(),
            _ => false,
        }
    }

    /// Validate and, when every required field is filled, move to
    /// `Submitting` and return the request to send.
    ///
    /// Returns `None` while a submission is already in flight or when
    /// validation fails (errors are then available via [`Self::errors`]).
    pub fn submit(&mut self) -> Option<SubmitRequest> {
        if self.phase != FormPhase::Editing {
            return None;
        }
        self.errors = validate_required(&self.fields, &self.values);
        if !self.errors.is_empty() {
            debug!(missing = self.errors.len(), "form submission blocked by validation");
            if let Some(first) = self.fields.iter().position(|field| self.errors.contains_key(&field.name)) {
                self.focus = first;
            }
            return None;
        }

        let mode = submission_mode(&self.fields);
        let request = SubmitRequest {
            session: self.session,
            model_id: self.model_id.clone(),
            title: self.title.clone(),
            mode,
            form_data: collect_form_data(&self.fields, &self.values),
            files: collect_files(&self.fields, &self.values),
            chat_id: self.chat_id.clone(),
        };
        self.phase = FormPhase::Submitting;
        info!(model_id = %self.model_id, session = self.session, ?mode, "submitting workflow form");
        Some(request)
    }

    /// Apply the outcome of a submission.
    pub fn submission_finished(&mut self, session: u64, outcome: &Result<WebhookResponse, String>) -> SubmissionResolution {
        if self.phase != FormPhase::Submitting || session != self.session {
            debug!(session, current = self.session, "ignoring stale workflow response");
            return SubmissionResolution::Stale;
        }
        match outcome {
            Ok(response) if response.success => {
                let toast = non_blank(response.message.as_deref()).unwrap_or(DEFAULT_SUCCESS_MESSAGE).to_string();
                let title = self.title.clone();
                self.close();
                SubmissionResolution::Completed {
                    title,
                    response: response.clone(),
                    toast,
                }
            }
            Ok(response) => {
                self.phase = FormPhase::Editing;
                SubmissionResolution::Rejected {
                    message: non_blank(response.message.as_deref()).unwrap_or(DEFAULT_FAILURE_MESSAGE).to_string(),
                }
            }
            Err(error) => {
                self.phase = FormPhase::Editing;
                SubmissionResolution::Rejected {
                    message: non_blank(Some(error)).unwrap_or(DEFAULT_ERROR_MESSAGE).to_string(),
                }
            }
        }
    }

    fn editable_field_type(&self) -> Option<FieldType> {
        if self.phase != FormPhase::Editing {
            return None;
        }
        self.fields.get(self.focus).map(|field| {
            if field.field_type == FieldType::Select && field.options.is_empty() {
                FieldType::Text
            } else {
                field.field_type
            }
        })
    }

    /// Apply an edit to the focused editor and mirror it into the value map.
    fn edit_focused(&mut self, edit: impl FnOnce(&mut TextInputState)) {
        let Some(editor) = self.editors.get_mut(self.focus) else { return };
        edit(editor);
        let Some(field) = self.fields.get(self.focus) else { return };
        if !field.is_file() {
            self.values.insert(field.name.clone(), FieldValue::Text(editor.input().to_string()));
            self.errors.shift_remove(&field.name);
        }
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|text| !text.trim().is_empty())
}
