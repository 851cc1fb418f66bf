//! Workflow form modal: collects a model's form fields, validates them, and
//! hands a [`SubmitRequest`](hookflow_types::SubmitRequest) to the runtime.

mod state;
mod view;

pub use state::{
    DEFAULT_ERROR_MESSAGE, DEFAULT_FAILURE_MESSAGE, DEFAULT_SUCCESS_MESSAGE, FormModalState, FormPhase, SubmissionResolution,
};
pub use view::draw_form_modal;
