//! UI components. Each component keeps its state machine in `state.rs` (pure,
//! unit tested) and its drawing code in `view.rs`.

pub mod catalog;
pub mod common;
pub mod form;
pub mod menu;
pub mod slash;
pub mod toast;
pub mod transcript;

pub use catalog::ModelCatalog;
pub use form::FormModalState;
pub use menu::WorkflowMenuState;
pub use slash::SlashPaletteState;
pub use toast::ToastStack;
pub use transcript::TranscriptState;
