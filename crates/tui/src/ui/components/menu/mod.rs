//! Workflow discovery menu (`Ctrl+W`).

mod state;
mod view;

pub use state::{MenuPhase, WorkflowMenuState};
pub use view::draw_menu;
