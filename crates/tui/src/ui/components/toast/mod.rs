//! Transient notifications stacked in the bottom-right corner.

mod state;
mod view;

pub use state::{TOAST_TICKS, Toast, ToastStack};
pub use view::draw_toasts;
