//! Slash-command palette shown above the composer while its input starts
//! with `/`.

mod state;
mod view;

pub use state::SlashPaletteState;
pub use view::draw_slash_palette;
