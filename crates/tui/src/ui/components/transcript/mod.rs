//! Transcript of completed workflow runs and their rendered responses.

mod state;
mod view;

pub use state::{TranscriptEntry, TranscriptState};
pub use view::draw_transcript;
