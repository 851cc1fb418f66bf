//! Helpers shared by the Hookflow front ends: configuration and credential
//! resolution, response classification, and Markdown sanitizing.

pub mod config;
pub mod markdown;
pub mod path_processing;
pub mod response;
pub mod text_processing;

pub use config::{ClientConfig, ConfigError, default_config_path, delete_stored_token, resolve_token, store_token, stored_token};
pub use markdown::{InlineSpan, MarkdownLine, markdown_blocks, sanitize_markdown};
pub use path_processing::{download_file_name, expand_tilde, unique_destination};
pub use response::{DownloadLink, PLACEHOLDER, ResponseView, classify, format_scalar, render_plain};
pub use text_processing::redact_sensitive;
