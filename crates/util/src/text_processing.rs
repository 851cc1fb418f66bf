//! # Text Processing Utilities
//!
//! Redaction of credential-looking values before text reaches a log file or
//! the terminal (error bodies echoed by the backend may include request
//! headers).

use once_cell::sync::Lazy;
use regex::Regex;

const REPLACEMENT: &str = "[REDACTED]";

static REDACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(authorization:\s*)([^\s,;]+(?:\s+[^\s,;]+)?)",
        r"(?i)(\bBearer\s+)([A-Za-z0-9\-._~+/]+=*)",
        r#"(?i)("(?:token|api_key|password|secret)"\s*:\s*")([^"]*)(")"#,
        r"(?i)([A-Z0-9_]*(?:KEY|TOKEN|SECRET|PASSWORD)=)([^\s]+)",
        r"\b(sk-)([A-Za-z0-9]{8,})",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Redacts values that look like secrets in a string.
///
/// Key names and surrounding punctuation are kept so the output stays useful
/// for debugging.
///
/// ```rust
/// use hookflow_util::redact_sensitive;
///
/// assert_eq!(redact_sensitive("HOOKFLOW_API_TOKEN=abc123"), "HOOKFLOW_API_TOKEN=[REDACTED]");
/// assert_eq!(redact_sensitive("Authorization: Bearer abc"), "Authorization: [REDACTED]");
/// ```
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in REDACT_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |captures: &regex::Captures| {
                let prefix = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                let suffix = captures.get(3).map(|m| m.as_str()).unwrap_or("");
                format!("{prefix}{REPLACEMENT}{suffix}")
            })
            .into_owned();
    }
    redacted
}
