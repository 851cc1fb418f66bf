//! Markdown handling for messages returned by external automation services.
//!
//! Messages are untrusted. [`sanitize_markdown`] removes raw HTML and
//! terminal control sequences while leaving Markdown syntax alone;
//! [`markdown_blocks`] then splits the text into lines a terminal renderer can
//! style without a full CommonMark implementation.

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?(?:</script\s*>|\z)").unwrap());
static STYLE_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?(?:</style\s*>|\z)").unwrap());
static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?(?:-->|\z)").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?[A-Za-z][A-Za-z0-9-]*(?:\s[^<>]*)?/?>").unwrap());
static QUOTE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ \t]*(?:>[ \t]?)*").unwrap());

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.*?)\s*#*\s*$").unwrap());
static RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:(?:-\s*){3,}|(?:\*\s*){3,}|(?:_\s*){3,})$").unwrap());
static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[-*+]\s+(.*)$").unwrap());
static NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d{1,9})[.)]\s+(.*)$").unwrap());
static QUOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*>\s?(.*)$").unwrap());
static FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:```|~~~)").unwrap());
static INLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`([^`]+)`|\*\*([^*]+?)\*\*|\*([^*\s](?:[^*]*[^*\s])?)\*|\b_([^_]+)_\b").unwrap());

/// Styled run of text within a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineSpan {
    Text(String),
    Bold(String),
    Emphasis(String),
    Code(String),
}

impl InlineSpan {
    pub fn text(&self) -> &str {
        match self {
            InlineSpan::Text(text) | InlineSpan::Bold(text) | InlineSpan::Emphasis(text) | InlineSpan::Code(text) => text,
        }
    }
}

/// One rendered line of a Markdown message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkdownLine {
    Heading { level: u8, spans: Vec<InlineSpan> },
    Bullet(Vec<InlineSpan>),
    Numbered { number: String, spans: Vec<InlineSpan> },
    Quote(Vec<InlineSpan>),
    /// A line inside a fenced code block, verbatim.
    Code(String),
    Rule,
    Paragraph(Vec<InlineSpan>),
    Blank,
}

impl MarkdownLine {
    /// Plain-text rendering with list and quote markers but no styling.
    pub fn to_plain(&self) -> String {
        let join = |spans: &[InlineSpan]| spans.iter().map(InlineSpan::text).collect::<String>();
        match self {
            MarkdownLine::Heading { spans, .. } | MarkdownLine::Paragraph(spans) => join(spans),
            MarkdownLine::Bullet(spans) => format!("• {}", join(spans)),
            MarkdownLine::Numbered { number, spans } => format!("{number}. {}", join(spans)),
            MarkdownLine::Quote(spans) => format!("│ {}", join(spans)),
            MarkdownLine::Code(line) => format!("    {line}"),
            MarkdownLine::Rule => "─".repeat(24),
            MarkdownLine::Blank => String::new(),
        }
    }
}

/// Remove raw HTML and control characters from untrusted Markdown.
///
/// `<script>`/`<style>` blocks are dropped with their content, comments and
/// remaining tags are removed, and any `<`/`>` left over is escaped as an
/// entity. Leading `>` quote markers are kept.
pub fn sanitize_markdown(input: &str) -> String {
    let without_controls: String = input
        .chars()
        .filter(|ch| !ch.is_control() || matches!(ch, '\n' | '\t'))
        .collect();
    let stripped = SCRIPT_BLOCK.replace_all(&without_controls, "");
    let stripped = STYLE_BLOCK.replace_all(&stripped, "");
    let stripped = COMMENT.replace_all(&stripped, "");
    let stripped = TAG.replace_all(&stripped, "");

    stripped
        .split('\n')
        .map(|line| {
            let prefix_len = QUOTE_PREFIX.find(line).map(|m| m.end()).unwrap_or(0);
            let (prefix, rest) = line.split_at(prefix_len);
            format!("{prefix}{}", rest.replace('<', "&lt;").replace('>', "&gt;"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Classify each line of (already sanitized) Markdown.
pub fn markdown_blocks(input: &str) -> Vec<MarkdownLine> {
    let mut lines = Vec::new();
    let mut in_fence = false;
    for line in input.lines() {
        if FENCE.is_match(line) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            lines.push(MarkdownLine::Code(decode_entities(line)));
            continue;
        }
        if line.trim().is_empty() {
            lines.push(MarkdownLine::Blank);
        } else if let Some(captures) = HEADING.captures(line) {
            lines.push(MarkdownLine::Heading {
                level: captures[1].len() as u8,
                spans: inline_spans(&captures[2]),
            });
        } else if RULE.is_match(line) {
            lines.push(MarkdownLine::Rule);
        } else if let Some(captures) = BULLET.captures(line) {
            lines.push(MarkdownLine::Bullet(inline_spans(&captures[1])));
        } else if let Some(captures) = NUMBERED.captures(line) {
            lines.push(MarkdownLine::Numbered {
                number: captures[1].to_string(),
                spans: inline_spans(&captures[2]),
            });
        } else if let Some(captures) = QUOTE.captures(line) {
            lines.push(MarkdownLine::Quote(inline_spans(&captures[1])));
        } else {
            lines.push(MarkdownLine::Paragraph(inline_spans(line.trim_end())));
        }
    }
    lines
}

/// Split a line into bold, emphasis, code, and plain runs.
pub fn inline_spans(text: &str) -> Vec<InlineSpan> {
    let mut spans = Vec::new();
    let mut last = 0;
    for captures in INLINE.captures_iter(text) {
        let Some(whole) = captures.get(0) else { continue };
        if whole.start() > last {
            spans.push(InlineSpan::Text(decode_entities(&text[last..whole.start()])));
        }
        let span = if let Some(code) = captures.get(1) {
            InlineSpan::Code(decode_entities(code.as_str()))
        } else if let Some(bold) = captures.get(2) {
            InlineSpan::Bold(decode_entities(bold.as_str()))
        } else if let Some(emphasis) = captures.get(3).or_else(|| captures.get(4)) {
            InlineSpan::Emphasis(decode_entities(emphasis.as_str()))
        } else {
            InlineSpan::Text(decode_entities(whole.as_str()))
        };
        spans.push(span);
        last = whole.end();
    }
    if last < text.len() {
        spans.push(InlineSpan::Text(decode_entities(&text[last..])));
    }
    spans
}

/// Plain-text rendering of a whole message.
pub fn markdown_to_plain(input: &str) -> String {
    markdown_blocks(&sanitize_markdown(input))
        .iter()
        .map(MarkdownLine::to_plain)
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<").replace("&gt;", ">").replace("&amp;", "&")
}
