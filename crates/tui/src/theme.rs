//! Theme and styling for the Hookflow TUI.
//!
//! A single dark palette with a teal accent. Components never build colors
//! directly; they go through the style helpers below so the look stays
//! consistent across the menu, form, transcript, and toasts.

use hookflow_types::Severity;
use ratatui::style::{Color, Modifier, Style};

/// Accent color for highlights, headings, and focus indicators.
pub const ACCENT: Color = Color::Rgb(38, 198, 178);

/// Primary foreground color for normal text.
pub const FG: Color = Color::Rgb(224, 224, 230);

/// Muted foreground color for hints, labels, and secondary information.
pub const FG_MUTED: Color = Color::Rgb(150, 150, 160);

/// Border color of unfocused panels.
pub const BORDER: Color = Color::Rgb(72, 72, 80);

/// Border color of the focused panel or field.
pub const BORDER_FOCUS: Color = ACCENT;

/// Background for panels, popups, and modals.
pub const BG_PANEL: Color = Color::Rgb(18, 18, 24);

/// Background of the focused input row.
pub const BG_HIGHLIGHT: Color = Color::Rgb(22, 36, 40);

/// Validation errors and error toasts.
pub const WARN: Color = Color::Rgb(220, 96, 110);

/// Success toasts and check glyphs.
pub const SUCCESS: Color = Color::Rgb(110, 200, 120);

/// Inline code spans and code blocks.
pub const CODE: Color = Color::Rgb(230, 190, 120);

/// Creates a border style based on focus state.
///
/// # Examples
///
/// ```rust,ignore
/// use crate::theme::border_style;
///
/// let focused_style = border_style(true); // ACCENT border
/// let normal_style = border_style(false); // BORDER
/// ```
pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(BORDER_FOCUS)
    } else {
        Style::default().fg(BORDER)
    }
}

/// Style for titles and headers: muted and bold.
pub fn title_style() -> Style {
    Style::default().fg(FG_MUTED).add_modifier(Modifier::BOLD)
}

/// Style for normal text content.
pub fn text_style() -> Style {
    Style::default().fg(FG)
}

/// Style for hints and secondary text.
pub fn text_muted() -> Style {
    Style::default().fg(FG_MUTED)
}

pub fn highlight_style() -> Style {
    // Used for focused input rows; keep a subtle background hint
    Style::default().fg(FG).bg(BG_HIGHLIGHT)
}

pub fn list_highlight_style() -> Style {
    // Used for list/table selection; emphasize via accent + bold, no fill
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn heading_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn code_style() -> Style {
    Style::default().fg(CODE)
}

pub fn error_style() -> Style {
    Style::default().fg(WARN)
}

pub fn panel_style() -> Style {
    Style::default().bg(BG_PANEL)
}

/// Border and text color of a toast.
pub fn toast_style(severity: Severity) -> Style {
    let color = match severity {
        Severity::Success => SUCCESS,
        Severity::Info => ACCENT,
        Severity::Error => WARN,
    };
    Style::default().fg(color).bg(BG_PANEL)
}
