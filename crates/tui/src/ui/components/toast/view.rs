use hookflow_types::Severity;
use ratatui::{prelude::*, widgets::*};

use super::ToastStack;
use crate::theme;

const TOAST_WIDTH: u16 = 44;

/// Draw toasts bottom-right, newest at the bottom.
pub fn draw_toasts(frame: &mut Frame, area: Rect, toasts: &ToastStack) {
    let width = TOAST_WIDTH.min(area.width);
    let inner_width = width.saturating_sub(2).max(1) as usize;
    let mut bottom = area.bottom();

    for toast in toasts.iter().collect::<Vec<_>>().into_iter().rev() {
        let lines = wrapped_line_count(&toast.message, inner_width).min(4);
        let height = lines + 2;
        if bottom < area.y + height {
            break;
        }
        let rect = Rect::new(area.right().saturating_sub(width), bottom - height, width, height);
        let glyph = match toast.severity {
            Severity::Success => "✓",
            Severity::Info => "ℹ",
            Severity::Error => "✗",
        };
        let style = theme::toast_style(toast.severity);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(style)
            .title(Span::styled(format!(" {glyph} "), style))
            .style(theme::panel_style());
        frame.render_widget(Clear, rect);
        frame.render_widget(
            Paragraph::new(toast.message.as_str())
                .style(theme::text_style())
                .wrap(Wrap { trim: true })
                .block(block),
            rect,
        );
        bottom -= height;
    }
}

fn wrapped_line_count(message: &str, width: usize) -> u16 {
    let chars = message.chars().count().max(1);
    chars.div_ceil(width) as u16
}
