use hookflow_types::{FieldType, FieldValue, format_size};
use ratatui::{prelude::*, widgets::*};

use super::{FormModalState, FormPhase};
use crate::theme;
use crate::ui::utils::centered_rect;

const TEXTAREA_ROWS: usize = 4;

/// Draw the modal centered over `area`.
pub fn draw_form_modal(frame: &mut Frame, area: Rect, form: &FormModalState) {
    let rect = centered_rect(70, 80, area);
    let block = Block::default()
        .title(Span::styled(format!(" {} ", form.title()), theme::heading_style()))
        .borders(Borders::ALL)
        .border_style(theme::border_style(true))
        .style(theme::panel_style());
    frame.render_widget(Clear, rect);
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let [body_area, hint_area] = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

    let (lines, focus_line) = form_lines(form, body_area.width as usize);
    let height = body_area.height as usize;
    let scroll = focus_line.saturating_sub(height.saturating_sub(4));
    frame.render_widget(Paragraph::new(lines).scroll((scroll as u16, 0)), body_area);

    let hint = match form.phase() {
        FormPhase::Submitting => "Submitting…  Esc cancel",
        _ if form.focused_field().is_some_and(|field| field.is_file()) => {
            "Enter attach path  Ctrl+D remove last  Tab next  Ctrl+S submit  Esc close"
        }
        _ if form.focused_field().is_some_and(|field| field.field_type == FieldType::Select && !field.options.is_empty()) => {
            "←/→ choose  Tab next  Ctrl+S submit  Esc close"
        }
        _ => "Tab next  Shift+Tab previous  Ctrl+S submit  Esc close",
    };
    frame.render_widget(Paragraph::new(hint).style(theme::text_muted()), hint_area);
}

/// Lines of the form body and the index of the first line of the focused row.
fn form_lines(form: &FormModalState, width: usize) -> (Vec<Line<'static>>, usize) {
    let mut lines = Vec::new();
    let mut focus_line = 0;

    if let Some(description) = form.description() {
        for line in description.lines() {
            lines.push(Line::styled(line.to_string(), theme::text_muted()));
        }
        lines.push(Line::default());
    }

    for (index, field) in form.fields().iter().enumerate() {
        let focused = index == form.focus() && form.phase() == FormPhase::Editing;
        if focused {
            focus_line = lines.len();
        }
        let mut label = vec![Span::styled(
            field.label.clone(),
            if focused { theme::heading_style() } else { theme::title_style() },
        )];
        if field.required {
            label.push(Span::styled(" *", theme::error_style()));
        }
        lines.push(Line::from(label));

        let row_style = if focused { theme::highlight_style() } else { theme::text_style() };
        let editor_text = form.editor(index).map(|editor| editor.split_at_cursor()).unwrap_or(("", ""));
        match field.field_type {
            FieldType::Select if !field.options.is_empty() => {
                let current = form.value(&field.name).and_then(FieldValue::as_text).unwrap_or_default();
                let shown = if current.is_empty() { "(choose)" } else { current };
                lines.push(Line::from(vec![
                    Span::styled("‹ ", theme::text_muted()),
                    Span::styled(shown.to_string(), row_style),
                    Span::styled(" ›", theme::text_muted()),
                ]));
            }
            FieldType::Textarea => {
                let text = caret_text(editor_text, focused);
                let mut rows: Vec<&str> = text.split('\n').collect();
                if rows.len() > TEXTAREA_ROWS {
                    rows.drain(..rows.len() - TEXTAREA_ROWS);
                }
                if text.is_empty() && !focused {
                    lines.push(placeholder_line(field.placeholder.as_deref()));
                } else {
                    for row in rows {
                        lines.push(Line::styled(format!("  {row}"), row_style));
                    }
                }
            }
            FieldType::File => {
                for file in form.value(&field.name).map(FieldValue::files).unwrap_or_default() {
                    lines.push(Line::from(vec![
                        Span::styled("  📎 ", theme::text_muted()),
                        Span::styled(file.file_name.clone(), theme::text_style()),
                        Span::styled(format!(" ({})", format_size(file.size())), theme::text_muted()),
                    ]));
                }
                let text = caret_text(editor_text, focused);
                if text.is_empty() {
                    let hint = match field.accept_filter() {
                        Some(accept) => format!("  path to file ({accept})"),
                        None => "  path to file".to_string(),
                    };
                    lines.push(Line::styled(hint, theme::text_muted()));
                } else {
                    lines.push(Line::styled(format!("  {text}"), row_style));
                }
            }
            _ => {
                let text = caret_text(editor_text, focused);
                if text.is_empty() {
                    lines.push(placeholder_line(field.placeholder.as_deref()));
                } else {
                    lines.push(Line::styled(format!("  {text}"), row_style));
                }
            }
        }

        if let Some(error) = form.errors().get(&field.name) {
            lines.push(Line::styled(format!("  {error}"), theme::error_style()));
        }
        lines.push(Line::default());
    }

    if form.is_submit_focused() && form.phase() == FormPhase::Editing {
        focus_line = lines.len();
    }
    let (label, style) = match form.phase() {
        FormPhase::Submitting => ("[ Submitting… ]", theme::text_muted()),
        _ if form.is_submit_focused() => ("[ Submit ]", theme::list_highlight_style().bg(theme::BG_HIGHLIGHT)),
        _ => ("[ Submit ]", theme::text_style()),
    };
    let padding = width.saturating_sub(label.chars().count()) / 2;
    lines.push(Line::from(vec![Span::raw(" ".repeat(padding)), Span::styled(label, style)]));

    (lines, focus_line)
}

fn caret_text((before, after): (&str, &str), focused: bool) -> String {
    if focused { format!("{before}▏{after}") } else { format!("{before}{after}") }
}

fn placeholder_line(placeholder: Option<&str>) -> Line<'static> {
    Line::styled(format!("  {}", placeholder.unwrap_or("")), theme::text_muted())
}
