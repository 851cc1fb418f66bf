//! Frame composition: header, transcript, composer, and hint bar, with the
//! menu, slash palette, form modal, and toasts drawn on top.

use ratatui::{prelude::*, widgets::*};

use crate::app::{App, THROBBER};
use crate::theme;
use crate::ui::components::form::draw_form_modal;
use crate::ui::components::menu::draw_menu;
use crate::ui::components::slash::draw_slash_palette;
use crate::ui::components::toast::draw_toasts;
use crate::ui::components::transcript::draw_transcript;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    frame.render_widget(Block::default().style(theme::panel_style()), area);

    let [header, body, composer, hints] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    draw_header(frame, header, app);
    draw_transcript(frame, body, &mut app.transcript);
    draw_composer(frame, composer, app);
    draw_hints(frame, hints, app);

    if app.slash.is_active() && !app.form.is_open() {
        draw_slash_palette(frame, composer, &app.slash, &app.catalog);
    }
    if app.menu.is_open() {
        draw_menu(frame, body, &mut app.menu, &app.catalog);
    }
    if app.form.is_open() {
        draw_form_modal(frame, area, &app.form);
    }
    draw_toasts(frame, body, &app.toasts);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled(" hookflow ", theme::heading_style()),
        Span::styled(app.base_url.clone(), theme::text_muted()),
    ];
    if let Some(chat_id) = app.chat_id.as_deref() {
        spans.push(Span::styled(format!("  chat {chat_id}"), theme::text_muted()));
    }
    if app.executing {
        spans.push(Span::styled(format!("  {}", THROBBER[app.throbber_idx % THROBBER.len()]), theme::heading_style()));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_composer(frame: &mut Frame, area: Rect, app: &App) {
    let focused = !app.form.is_open() && !app.menu.is_open();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::border_style(focused))
        .title(Span::styled(" Message ", theme::title_style()));
    let (before, after) = app.composer.split_at_cursor();
    let line = if app.composer.is_empty() && !focused {
        Line::styled("Type / for workflows", theme::text_muted())
    } else if app.composer.is_empty() {
        Line::from(vec![
            Span::styled("▏", theme::heading_style()),
            Span::styled("Type / for workflows", theme::text_muted()),
        ])
    } else {
        Line::from(vec![
            Span::styled(before.to_string(), theme::text_style()),
            Span::styled(if focused { "▏" } else { "" }, theme::heading_style()),
            Span::styled(after.to_string(), theme::text_style()),
        ])
    };
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_hints(frame: &mut Frame, area: Rect, app: &App) {
    let hint = if app.form.is_open() {
        ""
    } else if app.menu.is_open() {
        " ↑/↓ select  Enter open  type to filter  Esc close"
    } else if app.slash.is_active() {
        " ↑/↓ select  Enter open  Esc dismiss"
    } else if app.transcript.latest_download().is_some() {
        " Ctrl+W workflows  / slash commands  Alt+O open link  Alt+S save file  PgUp/PgDn scroll  Ctrl+C quit"
    } else {
        " Ctrl+W workflows  / slash commands  PgUp/PgDn scroll  Ctrl+C quit"
    };
    frame.render_widget(Paragraph::new(hint).style(theme::text_muted()), area);
}
