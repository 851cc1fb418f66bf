use ratatui::{prelude::*, widgets::*};

use super::SlashPaletteState;
use crate::theme;
use crate::ui::components::ModelCatalog;

const MAX_ROWS: u16 = 8;

/// Draw the palette directly above `composer`, growing upwards.
pub fn draw_slash_palette(frame: &mut Frame, composer: Rect, palette: &SlashPaletteState, catalog: &ModelCatalog) {
    let matches = palette.matches(catalog);
    let rows = if catalog.is_loaded() { (matches.len() as u16).clamp(1, MAX_ROWS) } else { 1 };
    let height = (rows + 2).min(composer.y);
    if height < 3 {
        return;
    }
    let area = Rect::new(composer.x, composer.y - height, composer.width.min(60), height);

    let block = Block::default()
        .title(Span::styled("Slash commands", theme::title_style()))
        .borders(Borders::ALL)
        .border_style(theme::border_style(true))
        .style(theme::panel_style());
    frame.render_widget(Clear, area);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if !catalog.is_loaded() {
        frame.render_widget(Paragraph::new("Loading workflows…").style(theme::text_muted()), inner);
        return;
    }
    if matches.is_empty() {
        frame.render_widget(Paragraph::new("No matching workflows").style(theme::text_muted()), inner);
        return;
    }

    let items: Vec<ListItem> = matches
        .iter()
        .map(|model| {
            let command = model.command_keyword().map(|c| format!("/{c}")).unwrap_or_default();
            ListItem::new(Line::from(vec![
                Span::styled(format!("{command:<14}"), theme::code_style()),
                Span::styled(model.name.clone(), theme::text_style()),
            ]))
        })
        .collect();
    let mut list_state = ListState::default().with_selected(Some(palette.cursor()));
    let list = List::new(items).highlight_style(theme::list_highlight_style());
    frame.render_stateful_widget(list, inner, &mut list_state);
}
