use ratatui::{prelude::*, widgets::*};

use super::{MenuPhase, WorkflowMenuState};
use crate::theme;
use crate::ui::components::ModelCatalog;

/// Draw the dropdown anchored at the top-left of `area`.
pub fn draw_menu(frame: &mut Frame, area: Rect, menu: &mut WorkflowMenuState, catalog: &ModelCatalog) {
    let width = area.width.min(48);
    let height = area.height.min(14);
    let area = Rect::new(area.x, area.y, width, height);

    let filter = menu.filter().input();
    let title = if filter.is_empty() {
        "Workflows".to_string()
    } else {
        format!("Workflows — {filter}")
    };
    let block = Block::default()
        .title(Span::styled(title, theme::title_style().fg(theme::ACCENT)))
        .borders(Borders::ALL)
        .border_style(theme::border_style(true))
        .style(theme::panel_style());

    frame.render_widget(Clear, area);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let placeholder = match menu.phase() {
        MenuPhase::Loading => Some("Loading workflows…"),
        MenuPhase::Empty => Some("No workflows available"),
        MenuPhase::Populated | MenuPhase::Closed => None,
    };
    if let Some(text) = placeholder {
        frame.render_widget(Paragraph::new(text).style(theme::text_muted()), inner);
        return;
    }

    let items: Vec<ListItem> = menu
        .visible(catalog)
        .into_iter()
        .map(|model| {
            let mut spans = vec![Span::styled(model.name.clone(), theme::text_style())];
            if let Some(command) = model.command_keyword() {
                spans.push(Span::styled(format!("  /{command}"), theme::text_muted()));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    if items.is_empty() {
        frame.render_widget(Paragraph::new("No matching workflows").style(theme::text_muted()), inner);
        return;
    }

    let list = List::new(items)
        .highlight_style(theme::list_highlight_style())
        .highlight_symbol("› ");
    frame.render_stateful_widget(list, inner, menu.list_state());
}
