use hookflow_util::{InlineSpan, MarkdownLine, ResponseView, markdown_blocks};
use ratatui::{prelude::*, widgets::*};
use unicode_width::UnicodeWidthChar;

use super::{TranscriptEntry, TranscriptState};
use crate::theme;

const MAX_COLUMN_WIDTH: u16 = 40;

/// A vertically stacked piece of an entry. Tables are kept apart from text so
/// they render through ratatui's `Table`.
#[derive(Debug)]
enum Segment {
    Lines(Vec<Line<'static>>),
    Table { columns: Vec<String>, rows: Vec<Vec<String>> },
}

impl Segment {
    fn height(&self) -> usize {
        match self {
            Segment::Lines(lines) => lines.len(),
            Segment::Table { rows, .. } => rows.len() + 1,
        }
    }
}

/// Draw the transcript, following the newest entry unless scrolled up.
pub fn draw_transcript(frame: &mut Frame, area: Rect, transcript: &mut TranscriptState) {
    let block = Block::default()
        .title(Span::styled(" Workflow results ", theme::title_style()))
        .borders(Borders::ALL)
        .border_style(theme::border_style(false));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if transcript.is_empty() {
        let hint = Paragraph::new(vec![
            Line::default(),
            Line::styled("No workflow results yet.", theme::text_muted()),
            Line::styled("Press Ctrl+W to browse workflows or type / in the composer.", theme::text_muted()),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(hint, inner);
        return;
    }

    let width = inner.width as usize;
    let segments: Vec<Segment> = transcript
        .entries()
        .iter()
        .flat_map(|entry| entry_segments(entry, width))
        .collect();
    let total: usize = segments.iter().map(Segment::height).sum();
    let height = inner.height as usize;
    let max_scroll = total.saturating_sub(height);
    transcript.clamp_scroll(u16::try_from(max_scroll).unwrap_or(u16::MAX));
    let start = max_scroll - (transcript.scroll_from_bottom() as usize).min(max_scroll);

    let mut top = 0usize;
    for segment in segments {
        let segment_height = segment.height();
        let bottom = top + segment_height;
        if bottom <= start {
            top = bottom;
            continue;
        }
        if top >= start + height {
            break;
        }
        let clip = start.saturating_sub(top);
        let y = inner.y + (top + clip - start) as u16;
        let visible = (segment_height - clip).min(inner.bottom().saturating_sub(y) as usize);
        let rect = Rect::new(inner.x, y, inner.width, visible as u16);
        render_segment(frame, rect, segment, clip);
        top = bottom;
    }
}

fn render_segment(frame: &mut Frame, rect: Rect, segment: Segment, clip: usize) {
    match segment {
        Segment::Lines(lines) => {
            frame.render_widget(Paragraph::new(lines).scroll((clip as u16, 0)), rect);
        }
        Segment::Table { columns, rows } => {
            let widths: Vec<Constraint> = columns
                .iter()
                .enumerate()
                .map(|(index, column)| {
                    let widest = rows
                        .iter()
                        .filter_map(|row| row.get(index))
                        .map(|cell| display_width(cell))
                        .chain(std::iter::once(display_width(column)))
                        .max()
                        .unwrap_or(1);
                    Constraint::Length((widest as u16).clamp(1, MAX_COLUMN_WIDTH))
                })
                .collect();
            let body = rows
                .into_iter()
                .skip(clip.saturating_sub(1))
                .map(|row| Row::new(row.into_iter().map(Cell::from)).style(theme::text_style()));
            let mut table = Table::new(body, widths).column_spacing(2);
            if clip == 0 {
                table = table.header(Row::new(columns.into_iter().map(Cell::from)).style(theme::heading_style().add_modifier(Modifier::UNDERLINED)));
            }
            frame.render_widget(table, rect);
        }
    }
}

fn entry_segments(entry: &TranscriptEntry, width: usize) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut lines = vec![Line::from(vec![
        Span::styled("▸ ", theme::heading_style()),
        Span::styled(entry.title.clone(), theme::heading_style()),
        Span::styled(format!("  {}", entry.timestamp.format("%H:%M:%S")), theme::text_muted()),
    ])];

    if !entry.response.has_content() {
        lines.push(Line::styled("  Workflow finished without output.", theme::text_muted()));
    }

    if let Some(message) = entry.message.as_deref() {
        for block in markdown_blocks(message) {
            lines.extend(markdown_lines(&block, width));
        }
    }

    match &entry.view {
        ResponseView::Empty => {}
        ResponseView::Table { columns, rows } => {
            segments.push(Segment::Lines(std::mem::take(&mut lines)));
            segments.push(Segment::Table {
                columns: columns.clone(),
                rows: rows.clone(),
            });
        }
        ResponseView::List(items) => {
            for item in items {
                lines.extend(wrap_spans(vec![Span::styled(item.clone(), theme::text_style())], width, "  • ", "    "));
            }
        }
        ResponseView::KeyValue(pairs) => {
            let key_width = pairs.iter().map(|(key, _)| display_width(key)).max().unwrap_or(0);
            for (key, value) in pairs {
                let padded = format!("  {key}{}  ", " ".repeat(key_width - display_width(key)));
                let continuation = " ".repeat(display_width(&padded));
                let mut wrapped = wrap_spans(vec![Span::styled(value.clone(), theme::text_style())], width, "", &continuation);
                if let Some(first) = wrapped.first_mut() {
                    first.spans.insert(0, Span::styled(padded, theme::title_style()));
                }
                lines.extend(wrapped);
            }
        }
        ResponseView::Raw(text) => {
            for line in text.lines() {
                lines.extend(wrap_spans(vec![Span::styled(line.to_string(), theme::code_style())], width, "  ", "  "));
            }
        }
    }

    if let Some(link) = &entry.download {
        lines.push(Line::from(vec![
            Span::styled("  ⤓ ", theme::heading_style()),
            Span::styled(link.label.clone(), theme::text_style().add_modifier(Modifier::UNDERLINED)),
            Span::styled("   Alt+O open · Alt+C copy link · Alt+S save", theme::text_muted()),
        ]));
    }
    lines.push(Line::default());
    segments.push(Segment::Lines(lines));
    segments
}

fn markdown_lines(block: &MarkdownLine, width: usize) -> Vec<Line<'static>> {
    match block {
        MarkdownLine::Heading { spans, .. } => {
            let styled = spans.iter().map(|span| Span::styled(span.text().to_string(), theme::heading_style())).collect();
            wrap_spans(styled, width, "  ", "  ")
        }
        MarkdownLine::Bullet(spans) => wrap_spans(styled_spans(spans), width, "  • ", "    "),
        MarkdownLine::Numbered { number, spans } => {
            let prefix = format!("  {number}. ");
            let continuation = " ".repeat(display_width(&prefix));
            wrap_spans(styled_spans(spans), width, &prefix, &continuation)
        }
        MarkdownLine::Quote(spans) => {
            let styled = spans.iter().map(|span| Span::styled(span.text().to_string(), theme::text_muted())).collect();
            wrap_spans(styled, width, "  │ ", "  │ ")
        }
        MarkdownLine::Code(line) => wrap_spans(vec![Span::styled(line.clone(), theme::code_style())], width, "    ", "    "),
        MarkdownLine::Rule => vec![Line::styled(format!("  {}", "─".repeat(width.saturating_sub(4).min(40))), theme::text_muted())],
        MarkdownLine::Paragraph(spans) => wrap_spans(styled_spans(spans), width, "  ", "  "),
        MarkdownLine::Blank => vec![Line::default()],
    }
}

fn styled_spans(spans: &[InlineSpan]) -> Vec<Span<'static>> {
    spans
        .iter()
        .map(|span| match span {
            InlineSpan::Text(text) => Span::styled(text.clone(), theme::text_style()),
            InlineSpan::Bold(text) => Span::styled(text.clone(), theme::text_style().add_modifier(Modifier::BOLD)),
            InlineSpan::Emphasis(text) => Span::styled(text.clone(), theme::text_style().add_modifier(Modifier::ITALIC)),
            InlineSpan::Code(text) => Span::styled(text.clone(), theme::code_style()),
        })
        .collect()
}

/// Hard-wrap styled spans at `width` columns. The first line starts with
/// `prefix`, later lines with `continuation`.
fn wrap_spans(spans: Vec<Span<'static>>, width: usize, prefix: &str, continuation: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = vec![Span::raw(prefix.to_string())];
    let mut used = display_width(prefix);
    let limit = width.max(display_width(prefix) + 1).max(display_width(continuation) + 1);

    for span in spans {
        let style = span.style;
        let mut run = String::new();
        for ch in span.content.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if used + ch_width > limit {
                if !run.is_empty() {
                    current.push(Span::styled(std::mem::take(&mut run), style));
                }
                lines.push(Line::from(std::mem::take(&mut current)));
                current.push(Span::raw(continuation.to_string()));
                used = display_width(continuation);
            }
            run.push(ch);
            used += ch_width;
        }
        if !run.is_empty() {
            current.push(Span::styled(run, style));
        }
    }
    lines.push(Line::from(current));
    lines
}

fn display_width(text: &str) -> usize {
    unicode_width::UnicodeWidthStr::width(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookflow_types::WebhookResponse;
    use serde_json::json;

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn wrapping_keeps_prefixes() {
        let lines = wrap_spans(vec![Span::raw("abcdefgh")], 6, "- ", "  ");
        let text: Vec<String> = lines.iter().map(plain).collect();
        assert_eq!(text, ["- abcd", "  efgh"]);
    }

    #[test]
    fn tables_become_their_own_segment() {
        let entry = TranscriptEntry::new(
            "Users",
            WebhookResponse {
                success: true,
                message: Some("# Found".into()),
                data: Some(json!([{ "name": "a" }, { "name": "b" }])),
                file_url: Some("/files/u.csv".into()),
                file_name: Some("u.csv".into()),
            },
        );
        let segments = entry_segments(&entry, 80);
        assert_eq!(segments.len(), 3);
        let Segment::Lines(head) = &segments[0] else { panic!("expected text") };
        assert_eq!(plain(&head[1]), "  Found");
        assert!(matches!(&segments[1], Segment::Table { rows, .. } if rows.len() == 2));
        assert_eq!(segments[1].height(), 3);
        let Segment::Lines(tail) = &segments[2] else { panic!("expected text") };
        assert!(plain(&tail[0]).contains("u.csv"));
    }

    #[test]
    fn responses_without_output_say_so() {
        let empty = TranscriptEntry::new("Ping", WebhookResponse { success: true, ..Default::default() });
        let segments = entry_segments(&empty, 80);
        let [Segment::Lines(lines)] = segments.as_slice() else { panic!("expected text") };
        assert_eq!(plain(&lines[1]), "  Workflow finished without output.");

        let with_data = TranscriptEntry::new(
            "Ping",
            WebhookResponse {
                success: true,
                data: Some(json!(["pong"])),
                ..Default::default()
            },
        );
        let segments = entry_segments(&with_data, 80);
        let [Segment::Lines(lines)] = segments.as_slice() else { panic!("expected text") };
        assert!(lines.iter().all(|line| !plain(line).contains("without output")));
    }

    #[test]
    fn key_values_align_keys() {
        let entry = TranscriptEntry::new(
            "Status",
            WebhookResponse {
                success: true,
                data: Some(json!({ "id": 1, "status": "ok" })),
                ..Default::default()
            },
        );
        let segments = entry_segments(&entry, 80);
        let Segment::Lines(lines) = &segments[0] else { panic!("expected text") };
        assert_eq!(plain(&lines[1]), "  id      1");
        assert_eq!(plain(&lines[2]), "  status  ok");
    }

    #[test]
    fn rendering_follows_the_newest_entry() {
        let mut transcript = TranscriptState::default();
        for index in 0..5 {
            transcript.push(TranscriptEntry::new(
                format!("Run {index}"),
                WebhookResponse {
                    success: true,
                    message: Some(format!("result {index}")),
                    ..Default::default()
                },
            ));
        }
        let backend = ratatui::backend::TestBackend::new(40, 8);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| draw_transcript(frame, frame.area(), &mut transcript))
            .unwrap();
        let buffer = terminal.backend().buffer().clone();
        let rows: Vec<String> = (0..8u16)
            .map(|y| (0..40u16).map(|x| buffer[(x, y)].symbol().to_string()).collect())
            .collect();
        let screen = rows.join("\n");
        assert!(screen.contains("result 4"));
        assert!(!screen.contains("Run 0"));
    }
}
