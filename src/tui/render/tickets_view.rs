use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, FlatItem};
use crate::util::unicode::fit_to_width;

/// Width of the ticket ID column (including the `#`).
const ID_WIDTH: usize = 9;
/// Width of a timestamp column (`2026-08-01T10:00:00Z` sized).
const STAMP_WIDTH: usize = 20;

/// Render the tickets view: feed headers with their tickets beneath.
pub fn render_tickets_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let items = app.build_flat_items();
    let height = area.height as usize;
    let bg = app.theme.background;

    if items.is_empty() {
        let hint = if app.store.is_empty() {
            "no tickets yet — press s to sync (or run `tw sync`)"
        } else {
            "every ticket is filtered out — o toggles the open filter, Esc clears search"
        };
        let line = Line::from(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
        frame.render_widget(Paragraph::new(line).style(Style::default().bg(bg)), area);
        return;
    }

    // Keep the cursor visible
    if app.cursor < app.scroll_offset {
        app.scroll_offset = app.cursor;
    } else if height > 0 && app.cursor >= app.scroll_offset + height {
        app.scroll_offset = app.cursor - height + 1;
    }

    let mut lines: Vec<Line> = Vec::with_capacity(height);
    for (idx, item) in items
        .iter()
        .enumerate()
        .skip(app.scroll_offset)
        .take(height)
    {
        let selected = idx == app.cursor;
        let row_bg = if selected { app.theme.selection_bg } else { bg };

        let line = match item {
            FlatItem::FeedHeader {
                title,
                open,
                shown,
                collapsed,
                ..
            } => {
                let arrow = if *collapsed { "\u{25B8}" } else { "\u{25BE}" };
                let mut text = format!("{} {} ({} open)", arrow, title, open);
                if *collapsed && *shown > 0 {
                    text.push_str(&format!(" [{} hidden]", shown));
                }
                Line::from(Span::styled(
                    fit_to_width(&text, area.width as usize),
                    Style::default()
                        .fg(app.theme.cyan)
                        .bg(row_bg)
                        .add_modifier(Modifier::BOLD),
                ))
            }
            FlatItem::Ticket { id } => match app.store.get(id) {
                Some(t) => ticket_line(app, t, selected, row_bg, area.width as usize),
                None => Line::from(Span::styled("", Style::default().bg(row_bg))),
            },
        };
        lines.push(line);
    }

    let paragraph = Paragraph::new(lines).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

fn ticket_line<'a>(
    app: &App,
    t: &crate::model::ticket::Ticket,
    selected: bool,
    row_bg: ratatui::style::Color,
    width: usize,
) -> Line<'a> {
    let text_fg = if t.done { app.theme.dim } else { app.theme.text };
    let mut spans: Vec<Span> = Vec::new();
    let mut used = 0usize;

    // ID column; marked rows show their ID highlighted
    let marked = app.marked.contains(&t.id);
    let id_text = fit_to_width(&format!("  #{}", t.id), ID_WIDTH);
    used += ID_WIDTH + 1;
    let id_fg = if marked {
        app.theme.highlight
    } else if selected {
        app.theme.text_bright
    } else {
        text_fg
    };
    spans.push(Span::styled(
        format!("{} ", id_text),
        Style::default().fg(id_fg).bg(row_bg),
    ));

    // Done mark
    let (mark, mark_fg) = if t.done {
        ("\u{2713}", app.theme.green)
    } else {
        (" ", text_fg)
    };
    used += 2;
    spans.push(Span::styled(
        format!("{} ", mark),
        Style::default().fg(mark_fg).bg(row_bg),
    ));

    // Keyword hit mark
    let (hit, hit_fg) = if t.search_hit {
        ("*", app.theme.yellow)
    } else {
        (" ", text_fg)
    };
    used += 2;
    spans.push(Span::styled(
        format!("{} ", hit),
        Style::default().fg(hit_fg).bg(row_bg),
    ));

    // Optional timestamp columns
    if app.show_updated {
        used += STAMP_WIDTH + 1;
        spans.push(Span::styled(
            format!("{} ", fit_to_width(&t.updated_on, STAMP_WIDTH)),
            Style::default().fg(app.theme.dim).bg(row_bg),
        ));
    }
    if app.show_done_at {
        used += STAMP_WIDTH + 1;
        spans.push(Span::styled(
            format!("{} ", fit_to_width(t.done_at.as_deref().unwrap_or(""), STAMP_WIDTH)),
            Style::default().fg(app.theme.dim).bg(row_bg),
        ));
    }

    // Subject, with the due date tucked on when present
    let mut subject = t.subject.clone();
    if !t.due_date.is_empty() {
        subject.push_str(&format!(" (due {})", t.due_date));
    }
    let remaining = width.saturating_sub(used);
    let mut subject_style = Style::default()
        .fg(if selected { app.theme.text_bright } else { text_fg })
        .bg(row_bg);
    if t.done {
        subject_style = subject_style.add_modifier(Modifier::CROSSED_OUT);
    }
    spans.push(Span::styled(fit_to_width(&subject, remaining), subject_style));

    Line::from(spans)
}
