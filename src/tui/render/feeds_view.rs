use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::ops::sync::configured_feeds;
use crate::tui::app::App;
use crate::util::unicode::fit_to_width;

/// Render the feeds view: one block per configured feed with its counts.
pub fn render_feeds_view(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let feeds = configured_feeds(&app.workspace.config);

    if feeds.is_empty() {
        let line = Line::from(Span::styled(
            "no feeds configured — add one with `tw feeds add \"Title\" <url>`",
            Style::default().fg(app.theme.dim).bg(bg),
        ));
        frame.render_widget(Paragraph::new(line).style(Style::default().bg(bg)), area);
        return;
    }

    let width = area.width as usize;
    let mut lines: Vec<Line> = Vec::new();
    for (idx, feed) in feeds.iter().enumerate() {
        let selected = idx == app.feeds_cursor;
        let row_bg = if selected { app.theme.selection_bg } else { bg };

        let mut total = 0usize;
        let mut open = 0usize;
        for t in app.store.values().filter(|t| t.feed_id == feed.id) {
            total += 1;
            if !t.done {
                open += 1;
            }
        }

        let head = format!("{}  ({} tickets, {} open)", feed.title, total, open);
        lines.push(Line::from(Span::styled(
            fit_to_width(&head, width),
            Style::default()
                .fg(if selected { app.theme.text_bright } else { app.theme.cyan })
                .bg(row_bg)
                .add_modifier(Modifier::BOLD),
        )));

        lines.push(Line::from(Span::styled(
            fit_to_width(&format!("    {}", feed.url), width),
            Style::default().fg(app.theme.dim).bg(row_bg),
        )));

        if !feed.terms.is_empty() {
            lines.push(Line::from(Span::styled(
                fit_to_width(&format!("    search: {}", feed.terms.join(", ")), width),
                Style::default().fg(app.theme.yellow).bg(row_bg),
            )));
        }

        lines.push(Line::from(Span::styled(String::new(), Style::default().bg(bg))));
    }

    let paragraph = Paragraph::new(lines).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}
