use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, View};

/// Render the tab bar (top of screen): app name, view tabs, open count.
pub fn render_tab_bar(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let tab = |label: &str, active: bool| -> Span<'static> {
        if active {
            Span::styled(
                format!(" {} ", label),
                Style::default()
                    .fg(app.theme.text_bright)
                    .bg(bg)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(format!(" {} ", label), Style::default().fg(app.theme.dim).bg(bg))
        }
    };

    let mut spans = vec![
        Span::styled("[~] tickwatch ", Style::default().fg(app.theme.highlight).bg(bg)),
        tab("1 Tickets", app.view == View::Tickets),
        tab("2 Feeds", app.view == View::Feeds),
    ];

    let open = app.store.values().filter(|t| !t.done).count();
    let right = format!("{} open / {} tickets", open, app.store.len());
    let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    if used + right.chars().count() < width {
        spans.push(Span::styled(
            " ".repeat(width - used - right.chars().count()),
            Style::default().bg(bg),
        ));
        spans.push(Span::styled(right, Style::default().fg(app.theme.dim).bg(bg)));
    }

    let separator = Line::from(Span::styled(
        "─".repeat(width),
        Style::default().fg(app.theme.dim).bg(bg),
    ));

    let paragraph = Paragraph::new(vec![Line::from(spans), separator]).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}
