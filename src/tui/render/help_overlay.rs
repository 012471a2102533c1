use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::App;

const KEYS: &[(&str, &str)] = &[
    ("j/k", "move"),
    ("g/G", "top / bottom"),
    ("Tab h l", "switch view"),
    ("Enter z", "collapse/expand feed"),
    ("space", "toggle done"),
    ("v", "mark ticket"),
    ("x", "toggle done on marked"),
    ("o", "only open tickets"),
    ("u", "show updated column"),
    ("c", "show done-at column"),
    ("/", "filter tickets"),
    ("Esc", "clear filter"),
    ("s", "sync now"),
    ("S", "start/stop polling"),
    ("r", "reload from disk"),
    ("q", "quit"),
];

/// Render the help overlay, centered on top of everything.
pub fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let height = (KEYS.len() + 4) as u16;
    let width = 44u16.min(area.width);
    let popup = Rect {
        x: area.width.saturating_sub(width) / 2,
        y: area.height.saturating_sub(height) / 2,
        width,
        height: height.min(area.height),
    };

    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.highlight))
        .title(Span::styled(
            " keys ",
            Style::default()
                .fg(app.theme.text_bright)
                .add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(app.theme.background));

    let mut lines = vec![Line::from("")];
    for (key, desc) in KEYS {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:<9}", key),
                Style::default().fg(app.theme.cyan),
            ),
            Span::styled(*desc, Style::default().fg(app.theme.text)),
        ]));
    }

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, popup);
}
