use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::ops::sched::format_remaining;
use crate::tui::app::{App, Mode, SyncStatus};

/// Render the status row (bottom of screen): schedule state, countdown,
/// last sync outcome — or the search prompt while one is being typed.
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let line = match app.mode {
        Mode::Navigate => {
            let mut spans: Vec<Span> = Vec::new();

            let schedule_text = if app.sync_in_flight() {
                "syncing\u{2026}".to_string()
            } else if app.schedule.is_running() {
                format!("next sync {}", format_remaining(app.schedule.remaining(Instant::now())))
            } else {
                "sync stopped".to_string()
            };
            spans.push(Span::styled(
                schedule_text,
                Style::default().fg(app.theme.text).bg(bg),
            ));

            match &app.status {
                SyncStatus::Idle => {}
                SyncStatus::Ok(summary) => {
                    spans.push(Span::styled(" | ", Style::default().fg(app.theme.dim).bg(bg)));
                    spans.push(Span::styled(
                        summary.clone(),
                        Style::default().fg(app.theme.green).bg(bg),
                    ));
                }
                SyncStatus::Error(message) => {
                    spans.push(Span::styled(" | ", Style::default().fg(app.theme.dim).bg(bg)));
                    spans.push(Span::styled(
                        message.clone(),
                        Style::default().fg(app.theme.red).bg(bg),
                    ));
                }
            }

            if let Some(pattern) = &app.last_search {
                spans.push(Span::styled(
                    format!(" /{}", pattern),
                    Style::default().fg(app.theme.yellow).bg(bg),
                ));
            }
            if app.only_open {
                spans.push(Span::styled(
                    " [open only]",
                    Style::default().fg(app.theme.dim).bg(bg),
                ));
            }

            let hint = if app.workspace.config.ui.show_key_hints {
                "space done  s sync  ? help"
            } else {
                "? help"
            };
            let content_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
            let hint_width = hint.chars().count();
            if content_width + hint_width < width {
                let padding = width - content_width - hint_width;
                spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
                spans.push(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
            }
            Line::from(spans)
        }
        Mode::Search => {
            // Search prompt: /pattern▌
            let mut spans = vec![
                Span::styled(
                    format!("/{}", app.search_input),
                    Style::default().fg(app.theme.text_bright).bg(bg),
                ),
                Span::styled("\u{258C}", Style::default().fg(app.theme.highlight).bg(bg)),
            ];
            let hint = "Enter filter  Esc cancel";
            let content_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
            let hint_width = hint.chars().count();
            if content_width + hint_width < width {
                let padding = width - content_width - hint_width;
                spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
                spans.push(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
            }
            Line::from(spans)
        }
    };

    let paragraph = Paragraph::new(line).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}
