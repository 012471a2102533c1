use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::{App, Mode, View, save_ui_state};

pub fn handle_navigate(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => {
            save_ui_state(app);
            app.should_quit = true;
        }
        KeyCode::Char('?') => app.show_help = true,

        // View switching
        KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => {
            app.view = match app.view {
                View::Tickets => View::Feeds,
                View::Feeds => View::Tickets,
            };
        }
        KeyCode::Char('1') => app.view = View::Tickets,
        KeyCode::Char('2') => app.view = View::Feeds,

        // Movement
        KeyCode::Char('j') | KeyCode::Down => move_cursor(app, 1),
        KeyCode::Char('k') | KeyCode::Up => move_cursor(app, -1),
        KeyCode::Char('g') => jump_cursor(app, true),
        KeyCode::Char('G') => jump_cursor(app, false),

        // Collapse/expand the feed under the cursor
        KeyCode::Enter | KeyCode::Char('z') => {
            if app.view == View::Tickets
                && let Some(feed_id) = app.cursor_feed_id()
            {
                if !app.collapsed.remove(&feed_id) {
                    app.collapsed.insert(feed_id);
                }
                app.clamp_cursor();
            }
        }

        // Done toggle
        KeyCode::Char(' ') => {
            if app.view == View::Tickets {
                app.toggle_done_at_cursor();
            }
        }

        // Mark for bulk toggle, then toggle all marked at once
        KeyCode::Char('v') => {
            if app.view == View::Tickets
                && let Some(id) = app.cursor_ticket_id()
            {
                if !app.marked.remove(&id) {
                    app.marked.insert(id);
                }
                move_cursor(app, 1);
            }
        }
        KeyCode::Char('x') => {
            if app.view == View::Tickets {
                app.toggle_done_marked();
            }
        }

        // Filters and columns
        KeyCode::Char('o') => {
            app.only_open = !app.only_open;
            app.clamp_cursor();
        }
        KeyCode::Char('u') => app.show_updated = !app.show_updated,
        KeyCode::Char('c') => app.show_done_at = !app.show_done_at,

        // Sync control
        KeyCode::Char('s') => app.schedule.request_sync(Instant::now()),
        KeyCode::Char('S') => {
            let now = Instant::now();
            if app.schedule.is_running() {
                app.schedule.stop();
            } else {
                app.schedule.start(now);
            }
        }
        KeyCode::Char('r') => app.reload_from_disk(),

        // Search
        KeyCode::Char('/') => {
            app.mode = Mode::Search;
            app.search_input.clear();
        }
        KeyCode::Esc => {
            if !app.marked.is_empty() {
                app.marked.clear();
            } else if app.last_search.take().is_some() {
                app.clamp_cursor();
            }
        }

        _ => {}
    }
}

fn move_cursor(app: &mut App, delta: isize) {
    match app.view {
        View::Tickets => {
            let len = app.build_flat_items().len();
            if len == 0 {
                return;
            }
            let cursor = app.cursor as isize + delta;
            app.cursor = cursor.clamp(0, len as isize - 1) as usize;
        }
        View::Feeds => {
            let len = crate::ops::sync::configured_feeds(&app.workspace.config).len();
            if len == 0 {
                return;
            }
            let cursor = app.feeds_cursor as isize + delta;
            app.feeds_cursor = cursor.clamp(0, len as isize - 1) as usize;
        }
    }
}

fn jump_cursor(app: &mut App, top: bool) {
    match app.view {
        View::Tickets => {
            let len = app.build_flat_items().len();
            app.cursor = if top { 0 } else { len.saturating_sub(1) };
        }
        View::Feeds => {
            let len = crate::ops::sync::configured_feeds(&app.workspace.config).len();
            app.feeds_cursor = if top { 0 } else { len.saturating_sub(1) };
        }
    }
}
