use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::{App, Mode};

pub fn handle_search(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            // Cancel: keep whatever filter was active before
            app.search_input.clear();
            app.mode = Mode::Navigate;
        }
        KeyCode::Enter => {
            app.last_search = if app.search_input.is_empty() {
                None
            } else {
                Some(app.search_input.clone())
            };
            app.search_input.clear();
            app.mode = Mode::Navigate;
            app.cursor = 0;
            app.scroll_offset = 0;
            app.clamp_cursor();
        }
        KeyCode::Backspace => {
            app.search_input.pop();
        }
        KeyCode::Char(c) => {
            app.search_input.push(c);
        }
        _ => {}
    }
}
