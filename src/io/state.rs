use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Persisted TUI state (written to .state.json)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiState {
    /// Which view is showing ("tickets", "feeds")
    pub view: String,
    /// Cursor index into the flattened tickets list
    #[serde(default)]
    pub cursor: usize,
    /// Scroll offset (first visible row)
    #[serde(default)]
    pub scroll_offset: usize,
    /// Feed IDs whose groups are collapsed
    #[serde(default)]
    pub collapsed: HashSet<String>,
    /// Hide done tickets
    #[serde(default)]
    pub only_open: bool,
    /// Show the updated-on column
    #[serde(default)]
    pub show_updated: bool,
    /// Show the done-at column
    #[serde(default)]
    pub show_done_at: bool,
    /// Last search pattern
    #[serde(default)]
    pub last_search: Option<String>,
}

/// Read .state.json from the workspace directory
pub fn read_ui_state(dir: &Path) -> Option<UiState> {
    let path = dir.join(".state.json");
    let content = fs::read_to_string(&path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Write .state.json to the workspace directory
pub fn write_ui_state(dir: &Path, state: &UiState) -> Result<(), std::io::Error> {
    let path = dir.join(".state.json");
    let content = serde_json::to_string_pretty(state)?;
    fs::write(&path, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut state = UiState {
            view: "tickets".into(),
            cursor: 5,
            scroll_offset: 10,
            only_open: true,
            show_updated: true,
            last_search: Some("login".into()),
            ..Default::default()
        };
        state.collapsed.insert("demo".into());

        write_ui_state(dir.path(), &state).unwrap();
        let loaded = read_ui_state(dir.path()).unwrap();

        assert_eq!(loaded.view, "tickets");
        assert_eq!(loaded.cursor, 5);
        assert_eq!(loaded.scroll_offset, 10);
        assert!(loaded.only_open);
        assert!(loaded.show_updated);
        assert!(!loaded.show_done_at);
        assert_eq!(loaded.last_search, Some("login".into()));
        assert!(loaded.collapsed.contains("demo"));
    }

    #[test]
    fn read_missing_file_returns_none() {
        let dir = TempDir::new().unwrap();
        assert!(read_ui_state(dir.path()).is_none());
    }

    #[test]
    fn read_malformed_json_returns_none() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".state.json"), "not json {{{").unwrap();
        assert!(read_ui_state(dir.path()).is_none());
    }

    #[test]
    fn serde_defaults_on_minimal_object() {
        let state: UiState = serde_json::from_str(r#"{"view":"feeds"}"#).unwrap();
        assert_eq!(state.view, "feeds");
        assert_eq!(state.cursor, 0);
        assert!(state.collapsed.is_empty());
        assert!(!state.only_open);
        assert!(state.last_search.is_none());
    }
}
