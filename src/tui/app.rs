use std::collections::HashSet;
use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use regex::Regex;

use crate::io::lock::WorkspaceLock;
use crate::io::state::{UiState, read_ui_state, write_ui_state};
use crate::io::store_io;
use crate::io::watcher::WorkspaceWatcher;
use crate::io::workspace::{Workspace, discover_workspace, load_workspace};
use crate::model::ticket::TicketStore;
use crate::ops::sched::PollSchedule;
use crate::ops::sync::{SyncResult, spawn_sync};
use crate::ops::ticket_ops;

use super::input;
use super::render;
use super::theme::Theme;

/// Which view is currently displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Tickets grouped by feed
    Tickets,
    /// Configured feeds overview
    Feeds,
}

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    Search,
}

/// Outcome of the most recent sync cycle, for the status row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// No cycle has run yet.
    Idle,
    Ok(String),
    Error(String),
}

/// A flattened row in the tickets view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlatItem {
    /// Feed group header. `open` counts not-done tickets regardless of
    /// the display filters; `shown` is how many rows follow it.
    FeedHeader {
        feed_id: String,
        title: String,
        open: usize,
        shown: usize,
        collapsed: bool,
    },
    /// A ticket row (ID into the store)
    Ticket { id: String },
}

/// Main application state
pub struct App {
    pub workspace: Workspace,
    pub store: TicketStore,
    pub schedule: PollSchedule,
    pub theme: Theme,
    pub view: View,
    pub mode: Mode,
    pub should_quit: bool,
    /// Cursor index into the flat tickets list
    pub cursor: usize,
    /// Scroll offset (first visible row) for the tickets view
    pub scroll_offset: usize,
    /// Cursor for the feeds view
    pub feeds_cursor: usize,
    /// Feed IDs whose groups are collapsed
    pub collapsed: HashSet<String>,
    /// Ticket IDs marked for a bulk done toggle (not persisted)
    pub marked: HashSet<String>,
    /// Hide done tickets
    pub only_open: bool,
    pub show_updated: bool,
    pub show_done_at: bool,
    pub show_help: bool,
    /// Search mode: current query being typed
    pub search_input: String,
    /// Active display filter pattern
    pub last_search: Option<String>,
    /// Outcome of the last sync cycle
    pub status: SyncStatus,
    /// Channel from the in-flight sync worker, if any
    pub sync_rx: Option<mpsc::Receiver<SyncResult>>,
}

impl App {
    pub fn new(workspace: Workspace, store: TicketStore) -> Self {
        let theme = Theme::from_config(&workspace.config.ui);
        let schedule = PollSchedule::from_minutes(workspace.config.refresh_minutes());

        App {
            workspace,
            store,
            schedule,
            theme,
            view: View::Tickets,
            mode: Mode::Navigate,
            should_quit: false,
            cursor: 0,
            scroll_offset: 0,
            feeds_cursor: 0,
            collapsed: HashSet::new(),
            marked: HashSet::new(),
            only_open: false,
            show_updated: false,
            show_done_at: false,
            show_help: false,
            search_input: String::new(),
            last_search: None,
            status: SyncStatus::Idle,
            sync_rx: None,
        }
    }

    /// The active filter regex (case-insensitive), if a search is set.
    /// Invalid patterns fall back to a literal match, like the search
    /// prompt promises.
    pub fn search_re(&self) -> Option<Regex> {
        let pattern = self.last_search.as_deref()?;
        Regex::new(&format!("(?i){}", pattern))
            .or_else(|_| Regex::new(&format!("(?i){}", regex::escape(pattern))))
            .ok()
    }

    /// Build the flat row list for the tickets view: every feed seen in
    /// the store gets a header (even when all its rows are filtered out),
    /// followed by its visible tickets unless collapsed.
    pub fn build_flat_items(&self) -> Vec<FlatItem> {
        let re = self.search_re();
        let visible = |id: &str| -> bool {
            let Some(t) = self.store.get(id) else {
                return false;
            };
            if self.only_open && t.done {
                return false;
            }
            match &re {
                Some(re) => re.is_match(&t.subject) || re.is_match(&t.id),
                None => true,
            }
        };

        // Group tickets by feed in first-seen order, then sort by feed ID
        let mut groups: Vec<(String, String, Vec<String>)> = Vec::new();
        for t in self.store.values() {
            let feed_id = if t.feed_id.is_empty() {
                "feed"
            } else {
                t.feed_id.as_str()
            };
            match groups.iter_mut().find(|g| g.0 == feed_id) {
                Some(group) => group.2.push(t.id.clone()),
                None => {
                    let title = if t.feed_title.is_empty() {
                        "feed".to_string()
                    } else {
                        t.feed_title.clone()
                    };
                    groups.push((feed_id.to_string(), title, vec![t.id.clone()]));
                }
            }
        }
        groups.sort_by(|a, b| a.0.cmp(&b.0));

        let mut items = Vec::new();
        for (feed_id, title, ids) in groups {
            let open = ids
                .iter()
                .filter(|id| self.store.get(*id).is_some_and(|t| !t.done))
                .count();
            let shown: Vec<&String> = ids.iter().filter(|id| visible(id)).collect();
            let collapsed = self.collapsed.contains(&feed_id);
            items.push(FlatItem::FeedHeader {
                feed_id,
                title,
                open,
                shown: shown.len(),
                collapsed,
            });
            if !collapsed {
                for id in shown {
                    items.push(FlatItem::Ticket { id: id.clone() });
                }
            }
        }
        items
    }

    /// Ticket ID under the cursor, if the cursor is on a ticket row.
    pub fn cursor_ticket_id(&self) -> Option<String> {
        match self.build_flat_items().get(self.cursor) {
            Some(FlatItem::Ticket { id }) => Some(id.clone()),
            _ => None,
        }
    }

    /// Feed ID the cursor row belongs to (header or ticket).
    pub fn cursor_feed_id(&self) -> Option<String> {
        let items = self.build_flat_items();
        match items.get(self.cursor)? {
            FlatItem::FeedHeader { feed_id, .. } => Some(feed_id.clone()),
            FlatItem::Ticket { id } => self.store.get(id).map(|t| {
                if t.feed_id.is_empty() {
                    "feed".to_string()
                } else {
                    t.feed_id.clone()
                }
            }),
        }
    }

    /// Keep the cursor inside the current flat list.
    pub fn clamp_cursor(&mut self) {
        let len = self.build_flat_items().len();
        if len == 0 {
            self.cursor = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }

    /// A sync worker is currently running.
    pub fn sync_in_flight(&self) -> bool {
        self.sync_rx.is_some()
    }

    /// Toggle done on the cursor ticket and persist. Refused while a sync
    /// is in flight — the worker's merged store would overwrite the edit.
    pub fn toggle_done_at_cursor(&mut self) {
        if self.sync_in_flight() {
            self.status = SyncStatus::Error("sync in progress — try again in a moment".into());
            return;
        }
        let Some(id) = self.cursor_ticket_id() else {
            return;
        };
        if let Some(ticket) = self.store.get_mut(&id) {
            ticket_ops::toggle_done(ticket);
        }
        self.save_store();
    }

    /// Toggle done on every marked ticket in one write; falls back to the
    /// cursor ticket when nothing is marked.
    pub fn toggle_done_marked(&mut self) {
        if self.marked.is_empty() {
            self.toggle_done_at_cursor();
            return;
        }
        if self.sync_in_flight() {
            self.status = SyncStatus::Error("sync in progress — try again in a moment".into());
            return;
        }
        let ids: Vec<String> = self.marked.drain().collect();
        for id in ids {
            if let Some(ticket) = self.store.get_mut(&id) {
                ticket_ops::toggle_done(ticket);
            }
        }
        self.save_store();
    }

    /// Persist the store under the workspace lock. Failures surface in the
    /// status row; store_io has already preserved the data in the sync log.
    pub fn save_store(&mut self) {
        let result = WorkspaceLock::acquire_default(&self.workspace.dir)
            .map_err(|e| e.to_string())
            .and_then(|_lock| {
                store_io::save_store(&self.workspace.dir, &self.store).map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            self.status = SyncStatus::Error(e);
        }
    }

    /// Reload the store and config from disk (watcher event or `r` key).
    pub fn reload_from_disk(&mut self) {
        if let Ok(root) = discover_workspace(&self.workspace.root)
            && let Ok(ws) = load_workspace(&root)
        {
            self.schedule
                .set_interval(Duration::from_secs(ws.config.refresh_minutes() * 60));
            self.theme = Theme::from_config(&ws.config.ui);
            self.workspace = ws;
        }
        if !self.sync_in_flight()
            && let Ok(store) = store_io::load_store(&self.workspace.dir)
        {
            self.store = store;
        }
        self.clamp_cursor();
    }

    /// Kick off a background sync cycle if the schedule says so.
    pub fn maybe_start_sync(&mut self, now: Instant) {
        if !self.schedule.due(now) || self.sync_in_flight() {
            return;
        }
        if let Err(issue) = self.workspace.config.check_ready() {
            self.status = SyncStatus::Error(issue.to_string());
            self.schedule.stop();
            return;
        }
        self.schedule.begin();
        self.sync_rx = Some(spawn_sync(
            self.workspace.config.clone(),
            self.store.clone(),
            self.workspace.dir.clone(),
        ));
    }

    /// Collect the worker's result if one is ready.
    pub fn poll_sync_result(&mut self, now: Instant) {
        let Some(rx) = &self.sync_rx else { return };
        let Ok(result) = rx.try_recv() else { return };

        self.sync_rx = None;
        self.schedule.finish(now);
        match result {
            Ok((store, report)) => {
                self.store = store;
                self.status = if report.all_failed() {
                    SyncStatus::Error(report.summary())
                } else {
                    SyncStatus::Ok(report.summary())
                };
            }
            Err(message) => {
                self.status = SyncStatus::Error(message);
            }
        }
        self.clamp_cursor();
    }
}

/// Restore UI state from .state.json
pub fn restore_ui_state(app: &mut App) {
    let ui_state = match read_ui_state(&app.workspace.dir) {
        Some(s) => s,
        None => return,
    };

    if ui_state.view == "feeds" {
        app.view = View::Feeds;
    }
    app.cursor = ui_state.cursor;
    app.scroll_offset = ui_state.scroll_offset;
    app.collapsed = ui_state.collapsed;
    app.only_open = ui_state.only_open;
    app.show_updated = ui_state.show_updated;
    app.show_done_at = ui_state.show_done_at;
    app.last_search = ui_state.last_search;
    app.clamp_cursor();
}

/// Save UI state to .state.json
pub fn save_ui_state(app: &App) {
    let view = match app.view {
        View::Tickets => "tickets".to_string(),
        View::Feeds => "feeds".to_string(),
    };
    let ui_state = UiState {
        view,
        cursor: app.cursor,
        scroll_offset: app.scroll_offset,
        collapsed: app.collapsed.clone(),
        only_open: app.only_open,
        show_updated: app.show_updated,
        show_done_at: app.show_done_at,
        last_search: app.last_search.clone(),
    };
    let _ = write_ui_state(&app.workspace.dir, &ui_state);
}

/// Run the TUI application
pub fn run(workspace_dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    // Discover and load the workspace
    let start = match workspace_dir {
        Some(dir) => std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
        None => std::env::current_dir()?,
    };
    let root = discover_workspace(&start)?;
    let workspace = load_workspace(&root)?;
    let store = store_io::load_store(&workspace.dir)?;

    let watcher = WorkspaceWatcher::start(&workspace.dir).ok();

    let mut app = App::new(workspace, store);
    restore_ui_state(&mut app);

    // Polling starts armed, like the original start-on-launch behavior,
    // but only when the config can actually sync.
    if app.workspace.config.check_ready().is_ok() {
        app.schedule.start(Instant::now());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Run event loop
    let result = run_event_loop(&mut terminal, &mut app, watcher.as_ref());

    // Save UI state before exit
    save_ui_state(&app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    watcher: Option<&WorkspaceWatcher>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut save_counter = 0u32;
    loop {
        let now = Instant::now();
        if let Some(watcher) = watcher
            && !watcher.poll().is_empty()
        {
            app.reload_from_disk();
        }
        app.poll_sync_result(now);
        app.maybe_start_sync(now);

        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
            // Debounced state save: every ~5 key presses
            save_counter += 1;
            if save_counter >= 5 {
                save_ui_state(app);
                save_counter = 0;
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
