mod init;
pub use init::cmd_init;

use std::path::PathBuf;
use std::sync::Mutex;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::lock::WorkspaceLock;
use crate::io::store_io;
use crate::io::synclog;
use crate::io::workspace::{self, Workspace, WorkspaceError};
use crate::model::feed::normalize_feeds;
use crate::model::ticket::TicketStore;
use crate::ops::{sync, ticket_ops};

/// Global override for the workspace directory (set by -C flag)
static WORKSPACE_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;

    // Store -C override for load_workspace_cwd()
    if let Some(ref dir) = cli.workspace_dir {
        let abs = std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?;
        WORKSPACE_DIR_OVERRIDE.lock().unwrap().replace(abs);
    }

    match cli.command {
        None => {
            // main.rs launches the TUI for the bare invocation
            Ok(())
        }
        Some(cmd) => match cmd {
            // Init is handled in main.rs before workspace discovery
            Commands::Init(args) => cmd_init(args),

            // Read commands
            Commands::List(args) => cmd_list(args, json),
            Commands::Feeds(args) => match args.action {
                None => cmd_feeds_list(json),
                Some(FeedsAction::Add(add)) => cmd_feeds_add(add),
                Some(FeedsAction::Remove(rm)) => cmd_feeds_remove(rm),
            },
            Commands::Log(args) => cmd_log(args, json),

            // Write commands
            Commands::Sync => cmd_sync(json),
            Commands::Done(args) => cmd_mark(args, true),
            Commands::Undone(args) => cmd_mark(args, false),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_workspace_cwd() -> Result<Workspace, WorkspaceError> {
    let start = match WORKSPACE_DIR_OVERRIDE.lock().unwrap().as_ref() {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(WorkspaceError::IoError)?,
    };
    let root = workspace::discover_workspace(&start)?;
    workspace::load_workspace(&root)
}

/// Group store tickets by feed, in store order. Feed order follows first
/// appearance; the open count ignores any display filter.
fn group_by_feed(store: &TicketStore) -> Vec<(String, String, Vec<&crate::model::ticket::Ticket>)> {
    let mut groups: Vec<(String, String, Vec<&crate::model::ticket::Ticket>)> = Vec::new();
    for ticket in store.values() {
        let feed_id = if ticket.feed_id.is_empty() {
            "feed"
        } else {
            ticket.feed_id.as_str()
        };
        match groups.iter_mut().find(|g| g.0 == feed_id) {
            Some(group) => group.2.push(ticket),
            None => {
                let title = if ticket.feed_title.is_empty() {
                    "feed".to_string()
                } else {
                    ticket.feed_title.clone()
                };
                groups.push((feed_id.to_string(), title, vec![ticket]));
            }
        }
    }
    groups.sort_by(|a, b| a.0.cmp(&b.0));
    groups
}

// ---------------------------------------------------------------------------
// Sync
// ---------------------------------------------------------------------------

fn cmd_sync(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ws = load_workspace_cwd()?;
    ws.config.check_ready()?;

    let _lock = WorkspaceLock::acquire_default(&ws.dir)?;
    let mut store = store_io::load_store(&ws.dir)?;
    let report = sync::run_sync(&ws.config, &mut store, &ws.dir)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report_to_json(&report))?);
    } else {
        println!("sync: {}", report.summary());
        for failure in &report.failures {
            eprintln!("  {}: {}", failure.feed_title, failure.message);
        }
    }

    if report.all_failed() {
        return Err("sync failed: every feed errored (see `tw log`)".into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

fn cmd_list(args: ListArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ws = load_workspace_cwd()?;
    let store = store_io::load_store(&ws.dir)?;

    let keep = |t: &crate::model::ticket::Ticket| {
        if args.open && t.done {
            return false;
        }
        if args.done && !t.done {
            return false;
        }
        true
    };

    let groups = group_by_feed(&store);
    let groups: Vec<_> = groups
        .into_iter()
        .filter(|g| args.feed.as_deref().is_none_or(|want| want == g.0))
        .collect();

    if json {
        let out: Vec<FeedGroupJson> = groups
            .iter()
            .map(|(feed_id, feed_title, tickets)| FeedGroupJson {
                feed_id: feed_id.clone(),
                feed_title: feed_title.clone(),
                open: tickets.iter().filter(|t| !t.done).count(),
                tickets: tickets
                    .iter()
                    .filter(|t| keep(t))
                    .map(|t| ticket_to_json(t))
                    .collect(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if groups.is_empty() {
        println!("no tickets yet — run `tw sync`");
        return Ok(());
    }
    for (i, (_, feed_title, tickets)) in groups.iter().enumerate() {
        if i > 0 {
            println!();
        }
        let open = tickets.iter().filter(|t| !t.done).count();
        println!("{} ({} open)", feed_title, open);
        for ticket in tickets.iter().filter(|t| keep(t)) {
            println!("{}", ticket_line(ticket));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Done / undone
// ---------------------------------------------------------------------------

fn cmd_mark(args: DoneArgs, done: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ws = load_workspace_cwd()?;
    let _lock = WorkspaceLock::acquire_default(&ws.dir)?;
    let mut store = store_io::load_store(&ws.dir)?;

    for id in &args.ids {
        let id = id.trim_start_matches('#');
        ticket_ops::mark_done(&mut store, id, done)?;
    }
    store_io::save_store(&ws.dir, &store)?;

    let verb = if done { "done" } else { "undone" };
    for id in &args.ids {
        println!("{}: #{}", verb, id.trim_start_matches('#'));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Feeds
// ---------------------------------------------------------------------------

fn cmd_feeds_list(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ws = load_workspace_cwd()?;
    let store = store_io::load_store(&ws.dir)?;
    let feeds = normalize_feeds(&ws.config);

    let counts = |feed_id: &str| {
        let tickets = store.values().filter(|t| t.feed_id == feed_id);
        let (mut total, mut open) = (0, 0);
        for t in tickets {
            total += 1;
            if !t.done {
                open += 1;
            }
        }
        (total, open)
    };

    if json {
        let out: Vec<FeedInfoJson> = feeds
            .iter()
            .map(|f| {
                let (tickets, open) = counts(&f.id);
                FeedInfoJson {
                    id: f.id.clone(),
                    title: f.title.clone(),
                    url: f.url.clone(),
                    search: f.terms.clone(),
                    tickets,
                    open,
                }
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if feeds.is_empty() {
        println!("no feeds configured — add one with `tw feeds add`");
        return Ok(());
    }
    for f in &feeds {
        let (total, open) = counts(&f.id);
        println!("{}  {} ({} tickets, {} open)", f.id, f.title, total, open);
        println!("    {}", f.url);
        if !f.terms.is_empty() {
            println!("    search: {}", f.terms.join(", "));
        }
    }
    Ok(())
}

fn cmd_feeds_add(args: FeedAddArgs) -> Result<(), Box<dyn std::error::Error>> {
    let ws = load_workspace_cwd()?;
    let _lock = WorkspaceLock::acquire_default(&ws.dir)?;

    let (_, mut doc) = config_io::read_config(&ws.dir)?;
    config_io::add_feed_to_config(
        &mut doc,
        args.id.as_deref(),
        &args.title,
        &args.url,
        args.search.as_deref(),
    );
    config_io::write_config(&ws.dir, &doc)?;

    println!("added feed: {}", args.title);
    Ok(())
}

fn cmd_feeds_remove(args: FeedRemoveArgs) -> Result<(), Box<dyn std::error::Error>> {
    let ws = load_workspace_cwd()?;
    let _lock = WorkspaceLock::acquire_default(&ws.dir)?;

    let (_, mut doc) = config_io::read_config(&ws.dir)?;
    let removed = config_io::remove_feed_from_config(&mut doc, &args.id);
    if removed == 0 {
        return Err(format!("no feed with id \"{}\" (see `tw feeds`)", args.id).into());
    }
    config_io::write_config(&ws.dir, &doc)?;

    println!("removed {} feed(s)", removed);
    Ok(())
}

// ---------------------------------------------------------------------------
// Log
// ---------------------------------------------------------------------------

fn cmd_log(args: LogArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ws = load_workspace_cwd()?;
    let entries = synclog::read_log_entries(&ws.dir, Some(args.limit));

    if json {
        let out: Vec<serde_json::Value> = entries.iter().map(|e| e.to_json()).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("sync log is empty");
        return Ok(());
    }
    for entry in &entries {
        print!("{}", entry.to_display_markdown());
    }
    Ok(())
}
