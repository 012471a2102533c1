use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use crate::feed::{FeedClient, FetchError};
use crate::io::store_io::{self, StoreError};
use crate::io::synclog::{self, LogCategory};
use crate::model::config::Config;
use crate::model::feed::{Feed, normalize_feeds};
use crate::model::ticket::TicketStore;
use crate::ops::merge::merge_tickets;

/// A feed that failed during a cycle. The other feeds still synced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFailure {
    pub feed_title: String,
    pub message: String,
}

/// What one fetch-merge-persist cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries fetched across all feeds that responded.
    pub fetched: usize,
    /// Tickets first seen this cycle.
    pub new: usize,
    /// Known tickets whose `updated_on` changed.
    pub updated: usize,
    /// Feeds that fetched and merged cleanly.
    pub feeds_ok: usize,
    pub failures: Vec<FeedFailure>,
}

impl SyncReport {
    /// Every configured feed failed — nothing was refreshed.
    pub fn all_failed(&self) -> bool {
        self.feeds_ok == 0 && !self.failures.is_empty()
    }

    /// One-line summary for the status row and CLI output.
    pub fn summary(&self) -> String {
        let mut out = format!("fetched {}", self.fetched);
        if self.new > 0 || self.updated > 0 {
            out.push_str(&format!(" (+{} new, ~{} updated)", self.new, self.updated));
        } else {
            out.push_str(", no changes");
        }
        if !self.failures.is_empty() {
            let n = self.failures.len();
            out.push_str(&format!(
                ", {} feed{} failed",
                n,
                if n == 1 { "" } else { "s" }
            ));
        }
        out
    }
}

/// Error type for faults that abort a whole cycle (per-feed errors don't).
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("could not build http client: {0}")]
    Client(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Run one fetch-merge-persist cycle against every configured feed.
///
/// A feed that fails is logged and reported but doesn't stop the cycle;
/// it gets retried when the next cycle fires. The store is persisted once
/// at the end, even when some feeds failed, so partial progress sticks.
pub fn run_sync(
    config: &Config,
    store: &mut TicketStore,
    dir: &Path,
) -> Result<SyncReport, SyncError> {
    let client = FeedClient::new(
        &config.redmine.api_key,
        Duration::from_secs(config.redmine.timeout_secs),
    )?;

    let mut report = SyncReport::default();
    for feed in normalize_feeds(config) {
        match client.fetch_feed(&feed) {
            Ok(tickets) => {
                report.fetched += tickets.len();
                let outcome = merge_tickets(store, tickets);
                report.new += outcome.new;
                report.updated += outcome.updated;
                if config.details.enabled {
                    enrich_details(&client, store, &outcome.changed_ids, config, dir);
                }
                report.feeds_ok += 1;
            }
            Err(e) => {
                let category = match &e {
                    FetchError::Atom(_) | FetchError::Detail(_) => LogCategory::Parse,
                    _ => LogCategory::Fetch,
                };
                synclog::log_failure(dir, category, "feed fetch failed", &feed.title, &e.to_string());
                report.failures.push(FeedFailure {
                    feed_title: feed.title.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    store_io::save_store(dir, store)?;
    Ok(report)
}

/// Secondary detail fetch for tickets that are new or changed this cycle.
/// Failures are logged and skipped; the ticket is retried whenever it next
/// changes.
fn enrich_details(
    client: &FeedClient,
    store: &mut TicketStore,
    changed_ids: &[String],
    config: &Config,
    dir: &Path,
) {
    for id in changed_ids {
        let Some(url) = store.get(id).map(|t| t.url.clone()) else {
            continue;
        };
        if url.is_empty() {
            continue;
        }
        match client.fetch_due_date(&url, &config.details.due_date_field) {
            Ok(due) if !due.is_empty() => {
                if let Some(ticket) = store.get_mut(id) {
                    ticket.due_date = due;
                }
            }
            Ok(_) => {}
            Err(e) => {
                synclog::log_failure(dir, LogCategory::Fetch, "detail fetch failed", id, &e.to_string());
            }
        }
    }
}

/// Result delivered by a background sync worker: the merged store and the
/// report, or a cycle-fatal error message.
pub type SyncResult = Result<(TicketStore, SyncReport), String>;

/// Run a sync cycle on a worker thread so the TUI keeps drawing the
/// countdown. The caller polls the returned channel each tick; the
/// schedule's single-flight flag guarantees at most one worker exists.
pub fn spawn_sync(config: Config, store: TicketStore, dir: PathBuf) -> mpsc::Receiver<SyncResult> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut store = store;
        let result = run_sync(&config, &mut store, &dir)
            .map(|report| (store, report))
            .map_err(|e| e.to_string());
        let _ = tx.send(result);
    });
    rx
}

/// Which feeds a sync would use. Exposed for the feeds view and `tw feeds`.
pub fn configured_feeds(config: &Config) -> Vec<Feed> {
    normalize_feeds(config)
}
