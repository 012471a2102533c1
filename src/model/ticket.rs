use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::feed::atom::FeedEntry;
use crate::model::feed::Feed;

/// All tickets ever seen, keyed by ticket ID. Insertion order is the
/// on-disk row order, so saves are stable across runs.
pub type TicketStore = IndexMap<String, Ticket>;

/// One Redmine ticket as tracked across polls.
///
/// Server-sourced fields are refreshed on every sync. `done`/`done_at` are
/// user-owned and `due_date` is filled by the detail fetch; the reconciler
/// preserves all three.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Numeric issue ID extracted from the entry (`#1234`), or the raw
    /// entry ID when no number is present.
    pub id: String,
    /// Subject with the `Project - Tracker #1234: ` prefix stripped.
    pub subject: String,
    /// Issue status from the Atom `<category term="...">`.
    pub status: String,
    /// Server-side last-updated timestamp, kept verbatim.
    pub updated_on: String,
    /// Due date from the detail fetch. Empty until enriched.
    #[serde(default)]
    pub due_date: String,
    /// Issue URL (Redmine puts it in the Atom entry ID).
    pub url: String,
    /// ID of the feed this ticket was last seen in.
    pub feed_id: String,
    /// Display title of that feed.
    pub feed_title: String,
    /// Whether the owning feed's keywords matched title/content.
    #[serde(default)]
    pub search_hit: bool,
    /// User-set completion flag.
    #[serde(default)]
    pub done: bool,
    /// Local timestamp of when `done` was last set. Cleared on un-done.
    #[serde(default)]
    pub done_at: Option<String>,
}

impl Ticket {
    /// Build a ticket candidate from a parsed Atom entry.
    pub fn from_entry(entry: &FeedEntry, feed: &Feed, search_hit: bool) -> Self {
        let status = if entry.category_term.is_empty() {
            "unknown".to_string()
        } else {
            entry.category_term.clone()
        };
        Ticket {
            id: extract_ticket_id(&entry.id, &entry.title),
            subject: extract_subject(&entry.title),
            status,
            updated_on: entry.updated.trim().to_string(),
            due_date: String::new(),
            // Redmine's atom:id is usually the issue URL
            url: entry.id.clone(),
            feed_id: feed.id.clone(),
            feed_title: feed.title.clone(),
            search_hit,
            done: false,
            done_at: None,
        }
    }
}

/// Extract the numeric ticket ID from an entry ID or title.
///
/// Looks for `#` followed by digits (`.../issues#1234`, `Tracker #1234: ...`)
/// in the entry ID first, then the title. Falls back to the raw entry ID,
/// then the raw title, then `"unknown"`.
pub fn extract_ticket_id(entry_id: &str, title: &str) -> String {
    for candidate in [entry_id, title] {
        if let Some(num) = hash_number(candidate) {
            return num;
        }
    }
    if !entry_id.is_empty() {
        return entry_id.to_string();
    }
    if !title.is_empty() {
        return title.to_string();
    }
    "unknown".to_string()
}

/// First `#NNN` digit run in the text, without the `#`.
fn hash_number(text: &str) -> Option<String> {
    let mut rest = text;
    while let Some(pos) = rest.find('#') {
        let after = &rest[pos + 1..];
        let digits: String = after.chars().take_while(|c| c.is_ascii_digit()).collect();
        if !digits.is_empty() {
            return Some(digits);
        }
        rest = after;
    }
    None
}

/// Strip the `Project - Tracker #1234: ` prefix from an Atom title.
pub fn extract_subject(title: &str) -> String {
    let title = title.trim();
    match title.split_once(": ") {
        Some((_, subject)) => subject.to_string(),
        None => title.to_string(),
    }
}
