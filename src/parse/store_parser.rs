use std::collections::HashMap;

use crate::model::ticket::{Ticket, TicketStore};
use crate::parse::unescape_field;

/// Parse the ticket store file (header line + one escaped TSV row per
/// ticket).
///
/// Column lookup is by header name, so extra columns are ignored and
/// missing ones default. Rows without an `id` value can't be keyed and are
/// returned as dropped lines for the caller to log.
pub fn parse_store(source: &str) -> (TicketStore, Vec<String>) {
    let mut store = TicketStore::new();
    let mut dropped = Vec::new();

    let mut lines = source.lines();
    let header = match lines.next() {
        Some(h) if !h.trim().is_empty() => h,
        _ => return (store, dropped),
    };
    let columns: HashMap<&str, usize> = header
        .split('\t')
        .enumerate()
        .map(|(i, name)| (name.trim(), i))
        .collect();

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<String> = line.split('\t').map(unescape_field).collect();
        let get = |name: &str| -> String {
            columns
                .get(name)
                .and_then(|&i| fields.get(i))
                .cloned()
                .unwrap_or_default()
        };

        let id = get("id");
        if id.is_empty() {
            dropped.push(line.to_string());
            continue;
        }
        let done_at = get("done_at");
        store.insert(
            id.clone(),
            Ticket {
                id,
                subject: get("subject"),
                status: get("status"),
                updated_on: get("updated_on"),
                due_date: get("due_date"),
                url: get("url"),
                feed_id: get("feed_id"),
                feed_title: get("feed_title"),
                search_hit: parse_bool(&get("search_hit")),
                done: parse_bool(&get("done")),
                done_at: if done_at.is_empty() { None } else { Some(done_at) },
            },
        );
    }

    (store, dropped)
}

/// Accepts the serializer's `true`/`false` plus capitalized spellings from
/// hand edits.
fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "true" | "True" | "TRUE" | "1")
}
