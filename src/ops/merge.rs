use crate::model::ticket::{Ticket, TicketStore};

/// What a merge changed, for the status summary and detail enrichment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Tickets not previously in the store.
    pub new: usize,
    /// Known tickets whose `updated_on` changed.
    pub updated: usize,
    /// IDs of new tickets plus those whose `updated_on` changed, in fetch
    /// order. These are the detail-fetch candidates.
    pub changed_ids: Vec<String>,
}

/// Merge freshly fetched tickets into the store.
///
/// Server-sourced fields are refreshed; user-owned fields (`done`,
/// `done_at`) and the locally fetched `due_date` are preserved. URL and
/// feed attribution only move to the fetched value when it is non-empty,
/// so a degraded feed can't blank them. Tickets absent from the fetch are
/// left untouched — the store is a superset of everything ever seen.
pub fn merge_tickets(store: &mut TicketStore, fetched: Vec<Ticket>) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();

    for t in fetched {
        match store.get_mut(&t.id) {
            Some(existing) => {
                let was_updated_on = existing.updated_on.clone();
                let merged = Ticket {
                    id: t.id,
                    subject: t.subject,
                    status: t.status,
                    updated_on: t.updated_on,
                    due_date: non_empty_or(t.due_date, &existing.due_date),
                    url: non_empty_or(t.url, &existing.url),
                    feed_id: non_empty_or(t.feed_id, &existing.feed_id),
                    feed_title: non_empty_or(t.feed_title, &existing.feed_title),
                    search_hit: t.search_hit,
                    done: existing.done,
                    done_at: existing.done_at.clone(),
                };
                if merged.updated_on != was_updated_on {
                    outcome.updated += 1;
                    outcome.changed_ids.push(merged.id.clone());
                }
                *existing = merged;
            }
            None => {
                outcome.new += 1;
                outcome.changed_ids.push(t.id.clone());
                store.insert(t.id.clone(), t);
            }
        }
    }

    outcome
}

fn non_empty_or(fresh: String, fallback: &str) -> String {
    if fresh.is_empty() {
        fallback.to_string()
    } else {
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ticket(id: &str, updated_on: &str) -> Ticket {
        Ticket {
            id: id.to_string(),
            subject: format!("Subject {}", id),
            status: "New".to_string(),
            updated_on: updated_on.to_string(),
            due_date: String::new(),
            url: format!("https://r.example/issues/{}", id),
            feed_id: "demo".to_string(),
            feed_title: "Demo feed".to_string(),
            search_hit: false,
            done: false,
            done_at: None,
        }
    }

    #[test]
    fn new_tickets_are_inserted() {
        let mut store = TicketStore::new();
        let outcome = merge_tickets(&mut store, vec![ticket("1", "t1"), ticket("2", "t1")]);
        assert_eq!(outcome.new, 2);
        assert_eq!(outcome.updated, 0);
        assert_eq!(outcome.changed_ids, vec!["1", "2"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn done_flag_survives_refresh() {
        let mut store = TicketStore::new();
        let mut existing = ticket("1", "t1");
        existing.done = true;
        existing.done_at = Some("2026-08-02T18:30:00".to_string());
        store.insert("1".to_string(), existing);

        let mut fresh = ticket("1", "t2");
        fresh.subject = "Renamed subject".to_string();
        fresh.status = "In Progress".to_string();
        let outcome = merge_tickets(&mut store, vec![fresh]);

        assert_eq!(outcome.updated, 1);
        let t = &store["1"];
        assert!(t.done);
        assert_eq!(t.done_at.as_deref(), Some("2026-08-02T18:30:00"));
        // Server fields refreshed
        assert_eq!(t.subject, "Renamed subject");
        assert_eq!(t.status, "In Progress");
        assert_eq!(t.updated_on, "t2");
    }

    #[test]
    fn due_date_survives_unless_fetch_has_one() {
        let mut store = TicketStore::new();
        let mut existing = ticket("1", "t1");
        existing.due_date = "2026-08-15".to_string();
        store.insert("1".to_string(), existing);

        // Feed entries never carry a due date
        merge_tickets(&mut store, vec![ticket("1", "t2")]);
        assert_eq!(store["1"].due_date, "2026-08-15");

        let mut with_due = ticket("1", "t3");
        with_due.due_date = "2026-09-01".to_string();
        merge_tickets(&mut store, vec![with_due]);
        assert_eq!(store["1"].due_date, "2026-09-01");
    }

    #[test]
    fn unchanged_updated_on_counts_as_neither() {
        let mut store = TicketStore::new();
        store.insert("1".to_string(), ticket("1", "t1"));

        let outcome = merge_tickets(&mut store, vec![ticket("1", "t1")]);
        assert_eq!(outcome.new, 0);
        assert_eq!(outcome.updated, 0);
        assert!(outcome.changed_ids.is_empty());
    }

    #[test]
    fn empty_url_does_not_clobber() {
        let mut store = TicketStore::new();
        store.insert("1".to_string(), ticket("1", "t1"));

        let mut fresh = ticket("1", "t2");
        fresh.url = String::new();
        fresh.feed_title = String::new();
        merge_tickets(&mut store, vec![fresh]);

        assert_eq!(store["1"].url, "https://r.example/issues/1");
        assert_eq!(store["1"].feed_title, "Demo feed");
    }

    #[test]
    fn search_hit_is_refreshed_both_ways() {
        let mut store = TicketStore::new();
        let mut existing = ticket("1", "t1");
        existing.search_hit = true;
        store.insert("1".to_string(), existing);

        merge_tickets(&mut store, vec![ticket("1", "t2")]);
        assert!(!store["1"].search_hit);
    }

    #[test]
    fn absent_tickets_are_kept() {
        let mut store = TicketStore::new();
        store.insert("1".to_string(), ticket("1", "t1"));
        store.insert("2".to_string(), ticket("2", "t1"));

        merge_tickets(&mut store, vec![ticket("2", "t2")]);
        assert_eq!(store.len(), 2);
        assert!(store.contains_key("1"));
    }
}
