use crate::model::ticket::{Ticket, TicketStore};
use crate::parse::{STORE_COLUMNS, escape_field};

/// Serialize the store to its on-disk form: header line, then one escaped
/// TSV row per ticket in store order.
pub fn serialize_store(store: &TicketStore) -> String {
    let mut out = String::new();
    out.push_str(&STORE_COLUMNS.join("\t"));
    out.push('\n');
    for ticket in store.values() {
        out.push_str(&serialize_row(ticket));
        out.push('\n');
    }
    out
}

fn serialize_row(t: &Ticket) -> String {
    let fields = [
        t.id.as_str(),
        t.subject.as_str(),
        t.status.as_str(),
        t.updated_on.as_str(),
        t.due_date.as_str(),
        t.url.as_str(),
        t.feed_id.as_str(),
        t.feed_title.as_str(),
        if t.search_hit { "true" } else { "false" },
        if t.done { "true" } else { "false" },
        t.done_at.as_deref().unwrap_or(""),
    ];
    fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join("\t")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_store;
    use pretty_assertions::assert_eq;

    fn ticket(id: &str) -> Ticket {
        Ticket {
            id: id.to_string(),
            subject: format!("Subject {}", id),
            status: "New".to_string(),
            updated_on: "2026-08-01T10:00:00Z".to_string(),
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
    fn empty_store_is_header_only() {
        let store = TicketStore::new();
        assert_eq!(
            serialize_store(&store),
            "id\tsubject\tstatus\tupdated_on\tdue_date\turl\tfeed_id\tfeed_title\tsearch_hit\tdone\tdone_at\n"
        );
    }

    #[test]
    fn single_row_layout() {
        let mut store = TicketStore::new();
        let mut t = ticket("42");
        t.done = true;
        t.done_at = Some("2026-08-02T18:30:00".to_string());
        store.insert(t.id.clone(), t);
        let out = serialize_store(&store);
        let row = out.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "42\tSubject 42\tNew\t2026-08-01T10:00:00Z\t\thttps://r.example/issues/42\tdemo\tDemo feed\tfalse\ttrue\t2026-08-02T18:30:00"
        );
    }

    #[test]
    fn round_trip_preserves_store() {
        let mut store = TicketStore::new();
        for id in ["3", "1", "2"] {
            store.insert(id.to_string(), ticket(id));
        }
        let mut weird = ticket("9");
        weird.subject = "tab\there\nand newline \\ backslash".to_string();
        store.insert("9".to_string(), weird);

        let (reparsed, dropped) = parse_store(&serialize_store(&store));
        assert!(dropped.is_empty());
        assert_eq!(reparsed, store);
    }

    #[test]
    fn row_order_follows_insertion_order() {
        let mut store = TicketStore::new();
        for id in ["b", "a", "c"] {
            store.insert(id.to_string(), ticket(id));
        }
        let out = serialize_store(&store);
        let first_col: Vec<&str> = out
            .lines()
            .skip(1)
            .map(|l| l.split('\t').next().unwrap())
            .collect();
        assert_eq!(first_col, vec!["b", "a", "c"]);
    }
}
