use serde::Serialize;

use crate::model::ticket::Ticket;
use crate::ops::sync::SyncReport;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TicketJson {
    pub id: String,
    pub subject: String,
    pub status: String,
    pub updated_on: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub due_date: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    pub search_hit: bool,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_at: Option<String>,
}

#[derive(Serialize)]
pub struct FeedGroupJson {
    pub feed_id: String,
    pub feed_title: String,
    pub open: usize,
    pub tickets: Vec<TicketJson>,
}

#[derive(Serialize)]
pub struct FeedInfoJson {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub search: Vec<String>,
    pub tickets: usize,
    pub open: usize,
}

#[derive(Serialize)]
pub struct SyncReportJson {
    pub fetched: usize,
    pub new: usize,
    pub updated: usize,
    pub feeds_ok: usize,
    pub failures: Vec<FeedFailureJson>,
}

#[derive(Serialize)]
pub struct FeedFailureJson {
    pub feed_title: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn ticket_to_json(ticket: &Ticket) -> TicketJson {
    TicketJson {
        id: ticket.id.clone(),
        subject: ticket.subject.clone(),
        status: ticket.status.clone(),
        updated_on: ticket.updated_on.clone(),
        due_date: ticket.due_date.clone(),
        url: ticket.url.clone(),
        search_hit: ticket.search_hit,
        done: ticket.done,
        done_at: ticket.done_at.clone(),
    }
}

pub fn report_to_json(report: &SyncReport) -> SyncReportJson {
    SyncReportJson {
        fetched: report.fetched,
        new: report.new,
        updated: report.updated,
        feeds_ok: report.feeds_ok,
        failures: report
            .failures
            .iter()
            .map(|f| FeedFailureJson {
                feed_title: f.feed_title.clone(),
                message: f.message.clone(),
            })
            .collect(),
    }
}

/// One text row for `tw list`: `  #42   [x] *  Broken login (due 2026-08-15)`
pub fn ticket_line(ticket: &Ticket) -> String {
    let done_mark = if ticket.done { "[x]" } else { "[ ]" };
    let hit_mark = if ticket.search_hit { "*" } else { " " };
    let mut line = format!(
        "  #{:<8} {} {} {}",
        ticket.id, done_mark, hit_mark, ticket.subject
    );
    if !ticket.due_date.is_empty() {
        line.push_str(&format!(" (due {})", ticket.due_date));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ticket() -> Ticket {
        Ticket {
            id: "42".into(),
            subject: "Broken login".into(),
            status: "New".into(),
            updated_on: "2026-08-01T10:00:00Z".into(),
            due_date: String::new(),
            url: "https://r.example/issues/42".into(),
            feed_id: "demo".into(),
            feed_title: "Demo feed".into(),
            search_hit: true,
            done: false,
            done_at: None,
        }
    }

    #[test]
    fn ticket_line_open_with_hit() {
        assert_eq!(ticket_line(&ticket()), "  #42       [ ] * Broken login");
    }

    #[test]
    fn ticket_line_done_with_due() {
        let mut t = ticket();
        t.done = true;
        t.search_hit = false;
        t.due_date = "2026-08-15".into();
        assert_eq!(
            ticket_line(&t),
            "  #42       [x]   Broken login (due 2026-08-15)"
        );
    }

    #[test]
    fn ticket_json_skips_empty_fields() {
        let mut t = ticket();
        t.due_date = String::new();
        t.url = String::new();
        let json = serde_json::to_value(ticket_to_json(&t)).unwrap();
        assert!(json.get("due_date").is_none());
        assert!(json.get("url").is_none());
        assert!(json.get("done_at").is_none());
        assert_eq!(json["id"], "42");
    }
}
