use chrono::Local;

use crate::model::ticket::{Ticket, TicketStore};

/// Error type for ticket operations
#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error("ticket not found: {0}")]
    NotFound(String),
}

/// Mark done and stamp `done_at`. Re-marking an already-done ticket keeps
/// the original timestamp.
pub fn set_done(ticket: &mut Ticket) {
    if !ticket.done {
        ticket.done = true;
        ticket.done_at = Some(now_stamp());
    }
}

/// Clear the done flag and its timestamp.
pub fn clear_done(ticket: &mut Ticket) {
    ticket.done = false;
    ticket.done_at = None;
}

/// Flip the done flag.
pub fn toggle_done(ticket: &mut Ticket) {
    if ticket.done {
        clear_done(ticket);
    } else {
        set_done(ticket);
    }
}

/// Set or clear done on a ticket in the store by ID.
pub fn mark_done(store: &mut TicketStore, id: &str, done: bool) -> Result<(), TicketError> {
    let ticket = store
        .get_mut(id)
        .ok_or_else(|| TicketError::NotFound(id.to_string()))?;
    if done {
        set_done(ticket);
    } else {
        clear_done(ticket);
    }
    Ok(())
}

/// Local timestamp at seconds resolution, as stored in `done_at`.
pub fn now_stamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}
