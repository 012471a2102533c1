pub mod config;
pub mod feed;
pub mod ticket;

pub use config::{Config, DetailConfig, FeedConfig, RedmineConfig, UiConfig};
pub use feed::Feed;
pub use ticket::{Ticket, TicketStore};
