pub mod atom;
pub mod client;
pub mod detail;

pub use client::{FeedClient, FetchError};
