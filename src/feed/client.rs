use std::time::Duration;

use crate::feed::atom::{self, AtomError};
use crate::feed::detail;
use crate::model::feed::Feed;
use crate::model::ticket::Ticket;

/// Header Redmine expects the API key in.
const API_KEY_HEADER: &str = "X-Redmine-API-Key";

/// Error type for feed and detail fetches
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error(transparent)]
    Atom(#[from] AtomError),
    #[error("malformed issue JSON: {0}")]
    Detail(#[from] serde_json::Error),
}

/// Blocking HTTP client for Redmine Atom feeds and the issue detail
/// endpoint. One instance per sync cycle.
pub struct FeedClient {
    http: reqwest::blocking::Client,
    api_key: String,
}

impl FeedClient {
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(FeedClient {
            http,
            api_key: api_key.to_string(),
        })
    }

    /// Fetch one feed and turn its entries into ticket candidates, with the
    /// feed's keyword matching applied.
    pub fn fetch_feed(&self, feed: &Feed) -> Result<Vec<Ticket>, FetchError> {
        let body = self.get_text(&feed.url)?;
        let entries = atom::parse_entries(&body)?;
        let tickets = entries
            .iter()
            .map(|entry| {
                let hit = feed.matches(&entry.title, &entry.content);
                Ticket::from_entry(entry, feed, hit)
            })
            .collect();
        Ok(tickets)
    }

    /// Fetch the issue detail JSON for a ticket and extract its due date:
    /// `issue.due_date` when present, else the named custom field.
    pub fn fetch_due_date(
        &self,
        issue_url: &str,
        due_date_field: &str,
    ) -> Result<String, FetchError> {
        let detail_url = format!("{}.json?include=journals", issue_url.trim_end_matches('/'));
        let body = self.get_text(&detail_url)?;
        Ok(detail::due_date_from_json(&body, due_date_field)?)
    }

    fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(resp.text()?)
    }
}
