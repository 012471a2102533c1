use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Placeholder API key written by `tw init`; sync refuses to run with it.
pub const API_KEY_PLACEHOLDER: &str = "PUT_YOUR_API_KEY";

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub redmine: RedmineConfig,
    #[serde(default)]
    pub details: DetailConfig,
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedmineConfig {
    /// Sent as `X-Redmine-API-Key` on every request.
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// Poll interval. Values below 1 are clamped to 1.
    #[serde(default = "default_refresh_minutes")]
    pub refresh_minutes: u64,
    /// Per-request HTTP timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RedmineConfig {
    fn default() -> Self {
        RedmineConfig {
            api_key: default_api_key(),
            refresh_minutes: default_refresh_minutes(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Secondary per-issue detail fetch (due-date enrichment).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Custom field name consulted when `issue.due_date` is empty.
    #[serde(default)]
    pub due_date_field: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Stable grouping ID. Derived from the title when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// Comma-separated keywords matched against entry title/content.
    #[serde(default)]
    pub search: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub show_key_hints: bool,
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

fn default_api_key() -> String {
    API_KEY_PLACEHOLDER.to_string()
}

/// Default: see src/templates/config.toml
fn default_refresh_minutes() -> u64 {
    30
}

/// Default: see src/templates/config.toml
fn default_timeout_secs() -> u64 {
    15
}

/// Why a sync cannot start with the current config.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigIssue {
    #[error("api_key is not set — edit [redmine] in config.toml")]
    MissingApiKey,
    #[error("no feeds configured — add a [[feeds]] entry or use `tw feeds add`")]
    NoFeeds,
}

impl Config {
    /// Check that a sync can run: real API key and at least one usable feed.
    pub fn check_ready(&self) -> Result<(), ConfigIssue> {
        let key = self.redmine.api_key.trim();
        if key.is_empty() || key == API_KEY_PLACEHOLDER {
            return Err(ConfigIssue::MissingApiKey);
        }
        if !self.feeds.iter().any(|f| !f.url.trim().is_empty()) {
            return Err(ConfigIssue::NoFeeds);
        }
        Ok(())
    }

    /// Poll interval with the 1-minute floor applied.
    pub fn refresh_minutes(&self) -> u64 {
        self.redmine.refresh_minutes.max(1)
    }
}
