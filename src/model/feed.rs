use std::collections::HashSet;

use crate::model::config::Config;

/// A normalized feed subscription: validated URL, stable ID, split keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Lowercased keyword terms from the config `search` string.
    pub terms: Vec<String>,
}

impl Feed {
    /// Whether any keyword term occurs in the entry title or content.
    /// An empty term list never matches.
    pub fn matches(&self, title: &str, content: &str) -> bool {
        if self.terms.is_empty() {
            return false;
        }
        let title = title.to_lowercase();
        let content = content.to_lowercase();
        self.terms
            .iter()
            .any(|term| title.contains(term) || content.contains(term))
    }
}

/// Normalize the configured feed list: entries without a URL are skipped,
/// missing IDs are derived from the title, and duplicate IDs get a numeric
/// suffix so every feed groups separately.
pub fn normalize_feeds(config: &Config) -> Vec<Feed> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut feeds = Vec::new();
    for fc in &config.feeds {
        if fc.url.trim().is_empty() {
            continue;
        }
        let title = if fc.title.trim().is_empty() {
            "feed".to_string()
        } else {
            fc.title.trim().to_string()
        };
        let base = match &fc.id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => slugify(&title),
        };
        let id = unique_id(base, &mut taken);
        feeds.push(Feed {
            id,
            title,
            url: fc.url.trim().to_string(),
            terms: split_terms(&fc.search),
        });
    }
    feeds
}

fn unique_id(base: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(base.clone()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}-{}", base, n);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Split a comma-separated keyword string into trimmed, lowercased terms.
pub fn split_terms(search: &str) -> Vec<String> {
    search
        .split(',')
        .map(|part| part.trim().to_lowercase())
        .filter(|part| !part.is_empty())
        .collect()
}

/// Lowercase alphanumeric with hyphens, collapsing everything else.
pub fn slugify(title: &str) -> String {
    let mut slug = String::new();
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() { "feed".to_string() } else { slug }
}
