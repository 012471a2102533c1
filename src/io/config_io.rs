use std::fs;
use std::path::Path;

use crate::io::workspace::WorkspaceError;
use crate::model::config::Config;

/// Read the workspace config, returning both the parsed config and the raw
/// toml_edit document for round-trip-safe editing.
pub fn read_config(dir: &Path) -> Result<(Config, toml_edit::DocumentMut), WorkspaceError> {
    let config_path = dir.join("config.toml");
    let config_text = fs::read_to_string(&config_path).map_err(|e| WorkspaceError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: Config = toml::from_str(&config_text)?;
    let doc: toml_edit::DocumentMut = config_text.parse().map_err(|_: toml_edit::TomlError| {
        WorkspaceError::ConfigParseError(toml::from_str::<Config>("=").unwrap_err())
    })?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), WorkspaceError> {
    let config_path = dir.join("config.toml");
    fs::write(&config_path, doc.to_string()).map_err(|e| WorkspaceError::ReadError {
        path: config_path,
        source: e,
    })?;
    Ok(())
}

/// Append a `[[feeds]]` entry to the config document.
pub fn add_feed_to_config(
    doc: &mut toml_edit::DocumentMut,
    id: Option<&str>,
    title: &str,
    url: &str,
    search: Option<&str>,
) {
    if !doc.contains_key("feeds") {
        doc["feeds"] = toml_edit::Item::ArrayOfTables(toml_edit::ArrayOfTables::new());
    }

    if let Some(feeds) = doc["feeds"].as_array_of_tables_mut() {
        let mut table = toml_edit::Table::new();
        if let Some(id) = id {
            table["id"] = toml_edit::value(id);
        }
        table["title"] = toml_edit::value(title);
        table["url"] = toml_edit::value(url);
        if let Some(search) = search {
            table["search"] = toml_edit::value(search);
        }
        feeds.push(table);
    }
}

/// Remove every `[[feeds]]` entry whose `id` (or, for entries without an
/// `id`, whose slugified title) equals `feed_id`. Returns how many entries
/// were removed.
pub fn remove_feed_from_config(doc: &mut toml_edit::DocumentMut, feed_id: &str) -> usize {
    let Some(feeds) = doc["feeds"].as_array_of_tables_mut() else {
        return 0;
    };
    let before = feeds.len();
    feeds.retain(|table| {
        let id = table
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| {
                table
                    .get("title")
                    .and_then(|v| v.as_str())
                    .map(crate::model::feed::slugify)
                    .unwrap_or_default()
            });
        id != feed_id
    });
    before - feeds.len()
}

/// Update the refresh interval in the config document.
pub fn set_refresh_minutes(doc: &mut toml_edit::DocumentMut, minutes: u64) {
    if !doc.contains_key("redmine") {
        doc["redmine"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc["redmine"]["refresh_minutes"] = toml_edit::value(minutes as i64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_config() -> &'static str {
        r#"[redmine]
api_key = "abc123"
refresh_minutes = 30

[[feeds]]
id = "demo"
title = "Demo feed"
url = "https://redmine.example.com/projects/demo/issues.atom"
search = "urgent, crash"

[[feeds]]
title = "Ops feed"
url = "https://redmine.example.com/projects/ops/issues.atom"
"#
    }

    #[test]
    fn test_round_trip_config() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("tickwatch");
        fs::create_dir_all(&dir).unwrap();
        let config_path = dir.join("config.toml");

        let original = sample_config();
        fs::write(&config_path, original).unwrap();

        let (_config, doc) = read_config(&dir).unwrap();
        write_config(&dir, &doc).unwrap();

        let written = fs::read_to_string(&config_path).unwrap();
        assert_eq!(written, original);
    }

    #[test]
    fn test_add_feed() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        add_feed_to_config(
            &mut doc,
            Some("qa"),
            "QA feed",
            "https://redmine.example.com/projects/qa/issues.atom",
            Some("flaky"),
        );
        let config: Config = toml::from_str(&doc.to_string()).unwrap();
        assert_eq!(config.feeds.len(), 3);
        assert_eq!(config.feeds[2].id.as_deref(), Some("qa"));
        assert_eq!(config.feeds[2].search, "flaky");
    }

    #[test]
    fn test_add_feed_to_empty_config() {
        let mut doc: toml_edit::DocumentMut = "".parse().unwrap();
        add_feed_to_config(&mut doc, None, "First", "https://r.example/a.atom", None);
        let config: Config = toml::from_str(&doc.to_string()).unwrap();
        assert_eq!(config.feeds.len(), 1);
        assert_eq!(config.feeds[0].title, "First");
        assert!(config.feeds[0].id.is_none());
    }

    #[test]
    fn test_remove_feed_by_id() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        assert_eq!(remove_feed_from_config(&mut doc, "demo"), 1);
        let config: Config = toml::from_str(&doc.to_string()).unwrap();
        assert_eq!(config.feeds.len(), 1);
        assert_eq!(config.feeds[0].title, "Ops feed");
    }

    #[test]
    fn test_remove_feed_by_slugified_title() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        // The second feed has no id; its derived id is "ops-feed"
        assert_eq!(remove_feed_from_config(&mut doc, "ops-feed"), 1);
        let config: Config = toml::from_str(&doc.to_string()).unwrap();
        assert_eq!(config.feeds.len(), 1);
        assert_eq!(config.feeds[0].id.as_deref(), Some("demo"));
    }

    #[test]
    fn test_remove_feed_unknown_id() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        assert_eq!(remove_feed_from_config(&mut doc, "nope"), 0);
    }

    #[test]
    fn test_set_refresh_minutes() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        set_refresh_minutes(&mut doc, 5);
        assert!(doc.to_string().contains("refresh_minutes = 5"));
    }
}
