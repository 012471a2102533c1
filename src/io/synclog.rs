use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

/// Maximum size of the sync log before inline trimming (1 MB).
const MAX_LOG_SIZE: u64 = 1_048_576;

/// Default number of days before entries are prunable.
pub const PRUNE_AGE_DAYS: i64 = 30;

/// Self-documenting header written at the top of a new sync log.
const FILE_HEADER: &str = "\
<!-- tickwatch sync log — append-only record of failed fetches and writes
     A failed feed is retried on the next poll cycle; the error lands here.
     View with: tw log
     Safe to delete if empty or stale. -->

---
";

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// What failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    /// Feed or detail HTTP fetch failed.
    Fetch,
    /// Atom/JSON/store content could not be parsed.
    Parse,
    /// Store or config write failed.
    Write,
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogCategory::Fetch => write!(f, "fetch"),
            LogCategory::Parse => write!(f, "parse"),
            LogCategory::Write => write!(f, "write"),
        }
    }
}

impl LogCategory {
    pub fn parse_category(s: &str) -> Option<Self> {
        match s {
            "fetch" => Some(LogCategory::Fetch),
            "parse" => Some(LogCategory::Parse),
            "write" => Some(LogCategory::Write),
            _ => None,
        }
    }
}

/// A single entry in the sync log.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub category: LogCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

// ---------------------------------------------------------------------------
// Path helper
// ---------------------------------------------------------------------------

/// Return the path to the sync log file.
pub fn sync_log_path(dir: &Path) -> PathBuf {
    dir.join(".sync.log")
}

// ---------------------------------------------------------------------------
// Atomic file write
// ---------------------------------------------------------------------------

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry formatting
// ---------------------------------------------------------------------------

impl LogEntry {
    /// Format this entry as a markdown block for the sync log.
    fn to_markdown(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "## {} — {}: {}\n",
            self.timestamp
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.category,
            self.description,
        ));
        out.push('\n');

        for (key, value) in &self.fields {
            out.push_str(&format!("{}: {}\n", key, value));
        }

        if !self.body.is_empty() {
            out.push('\n');
            out.push_str("```text\n");
            out.push_str(&self.body);
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n");
        }

        out.push('\n');
        out.push_str("---\n");
        out
    }

    /// Serialize to JSON value for `tw log --json`.
    pub fn to_json(&self) -> serde_json::Value {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();

        serde_json::json!({
            "timestamp": self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "category": self.category.to_string(),
            "description": self.description,
            "fields": fields,
            "body": self.body,
        })
    }

    /// Format as human-readable raw markdown for display.
    pub fn to_display_markdown(&self) -> String {
        self.to_markdown()
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Append an entry to the sync log. Errors are swallowed and printed to
/// stderr; a broken log must never abort a sync cycle.
pub fn log_event(dir: &Path, entry: LogEntry) {
    if let Err(e) = log_event_inner(dir, entry) {
        eprintln!("warning: could not write to sync log: {}", e);
    }
}

/// Convenience: log a failure with a single field and the error text as body.
pub fn log_failure(dir: &Path, category: LogCategory, description: &str, target: &str, error: &str) {
    log_event(
        dir,
        LogEntry {
            timestamp: Utc::now(),
            category,
            description: description.to_string(),
            fields: vec![("Target".to_string(), target.to_string())],
            body: error.to_string(),
        },
    );
}

fn log_event_inner(dir: &Path, entry: LogEntry) -> io::Result<()> {
    let path = sync_log_path(dir);

    if let Ok(meta) = std::fs::metadata(&path)
        && meta.len() > MAX_LOG_SIZE
    {
        try_inline_trim(&path);
    }

    let needs_header = !path.exists() || std::fs::metadata(&path).map_or(true, |m| m.len() == 0);

    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;

    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }

    file.write_all(entry.to_markdown().as_bytes())?;
    Ok(())
}

/// Trim old entries when the log exceeds MAX_LOG_SIZE. Uses a non-blocking
/// try-lock on the file itself; if another process holds it, skip.
fn try_inline_trim(path: &Path) {
    let file = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(f) => f,
        Err(_) => return,
    };

    let fd = {
        use std::os::unix::io::AsRawFd;
        file.as_raw_fd()
    };
    let ret = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
    if ret != 0 {
        return;
    }

    let mut content = String::new();
    let mut reader = io::BufReader::new(&file);
    if reader.read_to_string(&mut content).is_err() {
        return;
    }

    let cutoff = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS);
    let trimmed = prune_entries_before(&content, &cutoff);

    if trimmed.len() < content.len()
        && let Ok(mut f) = File::create(path)
    {
        let _ = f.write_all(trimmed.as_bytes());
    }

    // Lock released on drop
}

// ---------------------------------------------------------------------------
// Reading entries
// ---------------------------------------------------------------------------

/// Read entries from the sync log, most recent first. `limit` keeps only
/// the newest N.
pub fn read_log_entries(dir: &Path, limit: Option<usize>) -> Vec<LogEntry> {
    let path = sync_log_path(dir);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    let mut entries = parse_entries(&content);

    if let Some(n) = limit {
        let skip = entries.len().saturating_sub(n);
        entries = entries.into_iter().skip(skip).collect();
    }

    entries.reverse();
    entries
}

/// Parse all entries from the log content string (oldest first).
fn parse_entries(content: &str) -> Vec<LogEntry> {
    let mut entries = Vec::new();
    let mut lines = content.lines().peekable();

    while let Some(line) = lines.next() {
        // Entry headers: ## <timestamp> — <category>: <description>
        if !line.starts_with("## ") {
            continue;
        }

        let Some((timestamp, category, description)) = parse_entry_header(&line[3..]) else {
            continue;
        };

        let mut fields = Vec::new();
        let mut body = String::new();
        let mut in_code_block = false;

        for line in lines.by_ref() {
            if line == "---" && !in_code_block {
                break;
            }
            if line.starts_with("## ") && !in_code_block {
                // Next entry — the separator went missing
                break;
            }

            if in_code_block {
                if line == "```" {
                    in_code_block = false;
                } else {
                    if !body.is_empty() {
                        body.push('\n');
                    }
                    body.push_str(line);
                }
                continue;
            }

            if line.starts_with("```") {
                in_code_block = true;
                continue;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(colon) = trimmed.find(": ") {
                fields.push((trimmed[..colon].to_string(), trimmed[colon + 2..].to_string()));
            }
        }

        entries.push(LogEntry {
            timestamp,
            category,
            description,
            fields,
            body,
        });
    }

    entries
}

/// Parse an entry header: `<timestamp> — <category>: <description>`
fn parse_entry_header(header: &str) -> Option<(DateTime<Utc>, LogCategory, String)> {
    let dash_pos = header.find(" — ")?;
    let timestamp_str = &header[..dash_pos];
    let rest = &header[dash_pos + " — ".len()..];

    let timestamp = DateTime::parse_from_rfc3339(timestamp_str)
        .ok()?
        .with_timezone(&Utc);

    let colon_pos = rest.find(": ")?;
    let category = LogCategory::parse_category(&rest[..colon_pos])?;

    Some((timestamp, category, rest[colon_pos + 2..].to_string()))
}

// ---------------------------------------------------------------------------
// Pruning
// ---------------------------------------------------------------------------

/// Remove entries with timestamps before `cutoff` from the raw content.
/// Preserves the file header.
fn prune_entries_before(content: &str, cutoff: &DateTime<Utc>) -> String {
    let mut result = String::new();
    let mut current_entry = String::new();
    let mut current_timestamp: Option<DateTime<Utc>> = None;
    let mut in_header = true;

    for line in content.lines() {
        // The file header ends at the first ---
        if in_header {
            result.push_str(line);
            result.push('\n');
            if line == "---" {
                in_header = false;
            }
            continue;
        }

        if let Some(stripped) = line.strip_prefix("## ") {
            if let Some(ts) = current_timestamp
                && ts >= *cutoff
            {
                result.push_str(&current_entry);
            }
            current_entry.clear();
            current_timestamp = parse_entry_header(stripped).map(|(ts, _, _)| ts);
            current_entry.push_str(line);
            current_entry.push('\n');
        } else {
            current_entry.push_str(line);
            current_entry.push('\n');
        }
    }

    if let Some(ts) = current_timestamp
        && ts >= *cutoff
    {
        result.push_str(&current_entry);
    }

    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn make_entry(category: LogCategory, desc: &str, body: &str) -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            category,
            description: desc.to_string(),
            fields: vec![("Target".to_string(), "Demo feed".to_string())],
            body: body.to_string(),
        }
    }

    #[test]
    fn entry_formatting() {
        let entry = LogEntry {
            timestamp: Utc.with_ymd_and_hms(2026, 8, 2, 14, 32, 5).unwrap(),
            category: LogCategory::Fetch,
            description: "feed fetch failed".to_string(),
            fields: vec![("Target".to_string(), "Demo feed".to_string())],
            body: "HTTP 503".to_string(),
        };
        insta::assert_snapshot!(entry.to_markdown(), @r"
        ## 2026-08-02T14:32:05Z — fetch: feed fetch failed

        Target: Demo feed

        ```text
        HTTP 503
        ```

        ---
        ");
    }

    #[test]
    fn log_and_read() {
        let tmp = TempDir::new().unwrap();
        log_event(tmp.path(), make_entry(LogCategory::Fetch, "test1", "body1"));
        log_event(tmp.path(), make_entry(LogCategory::Write, "test2", "body2"));

        let entries = read_log_entries(tmp.path(), None);
        assert_eq!(entries.len(), 2);
        // Most recent first
        assert_eq!(entries[0].description, "test2");
        assert_eq!(entries[1].description, "test1");
    }

    #[test]
    fn read_with_limit() {
        let tmp = TempDir::new().unwrap();
        for i in 0..5 {
            log_event(
                tmp.path(),
                make_entry(LogCategory::Parse, &format!("entry{}", i), ""),
            );
        }

        let entries = read_log_entries(tmp.path(), Some(2));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].description, "entry4");
        assert_eq!(entries[1].description, "entry3");
    }

    #[test]
    fn round_trip_parse() {
        let tmp = TempDir::new().unwrap();
        let original = LogEntry {
            timestamp: Utc::now(),
            category: LogCategory::Write,
            description: "store write failed".to_string(),
            fields: vec![
                ("Target".to_string(), "tickets.tsv".to_string()),
                ("Error".to_string(), "Permission denied".to_string()),
            ],
            body: "id\tsubject\n42\tBroken login".to_string(),
        };
        log_event(tmp.path(), original);

        let entries = read_log_entries(tmp.path(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, LogCategory::Write);
        assert_eq!(entries[0].description, "store write failed");
        assert_eq!(entries[0].fields.len(), 2);
        assert_eq!(entries[0].body, "id\tsubject\n42\tBroken login");
    }

    #[test]
    fn file_header_created_on_first_write() {
        let tmp = TempDir::new().unwrap();
        log_event(tmp.path(), make_entry(LogCategory::Fetch, "test", "body"));

        let content = std::fs::read_to_string(sync_log_path(tmp.path())).unwrap();
        assert!(content.starts_with("<!-- tickwatch sync log"));
    }

    #[test]
    fn entry_to_json() {
        let entry = make_entry(LogCategory::Fetch, "feed fetch failed", "HTTP 503");
        let json = entry.to_json();
        assert_eq!(json["category"], "fetch");
        assert_eq!(json["description"], "feed fetch failed");
        assert_eq!(json["body"], "HTTP 503");
        assert_eq!(json["fields"]["Target"], "Demo feed");
    }

    #[test]
    fn parse_entry_header_valid() {
        let result = parse_entry_header("2026-08-02T14:32:05Z — fetch: feed fetch failed");
        let (_, cat, desc) = result.unwrap();
        assert_eq!(cat, LogCategory::Fetch);
        assert_eq!(desc, "feed fetch failed");
    }

    #[test]
    fn parse_entry_header_invalid() {
        assert!(parse_entry_header("not a valid header").is_none());
        assert!(parse_entry_header("2026-08-02T14:32:05Z — unknown: desc").is_none());
    }

    #[test]
    fn empty_body_entry_has_no_code_fence() {
        let entry = LogEntry {
            timestamp: Utc::now(),
            category: LogCategory::Parse,
            description: "dropped rows".to_string(),
            fields: vec![("Source".to_string(), "tickets.tsv".to_string())],
            body: String::new(),
        };
        let md = entry.to_markdown();
        assert!(!md.contains("```"));
        assert!(md.contains("parse: dropped rows"));
    }

    #[test]
    fn prune_keeps_recent_entries_and_header() {
        let old = LogEntry {
            timestamp: Utc::now() - chrono::Duration::days(60),
            category: LogCategory::Fetch,
            description: "old".to_string(),
            fields: vec![],
            body: String::new(),
        };
        let new = LogEntry {
            timestamp: Utc::now(),
            category: LogCategory::Write,
            description: "new".to_string(),
            fields: vec![],
            body: String::new(),
        };
        let content = format!("{}{}{}", FILE_HEADER, old.to_markdown(), new.to_markdown());

        let cutoff = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS);
        let trimmed = prune_entries_before(&content, &cutoff);

        assert!(trimmed.contains("tickwatch sync log"));
        assert!(!trimmed.contains("fetch: old"));
        assert!(trimmed.contains("write: new"));
    }

    #[test]
    fn read_nonexistent_returns_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(read_log_entries(&tmp.path().join("missing"), None).is_empty());
    }

    #[test]
    fn atomic_write_overwrites() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("test.txt");

        atomic_write(&path, b"hello world").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello world");

        atomic_write(&path, b"goodbye").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "goodbye");
    }
}
