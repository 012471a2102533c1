pub mod store_parser;
pub mod store_serializer;

pub use store_parser::parse_store;
pub use store_serializer::serialize_store;

/// Column order written by the serializer. The parser is header-driven, so
/// readers tolerate reordered or unknown columns from other versions.
pub const STORE_COLUMNS: &[&str] = &[
    "id",
    "subject",
    "status",
    "updated_on",
    "due_date",
    "url",
    "feed_id",
    "feed_title",
    "search_hit",
    "done",
    "done_at",
];

/// Escape a field for a tab-separated row.
pub(crate) fn escape_field(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for c in field.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Undo `escape_field`. Unknown escapes are kept verbatim.
pub(crate) fn unescape_field(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn escape_round_trips_control_chars() {
        let raw = "a\tb\nc\\d\re";
        assert_eq!(unescape_field(&escape_field(raw)), raw);
    }

    #[test]
    fn escaped_field_has_no_raw_separators() {
        let escaped = escape_field("a\tb\nc");
        assert!(!escaped.contains('\t'));
        assert!(!escaped.contains('\n'));
    }

    #[test]
    fn unknown_escape_is_kept() {
        assert_eq!(unescape_field("a\\xb"), "a\\xb");
        assert_eq!(unescape_field("trailing\\"), "trailing\\");
    }
}
