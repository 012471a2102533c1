use quick_xml::Reader;
use quick_xml::events::Event;

/// One `<entry>` from a Redmine issues Atom feed, with just the elements
/// the tracker uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    /// `<id>` — Redmine puts the issue URL here.
    pub id: String,
    /// `<title>` — usually `Project - Tracker #1234: Subject`.
    pub title: String,
    /// `<updated>` timestamp, verbatim.
    pub updated: String,
    /// `<content>` text, used only for keyword matching.
    pub content: String,
    /// `term` attribute of the first `<category>` — the issue status.
    pub category_term: String,
}

/// Error type for Atom parsing
#[derive(Debug, thiserror::Error)]
pub enum AtomError {
    #[error("malformed feed XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed feed XML: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),
}

/// Which entry child element text is currently being collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Title,
    Updated,
    Content,
}

/// Parse the `<entry>` elements out of an Atom document.
///
/// Namespace prefixes are ignored (matching is on local names), entities
/// are unescaped, and elements the tracker doesn't use are skipped. Feeds
/// with no entries parse to an empty list.
pub fn parse_entries(xml: &str) -> Result<Vec<FeedEntry>, AtomError> {
    let mut reader = Reader::from_str(xml);
    let mut entries = Vec::new();
    let mut current: Option<FeedEntry> = None;
    let mut field: Option<Field> = None;
    // Depth of nested elements inside the field being collected, so markup
    // inside e.g. xhtml content doesn't end collection early.
    let mut field_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) => {
                let name = e.local_name();
                if field.is_some() {
                    field_depth += 1;
                    continue;
                }
                match name.as_ref() {
                    b"entry" => current = Some(FeedEntry::default()),
                    b"id" if current.is_some() => field = Some(Field::Id),
                    b"title" if current.is_some() => field = Some(Field::Title),
                    b"updated" if current.is_some() => field = Some(Field::Updated),
                    b"content" if current.is_some() => field = Some(Field::Content),
                    b"category" => read_category(&e, current.as_mut()),
                    _ => {}
                }
            }
            Event::Empty(e) => {
                if field.is_none() && e.local_name().as_ref() == b"category" {
                    read_category(&e, current.as_mut());
                }
            }
            Event::Text(e) => {
                if let (Some(field), Some(entry)) = (field, current.as_mut()) {
                    let text = e.unescape()?;
                    append_field(entry, field, &text);
                }
            }
            Event::CData(e) => {
                if let (Some(field), Some(entry)) = (field, current.as_mut()) {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    append_field(entry, field, &text);
                }
            }
            Event::End(e) => {
                if field.is_some() {
                    if field_depth > 0 {
                        field_depth -= 1;
                    } else {
                        field = None;
                    }
                    continue;
                }
                if e.local_name().as_ref() == b"entry"
                    && let Some(entry) = current.take()
                {
                    entries.push(entry);
                }
            }
            _ => {}
        }
    }

    Ok(entries)
}

fn append_field(entry: &mut FeedEntry, field: Field, text: &str) {
    let slot = match field {
        Field::Id => &mut entry.id,
        Field::Title => &mut entry.title,
        Field::Updated => &mut entry.updated,
        Field::Content => &mut entry.content,
    };
    slot.push_str(text);
}

/// Pull the `term` attribute off a `<category>` start tag. Only the first
/// category of an entry wins (Redmine emits one: the status).
fn read_category(e: &quick_xml::events::BytesStart<'_>, current: Option<&mut FeedEntry>) {
    let Some(entry) = current else { return };
    if !entry.category_term.is_empty() {
        return;
    }
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == b"term" {
            entry.category_term = String::from_utf8_lossy(&attr.value).into_owned();
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Demo: Issues</title>
  <updated>2026-08-01T10:00:00Z</updated>
  <entry>
    <title>Demo - Bug #42: Broken login</title>
    <id>https://redmine.example.com/issues/42</id>
    <updated>2026-08-01T09:58:12Z</updated>
    <category term="In Progress"/>
    <content type="html">&lt;p&gt;Login crashes with a 500&lt;/p&gt;</content>
  </entry>
  <entry>
    <title>Demo - Feature #43: Faster exports</title>
    <id>https://redmine.example.com/issues/43</id>
    <updated>2026-07-31T16:00:00Z</updated>
    <category term="New"/>
    <content type="html">Exports take minutes</content>
  </entry>
</feed>
"#;

    #[test]
    fn parses_all_entries() {
        let entries = parse_entries(SAMPLE_FEED).unwrap();
        assert_eq!(entries.len(), 2);

        let e = &entries[0];
        assert_eq!(e.title, "Demo - Bug #42: Broken login");
        assert_eq!(e.id, "https://redmine.example.com/issues/42");
        assert_eq!(e.updated, "2026-08-01T09:58:12Z");
        assert_eq!(e.category_term, "In Progress");
        assert_eq!(e.content, "<p>Login crashes with a 500</p>");

        assert_eq!(entries[1].category_term, "New");
    }

    #[test]
    fn feed_level_elements_are_not_entry_fields() {
        // The feed's own <title>/<updated> must not leak into entries
        let entries = parse_entries(SAMPLE_FEED).unwrap();
        assert!(!entries[0].title.contains("Demo: Issues"));
        assert_ne!(entries[0].updated, "2026-08-01T10:00:00Z");
    }

    #[test]
    fn empty_feed_parses_to_no_entries() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>Empty</title></feed>"#;
        assert_eq!(parse_entries(xml).unwrap(), Vec::new());
    }

    #[test]
    fn missing_elements_default_to_empty() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry><title>Only a title</title></entry>
</feed>"#;
        let entries = parse_entries(xml).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Only a title");
        assert_eq!(entries[0].id, "");
        assert_eq!(entries[0].category_term, "");
    }

    #[test]
    fn namespace_prefixes_are_ignored() {
        let xml = r#"<a:feed xmlns:a="http://www.w3.org/2005/Atom">
  <a:entry>
    <a:title>Prefixed #9: entry</a:title>
    <a:id>https://r.example/issues/9</a:id>
    <a:category term="Closed"></a:category>
  </a:entry>
</a:feed>"#;
        let entries = parse_entries(xml).unwrap();
        assert_eq!(entries[0].title, "Prefixed #9: entry");
        assert_eq!(entries[0].category_term, "Closed");
    }

    #[test]
    fn cdata_content_is_collected() {
        let xml = r#"<feed><entry><content><![CDATA[raw <b>html</b> here]]></content></entry></feed>"#;
        let entries = parse_entries(xml).unwrap();
        assert_eq!(entries[0].content, "raw <b>html</b> here");
    }

    #[test]
    fn nested_markup_in_content_does_not_end_collection() {
        let xml = r#"<feed><entry>
  <content type="xhtml"><div>first<p>second</p>third</div></content>
  <updated>2026-08-01T00:00:00Z</updated>
</entry></feed>"#;
        let entries = parse_entries(xml).unwrap();
        assert_eq!(entries[0].content, "firstsecondthird");
        assert_eq!(entries[0].updated, "2026-08-01T00:00:00Z");
    }

    #[test]
    fn first_category_wins() {
        let xml = r#"<feed><entry>
  <category term="New"/>
  <category term="Other"/>
</entry></feed>"#;
        let entries = parse_entries(xml).unwrap();
        assert_eq!(entries[0].category_term, "New");
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(parse_entries("<feed><entry></feed>").is_err());
    }

    #[test]
    fn entities_in_titles_are_unescaped() {
        let xml = r#"<feed><entry><title>Fix &amp; verify &lt;input&gt;</title></entry></feed>"#;
        let entries = parse_entries(xml).unwrap();
        assert_eq!(entries[0].title, "Fix & verify <input>");
    }
}
