//! Front-matter codec — the restricted YAML-like header block at the top of an
//! exported Markdown file.
//!
//! Parsing is deliberately fail-open: a missing or unterminated header yields
//! empty metadata and the full text as body, never an error. The verbatim
//! header block (delimiters included) is preserved for lossless write-back.

use std::collections::HashMap;

/// Delimiter line bounding the front-matter block.
pub const FRONT_MATTER_DELIMITER: &str = "---";

/// A parsed front-matter value: a trimmed scalar, or a `[a, b, c]` list.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Scalar(String),
    List(Vec<String>),
}

impl MetaValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::List(_) => None,
        }
    }
}

/// Result of running the codec over raw file text.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub meta: HashMap<String, MetaValue>,
    /// Body with the header stripped and leading whitespace trimmed.
    pub body: String,
    /// Verbatim original header block including both delimiter lines, or
    /// empty when no well-formed header was found.
    pub raw_front_matter: String,
}

/// Parse a document that may begin with a `---`-delimited header block.
///
/// Lines between the delimiters parse as `key: value`; a value wrapped in
/// `[...]` becomes a list split on commas with elements trimmed and empties
/// dropped. Lines without a key before the colon are silently skipped.
pub fn parse_front_matter(raw: &str) -> ParsedDocument {
    let open = format!("{FRONT_MATTER_DELIMITER}\n");
    let Some(after_open) = raw.strip_prefix(&open) else {
        return ParsedDocument {
            meta: HashMap::new(),
            body: raw.to_string(),
            raw_front_matter: String::new(),
        };
    };

    let close = format!("\n{FRONT_MATTER_DELIMITER}");
    let Some(close_idx) = after_open.find(&close) else {
        // Unterminated header: fail open, treat the whole text as body.
        return ParsedDocument {
            meta: HashMap::new(),
            body: raw.to_string(),
            raw_front_matter: String::new(),
        };
    };

    let header = &after_open[..close_idx];
    let raw_front_matter =
        format!("{FRONT_MATTER_DELIMITER}\n{header}\n{FRONT_MATTER_DELIMITER}");
    let body = after_open[close_idx + close.len()..]
        .trim_start()
        .to_string();

    let mut meta = HashMap::new();
    for line in header.lines() {
        let Some(colon_idx) = line.find(':') else {
            continue;
        };
        let key = line[..colon_idx].trim();
        if key.is_empty() {
            continue;
        }
        let value = line[colon_idx + 1..].trim();

        let parsed = if value.starts_with('[') && value.ends_with(']') {
            MetaValue::List(
                value[1..value.len() - 1]
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            )
        } else {
            MetaValue::Scalar(value.to_string())
        };
        meta.insert(key.to_string(), parsed);
    }

    ParsedDocument {
        meta,
        body,
        raw_front_matter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_front_matter_returns_full_body() {
        let doc = parse_front_matter("# Just a note\n\nHello");
        assert!(doc.meta.is_empty());
        assert_eq!(doc.body, "# Just a note\n\nHello");
        assert_eq!(doc.raw_front_matter, "");
    }

    #[test]
    fn parses_scalars_and_lists() {
        let raw = "---\ntitle: My Note\ntags: [a, b , c]\n---\n\nBody text";
        let doc = parse_front_matter(raw);
        assert_eq!(
            doc.meta.get("title"),
            Some(&MetaValue::Scalar("My Note".into()))
        );
        assert_eq!(
            doc.meta.get("tags"),
            Some(&MetaValue::List(vec!["a".into(), "b".into(), "c".into()]))
        );
        assert_eq!(doc.body, "Body text");
    }

    #[test]
    fn preserves_raw_header_verbatim() {
        let raw = "---\ntitle: Exact  Spacing\nid: abc-123\n---\nBody";
        let doc = parse_front_matter(raw);
        assert_eq!(
            doc.raw_front_matter,
            "---\ntitle: Exact  Spacing\nid: abc-123\n---"
        );
    }

    #[test]
    fn unterminated_header_fails_open() {
        let raw = "---\ntitle: Broken\nNo closing delimiter here";
        let doc = parse_front_matter(raw);
        assert!(doc.meta.is_empty());
        assert_eq!(doc.body, raw);
        assert_eq!(doc.raw_front_matter, "");
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let raw = "---\nno colon line\n: value without key\ntitle: Ok\n---\nBody";
        let doc = parse_front_matter(raw);
        assert_eq!(doc.meta.len(), 1);
        assert_eq!(doc.meta.get("title"), Some(&MetaValue::Scalar("Ok".into())));
    }

    #[test]
    fn empty_list_entries_are_dropped() {
        let raw = "---\ntags: [a, , b,]\n---\nBody";
        let doc = parse_front_matter(raw);
        assert_eq!(
            doc.meta.get("tags"),
            Some(&MetaValue::List(vec!["a".into(), "b".into()]))
        );
    }

    #[test]
    fn delimiter_must_open_the_file() {
        let raw = "preamble\n---\ntitle: Not front matter\n---\n";
        let doc = parse_front_matter(raw);
        assert!(doc.meta.is_empty());
        assert_eq!(doc.body, raw);
    }
}
