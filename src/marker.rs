//! Legacy single-paragraph admonition markers: `!!! warning do this`.

use crate::kind::AdmonitionKind;
use crate::tree::{Document, NodeId, NodeKind};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref MARKER_RE: Regex =
        Regex::new(r"(?i)^!!!\s*(info|note|warning|tip)\s*(.*)$").unwrap();
}

/// A matched marker line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker<'a> {
    pub kind: AdmonitionKind,
    /// Rest of the line after the keyword.
    pub content: &'a str,
}

/// Match a line of text against the marker pattern.
pub fn match_marker(text: &str) -> Option<Marker<'_>> {
    let caps = MARKER_RE.captures(text)?;
    let keyword = caps.get(1)?.as_str();
    let content = caps.get(2).map_or("", |m| m.as_str());
    Some(Marker {
        kind: AdmonitionKind::from_keyword(keyword),
        content,
    })
}

/// Match the first child of a paragraph, which must be a plain text node.  Returns
/// the text node alongside the marker.
pub fn match_paragraph(doc: &Document, para: NodeId) -> Option<(NodeId, Marker<'_>)> {
    if *doc.kind(para) != NodeKind::Paragraph {
        return None;
    }
    let first = doc.first_child(para)?;
    match doc.kind(first) {
        NodeKind::Text(text) => match_marker(text).map(|marker| (first, marker)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_marker() {
        let tests = [
            ("!!! warning do this", Some((AdmonitionKind::Warning, "do this"))),
            ("!!! WARNING", Some((AdmonitionKind::Warning, ""))),
            ("!!!note   spaced", Some((AdmonitionKind::Note, "spaced"))),
            ("!!! Info <b>raw</b>", Some((AdmonitionKind::Info, "<b>raw</b>"))),
            ("!!! tip", Some((AdmonitionKind::Tip, ""))),
            ("!!  warning", None),
            ("!!! bogus text", None),
            ("say !!! note", None),
            ("", None),
        ];
        for (input, want) in tests {
            let got = match_marker(input).map(|m| (m.kind, m.content));
            assert_eq!(got, want, "Failed for input '{input}'");
        }
    }

    #[test]
    fn test_match_paragraph() {
        let doc = Document::parse("!!! note *emphasised*\n\n*!!! note* not first\n");
        let root = doc.root();
        let first = doc.children(root)[0];
        let second = doc.children(root)[1];

        let (text, marker) = match_paragraph(&doc, first).unwrap();
        assert_eq!(text, doc.first_child(first).unwrap());
        assert_eq!(marker.kind, AdmonitionKind::Note);
        assert_eq!(marker.content, "");

        assert!(match_paragraph(&doc, second).is_none());
        assert!(match_paragraph(&doc, root).is_none());
    }
}
