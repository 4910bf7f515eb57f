//! Parser extension recognizing admonition quotes:
//!
//! ```markdown
//! > [!warning] Optional title {#id .extra data-x="y"}
//! > Body text.
//! ```

use crate::tree::{Admonition, Document, NodeId, NodeKind};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

lazy_static! {
    static ref ADMONITION_RE: Regex = Regex::new(
        r"^\[!(?P<class>[A-Za-z][A-Za-z0-9_-]*)\][ \t]*(?P<title>[^{]*?)[ \t]*(?:\{(?P<attrs>[^}]*)\})?[ \t]*$"
    )
    .unwrap();
}

/// Parse a marker line into an admonition, if it is one.
pub fn parse_marker(line: &str) -> Option<Admonition> {
    let caps = ADMONITION_RE.captures(line)?;
    Some(Admonition {
        class: caps["class"].to_string(),
        title: caps
            .name("title")
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
        attributes: caps
            .name("attrs")
            .map(|m| parse_attributes(m.as_str()))
            .unwrap_or_default(),
    })
}

/// Parse `#id .class key=value key="quoted value"` into attribute pairs, with `id`
/// first, then `class` (all classes joined), then the remaining keys in order.
pub fn parse_attributes(text: &str) -> Vec<(String, String)> {
    let mut id = None;
    let mut classes = Vec::new();
    let mut others = Vec::new();
    for token in tokenize(text) {
        if let Some(value) = token.strip_prefix('#') {
            id = Some(value.to_string());
        } else if let Some(value) = token.strip_prefix('.') {
            classes.push(value.to_string());
        } else if let Some((key, value)) = token.split_once('=') {
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            others.push((key.to_string(), value.to_string()));
        }
    }

    let mut attributes = Vec::new();
    if let Some(id) = id {
        attributes.push(("id".to_string(), id));
    }
    if !classes.is_empty() {
        attributes.push(("class".to_string(), classes.join(" ")));
    }
    attributes.extend(others);
    attributes
}

/// Split on whitespace, except inside double quotes.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in text.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Convert every block quote that opens with a marker line into an admonition
/// node, removing the marker line from its body.  The marker line is every
/// child of the first paragraph up to the first line break, so inline markup in
/// a title is flattened to its text.
pub fn extend(doc: &mut Document) {
    let quotes: Vec<NodeId> = doc
        .ids()
        .filter(|&id| *doc.kind(id) == NodeKind::Blockquote)
        .collect();
    for quote in quotes {
        let Some(para) = doc.first_child(quote) else {
            continue;
        };
        if *doc.kind(para) != NodeKind::Paragraph {
            continue;
        }
        match doc.first_child(para).map(|first| doc.kind(first)) {
            Some(NodeKind::Text(text)) if text.starts_with("[!") => {}
            _ => continue,
        }

        let mut line = String::new();
        let mut consumed = Vec::new();
        for &child in doc.children(para) {
            consumed.push(child);
            if matches!(doc.kind(child), NodeKind::SoftBreak | NodeKind::HardBreak) {
                break;
            }
            doc.collect_text(child, &mut line);
        }
        let Some(admonition) = parse_marker(&line) else {
            continue;
        };
        debug!(
            "Admonition class '{}' title '{}'",
            admonition.class, admonition.title
        );

        for child in consumed {
            doc.remove_child(para, child);
        }
        if doc.children(para).is_empty() {
            doc.remove_child(quote, para);
        }
        doc.set_kind(quote, NodeKind::Admonition(admonition));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_marker() {
        let tests = [
            ("[!note]", Some(("note", "", vec![]))),
            ("[!warning] Heads up", Some(("warning", "Heads up", vec![]))),
            ("[!Tip]   spaced out  ", Some(("Tip", "spaced out", vec![]))),
            (
                "[!info] Title {#main .a .b data-x=\"1 2\"}",
                Some((
                    "info",
                    "Title",
                    attrs(&[("id", "main"), ("class", "a b"), ("data-x", "1 2")]),
                )),
            ),
            ("[!info]{.wide}", Some(("info", "", attrs(&[("class", "wide")])))),
            ("[note]", None),
            ("[!] empty", None),
            ("text [!note]", None),
        ];
        for (input, want) in tests {
            let got = parse_marker(input);
            let want = want.map(|(class, title, attributes)| Admonition {
                class: class.to_string(),
                title: title.to_string(),
                attributes,
            });
            assert_eq!(got, want, "Failed for input '{input}'");
        }
    }

    #[test]
    fn test_extend_strips_marker_line() {
        let tests = [
            ("> [!note] Heads up\n> body text\n", "Heads up", vec![]),
            (
                "> [!note] Some *emph* title\n> body text\n",
                "Some emph title",
                vec![],
            ),
            (
                "> [!tip] Use `cargo` **now** {.x}\n> body text\n",
                "Use cargo now",
                attrs(&[("class", "x")]),
            ),
            (
                "> [!info] [linked](http://x) title\\\n> body text\n",
                "linked title",
                vec![],
            ),
        ];
        for (input, title, attributes) in tests {
            let mut doc = Document::parse(input);
            extend(&mut doc);
            let quote = doc.first_child(doc.root()).unwrap();
            let class = match doc.kind(quote) {
                NodeKind::Admonition(admonition) => admonition.class.clone(),
                other => panic!("Failed for input '{input}': {other:?}"),
            };
            assert_eq!(
                doc.kind(quote),
                &NodeKind::Admonition(Admonition {
                    class,
                    title: title.to_string(),
                    attributes,
                }),
                "Failed for input '{input}'"
            );
            let para = doc.first_child(quote).unwrap();
            assert_eq!(doc.children(para).len(), 1, "Failed for input '{input}'");
            let text = doc.first_child(para).unwrap();
            assert_eq!(
                doc.kind(text),
                &NodeKind::Text("body text".to_string()),
                "Failed for input '{input}'"
            );
        }
    }

    #[test]
    fn test_extend_requires_leading_text() {
        let mut doc = Document::parse("> *[!note]* title\n> body\n");
        extend(&mut doc);
        let quote = doc.first_child(doc.root()).unwrap();
        assert_eq!(doc.kind(quote), &NodeKind::Blockquote);
    }

    #[test]
    fn test_extend_drops_empty_paragraph() {
        let mut doc = Document::parse("> [!tip]\n>\n> body\n");
        extend(&mut doc);
        let quote = doc.first_child(doc.root()).unwrap();
        assert!(matches!(doc.kind(quote), NodeKind::Admonition(_)));
        assert_eq!(doc.children(quote).len(), 1);
        let para = doc.first_child(quote).unwrap();
        let text = doc.first_child(para).unwrap();
        assert_eq!(doc.kind(text), &NodeKind::Text("body".to_string()));
    }

    #[test]
    fn test_extend_leaves_plain_quotes() {
        let mut doc = Document::parse("> just a quote\n\nnot [!note] a quote\n");
        extend(&mut doc);
        let quote = doc.first_child(doc.root()).unwrap();
        assert_eq!(doc.kind(quote), &NodeKind::Blockquote);
    }
}
