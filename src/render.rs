//! Confluence storage-format rendering of a [`Document`].

use crate::config::{AdmonitionSyntax, Precedence, RenderConfig};
use crate::kind::AdmonitionKind;
use crate::level::LevelMap;
use crate::marker;
use crate::tree::{Document, NodeId, NodeKind, WalkStatus};
use log::{debug, trace};
use std::collections::HashSet;
use std::io::{self, Write};

const MACRO_CLOSE: &str = "</ac:rich-text-body></ac:structured-macro>\n";

/// HTML global attributes, which may be passed through onto a plain quote.
const GLOBAL_ATTRIBUTES: &[&str] = &[
    "accesskey",
    "autocapitalize",
    "autofocus",
    "class",
    "contenteditable",
    "dir",
    "draggable",
    "enterkeyhint",
    "hidden",
    "id",
    "inert",
    "inputmode",
    "is",
    "itemid",
    "itemprop",
    "itemref",
    "itemscope",
    "itemtype",
    "lang",
    "part",
    "role",
    "slot",
    "spellcheck",
    "style",
    "tabindex",
    "title",
    "translate",
];

fn is_global_attribute(name: &str) -> bool {
    GLOBAL_ATTRIBUTES.contains(&name) || name.starts_with("data-")
}

fn macro_open(kind: AdmonitionKind) -> String {
    format!(
        "<ac:structured-macro ac:name=\"{kind}\"><ac:parameter ac:name=\"icon\">true</ac:parameter><ac:rich-text-body>"
    )
}

/// Per-document render state.  A fresh context is created for every
/// [`Renderer::render_document`] call.
#[derive(Debug, Default)]
pub struct RenderContext {
    levels: Option<LevelMap>,
    /// Paragraphs whose marker matched on entering, so need closing on leaving.
    marker_paragraphs: HashSet<NodeId>,
    /// Text nodes already emitted as marker content.
    consumed: HashSet<NodeId>,
    /// Macro wrappers currently open.
    open_macros: usize,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quote level of `node`, classifying the whole document on first use.
    pub fn level(&mut self, doc: &Document, node: NodeId) -> usize {
        self.levels
            .get_or_insert_with(|| LevelMap::classify(doc, node))
            .level(node)
    }
}

/// Renders documents into Confluence storage format.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Parse markdown with the parser extensions enabled by the configuration.
    pub fn parse(&self, content: &str) -> Document {
        let mut doc = Document::parse(content);
        if self.config.syntax.structural() {
            crate::admonition::extend(&mut doc);
        }
        doc
    }

    /// Render a whole document, stopping at the first write failure.
    pub fn render_document<W: Write>(&self, doc: &Document, w: &mut W) -> io::Result<()> {
        let mut ctx = RenderContext::new();
        doc.walk(doc.root(), |node, entering| {
            self.render_node(&mut ctx, w, doc, node, entering)
        })?;
        Ok(())
    }

    /// Render markdown to a string.
    pub fn render_markdown(&self, content: &str) -> io::Result<String> {
        let doc = self.parse(content);
        let mut out = Vec::new();
        self.render_document(&doc, &mut out)?;
        String::from_utf8(out).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Single dispatch point for one node visit.
    pub fn render_node<W: Write>(
        &self,
        ctx: &mut RenderContext,
        w: &mut W,
        doc: &Document,
        node: NodeId,
        entering: bool,
    ) -> io::Result<WalkStatus> {
        trace!("render {:?} {:?} entering:{entering}", node, doc.kind(node));
        match doc.kind(node) {
            NodeKind::Blockquote | NodeKind::Admonition(_) => {
                self.render_quote(ctx, w, doc, node, entering)
            }
            NodeKind::Paragraph if self.config.syntax.marker() => {
                self.render_marker(ctx, w, doc, node, entering)
            }
            _ => self.render_default(ctx, w, doc, node, entering),
        }
    }

    /// Whether an outermost admonition quote gives way to a marker paragraph
    /// opening it.
    fn yields_to_marker(&self, doc: &Document, node: NodeId) -> bool {
        self.config.syntax == AdmonitionSyntax::Both(Precedence::Marker)
            && doc
                .first_child(node)
                .map_or(false, |para| marker::match_paragraph(doc, para).is_some())
    }

    fn render_quote<W: Write>(
        &self,
        ctx: &mut RenderContext,
        w: &mut W,
        doc: &Document,
        node: NodeId,
        entering: bool,
    ) -> io::Result<WalkStatus> {
        let level = ctx.level(doc, node);
        let kind = AdmonitionKind::of(doc, node);
        if level != 0 || kind == AdmonitionKind::None || self.yields_to_marker(doc, node) {
            return self.render_plain_quote(w, doc, node, entering);
        }

        if entering {
            debug!("Open {kind} macro");
            w.write_all(macro_open(kind).as_bytes())?;
            w.write_all(b"\n")?;
            if let NodeKind::Admonition(admonition) = doc.kind(node) {
                if !admonition.title.is_empty() {
                    w.write_all(b"<p><strong>")?;
                    self.write_content(w, &admonition.title)?;
                    w.write_all(b"</strong></p>\n")?;
                }
            }
            ctx.open_macros += 1;
        } else {
            w.write_all(MACRO_CLOSE.as_bytes())?;
            ctx.open_macros -= 1;
        }
        Ok(WalkStatus::Continue)
    }

    fn render_plain_quote<W: Write>(
        &self,
        w: &mut W,
        doc: &Document,
        node: NodeId,
        entering: bool,
    ) -> io::Result<WalkStatus> {
        if !entering {
            w.write_all(b"</blockquote>\n")?;
            return Ok(WalkStatus::Continue);
        }
        let attributes: Vec<&(String, String)> = match doc.kind(node) {
            NodeKind::Admonition(admonition) => admonition
                .attributes
                .iter()
                .filter(|(name, _)| is_global_attribute(name))
                .collect(),
            _ => Vec::new(),
        };
        if attributes.is_empty() {
            w.write_all(b"<blockquote>\n")?;
            return Ok(WalkStatus::Continue);
        }
        w.write_all(b"<blockquote")?;
        for (name, value) in attributes {
            write!(
                w,
                " {}=\"{}\"",
                name,
                html_escape::encode_double_quoted_attribute(value)
            )?;
        }
        w.write_all(b">")?;
        Ok(WalkStatus::Continue)
    }

    fn render_marker<W: Write>(
        &self,
        ctx: &mut RenderContext,
        w: &mut W,
        doc: &Document,
        node: NodeId,
        entering: bool,
    ) -> io::Result<WalkStatus> {
        if !entering {
            if ctx.marker_paragraphs.remove(&node) {
                w.write_all(MACRO_CLOSE.as_bytes())?;
                ctx.open_macros -= 1;
                return Ok(WalkStatus::Continue);
            }
            return self.render_default(ctx, w, doc, node, entering);
        }

        let matched = if ctx.open_macros == 0 {
            marker::match_paragraph(doc, node)
        } else {
            None
        };
        let Some((text, marker)) = matched else {
            return self.render_default(ctx, w, doc, node, entering);
        };
        debug!("Open {} macro from marker", marker.kind);
        w.write_all(macro_open(marker.kind).as_bytes())?;
        self.write_content(w, marker.content)?;
        ctx.marker_paragraphs.insert(node);
        ctx.consumed.insert(text);
        ctx.open_macros += 1;
        Ok(WalkStatus::Continue)
    }

    /// Write admonition titles and marker content, escaped unless configured not to be.
    fn write_content<W: Write>(&self, w: &mut W, text: &str) -> io::Result<()> {
        if self.config.escape {
            w.write_all(html_escape::encode_text(text).as_bytes())
        } else {
            w.write_all(text.as_bytes())
        }
    }

    /// Plain HTML rendering for everything that isn't an admonition.
    fn render_default<W: Write>(
        &self,
        ctx: &mut RenderContext,
        w: &mut W,
        doc: &Document,
        node: NodeId,
        entering: bool,
    ) -> io::Result<WalkStatus> {
        let (open, close): (String, String) = match doc.kind(node) {
            NodeKind::Document => return Ok(WalkStatus::Continue),
            NodeKind::Blockquote | NodeKind::Admonition(_) => {
                return self.render_plain_quote(w, doc, node, entering)
            }
            NodeKind::Paragraph => ("<p>".into(), "</p>\n".into()),
            NodeKind::Text(text) => {
                if entering && !ctx.consumed.contains(&node) {
                    w.write_all(html_escape::encode_text(text).as_bytes())?;
                }
                return Ok(WalkStatus::Continue);
            }
            NodeKind::Heading(level) => (format!("<h{level}>"), format!("</h{level}>\n")),
            NodeKind::CodeBlock(lang) => {
                if !entering {
                    w.write_all(b"</code></pre>\n")?;
                    return Ok(WalkStatus::Continue);
                }
                match lang {
                    Some(lang) => write!(
                        w,
                        "<pre><code class=\"language-{}\">",
                        html_escape::encode_double_quoted_attribute(lang)
                    )?,
                    None => w.write_all(b"<pre><code>")?,
                }
                return Ok(WalkStatus::Continue);
            }
            NodeKind::List(Some(1)) => ("<ol>\n".into(), "</ol>\n".into()),
            NodeKind::List(Some(start)) => (format!("<ol start=\"{start}\">\n"), "</ol>\n".into()),
            NodeKind::List(None) => ("<ul>\n".into(), "</ul>\n".into()),
            NodeKind::Item => ("<li>".into(), "</li>\n".into()),
            NodeKind::FootnoteDefinition(_) => return Ok(WalkStatus::Continue),
            NodeKind::Table => ("<table><tbody>\n".into(), "</tbody></table>\n".into()),
            NodeKind::TableHead | NodeKind::TableRow => ("<tr>".into(), "</tr>\n".into()),
            NodeKind::TableCell => {
                let in_head = doc
                    .parent(node)
                    .map_or(false, |p| *doc.kind(p) == NodeKind::TableHead);
                if in_head {
                    ("<th>".into(), "</th>".into())
                } else {
                    ("<td>".into(), "</td>".into())
                }
            }
            NodeKind::Emphasis => ("<em>".into(), "</em>".into()),
            NodeKind::Strong => ("<strong>".into(), "</strong>".into()),
            NodeKind::Strikethrough => ("<del>".into(), "</del>".into()),
            NodeKind::Link { dest, title } => {
                let mut open = format!(
                    "<a href=\"{}\"",
                    html_escape::encode_double_quoted_attribute(dest)
                );
                if !title.is_empty() {
                    open += &format!(
                        " title=\"{}\"",
                        html_escape::encode_double_quoted_attribute(title)
                    );
                }
                open.push('>');
                (open, "</a>".into())
            }
            NodeKind::Image { dest, title } => {
                if entering {
                    write!(
                        w,
                        "<ac:image ac:title=\"{}\"><ri:url ri:value=\"{}\" /></ac:image>",
                        html_escape::encode_double_quoted_attribute(title),
                        html_escape::encode_double_quoted_attribute(dest)
                    )?;
                }
                return Ok(WalkStatus::SkipChildren);
            }
            NodeKind::Code(text) => {
                if entering {
                    write!(w, "<code>{}</code>", html_escape::encode_text(text))?;
                }
                return Ok(WalkStatus::Continue);
            }
            NodeKind::Html(text) => {
                if entering {
                    w.write_all(text.as_bytes())?;
                }
                return Ok(WalkStatus::Continue);
            }
            NodeKind::FootnoteReference(name) => {
                if entering {
                    write!(w, "<sup>{}</sup>", html_escape::encode_text(name))?;
                }
                return Ok(WalkStatus::Continue);
            }
            NodeKind::SoftBreak => ("\n".into(), String::new()),
            NodeKind::HardBreak => ("<br />\n".into(), String::new()),
            NodeKind::Rule => ("<hr />\n".into(), String::new()),
            NodeKind::TaskListMarker(done) => {
                let marker = if *done { "☑ " } else { "☐ " };
                (marker.into(), String::new())
            }
        };
        let tag = if entering { open } else { close };
        w.write_all(tag.as_bytes())?;
        Ok(WalkStatus::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Admonition;

    fn admonition(class: &str, title: &str) -> NodeKind {
        NodeKind::Admonition(Admonition {
            class: class.to_string(),
            title: title.to_string(),
            attributes: vec![],
        })
    }

    fn render(doc: &Document) -> String {
        let mut out = Vec::new();
        Renderer::default().render_document(doc, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_decision_table() {
        let tests = [
            // (class, nested inside another quote, want macro)
            ("warning", false, true),
            ("bogus", false, false),
            ("warning", true, false),
            ("bogus", true, false),
        ];
        for (class, nested, want_macro) in tests {
            let mut doc = Document::new();
            let mut parent = doc.root();
            if nested {
                parent = doc.append(parent, NodeKind::Blockquote);
            }
            doc.append(parent, admonition(class, ""));
            let got = render(&doc);
            assert_eq!(
                got.contains("<ac:structured-macro"),
                want_macro,
                "Failed for input '{class}' nested:{nested}: {got}"
            );
        }
    }

    #[test]
    fn test_hand_built_tree() {
        let mut doc = Document::new();
        let root = doc.root();
        let outer = doc.append(root, admonition("note", "Heads <up>"));
        let para = doc.append(outer, NodeKind::Paragraph);
        doc.append(para, NodeKind::Text("body & soul".to_string()));
        let inner = doc.append(outer, admonition("tip", "ignored"));
        let para = doc.append(inner, NodeKind::Paragraph);
        doc.append(para, NodeKind::Text("inner".to_string()));

        assert_eq!(
            render(&doc),
            concat!(
                "<ac:structured-macro ac:name=\"note\"><ac:parameter ac:name=\"icon\">true</ac:parameter><ac:rich-text-body>\n",
                "<p><strong>Heads &lt;up&gt;</strong></p>\n",
                "<p>body &amp; soul</p>\n",
                "<blockquote>\n",
                "<p>inner</p>\n",
                "</blockquote>\n",
                "</ac:rich-text-body></ac:structured-macro>\n",
            )
        );
    }

    #[test]
    fn test_plain_quote_attributes() {
        let tests = [
            (
                vec![("id", "x"), ("onclick", "evil()"), ("data-v", "a\"b")],
                "<blockquote id=\"x\" data-v=\"a&quot;b\"></blockquote>\n",
            ),
            (
                vec![("role", "note"), ("tabindex", "0"), ("hidden", "")],
                "<blockquote role=\"note\" tabindex=\"0\" hidden=\"\"></blockquote>\n",
            ),
            (
                vec![("onclick", "evil()"), ("href", "x")],
                "<blockquote>\n</blockquote>\n",
            ),
            (vec![], "<blockquote>\n</blockquote>\n"),
        ];
        for (attributes, want) in tests {
            let mut doc = Document::new();
            let root = doc.root();
            doc.append(
                root,
                NodeKind::Admonition(Admonition {
                    class: "danger".to_string(),
                    title: String::new(),
                    attributes: attributes
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                }),
            );
            assert_eq!(render(&doc), want, "Failed for input '{attributes:?}'");
        }
    }

    #[test]
    fn test_context_levels_are_lazy() {
        let doc = Document::parse("> a\n>\n> > b\n");
        let mut ctx = RenderContext::new();
        assert!(ctx.levels.is_none());
        let outer = doc.first_child(doc.root()).unwrap();
        let inner = doc.children(outer)[1];
        assert_eq!(ctx.level(&doc, inner), 1);
        assert_eq!(ctx.level(&doc, outer), 0);
        assert!(ctx.levels.is_some());
    }

    #[test]
    fn test_marker_suppressed_inside_open_macro() {
        let renderer = Renderer::new(RenderConfig {
            syntax: AdmonitionSyntax::Both(Precedence::Structural),
            escape: true,
        });
        let got = renderer
            .render_markdown("> [!info]\n> !!! note inner\n")
            .unwrap();
        assert_eq!(got.matches("<ac:structured-macro").count(), 1);
        assert!(got.contains("ac:name=\"info\""));
        assert!(got.contains("<p>!!! note inner</p>"));
    }
}
