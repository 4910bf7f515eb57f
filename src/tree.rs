//! Arena-backed markdown node tree, built from `pulldown-cmark` events.

use log::trace;
use pulldown_cmark as md;

/// Stable identity of a node within one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Admonition data attached to an extended quote node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Admonition {
    /// Raw class as written by the author, e.g. "warning".
    pub class: String,
    /// Title; empty means absent.
    pub title: String,
    /// Pass-through attributes, in source order; empty means absent.
    pub attributes: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Paragraph,
    Text(String),
    Blockquote,
    Admonition(Admonition),
    Heading(u8),
    CodeBlock(Option<String>),
    List(Option<u64>),
    Item,
    FootnoteDefinition(String),
    Table,
    TableHead,
    TableRow,
    TableCell,
    Emphasis,
    Strong,
    Strikethrough,
    Link { dest: String, title: String },
    Image { dest: String, title: String },
    Code(String),
    Html(String),
    FootnoteReference(String),
    SoftBreak,
    HardBreak,
    Rule,
    TaskListMarker(bool),
}

impl NodeKind {
    /// Whether this node represents a block quotation, plain or admonition-typed.
    pub fn is_quote(&self) -> bool {
        matches!(self, NodeKind::Blockquote | NodeKind::Admonition(_))
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Tree walk control, returned by walk callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStatus {
    Continue,
    /// Don't descend into this node's children; the leaving visit still happens.
    SkipChildren,
    Stop,
}

/// A parsed markdown document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document holding only its root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parse markdown into a tree.  Adjacent text events are merged into a single
    /// `Text` node.
    pub fn parse(content: &str) -> Self {
        use md::{Event, Tag};

        let parser = md::Parser::new_ext(
            content,
            md::Options::ENABLE_TABLES
                | md::Options::ENABLE_FOOTNOTES
                | md::Options::ENABLE_STRIKETHROUGH
                | md::Options::ENABLE_TASKLISTS,
        );
        let mut doc = Self::new();
        let mut stack = vec![doc.root()];
        for event in parser {
            let Some(&current) = stack.last() else { break };
            match event {
                Event::Start(tag) => {
                    trace!("[MD]{}Start({tag:?})", "  ".repeat(stack.len()));
                    let kind = match tag {
                        Tag::Paragraph => NodeKind::Paragraph,
                        Tag::Heading(level, _frag_id, _classes) => NodeKind::Heading(match level {
                            md::HeadingLevel::H1 => 1,
                            md::HeadingLevel::H2 => 2,
                            md::HeadingLevel::H3 => 3,
                            md::HeadingLevel::H4 => 4,
                            md::HeadingLevel::H5 => 5,
                            md::HeadingLevel::H6 => 6,
                        }),
                        Tag::BlockQuote => NodeKind::Blockquote,
                        Tag::CodeBlock(md::CodeBlockKind::Fenced(lang)) if !lang.is_empty() => {
                            NodeKind::CodeBlock(Some(lang.to_string()))
                        }
                        Tag::CodeBlock(_) => NodeKind::CodeBlock(None),
                        Tag::List(first_num) => NodeKind::List(first_num),
                        Tag::Item => NodeKind::Item,
                        Tag::FootnoteDefinition(name) => {
                            NodeKind::FootnoteDefinition(name.to_string())
                        }
                        Tag::Table(_aligns) => NodeKind::Table,
                        Tag::TableHead => NodeKind::TableHead,
                        Tag::TableRow => NodeKind::TableRow,
                        Tag::TableCell => NodeKind::TableCell,
                        Tag::Emphasis => NodeKind::Emphasis,
                        Tag::Strong => NodeKind::Strong,
                        Tag::Strikethrough => NodeKind::Strikethrough,
                        Tag::Link(_link_type, dest, title) => NodeKind::Link {
                            dest: dest.to_string(),
                            title: title.to_string(),
                        },
                        Tag::Image(_link_type, dest, title) => NodeKind::Image {
                            dest: dest.to_string(),
                            title: title.to_string(),
                        },
                    };
                    let id = doc.append(current, kind);
                    stack.push(id);
                }
                Event::End(tag) => {
                    stack.pop();
                    trace!("[MD]{}End({tag:?})", "  ".repeat(stack.len()));
                }
                Event::Text(text) => doc.append_text(current, &text),
                Event::Code(text) => {
                    doc.append(current, NodeKind::Code(text.to_string()));
                }
                Event::Html(text) => {
                    doc.append(current, NodeKind::Html(text.to_string()));
                }
                Event::FootnoteReference(text) => {
                    doc.append(current, NodeKind::FootnoteReference(text.to_string()));
                }
                Event::SoftBreak => {
                    doc.append(current, NodeKind::SoftBreak);
                }
                Event::HardBreak => {
                    doc.append(current, NodeKind::HardBreak);
                }
                Event::Rule => {
                    doc.append(current, NodeKind::Rule);
                }
                Event::TaskListMarker(done) => {
                    doc.append(current, NodeKind::TaskListMarker(done));
                }
            }
        }
        doc
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Add a new last child to `parent`.
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Add text under `parent`, extending the last child if it is already text.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if let Some(&last) = self.nodes[parent.0].children.last() {
            if let NodeKind::Text(existing) = &mut self.nodes[last.0].kind {
                existing.push_str(text);
                return;
            }
        }
        self.append(parent, NodeKind::Text(text.to_string()));
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        self.nodes[id.0].kind = kind;
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// Detach `child` from `parent`.  The node stays in the arena but is no longer
    /// reachable from the root.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.retain(|&c| c != child);
        self.nodes[child.0].parent = None;
    }

    /// All node ids in arena order, including detached ones.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Append the plain text of `id` and its descendants to `output`, dropping
    /// inline markup.
    pub fn collect_text(&self, id: NodeId, output: &mut String) {
        match self.kind(id) {
            NodeKind::Text(text) | NodeKind::Code(text) => output.push_str(text),
            NodeKind::SoftBreak | NodeKind::HardBreak => output.push(' '),
            _ => {
                for &child in self.children(id) {
                    self.collect_text(child, output);
                }
            }
        }
    }

    /// Depth-first walk from `start`, visiting each node once entering and once
    /// leaving.
    pub fn walk<E, F>(&self, start: NodeId, mut visit: F) -> Result<WalkStatus, E>
    where
        F: FnMut(NodeId, bool) -> Result<WalkStatus, E>,
    {
        enum Phase {
            Pre,
            Post,
        }
        let mut stack = vec![(start, Phase::Pre)];
        while let Some((id, phase)) = stack.pop() {
            match phase {
                Phase::Pre => {
                    let status = visit(id, true)?;
                    if status == WalkStatus::Stop {
                        return Ok(WalkStatus::Stop);
                    }
                    stack.push((id, Phase::Post));
                    if status == WalkStatus::Continue {
                        for &child in self.children(id).iter().rev() {
                            stack.push((child, Phase::Pre));
                        }
                    }
                }
                Phase::Post => {
                    if visit(id, false)? == WalkStatus::Stop {
                        return Ok(WalkStatus::Stop);
                    }
                }
            }
        }
        Ok(WalkStatus::Continue)
    }
}
