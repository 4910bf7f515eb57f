//! Admonition kinds.

use crate::tree::{Document, NodeId, NodeKind};
use std::fmt;

/// Closed set of admonition kinds understood by Confluence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmonitionKind {
    Info,
    Note,
    Warning,
    Tip,
    None,
}

impl AdmonitionKind {
    /// Kind for an exact (case-sensitive) class name.
    pub fn from_class(class: &str) -> Self {
        match class {
            "info" => Self::Info,
            "note" => Self::Note,
            "warning" => Self::Warning,
            "tip" => Self::Tip,
            _ => Self::None,
        }
    }

    /// Kind for a marker keyword, ignoring case.
    pub fn from_keyword(keyword: &str) -> Self {
        Self::from_class(&keyword.to_ascii_lowercase())
    }

    /// Kind of an arbitrary node; anything other than an admonition node is `None`.
    pub fn of(doc: &Document, node: NodeId) -> Self {
        match doc.kind(node) {
            NodeKind::Admonition(admonition) => Self::from_class(&admonition.class),
            _ => Self::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Note => "note",
            Self::Warning => "warning",
            Self::Tip => "tip",
            Self::None => "none",
        }
    }
}

impl fmt::Display for AdmonitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
