//! Quote nesting levels.

use crate::tree::{Document, NodeId, WalkStatus};
use std::collections::HashMap;
use std::convert::Infallible;

/// Nesting depth of every quote-like node in one document.  Depth 0 is the
/// outermost quote on a path from the root.
#[derive(Debug, Clone, Default)]
pub struct LevelMap(HashMap<NodeId, usize>);

impl LevelMap {
    /// Classify all quotes in the document containing `node`.  The walk always
    /// starts from the root, whichever node is passed in.
    pub fn classify(doc: &Document, node: NodeId) -> Self {
        let mut root = node;
        while let Some(parent) = doc.parent(root) {
            root = parent;
        }

        let mut level = 0;
        let mut levels = HashMap::new();
        doc.walk::<Infallible, _>(root, |id, entering| {
            if doc.kind(id).is_quote() {
                if entering {
                    levels.insert(id, level);
                    level += 1;
                } else {
                    level -= 1;
                }
            }
            Ok(WalkStatus::Continue)
        })
        .unwrap_or_else(|never| match never {});
        Self(levels)
    }

    /// Depth of `node`; nodes that were never classified count as outermost.
    pub fn level(&self, node: NodeId) -> usize {
        self.0.get(&node).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
