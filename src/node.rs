//! Graph nodes and their occurrence indices.
//!
//! An [`RdsNode`] owns one lexicon unit and two derived index lists: the
//! forward `connections` (every position where the node currently occurs in
//! a search path) and the backward `parents` (every pattern or equivalence
//! class that references it). Both lists are rebuilt from scratch after any
//! rewiring, so they are never edited incrementally.

use crate::lexicon::{LexiconUnit, NodeId};
use serde::{Deserialize, Serialize};

/// One occurrence of a node in a search path: `(path index, offset)`.
///
/// Derived `Ord` gives the lexicographic `(path, pos)` order the rewiring
/// operator sorts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Connection {
    /// Index of the search path.
    pub path: usize,
    /// Offset of the occurrence within that path.
    pub pos: usize,
}

impl Connection {
    #[inline]
    pub fn new(path: usize, pos: usize) -> Self {
        Self { path, pos }
    }
}

/// A back-edge from a child to a referencing non-terminal:
/// `(parent node, position within the parent's payload)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentLink {
    /// The referencing pattern or equivalence-class node.
    pub node: NodeId,
    /// Child position inside a pattern; always 0 for equivalence classes.
    pub pos: usize,
}

impl ParentLink {
    #[inline]
    pub fn new(node: NodeId, pos: usize) -> Self {
        Self { node, pos }
    }
}

/// A node of the RDS graph: an owned lexicon unit plus occurrence indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RdsNode {
    /// The owned payload.
    pub lexicon: LexiconUnit,
    /// Current occurrences of this node across all search paths.
    pub connections: Vec<Connection>,
    /// Non-terminals whose payload references this node.
    pub parents: Vec<ParentLink>,
}

impl RdsNode {
    /// Creates a node with empty indices.
    pub fn new(lexicon: LexiconUnit) -> Self {
        Self {
            lexicon,
            connections: Vec::new(),
            parents: Vec::new(),
        }
    }

    /// Adds a parent link if not already present. Returns true if added.
    pub fn add_parent(&mut self, link: ParentLink) -> bool {
        if self.parents.contains(&link) {
            return false;
        }
        self.parents.push(link);
        true
    }
}
