//! Per-sentence derivation trees.
//!
//! Each search path carries one [`ParseTree`] recording how rewiring stacked
//! non-terminals over the original tokens. Tree nodes live in a single owning
//! vector; parent and child links are indices into it, so the tree clones by
//! value together with the rest of the graph.
//!
//! # Invariants
//! - Index 0 is always the sentinel root; it carries no value.
//! - The leaves, read left to right, equal the current search path.
//! - Rewiring only ever groups a contiguous range of the root's children
//!   under a fresh interior node, mirroring path rewiring exactly.

use crate::lexicon::NodeId;
use serde::{Deserialize, Serialize};

/// One node of a parse tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseNode {
    value: Option<NodeId>,
    parent: (usize, usize),
    children: Vec<usize>,
}

impl ParseNode {
    fn sentinel() -> Self {
        Self {
            value: None,
            parent: (0, 0),
            children: Vec::new(),
        }
    }

    fn leaf(value: NodeId, parent: (usize, usize)) -> Self {
        Self {
            value: Some(value),
            parent,
            children: Vec::new(),
        }
    }

    /// The graph node this tree node derives. `None` only for the root.
    #[inline]
    pub fn value(&self) -> Option<NodeId> {
        self.value
    }

    /// Tree indices of this node's children, left to right.
    #[inline]
    pub fn children(&self) -> &[usize] {
        &self.children
    }

    /// Replaces the child range `[start, finish]` with `new_node`, returning
    /// the subsumed child indices.
    fn rewire_children(&mut self, start: usize, finish: usize, new_node: usize) -> Vec<usize> {
        let subsumed: Vec<usize> = self.children.splice(start..=finish, [new_node]).collect();
        subsumed
    }
}

/// A derivation tree for one search path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseTree {
    nodes: Vec<ParseNode>,
}

impl ParseTree {
    /// Creates a tree whose root directly derives `leaves`, left to right.
    pub fn from_leaves(leaves: &[NodeId]) -> Self {
        let mut nodes = Vec::with_capacity(leaves.len() + 1);
        nodes.push(ParseNode::sentinel());
        for (i, &value) in leaves.iter().enumerate() {
            let index = nodes.len();
            nodes.push(ParseNode::leaf(value, (0, i)));
            nodes[0].children.push(index);
        }
        Self { nodes }
    }

    /// All tree nodes; index 0 is the root sentinel.
    #[inline]
    pub fn nodes(&self) -> &[ParseNode] {
        &self.nodes
    }

    /// Groups the root's child range `[start, finish]` under a new interior
    /// node deriving `new_node`.
    ///
    /// The subsumed children become the new node's children and their parent
    /// links are repointed at it.
    pub fn rewire(&mut self, start: usize, finish: usize, new_node: NodeId) {
        let new_index = self.nodes.len();
        self.nodes.push(ParseNode::leaf(new_node, (0, start)));
        let subsumed = self.nodes[0].rewire_children(start, finish, new_index);
        for (i, &child) in subsumed.iter().enumerate() {
            self.nodes[child].parent = (new_index, i);
        }
        self.nodes[new_index].children = subsumed;
    }

    /// Leaf values in left-to-right order.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_leaves(0, &mut out);
        out
    }

    fn collect_leaves(&self, node: usize, out: &mut Vec<NodeId>) {
        let children = &self.nodes[node].children;
        if children.is_empty() {
            if let Some(value) = self.nodes[node].value {
                out.push(value);
            }
            return;
        }
        for &child in children {
            self.collect_leaves(child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u32]) -> Vec<NodeId> {
        raw.iter().copied().map(NodeId::new).collect()
    }

    #[test]
    fn initial_tree_has_path_as_leaves() {
        let tree = ParseTree::from_leaves(&ids(&[0, 4, 5, 1]));
        assert_eq!(tree.leaves(), ids(&[0, 4, 5, 1]));
        assert_eq!(tree.nodes()[0].children().len(), 4);
        assert!(tree.nodes()[0].value().is_none());
    }

    #[test]
    fn rewire_groups_range_under_new_node() {
        let mut tree = ParseTree::from_leaves(&ids(&[0, 4, 5, 6, 1]));
        tree.rewire(1, 3, NodeId::new(9));
        // root now derives [0, 9, 1]
        let root_values: Vec<_> = tree.nodes()[0]
            .children()
            .iter()
            .map(|&c| tree.nodes()[c].value().unwrap())
            .collect();
        assert_eq!(root_values, ids(&[0, 9, 1]));
        // leaves are unchanged
        assert_eq!(tree.leaves(), ids(&[0, 4, 5, 6, 1]));
    }

    #[test]
    fn nested_rewire_preserves_leaves() {
        let mut tree = ParseTree::from_leaves(&ids(&[0, 4, 5, 6, 1]));
        // wrap a single leaf (equivalence-class insertion) then the range
        tree.rewire(2, 2, NodeId::new(8));
        tree.rewire(1, 3, NodeId::new(9));
        assert_eq!(tree.leaves(), ids(&[0, 4, 5, 6, 1]));
        let interior = tree
            .nodes()
            .iter()
            .find(|n| n.value() == Some(NodeId::new(8)))
            .unwrap();
        assert_eq!(interior.children().len(), 1);
    }
}
