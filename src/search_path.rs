//! Search paths: the (possibly rewritten) input sentences.
//!
//! A [`SearchPath`] is an ordered list of node ids through the graph. Paths
//! start life as `[Start, tokens.., End]` and shrink as rewiring replaces
//! ranges with pattern nodes. Slicing and substitution are non-destructive;
//! only [`rewire`](SearchPath::rewire) mutates in place.

use crate::lexicon::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, Index, IndexMut};

/// An ordered sequence of node ids representing one sentence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPath(Vec<NodeId>);

impl SearchPath {
    /// Creates a path from a node-id sequence.
    #[inline]
    pub fn new(path: Vec<NodeId>) -> Self {
        Self(path)
    }

    /// Copies the inclusive range `[start, finish]`.
    ///
    /// # Panics
    /// Panics if `start > finish` or `finish` is out of bounds; ranges are
    /// always derived from in-path indices.
    pub fn slice(&self, start: usize, finish: usize) -> Vec<NodeId> {
        assert!(start <= finish, "slice start after finish");
        assert!(finish < self.0.len(), "slice finish out of bounds");
        self.0[start..=finish].to_vec()
    }

    /// Returns a copy with the inclusive range `[start, finish]` replaced by
    /// `segment`.
    pub fn substitute(&self, start: usize, finish: usize, segment: &[NodeId]) -> SearchPath {
        assert!(start <= finish, "substitute start after finish");
        assert!(finish < self.0.len(), "substitute finish out of bounds");
        let mut out = Vec::with_capacity(self.0.len() - (finish - start + 1) + segment.len());
        out.extend_from_slice(&self.0[..start]);
        out.extend_from_slice(segment);
        out.extend_from_slice(&self.0[finish + 1..]);
        SearchPath(out)
    }

    /// Replaces the inclusive range `[start, finish]` with the single `node`.
    pub fn rewire(&mut self, start: usize, finish: usize, node: NodeId) {
        self.0.drain(start..=finish);
        self.0.insert(start, node);
    }
}

impl Deref for SearchPath {
    type Target = [NodeId];

    #[inline]
    fn deref(&self) -> &[NodeId] {
        &self.0
    }
}

impl Index<usize> for SearchPath {
    type Output = NodeId;

    #[inline]
    fn index(&self, index: usize) -> &NodeId {
        &self.0[index]
    }
}

impl IndexMut<usize> for SearchPath {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut NodeId {
        &mut self.0[index]
    }
}

impl fmt::Display for SearchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, node) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " --> ")?;
            }
            write!(f, "{node}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u32]) -> Vec<NodeId> {
        raw.iter().copied().map(NodeId::new).collect()
    }

    #[test]
    fn slice_is_inclusive() {
        let path = SearchPath::new(ids(&[0, 4, 5, 6, 1]));
        assert_eq!(path.slice(1, 3), ids(&[4, 5, 6]));
        assert_eq!(path.slice(2, 2), ids(&[5]));
    }

    #[test]
    fn substitute_replaces_range() {
        let path = SearchPath::new(ids(&[0, 4, 5, 6, 1]));
        let swapped = path.substitute(1, 3, &ids(&[9, 9]));
        assert_eq!(&*swapped, &ids(&[0, 9, 9, 1])[..]);
        // original untouched
        assert_eq!(path.len(), 5);
    }

    #[test]
    fn rewire_collapses_range() {
        let mut path = SearchPath::new(ids(&[0, 4, 5, 6, 1]));
        path.rewire(1, 3, NodeId::new(7));
        assert_eq!(&*path, &ids(&[0, 7, 1])[..]);
    }

    #[test]
    fn equality_is_elementwise() {
        let a = SearchPath::new(ids(&[0, 2, 1]));
        let b = SearchPath::new(ids(&[0, 2, 1]));
        let c = SearchPath::new(ids(&[0, 3, 1]));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
