//! Lexicon units: the payloads carried by graph nodes.
//!
//! Every node in the RDS graph owns exactly one [`LexiconUnit`]. The unit is a
//! closed sum over the five node kinds: the two sentinels, terminals interned
//! from the corpus, significant patterns (ordered child sequences) and
//! equivalence classes (insertion-ordered sets of interchangeable nodes).
//! Back-references between nodes are carried as [`NodeId`] indices only, so
//! cloning a unit clones the whole payload by value.
//!
//! # Invariants
//! - `NodeId(0)` and `NodeId(1)` are reserved for the unique Start and End
//!   nodes and appear as the first and last element of every search path.
//! - Pattern and equivalence-class payloads are immutable once installed in
//!   the graph; rewiring creates new nodes instead of editing payloads.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense identifier of a node in the RDS graph.
///
/// A transparent `u32` index into the graph's node arena. Ordering and
/// hashing are those of the inner index.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// The reserved Start node.
    pub const START: NodeId = NodeId(0);
    /// The reserved End node.
    pub const END: NodeId = NodeId(1);

    /// Creates a `NodeId` from a raw index.
    ///
    /// The caller must ensure the index refers to a live node (or is used as
    /// an intentional placeholder one past the arena, see the generalisation
    /// kernel).
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw index as `usize`, for arena lookups.
    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An insertion-ordered set of interchangeable node ids.
///
/// Duplicates are rejected on [`add`](EquivalenceClass::add); iteration order
/// is the order of first insertion, which keeps every downstream consumer
/// (probability counts, PCFG emission) deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquivalenceClass(Vec<NodeId>);

impl EquivalenceClass {
    /// Creates an empty class.
    #[inline]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates a class from a sequence of units, dropping duplicates.
    pub fn from_units(units: &[NodeId]) -> Self {
        let mut ec = Self::new();
        for &unit in units {
            ec.add(unit);
        }
        ec
    }

    /// Returns true if `unit` is a member.
    #[inline]
    pub fn has(&self, unit: NodeId) -> bool {
        self.0.contains(&unit)
    }

    /// Adds a member if not already present. Returns true if it was added.
    pub fn add(&mut self, unit: NodeId) -> bool {
        if self.has(unit) {
            return false;
        }
        self.0.push(unit);
        true
    }

    /// Intersection with `other`, keeping `other`'s member order.
    pub fn overlap(&self, other: &EquivalenceClass) -> EquivalenceClass {
        let mut out = EquivalenceClass::new();
        for &unit in &other.0 {
            if self.has(unit) {
                out.add(unit);
            }
        }
        out
    }

    /// Number of members.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the class has no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Members in insertion order.
    #[inline]
    pub fn members(&self) -> &[NodeId] {
        &self.0
    }
}

impl fmt::Display for EquivalenceClass {
    /// Class-local form: members by raw id, `|`-separated, e.g. `E[2 | 7]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E[")?;
        for (i, unit) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{unit}")?;
        }
        write!(f, "]")
    }
}

/// An ordered sequence of child node ids forming a significant pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignificantPattern(Vec<NodeId>);

impl SignificantPattern {
    /// Creates a pattern from a non-empty child sequence.
    ///
    /// # Panics
    /// Panics if `sequence` is empty; an empty pattern cannot rewire anything
    /// and indicates a kernel bug.
    pub fn new(sequence: Vec<NodeId>) -> Self {
        assert!(!sequence.is_empty(), "significant pattern must not be empty");
        Self(sequence)
    }

    /// Number of children.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: construction rejects empty sequences.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Children in order.
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.0
    }

    /// Position of `unit` among the children.
    ///
    /// # Panics
    /// Panics if `unit` is not a child; callers look up only ids taken from
    /// the pattern itself.
    pub fn find(&self, unit: NodeId) -> usize {
        self.0
            .iter()
            .position(|&c| c == unit)
            .unwrap_or_else(|| panic!("unit {unit} is not a child of this pattern"))
    }
}

impl fmt::Display for SignificantPattern {
    /// Class-local form: children by raw id, ` - `-separated, e.g. `P[2 - 3]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P[")?;
        for (i, unit) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " - ")?;
            }
            write!(f, "{unit}")?;
        }
        write!(f, "]")
    }
}

/// The payload of one graph node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LexiconUnit {
    /// Sentence-start sentinel, always node 0.
    Start,
    /// Sentence-end sentinel, always node 1.
    End,
    /// A corpus token, interned once.
    Terminal(String),
    /// A significant pattern over existing nodes.
    Pattern(SignificantPattern),
    /// An equivalence class over existing nodes.
    EquivalenceClass(EquivalenceClass),
}

impl LexiconUnit {
    /// Short tag used by debug listings.
    pub fn kind_tag(&self) -> &'static str {
        match self {
            LexiconUnit::Start => "Start",
            LexiconUnit::End => "End",
            LexiconUnit::Terminal(_) => "Terminal",
            LexiconUnit::Pattern(_) => "Pattern",
            LexiconUnit::EquivalenceClass(_) => "EquivalenceClass",
        }
    }
}

impl fmt::Display for LexiconUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexiconUnit::Start => write!(f, "*"),
            LexiconUnit::End => write!(f, "#"),
            LexiconUnit::Terminal(symbol) => write!(f, "{symbol}"),
            LexiconUnit::Pattern(sp) => write!(f, "{sp}"),
            LexiconUnit::EquivalenceClass(ec) => write!(f, "{ec}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalence_class_dedups_and_keeps_order() {
        let mut ec = EquivalenceClass::new();
        assert!(ec.add(NodeId::new(5)));
        assert!(ec.add(NodeId::new(3)));
        assert!(!ec.add(NodeId::new(5)));
        assert_eq!(ec.members(), &[NodeId::new(5), NodeId::new(3)]);
        assert!(ec.has(NodeId::new(3)));
        assert!(!ec.has(NodeId::new(4)));
    }

    #[test]
    fn overlap_keeps_other_order() {
        let a = EquivalenceClass::from_units(&[NodeId::new(1), NodeId::new(2), NodeId::new(3)]);
        let b = EquivalenceClass::from_units(&[NodeId::new(3), NodeId::new(1), NodeId::new(9)]);
        let overlap = a.overlap(&b);
        assert_eq!(overlap.members(), &[NodeId::new(3), NodeId::new(1)]);
    }

    #[test]
    fn pattern_find() {
        let sp = SignificantPattern::new(vec![NodeId::new(4), NodeId::new(7)]);
        assert_eq!(sp.find(NodeId::new(7)), 1);
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn empty_pattern_rejected() {
        let _ = SignificantPattern::new(Vec::new());
    }

    #[test]
    fn unit_display() {
        assert_eq!(LexiconUnit::Start.to_string(), "*");
        assert_eq!(LexiconUnit::End.to_string(), "#");
        assert_eq!(LexiconUnit::Terminal("cat".into()).to_string(), "cat");
        let sp = SignificantPattern::new(vec![NodeId::new(2), NodeId::new(3)]);
        assert_eq!(LexiconUnit::Pattern(sp).to_string(), "P[2 - 3]");
        let ec = EquivalenceClass::from_units(&[NodeId::new(2), NodeId::new(7)]);
        assert_eq!(LexiconUnit::EquivalenceClass(ec).to_string(), "E[2 | 7]");
    }
}
