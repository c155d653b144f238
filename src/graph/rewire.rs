//! The rewiring operator: committing patterns and equivalence classes.
//!
//! Rewiring replaces occurrences of a discovered unit with a single new node
//! id, keeping paths, parse trees and occurrence indices consistent in one
//! atomic step. Occurrences are applied per path in descending offset order
//! so earlier offsets stay valid while the path shrinks; overlapping
//! occurrences within one path are dropped up front (at most one rewrite per
//! region).

use super::RdsGraph;
use crate::lexicon::{EquivalenceClass, LexiconUnit, NodeId, SignificantPattern};
use crate::node::{Connection, RdsNode};
use tracing::{debug, warn};

impl RdsGraph {
    /// Points every listed occurrence at the existing equivalence-class node
    /// `ec`, then rebuilds the indices.
    ///
    /// # Panics
    /// Panics if `ec` is not an equivalence-class node; callers only pass ids
    /// obtained from the graph itself.
    pub(crate) fn rewire_to_existing(&mut self, connections: &[Connection], ec: NodeId) {
        assert!(
            matches!(
                self.nodes.get(ec.index()).map(|n| &n.lexicon),
                Some(LexiconUnit::EquivalenceClass(_))
            ),
            "rewire target {ec} is not an equivalence class"
        );
        for con in connections {
            self.paths[con.path][con.pos] = ec;
        }
        self.rewiring_ops += 1;
        self.rebuild_indices();
    }

    /// Installs a new equivalence-class node and rewires the listed
    /// occurrences onto it. An empty occurrence list installs the node
    /// unrooted, to be referenced by a later pattern.
    pub(crate) fn install_equivalence_class(
        &mut self,
        connections: &[Connection],
        ec: EquivalenceClass,
    ) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes
            .push(RdsNode::new(LexiconUnit::EquivalenceClass(ec)));
        self.rewire_to_existing(connections, id);
        id
    }

    /// Installs a new pattern node and rewires every non-overlapping
    /// occurrence onto it, updating the parse trees as it goes.
    pub(crate) fn install_pattern(
        &mut self,
        connections: &[Connection],
        sp: SignificantPattern,
    ) -> NodeId {
        let pattern: Vec<NodeId> = sp.children().to_vec();
        let pattern_len = pattern.len();
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(RdsNode::new(LexiconUnit::Pattern(sp)));

        if connections.is_empty() {
            warn!("pattern {id} installed with no occurrences to rewire");
            self.rewiring_ops += 1;
            self.rebuild_indices();
            return id;
        }

        let mut sorted = connections.to_vec();
        sorted.sort();

        // within one path, keep only the first of any overlapping occurrences
        let mut valid: Vec<Connection> = Vec::with_capacity(sorted.len());
        for con in sorted {
            if let Some(last) = valid.last() {
                if con.path == last.path && con.pos <= last.pos + pattern_len - 1 {
                    continue;
                }
            }
            valid.push(con);
        }
        debug!(pattern = %id, occurrences = valid.len(), "rewiring pattern occurrences");

        // descending offsets: later rewrites cannot shift earlier ones
        for con in valid.iter().rev() {
            let (p, q) = (con.path, con.pos);
            if p >= self.paths.len() {
                warn!(path = p, total = self.paths.len(), "rewire: path index out of bounds");
                continue;
            }
            if q + pattern_len - 1 >= self.paths[p].len() {
                warn!(path = p, offset = q, "rewire: occurrence exceeds path length");
                continue;
            }

            // where the occurrence matched through an equivalence class, hang
            // the class over the single leaf before grouping the range
            let segment = self.paths[p].slice(q, q + pattern_len - 1);
            for (j, &actual) in segment.iter().enumerate() {
                if actual != pattern[j] {
                    self.trees[p].rewire(q + j, q + j, pattern[j]);
                }
            }
            self.trees[p].rewire(q, q + pattern_len - 1, id);
            self.paths[p].rewire(q, q + pattern_len - 1, id);
        }

        self.rewiring_ops += 1;
        self.rebuild_indices();
        id
    }
}
