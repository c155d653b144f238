//! The generalisation kernel: bootstrap, slot classes and simulated rewiring.
//!
//! Generalisation widens the pattern search beyond literal repetition. For
//! every context window of the path it first *bootstraps*: paths agreeing
//! with the window at both endpoints vote on the interior slots, and slots
//! whose voters sufficiently overlap an existing equivalence class are
//! replaced by that class. Each boosted window then proposes *generalised*
//! paths, one per interior slot, where the slot is widened to an existing
//! class (when one is a subset of the encountered voters) or to a synthetic
//! placeholder id one past the node arena, announcing "a new class would be
//! created here".
//!
//! Placeholder candidates are scored by installing the hypothetical class on
//! a throwaway clone of the graph and running the significance kernel there;
//! the winning candidate is then committed for real: new classes installed
//! (restricted to the surviving overlap when the voters only partially cover
//! an existing class) and the winning range rewired as a pattern.

use super::distill::DistillParams;
use super::significance::{more_significant, PatternRange, SignificancePair};
use super::RdsGraph;
use crate::lexicon::{EquivalenceClass, LexiconUnit, NodeId, SignificantPattern};
use crate::search_path::SearchPath;
use tracing::{debug, trace};

impl RdsGraph {
    /// Collects the node ids appearing at `slot` across every path that
    /// matches the rest of `path` around it.
    ///
    /// # Panics
    /// Panics unless `slot` is strictly interior to the path.
    pub(crate) fn compute_equivalence_class(
        &self,
        path: &SearchPath,
        slot: usize,
    ) -> EquivalenceClass {
        assert!(
            slot > 0 && slot < path.len() - 1,
            "slot {slot} not interior to a path of length {}",
            path.len()
        );
        let mut connections = self.all_occurrences(path[0]);
        connections = self.filter_connections(&connections, 0, &path.slice(0, slot - 1));
        connections =
            self.filter_connections(&connections, slot + 1, &path.slice(slot + 1, path.len() - 1));

        let mut ec = EquivalenceClass::new();
        for con in connections {
            ec.add(self.paths[con.path][con.pos + slot]);
        }
        ec
    }

    /// Bootstraps one context window: gathers the encountered class of every
    /// interior slot from the paths agreeing at the window's endpoints, then
    /// substitutes the best-overlapping existing class (ratio strictly above
    /// `overlap_threshold`) into each slot.
    ///
    /// Returns the boosted window and the encountered classes, one per
    /// interior slot.
    pub(crate) fn bootstrap(
        &self,
        window: &SearchPath,
        overlap_threshold: f64,
    ) -> (SearchPath, Vec<EquivalenceClass>) {
        let len = window.len();
        let anchored = self.filter_connections(
            &self.all_occurrences(window[0]),
            len - 1,
            &window.slice(len - 1, len - 1),
        );

        let mut encountered: Vec<EquivalenceClass> = Vec::with_capacity(len - 2);
        for slot in 1..len - 1 {
            let mut ec = EquivalenceClass::new();
            for con in &anchored {
                ec.add(self.paths[con.path][con.pos + slot]);
            }
            encountered.push(ec);
        }

        let mut boosted = window.clone();
        let mut best_ratios = vec![0.0_f64; len - 2];
        for (i, voters) in encountered.iter().enumerate() {
            for (j, node) in self.nodes.iter().enumerate() {
                if let LexiconUnit::EquivalenceClass(existing) = &node.lexicon {
                    let ratio = voters.overlap(existing).len() as f64 / existing.len() as f64;
                    if ratio > best_ratios[i] && ratio > overlap_threshold {
                        boosted[i + 1] = NodeId::new(j as u32);
                        best_ratios[i] = ratio;
                    }
                }
            }
        }

        (boosted, encountered)
    }

    /// Finds an existing equivalence class that is a subset of `ec`.
    ///
    /// Returns the placeholder id `nodes.len()` when none qualifies,
    /// signalling that a new class would have to be created.
    pub(crate) fn find_existing_equivalence_class(&self, ec: &EquivalenceClass) -> NodeId {
        for (i, node) in self.nodes.iter().enumerate() {
            if let LexiconUnit::EquivalenceClass(existing) = &node.lexicon {
                if ec.overlap(existing).len() == existing.len() {
                    return NodeId::new(i as u32);
                }
            }
        }
        NodeId::new(self.nodes.len() as u32)
    }

    /// Generalised distillation of one path. Returns true when a pattern was
    /// committed.
    pub(crate) fn generalise_path(
        &mut self,
        search_path: &SearchPath,
        params: &DistillParams,
    ) -> bool {
        let context_size = params.context_size;

        // BOOTSTRAPPING: entry 0 is the raw path with no boosted context
        let mut contexts: Vec<(usize, usize)> = vec![(0, 0)];
        let mut boosted_paths: Vec<SearchPath> = vec![search_path.clone()];
        let mut encountered_per_context: Vec<Vec<EquivalenceClass>> =
            vec![vec![EquivalenceClass::new(); context_size - 2]];
        let mut window_start = 0;
        while window_start + context_size - 1 < search_path.len() {
            let context = (window_start, window_start + context_size - 1);
            let window = SearchPath::new(search_path.slice(context.0, context.1));
            let (boosted_part, encountered) = self.bootstrap(&window, params.overlap_threshold);
            boosted_paths.push(search_path.substitute(context.0, context.1, &boosted_part));
            contexts.push(context);
            encountered_per_context.push(encountered);
            window_start += 1;
        }

        // GENERALISATION: one candidate per interior slot of each window
        let mut general_to_boost: Vec<usize> = vec![0];
        let mut general_slots: Vec<usize> = vec![0];
        let mut general_paths: Vec<SearchPath> = vec![search_path.clone()];
        let mut general_ecs: Vec<EquivalenceClass> = vec![EquivalenceClass::new()];
        for b in 1..boosted_paths.len() {
            let (context_start, context_finish) = contexts[b];
            let boosted_part =
                SearchPath::new(boosted_paths[b].slice(context_start, context_finish));
            let first_for_window = general_paths.len();
            for j in 1..context_size - 1 {
                let ec = self.compute_equivalence_class(&boosted_part, j);
                let mut general_path = boosted_paths[b].clone();
                if ec.len() > 1 {
                    general_path[context_start + j] = self.find_existing_equivalence_class(&ec);
                }
                if general_path == *search_path {
                    continue;
                }
                if general_paths[first_for_window..]
                    .iter()
                    .any(|p| *p == general_path)
                {
                    continue;
                }
                general_to_boost.push(b);
                general_slots.push(context_start + j);
                general_paths.push(general_path);
                general_ecs.push(ec);
            }
        }
        trace!(candidates = general_paths.len(), "generalisation candidates gathered");

        // DISTILLATION: score every candidate, simulating new classes on a clone
        let node_count = self.nodes.len();
        let mut all_patterns: Vec<PatternRange> = Vec::new();
        let mut all_pvalues: Vec<SignificancePair> = Vec::new();
        let mut pattern_to_general: Vec<usize> = Vec::new();
        for g in 0..general_paths.len() {
            let slot = general_slots[g];
            let introduces_class = general_paths[g][slot].index() >= node_count;
            let (patterns, pvalues) = if introduces_class {
                let mut simulation = self.clone();
                simulation.install_equivalence_class(&[], general_ecs[g].clone());
                let connections = simulation.connection_matrix(&general_paths[g]);
                let (flows, descents) = simulation.flows_and_descents(&connections);
                simulation.find_significant_patterns(
                    &connections,
                    &flows,
                    &descents,
                    params.eta,
                    params.alpha,
                )
            } else {
                let connections = self.connection_matrix(&general_paths[g]);
                let (flows, descents) = self.flows_and_descents(&connections);
                self.find_significant_patterns(
                    &connections,
                    &flows,
                    &descents,
                    params.eta,
                    params.alpha,
                )
            };
            for (k, &pattern) in patterns.iter().enumerate() {
                // a new class is only useful inside the pattern it supports
                if introduces_class && (slot < pattern.0 || slot > pattern.1) {
                    continue;
                }
                all_patterns.push(pattern);
                all_pvalues.push(pvalues[k]);
                pattern_to_general.push(g);
            }
        }

        // SELECTION: strictly smaller max(left, right) wins, first found on ties
        let mut best_index: Option<usize> = None;
        for idx in 0..all_patterns.len() {
            if let Some(best) = best_index {
                if !more_significant(all_pvalues[idx], all_pvalues[best]) {
                    continue;
                }
            }
            best_index = Some(idx);
        }
        let Some(best_index) = best_index else {
            trace!("no significant pattern across candidates");
            return false;
        };
        debug!(
            patterns = all_patterns.len(),
            best = ?all_patterns[best_index],
            "generalisation selected a pattern"
        );

        let best_pattern = all_patterns[best_index];
        let g = pattern_to_general[best_index];
        let mut best_path = general_paths[g].clone();
        let best_ec = general_ecs[g].clone();
        let b = general_to_boost[g];
        let best_context = contexts[b];
        let best_encountered = &encountered_per_context[b];

        // COMMIT: install the classes the winning path relies on, then rewire
        let old_node_count = self.nodes.len();
        let commit_start = best_pattern.0.max(best_context.0);
        let commit_finish = best_pattern.1.min(best_context.1);
        for i in commit_start..=commit_finish {
            if best_path[i].index() >= old_node_count {
                // the announced new class becomes real
                best_path[i] = NodeId::new(self.nodes.len() as u32);
                self.install_equivalence_class(&[], best_ec.clone());
            } else if best_path[i] != search_path[i] {
                let local_slot = i - (best_context.0 + 1);
                let existing = match &self.nodes[best_path[i].index()].lexicon {
                    LexiconUnit::EquivalenceClass(ec) => ec.clone(),
                    other => unreachable!(
                        "boosted slot {i} points at a {} node",
                        other.kind_tag()
                    ),
                };
                let surviving = best_encountered[local_slot].overlap(&existing);
                if surviving.len() < existing.len() {
                    // only part of the class fits this context
                    debug!(slot = i, "restricted overlap class installed");
                    best_path[i] = NodeId::new(self.nodes.len() as u32);
                    self.install_equivalence_class(&[], surviving);
                } else {
                    debug!(slot = i, class = %best_path[i], "existing class reused");
                }
            }
        }

        let best_connections = self.connection_matrix(&best_path);
        let occurrences = best_connections[(best_pattern.1, best_pattern.0)].clone();
        let sp = SignificantPattern::new(best_path.slice(best_pattern.0, best_pattern.1));
        self.install_pattern(&occurrences, sp);
        true
    }
}
