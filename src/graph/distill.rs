//! The distillation driver: parameters and the fixed-point sweep.
//!
//! Distillation repeatedly sweeps every search path in insertion order.
//! Short paths (or any path when the context window is disabled) go through
//! plain distillation: one connection-matrix evaluation, one significance
//! test, one rewiring. Longer paths go through the generalisation kernel.
//! The loop ends at the first sweep that commits nothing, after which the
//! production probabilities are estimated from the parse trees.

use super::RdsGraph;
use crate::lexicon::SignificantPattern;
use crate::search_path::SearchPath;
use std::fmt;
use tracing::{debug, info, trace};

/// Tuning parameters of a distillation run.
///
/// All real-valued parameters live in `[0, 1]`; construction fails fast on
/// anything outside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistillParams {
    /// Descent threshold: a probability drop below this marks a boundary.
    pub eta: f64,
    /// Significance threshold on the binomial-tail p-values.
    pub alpha: f64,
    /// Context window size; generalisation is disabled below 3.
    pub context_size: usize,
    /// Minimum member-overlap ratio for reusing an existing class during
    /// bootstrap.
    pub overlap_threshold: f64,
}

impl DistillParams {
    /// Validates and constructs a parameter set.
    pub fn new(
        eta: f64,
        alpha: f64,
        context_size: usize,
        overlap_threshold: f64,
    ) -> Result<Self, ParamsError> {
        if !(0.0..=1.0).contains(&eta) {
            return Err(ParamsError::OutOfRange {
                parameter: "eta",
                value: eta,
            });
        }
        if !(0.0..=1.0).contains(&alpha) {
            return Err(ParamsError::OutOfRange {
                parameter: "alpha",
                value: alpha,
            });
        }
        if !(0.0..=1.0).contains(&overlap_threshold) {
            return Err(ParamsError::OutOfRange {
                parameter: "overlap_threshold",
                value: overlap_threshold,
            });
        }
        Ok(Self {
            eta,
            alpha,
            context_size,
            overlap_threshold,
        })
    }
}

/// Error raised when a distillation parameter falls outside its range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamsError {
    /// A real-valued parameter fell outside `[0, 1]`.
    OutOfRange {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// The rejected value.
        value: f64,
    },
}

impl fmt::Display for ParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamsError::OutOfRange { parameter, value } => {
                write!(f, "parameter {parameter} = {value} is outside [0, 1]")
            }
        }
    }
}

impl std::error::Error for ParamsError {}

impl RdsGraph {
    /// Runs distillation to convergence, then estimates the production
    /// probabilities.
    pub fn distill(&mut self, params: &DistillParams) {
        info!(
            eta = params.eta,
            alpha = params.alpha,
            context_size = params.context_size,
            overlap_threshold = params.overlap_threshold,
            "distillation started"
        );
        let mut iteration = 0usize;
        loop {
            trace!(iteration, "distillation sweep");
            let mut found_pattern = false;
            for p in 0..self.paths.len() {
                let path = self.paths[p].clone();
                let found = if params.context_size < 3 || path.len() < params.context_size {
                    self.distill_path(&path, params)
                } else {
                    self.generalise_path(&path, params)
                };
                found_pattern = found || found_pattern;
            }
            if !found_pattern {
                break;
            }
            iteration += 1;
        }
        self.estimate_probabilities();
        info!(
            iterations = iteration,
            patterns = self.pattern_count(),
            rewirings = self.rewiring_count(),
            nodes = self.nodes.len(),
            "distillation converged"
        );
    }

    /// Plain distillation of one path: evaluate, test, rewire the best
    /// pattern. Returns true when a pattern was committed.
    pub(crate) fn distill_path(&mut self, path: &SearchPath, params: &DistillParams) -> bool {
        let connections = self.connection_matrix(path);
        let (flows, descents) = self.flows_and_descents(&connections);
        let (patterns, pvalues) = self.find_significant_patterns(
            &connections,
            &flows,
            &descents,
            params.eta,
            params.alpha,
        );
        let Some(&best) = patterns.first() else {
            trace!("no significant pattern on this path");
            return false;
        };
        debug!(
            range = ?best,
            left_p = pvalues[0].0,
            right_p = pvalues[0].1,
            "best pattern found"
        );
        let occurrences = connections[(best.1, best.0)].clone();
        let sp = SignificantPattern::new(path.slice(best.0, best.1));
        self.install_pattern(&occurrences, sp);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(sentences: &[&str]) -> Vec<Vec<String>> {
        sentences
            .iter()
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn params_validated_on_construction() {
        assert!(DistillParams::new(0.9, 0.01, 2, 0.5).is_ok());
        assert!(DistillParams::new(1.5, 0.01, 2, 0.5).is_err());
        assert!(DistillParams::new(0.9, -0.1, 2, 0.5).is_err());
        assert!(DistillParams::new(0.9, 0.01, 2, 1.1).is_err());
        // context size is unconstrained; zero simply disables generalisation
        assert!(DistillParams::new(0.9, 0.01, 0, 0.5).is_ok());
    }

    #[test]
    fn trivial_corpus_is_a_noop() {
        let mut graph = RdsGraph::from_corpus(&corpus(&["a b c"])).unwrap();
        let params = DistillParams::new(0.9, 0.01, 2, 0.5).unwrap();
        graph.distill(&params);
        assert_eq!(graph.pattern_count(), 0);
        assert_eq!(graph.rewiring_count(), 0);
        assert_eq!(graph.paths()[0].len(), 5);
    }

    #[test]
    fn repeated_core_collapses_to_one_pattern() {
        let mut graph = RdsGraph::from_corpus(&corpus(&[
            "a b c d",
            "e b c f",
            "g b c h",
            "i b c j",
            "k b c l",
        ]))
        .unwrap();
        let params = DistillParams::new(0.9, 0.01, 2, 0.5).unwrap();
        let lengths_before: Vec<usize> = graph.paths().iter().map(|p| p.len()).collect();
        graph.distill(&params);

        assert_eq!(graph.pattern_count(), 1);
        assert_eq!(graph.rewiring_count(), 1);
        // every path shrank by one: the "b c" core became a single node
        for (path, before) in graph.paths().iter().zip(lengths_before) {
            assert_eq!(path.len(), before - 1);
        }
        // the pattern derives exactly "b c"
        let pattern = graph
            .nodes()
            .iter()
            .find_map(|n| match &n.lexicon {
                crate::lexicon::LexiconUnit::Pattern(sp) => Some(sp.clone()),
                _ => None,
            })
            .unwrap();
        let child_names: Vec<String> = pattern
            .children()
            .iter()
            .map(|&c| graph.node_name(c))
            .collect();
        assert_eq!(child_names, vec!["b", "c"]);
    }

    #[test]
    fn node_growth_implies_rewiring() {
        let mut graph = RdsGraph::from_corpus(&corpus(&[
            "a b c d",
            "e b c f",
            "g b c h",
            "i b c j",
            "k b c l",
        ]))
        .unwrap();
        let nodes_before = graph.nodes().len();
        graph.distill(&DistillParams::new(0.9, 0.01, 2, 0.5).unwrap());
        assert!(graph.nodes().len() > nodes_before);
        assert!(graph.rewiring_count() > 0);
    }
}
