//! The significance kernel: candidate ranges and binomial-tail p-values.
//!
//! A sub-range of a path is a candidate pattern when the descent matrix shows
//! a sharp probability drop (below `eta`) just before its start and just
//! after its end. Each candidate is scored by two binomial-tail p-values, one
//! per boundary, each minimised over the eligible context columns; the
//! candidate is significant when both fall strictly below `alpha`.
//!
//! Among significant candidates the kernel keeps the one with the smallest
//! `max(left, right)`; ties go to the first candidate found, and pattern
//! length is deliberately not a tie-break.

use super::matrix::ConnectionMatrix;
use super::RdsGraph;
use crate::maths::special::binom_pmf;
use ndarray::Array2;

/// Inclusive `(start, finish)` rows of a candidate pattern within a path.
pub(crate) type PatternRange = (usize, usize);

/// `(left, right)` boundary p-values of a candidate.
pub(crate) type SignificancePair = (f64, f64);

/// True when both boundary p-values fall strictly below `alpha`.
#[inline]
pub(crate) fn is_significant(pvalues: SignificancePair, alpha: f64) -> bool {
    pvalues.0 < alpha && pvalues.1 < alpha
}

/// Strict "more significant" order on p-value pairs: compares the pairwise
/// maxima.
#[inline]
pub(crate) fn more_significant(a: SignificancePair, b: SignificancePair) -> bool {
    a.0.max(a.1) < b.0.max(b.1)
}

impl RdsGraph {
    /// Finds all significant patterns on one evaluated path.
    ///
    /// Returns the significant ranges with their p-value pairs; the most
    /// significant entry is kept at the front. Both vectors are empty when
    /// nothing clears `alpha`.
    pub(crate) fn find_significant_patterns(
        &self,
        connections: &ConnectionMatrix,
        flows: &Array2<f64>,
        descents: &Array2<f64>,
        eta: f64,
        alpha: f64,
    ) -> (Vec<PatternRange>, Vec<SignificancePair>) {
        let dim = descents.nrows();

        // Candidate boundary rows: a start row follows a drop in some column
        // to its right, an end row precedes a drop in some column to its left.
        let mut start_rows = Vec::new();
        let mut end_rows = Vec::new();
        for i in 0..dim {
            for j in (0..i).rev() {
                if descents[(i, j)] < eta {
                    end_rows.push(i - 1);
                    break;
                }
            }
            for j in i + 1..dim {
                if descents[(i, j)] < eta {
                    start_rows.push(i + 1);
                    break;
                }
            }
        }

        let mut candidates: Vec<PatternRange> = Vec::new();
        for &start in &start_rows {
            for &end in &end_rows {
                if start < end {
                    candidates.push((start, end));
                }
            }
        }

        // p-values memoised per (row, column) for this path evaluation;
        // anything above 1.0 marks an unset cell.
        let mut cache = Array2::from_elem((dim, dim), 2.0);

        let mut patterns: Vec<PatternRange> = Vec::new();
        let mut pvalues: Vec<SignificancePair> = Vec::new();
        for &candidate in &candidates {
            let right = self.best_right_pvalue(&mut cache, connections, flows, descents, candidate, eta);
            let left = self.best_left_pvalue(&mut cache, connections, flows, descents, candidate, eta);
            if left.abs() > 1.0 || right.abs() > 1.0 {
                continue;
            }
            let pair = (left, right);
            if is_significant(pair, alpha) {
                patterns.push(candidate);
                pvalues.push(pair);
                let last = patterns.len() - 1;
                if last == 0 || more_significant(pair, pvalues[0]) {
                    patterns.swap(0, last);
                    pvalues.swap(0, last);
                }
            }
        }

        (patterns, pvalues)
    }

    /// Minimal right-boundary p-value over the eligible context columns
    /// `0..=start` (those with a descent below `eta` one row past the end).
    fn best_right_pvalue(
        &self,
        cache: &mut Array2<f64>,
        connections: &ConnectionMatrix,
        flows: &Array2<f64>,
        descents: &Array2<f64>,
        pattern: PatternRange,
        eta: f64,
    ) -> f64 {
        let (start, finish) = pattern;
        let row = finish + 1;
        let mut pvalue = 2.0;
        for col in 0..=start {
            if !(descents[(row, col)] < eta) {
                continue;
            }
            if cache[(row, col)] > 1.0 {
                cache[(row, col)] = self.right_significance(connections, flows, row, col, eta);
            }
            if cache[(row, col)] < pvalue {
                pvalue = cache[(row, col)];
            }
        }
        pvalue
    }

    /// Minimal left-boundary p-value over the eligible context columns
    /// `finish..dim`.
    fn best_left_pvalue(
        &self,
        cache: &mut Array2<f64>,
        connections: &ConnectionMatrix,
        flows: &Array2<f64>,
        descents: &Array2<f64>,
        pattern: PatternRange,
        eta: f64,
    ) -> f64 {
        let (start, finish) = pattern;
        let row = start - 1;
        let mut pvalue = 2.0;
        for col in finish..connections.ncols() {
            if !(descents[(row, col)] < eta) {
                continue;
            }
            if cache[(row, col)] > 1.0 {
                cache[(row, col)] = self.left_significance(connections, flows, row, col, eta);
            }
            if cache[(row, col)] < pvalue {
                pvalue = cache[(row, col)];
            }
        }
        pvalue
    }

    /// Tail probability of seeing at most the observed continuations, under
    /// a success rate of `eta` times the flow into the boundary from above.
    fn right_significance(
        &self,
        connections: &ConnectionMatrix,
        flows: &Array2<f64>,
        row: usize,
        col: usize,
        eta: f64,
    ) -> f64 {
        debug_assert!(row > col);
        let pattern_occurrences = connections[(row - 1, col)].len() as u64;
        let descent_occurrences = connections[(row, col)].len() as u64;
        let p = eta * flows[(row - 1, col)];
        let mut significance = 0.0;
        for i in 0..=descent_occurrences {
            significance += binom_pmf(i, pattern_occurrences, p);
        }
        significance.clamp(0.0, 1.0)
    }

    /// Mirror of [`RdsGraph::right_significance`] across the left boundary.
    fn left_significance(
        &self,
        connections: &ConnectionMatrix,
        flows: &Array2<f64>,
        row: usize,
        col: usize,
        eta: f64,
    ) -> f64 {
        debug_assert!(row < col);
        let pattern_occurrences = connections[(row + 1, col)].len() as u64;
        let descent_occurrences = connections[(row, col)].len() as u64;
        let p = eta * flows[(row + 1, col)];
        let mut significance = 0.0;
        for i in 0..=descent_occurrences {
            significance += binom_pmf(i, pattern_occurrences, p);
        }
        significance.clamp(0.0, 1.0)
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
    fn significance_pair_order() {
        assert!(more_significant((0.1, 0.2), (0.3, 0.1)));
        assert!(!more_significant((0.3, 0.1), (0.3, 0.05)));
        assert!(!more_significant((0.2, 0.2), (0.2, 0.2)));
    }

    #[test]
    fn repeated_subsequence_is_significant() {
        // "b c" always follows a varied left context and precedes a varied
        // right context, so its boundaries show sharp descents.
        let graph = RdsGraph::from_corpus(&corpus(&[
            "a b c d",
            "e b c f",
            "g b c h",
            "i b c j",
            "k b c l",
        ]))
        .unwrap();
        let path = graph.paths()[0].clone();
        let connections = graph.connection_matrix(&path);
        let (flows, descents) = graph.flows_and_descents(&connections);
        let (patterns, pvalues) =
            graph.find_significant_patterns(&connections, &flows, &descents, 0.9, 0.1);
        assert!(!patterns.is_empty());
        let best = patterns[0];
        // best range covers the shared "b c" core (positions 2..=3)
        assert!(best.0 <= 2 && best.1 >= 3, "best = {best:?}");
        let pair = pvalues[0];
        assert!(pair.0 < 0.1 && pair.1 < 0.1);
    }

    #[test]
    fn uniform_path_yields_nothing() {
        let graph = RdsGraph::from_corpus(&corpus(&["a b c"])).unwrap();
        let path = graph.paths()[0].clone();
        let connections = graph.connection_matrix(&path);
        let (flows, descents) = graph.flows_and_descents(&connections);
        let (patterns, pvalues) =
            graph.find_significant_patterns(&connections, &flows, &descents, 0.9, 0.01);
        assert!(patterns.is_empty());
        assert!(pvalues.is_empty());
    }
}
