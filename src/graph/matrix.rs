//! Connection, flow and descent matrices for one search path.
//!
//! For a path of length `L`, `connections[(i, j)]` holds every corpus
//! occurrence of the sub-path between positions `min(i, j)` and `max(i, j)`,
//! anchored at the occurrence of the first element. The matrix is symmetric
//! and is built column by column outward from the diagonal: each step away
//! from the diagonal filters the previous cell's occurrences by one more
//! element.
//!
//! Flows are the empirical probabilities of extending a matched context by
//! one element; descents are the multiplicative drops in those
//! probabilities. Both matrices are square, dense and short-lived: they are
//! allocated, used and released within a single path evaluation.

use super::RdsGraph;
use crate::lexicon::{LexiconUnit, NodeId};
use crate::node::Connection;
use crate::search_path::SearchPath;
use ndarray::Array2;

/// Per-cell occurrence lists for one path evaluation.
pub(crate) type ConnectionMatrix = Array2<Vec<Connection>>;

impl RdsGraph {
    /// All corpus occurrences of a node, expanding equivalence classes to
    /// include their members' occurrences.
    pub(crate) fn all_occurrences(&self, node: NodeId) -> Vec<Connection> {
        let n = &self.nodes[node.index()];
        let mut connections = n.connections.clone();
        if let LexiconUnit::EquivalenceClass(ec) = &n.lexicon {
            for &member in ec.members() {
                connections.extend_from_slice(&self.nodes[member.index()].connections);
            }
        }
        connections
    }

    /// Keeps the occurrences whose path, shifted by `start_offset`, matches
    /// `segment` element-wise.
    ///
    /// An equivalence-class element matches any of its members; every other
    /// element must match by id. Occurrences whose path is too short to hold
    /// the shifted segment are dropped.
    pub(crate) fn filter_connections(
        &self,
        init: &[Connection],
        start_offset: usize,
        segment: &[NodeId],
    ) -> Vec<Connection> {
        let mut filtered = Vec::new();
        'occurrences: for &con in init {
            let path = &self.paths[con.path];
            if con.pos + start_offset + segment.len() > path.len() {
                continue;
            }
            for (j, &elem) in segment.iter().enumerate() {
                let actual = path[con.pos + start_offset + j];
                match &self.nodes[elem.index()].lexicon {
                    LexiconUnit::EquivalenceClass(ec) => {
                        if !ec.has(actual) {
                            continue 'occurrences;
                        }
                    }
                    _ => {
                        if elem != actual {
                            continue 'occurrences;
                        }
                    }
                }
            }
            filtered.push(con);
        }
        filtered
    }

    /// Builds the symmetric connection matrix for `path`.
    pub(crate) fn connection_matrix(&self, path: &SearchPath) -> ConnectionMatrix {
        let dim = path.len();
        let mut connections: ConnectionMatrix = Array2::from_elem((dim, dim), Vec::new());
        for i in 0..dim {
            connections[(i, i)] = self.all_occurrences(path[i]);
            for j in i + 1..dim {
                let step = {
                    let prev = &connections[(j - 1, i)];
                    self.filter_connections(prev, j - i, &path.slice(j, j))
                };
                connections[(i, j)] = step.clone();
                connections[(j, i)] = step;
            }
        }
        connections
    }

    /// Derives the flow and descent matrices from a connection matrix.
    ///
    /// `flow(i, j)` divides a cell's occurrence count by its neighbour one
    /// step toward the diagonal (the diagonal itself divides by the corpus
    /// size); `descent(i, j)` divides a flow by its neighbour one step away
    /// from the diagonal (the diagonal carries 1).
    pub(crate) fn flows_and_descents(
        &self,
        connections: &ConnectionMatrix,
    ) -> (Array2<f64>, Array2<f64>) {
        let dim = connections.nrows();
        let count = |i: usize, j: usize| connections[(i, j)].len() as f64;

        let mut flows = Array2::from_elem((dim, dim), -1.0);
        for i in 0..dim {
            for j in 0..dim {
                flows[(i, j)] = if i > j {
                    count(i, j) / count(i - 1, j)
                } else if i < j {
                    count(i, j) / count(i + 1, j)
                } else {
                    count(i, i) / self.corpus_size as f64
                };
            }
        }

        let mut descents = Array2::from_elem((dim, dim), -1.0);
        for i in 0..dim {
            for j in 0..dim {
                descents[(i, j)] = if i > j {
                    flows[(i, j)] / flows[(i - 1, j)]
                } else if i < j {
                    flows[(i, j)] / flows[(i + 1, j)]
                } else {
                    1.0
                };
            }
        }

        (flows, descents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::EquivalenceClass;
    use crate::node::RdsNode;

    fn corpus(sentences: &[&str]) -> Vec<Vec<String>> {
        sentences
            .iter()
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn diagonal_counts_occurrences() {
        let graph = RdsGraph::from_corpus(&corpus(&["a b a", "a c"])).unwrap();
        let matrix = graph.connection_matrix(&graph.paths()[0]);
        // path [* a b a #]; "a" occurs three times across the corpus
        assert_eq!(matrix[(1, 1)].len(), 3);
        // "*" occurs once per path
        assert_eq!(matrix[(0, 0)].len(), 2);
    }

    #[test]
    fn off_diagonal_counts_subpaths() {
        let graph = RdsGraph::from_corpus(&corpus(&["a b c", "a b d", "x a b"])).unwrap();
        let matrix = graph.connection_matrix(&graph.paths()[0]);
        // sub-path "a b" (positions 1..=2) occurs in all three sentences
        assert_eq!(matrix[(2, 1)].len(), 3);
        assert_eq!(matrix[(1, 2)].len(), 3);
        // sub-path "a b c" only in the first
        assert_eq!(matrix[(3, 1)].len(), 1);
    }

    #[test]
    fn matrix_is_symmetric() {
        let graph = RdsGraph::from_corpus(&corpus(&["a b c", "a b c"])).unwrap();
        let matrix = graph.connection_matrix(&graph.paths()[0]);
        let dim = graph.paths()[0].len();
        for i in 0..dim {
            for j in 0..dim {
                assert_eq!(matrix[(i, j)], matrix[(j, i)]);
            }
        }
    }

    #[test]
    fn equivalence_class_matches_members() {
        let mut graph = RdsGraph::from_corpus(&corpus(&["a b x", "a c x"])).unwrap();
        let b = graph.paths()[0][2];
        let c = graph.paths()[1][2];
        let ec = EquivalenceClass::from_units(&[b, c]);
        let ec_id = NodeId::new(graph.nodes.len() as u32);
        graph
            .nodes
            .push(RdsNode::new(LexiconUnit::EquivalenceClass(ec)));
        graph.rebuild_indices();

        // a probe path [* a E x #] must match both sentences
        let probe = SearchPath::new(vec![
            graph.paths()[0][0],
            graph.paths()[0][1],
            ec_id,
            graph.paths()[0][3],
            graph.paths()[0][4],
        ]);
        let matrix = graph.connection_matrix(&probe);
        assert_eq!(matrix[(4, 0)].len(), 2);
    }

    #[test]
    fn flows_and_descents_shape() {
        let graph = RdsGraph::from_corpus(&corpus(&["a b c", "a b c"])).unwrap();
        let path = graph.paths()[0].clone();
        let matrix = graph.connection_matrix(&path);
        let (flows, descents) = graph.flows_and_descents(&matrix);
        let dim = path.len();
        assert_eq!(flows.dim(), (dim, dim));
        for i in 0..dim {
            assert_eq!(descents[(i, i)], 1.0);
            // diagonal flow is occurrence count over corpus size
            let expected = matrix[(i, i)].len() as f64 / graph.corpus_size() as f64;
            assert!((flows[(i, i)] - expected).abs() < 1e-12);
        }
        // both sentences identical: extending "a" to "a b" is certain
        assert!((flows[(2, 1)] - 1.0).abs() < 1e-12);
    }
}
