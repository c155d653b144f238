//! The RDS graph: a mutable hypergraph over lexicon units.
//!
//! The graph owns a single node arena plus the search paths and parse trees
//! derived from the corpus. Nodes reference each other only through indices
//! ([`NodeId`], [`Connection`], [`ParentLink`]), so a [`Clone`] of the graph
//! is a fully independent deep copy; the generalisation kernel relies on
//! this to simulate hypothetical rewirings on a throwaway clone.
//!
//! Submodules carry the kernels: matrix computation, significance testing,
//! generalisation, rewiring, the distillation driver and PCFG emission.
//!
//! # Invariants
//! - Nodes 0 and 1 are the unique Start/End sentinels, first and last element
//!   of every path.
//! - For every `(p, j)` in `nodes[n].connections`, `paths[p][j] == n`.
//! - `corpus_size` equals the summed length of all paths.
//! - Pattern / equivalence-class payloads are immutable once installed;
//!   rewiring only ever appends new nodes.
//! - Index lists are rebuilt from scratch after every mutation
//!   ([`RdsGraph::rebuild_indices`]); the rebuild is idempotent.

pub mod distill;
pub mod generalise;
pub mod matrix;
pub mod pcfg;
pub mod rewire;
pub mod significance;

use crate::lexicon::{LexiconUnit, NodeId};
use crate::maths::special::uniform_rand;
use crate::node::{Connection, ParentLink, RdsNode};
use crate::parse_tree::ParseTree;
use crate::search_path::SearchPath;
use std::collections::HashMap;
use std::fmt;
use tracing::error;

/// Error raised when a graph cannot be built from the given corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// No sequences were supplied.
    EmptyCorpus,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::EmptyCorpus => write!(f, "corpus contains no sequences"),
        }
    }
}

impl std::error::Error for GraphError {}

/// The central data structure of the distillation engine.
#[derive(Debug, Clone)]
pub struct RdsGraph {
    /// Owning node arena; ids are indices into it.
    pub(crate) nodes: Vec<RdsNode>,
    /// One search path per input sentence, in corpus order.
    pub(crate) paths: Vec<SearchPath>,
    /// One derivation tree per path.
    pub(crate) trees: Vec<ParseTree>,
    /// Per-node production counts, filled by probability estimation.
    pub(crate) counts: Vec<Vec<u32>>,
    /// Summed length of all paths.
    pub(crate) corpus_size: usize,
    /// Number of rewiring operations applied so far.
    pub(crate) rewiring_ops: usize,
}

impl RdsGraph {
    /// Builds the initial graph from a corpus of token sequences.
    ///
    /// Installs the Start/End sentinels, interns each distinct token as a
    /// terminal node in first-seen order, materialises one path and one
    /// parse tree per sentence and rebuilds the occurrence indices.
    pub fn from_corpus(sequences: &[Vec<String>]) -> Result<Self, GraphError> {
        if sequences.is_empty() {
            return Err(GraphError::EmptyCorpus);
        }

        let mut graph = RdsGraph {
            nodes: vec![
                RdsNode::new(LexiconUnit::Start),
                RdsNode::new(LexiconUnit::End),
            ],
            paths: Vec::with_capacity(sequences.len()),
            trees: Vec::with_capacity(sequences.len()),
            counts: Vec::new(),
            corpus_size: 0,
            rewiring_ops: 0,
        };

        let mut interned: HashMap<String, NodeId> = HashMap::new();
        for sequence in sequences {
            let mut current = Vec::with_capacity(sequence.len() + 2);
            current.push(NodeId::START);
            for token in sequence {
                let id = match interned.get(token) {
                    Some(&id) => id,
                    None => {
                        let id = NodeId::new(graph.nodes.len() as u32);
                        graph
                            .nodes
                            .push(RdsNode::new(LexiconUnit::Terminal(token.clone())));
                        interned.insert(token.clone(), id);
                        id
                    }
                };
                current.push(id);
            }
            current.push(NodeId::END);
            graph.paths.push(SearchPath::new(current));
        }

        graph.rebuild_indices();
        graph.trees = graph
            .paths
            .iter()
            .map(|path| ParseTree::from_leaves(path))
            .collect();
        Ok(graph)
    }

    /// Rebuilds every `connections` and `parents` list from the current
    /// paths and payloads, and recomputes `corpus_size`.
    ///
    /// Running the rebuild twice in a row leaves all lists bit-identical.
    pub(crate) fn rebuild_indices(&mut self) {
        for node in &mut self.nodes {
            node.connections.clear();
            node.parents.clear();
        }

        self.corpus_size = 0;
        for (p, path) in self.paths.iter().enumerate() {
            self.corpus_size += path.len();
            for (j, node) in path.iter().enumerate() {
                self.nodes[node.index()]
                    .connections
                    .push(Connection::new(p, j));
            }
        }

        let mut links: Vec<(NodeId, ParentLink)> = Vec::new();
        for (i, node) in self.nodes.iter().enumerate() {
            let parent = NodeId::new(i as u32);
            match &node.lexicon {
                LexiconUnit::Pattern(sp) => {
                    for (pos, &child) in sp.children().iter().enumerate() {
                        links.push((child, ParentLink::new(parent, pos)));
                    }
                }
                LexiconUnit::EquivalenceClass(ec) => {
                    for &member in ec.members() {
                        links.push((member, ParentLink::new(parent, 0)));
                    }
                }
                _ => {}
            }
        }
        for (child, link) in links {
            self.nodes[child.index()].add_parent(link);
        }
    }

    /// All nodes, id order.
    #[inline]
    pub fn nodes(&self) -> &[RdsNode] {
        &self.nodes
    }

    /// All search paths, corpus order.
    #[inline]
    pub fn paths(&self) -> &[SearchPath] {
        &self.paths
    }

    /// Summed length of all search paths.
    #[inline]
    pub fn corpus_size(&self) -> usize {
        self.corpus_size
    }

    /// Number of pattern nodes currently in the graph.
    pub fn pattern_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.lexicon, LexiconUnit::Pattern(_)))
            .count()
    }

    /// Number of rewiring operations applied so far.
    #[inline]
    pub fn rewiring_count(&self) -> usize {
        self.rewiring_ops
    }

    /// Short name of a node as it appears in emitted grammars:
    /// `E{id}`, `P{id}`, the terminal symbol, `*` or `#`.
    pub fn node_name(&self, node: NodeId) -> String {
        match self.nodes.get(node.index()) {
            None => format!("[invalid node {node}]"),
            Some(n) => match &n.lexicon {
                LexiconUnit::Start => "*".to_string(),
                LexiconUnit::End => "#".to_string(),
                LexiconUnit::Terminal(symbol) => symbol.clone(),
                LexiconUnit::Pattern(_) => format!("P{node}"),
                LexiconUnit::EquivalenceClass(_) => format!("E{node}"),
            },
        }
    }

    /// Expanded form of a node: members listed for equivalence classes
    /// (`E[a,b]`, comma-separated), children concatenated for patterns
    /// (`P[ab]`), the plain name otherwise.
    pub fn node_string(&self, node: NodeId) -> String {
        match self.nodes.get(node.index()) {
            None => format!("[invalid node {node}]"),
            Some(n) => match &n.lexicon {
                LexiconUnit::EquivalenceClass(ec) => {
                    let members: Vec<String> =
                        ec.members().iter().map(|&m| self.node_name(m)).collect();
                    format!("E[{}]", members.join(","))
                }
                LexiconUnit::Pattern(sp) => {
                    let children: Vec<String> =
                        sp.children().iter().map(|&c| self.node_name(c)).collect();
                    format!("P[{}]", children.join(""))
                }
                _ => self.node_name(node),
            },
        }
    }

    /// A path rendered as bracketed node names, space-separated.
    pub fn path_string(&self, path: &SearchPath) -> String {
        let names: Vec<String> = path.iter().map(|&id| self.node_name(id)).collect();
        format!("[{}]", names.join(" "))
    }

    /// Expands the Start node. See [`RdsGraph::generate_from`].
    pub fn generate(&self) -> Vec<String> {
        self.generate_from(NodeId::START)
    }

    /// Recursively expands a node into a token sequence.
    ///
    /// Terminals yield their symbol, the sentinels `*` / `#`, patterns the
    /// concatenation of their children, equivalence classes a uniformly
    /// sampled member. An out-of-bounds id or an empty class is logged and
    /// skipped; that is a safety net for corrupt graphs, not a normal path.
    pub fn generate_from(&self, node: NodeId) -> Vec<String> {
        let Some(n) = self.nodes.get(node.index()) else {
            error!(node = %node, total = self.nodes.len(), "generate: node index out of bounds");
            return Vec::new();
        };
        match &n.lexicon {
            LexiconUnit::Start => vec!["*".to_string()],
            LexiconUnit::End => vec!["#".to_string()],
            LexiconUnit::Terminal(symbol) => vec![symbol.clone()],
            LexiconUnit::EquivalenceClass(ec) => {
                if ec.is_empty() {
                    error!(node = %node, "generate: empty equivalence class");
                    return Vec::new();
                }
                let pick = (ec.len() as f64 * uniform_rand()).floor() as usize;
                let pick = pick.min(ec.len() - 1);
                self.generate_from(ec.members()[pick])
            }
            LexiconUnit::Pattern(sp) => {
                let mut sequence = Vec::new();
                for &child in sp.children() {
                    sequence.extend(self.generate_from(child));
                }
                sequence
            }
        }
    }

    /// Expands every element of a stored path in order.
    pub fn generate_path(&self, path: &SearchPath) -> Vec<String> {
        let mut sequence = Vec::new();
        for &node in path.iter() {
            sequence.extend(self.generate_from(node));
        }
        sequence
    }
}

impl fmt::Display for RdsGraph {
    /// Debug listing: every path in name form, then every node with its kind
    /// tag and parent back-edges.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Search Paths")?;
        for path in &self.paths {
            writeln!(f, "{}", self.path_string(path))?;
        }
        writeln!(f)?;
        writeln!(f, "RDS Graph Nodes {}", self.nodes.len())?;
        for (i, node) in self.nodes.iter().enumerate() {
            let id = NodeId::new(i as u32);
            write!(
                f,
                "Lexicon {i} ({}): {}   ------->  {}  [",
                node.lexicon.kind_tag(),
                self.node_string(id),
                node.parents.len()
            )?;
            for (j, parent) in node.parents.iter().enumerate() {
                if j > 0 {
                    write!(f, "   ")?;
                }
                write!(f, "{}", parent.node)?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}
