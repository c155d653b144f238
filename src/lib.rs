//! Adios: unsupervised grammar induction over symbol sequences.
//!
//! This crate implements recursive distillation of structure from a corpus
//! of token sequences. Sentences are loaded into a graph of lexicon units
//! whose search paths are repeatedly evaluated for statistically significant
//! sub-sequences; significant ranges are rewired into pattern nodes, and
//! interchangeable slot fillers are generalised into equivalence classes.
//! The fixed point of that loop is a probabilistic context-free grammar that
//! both describes the corpus and generates novel sequences.
//!
//! # Architecture
//!
//! - [`lexicon`]: node ids and the tagged payload sum type.
//! - [`search_path`] / [`parse_tree`]: the per-sentence views the engine
//!   mutates in lock-step.
//! - [`node`] / [`graph`]: the owning node arena with its occurrence
//!   indices, plus the kernels (matrices, significance, generalisation,
//!   rewiring, the driver, PCFG emission).
//! - [`maths`]: the deterministic process RNG and the binomial pmf.
//! - [`corpus`]: the sentence-per-line reader.
//!
//! # Example
//!
//! ```
//! use adios::prelude::*;
//!
//! let corpus: Vec<Vec<String>> = vec![
//!     vec!["the".into(), "cat".into(), "sat".into()],
//!     vec!["the".into(), "dog".into(), "sat".into()],
//! ];
//! let mut graph = RdsGraph::from_corpus(&corpus).unwrap();
//! graph.distill(&DistillParams::new(0.9, 0.01, 2, 0.5).unwrap());
//! let grammar = graph.pcfg_string();
//! assert!(grammar.lines().all(|line| line.contains("->")));
//! ```

pub mod corpus;
pub mod graph;
pub mod lexicon;
pub mod maths;
pub mod node;
pub mod parse_tree;
pub mod search_path;

pub use crate::graph::distill::{DistillParams, ParamsError};
pub use crate::graph::{GraphError, RdsGraph};
pub use crate::lexicon::{EquivalenceClass, LexiconUnit, NodeId, SignificantPattern};
pub use crate::node::{Connection, ParentLink, RdsNode};
pub use crate::parse_tree::ParseTree;
pub use crate::search_path::SearchPath;

/// Prelude for convenient usage.
pub mod prelude {
    pub use crate::corpus::{parse_corpus, read_corpus_file};
    pub use crate::graph::distill::{DistillParams, ParamsError};
    pub use crate::graph::{GraphError, RdsGraph};
    pub use crate::lexicon::{EquivalenceClass, LexiconUnit, NodeId, SignificantPattern};
    pub use crate::maths::special::reseed;
    pub use crate::search_path::SearchPath;
}
