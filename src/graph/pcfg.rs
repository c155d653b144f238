//! Probability estimation and PCFG emission.
//!
//! After convergence the parse trees are the record of every production the
//! grammar actually used: a pattern node contributes one count per tree
//! occurrence, an equivalence class one count for whichever member stood in
//! for it. The emitted grammar normalises those counts per left-hand side.
//!
//! Rule order is fixed for byte-reproducible output: equivalence-class rules
//! in node-id order, then pattern rules in node-id order, then the start
//! rules grouped by right-hand side in sorted order.

use super::RdsGraph;
use crate::lexicon::LexiconUnit;
use std::collections::BTreeMap;
use std::io::{self, Write};
use tracing::warn;

impl RdsGraph {
    /// Recounts every node's productions from the current parse trees.
    ///
    /// Equivalence classes get one counter per member, every other node a
    /// single counter.
    pub(crate) fn estimate_probabilities(&mut self) {
        let mut counts: Vec<Vec<u32>> = self
            .nodes
            .iter()
            .map(|node| match &node.lexicon {
                LexiconUnit::EquivalenceClass(ec) => vec![0; ec.len()],
                _ => vec![0; 1],
            })
            .collect();

        for tree in &self.trees {
            for tree_node in &tree.nodes()[1..] {
                let Some(node) = tree_node.value() else {
                    continue;
                };
                if node.index() >= self.nodes.len() {
                    warn!(node = %node, total = self.nodes.len(), "count skipped: node out of bounds");
                    continue;
                }
                match &self.nodes[node.index()].lexicon {
                    LexiconUnit::EquivalenceClass(ec) => {
                        assert_eq!(
                            tree_node.children().len(),
                            1,
                            "equivalence class derives exactly one child"
                        );
                        let child = tree_node.children()[0];
                        if let Some(derived) = tree.nodes()[child].value() {
                            for (k, &member) in ec.members().iter().enumerate() {
                                if member == derived {
                                    counts[node.index()][k] += 1;
                                }
                            }
                        }
                    }
                    _ => counts[node.index()][0] += 1,
                }
            }
        }

        self.counts = counts;
    }

    /// Writes the learned grammar as one rule per line:
    /// `LHS -> RHS [probability]`.
    ///
    /// Must be called after [`RdsGraph::distill`], which fills the counts.
    pub fn write_pcfg<W: Write>(&self, out: &mut W) -> io::Result<()> {
        assert_eq!(
            self.counts.len(),
            self.nodes.len(),
            "probabilities not estimated yet; run distill first"
        );

        // equivalence-class rules, one per member
        for (i, node) in self.nodes.iter().enumerate() {
            if let LexiconUnit::EquivalenceClass(ec) = &node.lexicon {
                let mut total: f64 = self.counts[i].iter().map(|&c| c as f64).sum();
                if total == 0.0 {
                    total = 1.0;
                }
                for (k, &member) in ec.members().iter().enumerate() {
                    writeln!(
                        out,
                        "E{i} -> {} [{}]",
                        self.node_name(member),
                        self.counts[i][k] as f64 / total
                    )?;
                }
            }
        }

        // pattern rules, a single production each
        for (i, node) in self.nodes.iter().enumerate() {
            if let LexiconUnit::Pattern(sp) = &node.lexicon {
                let mut total = self.counts[i][0] as f64;
                if total == 0.0 {
                    total = 1.0;
                }
                write!(out, "P{i} ->")?;
                for &child in sp.children() {
                    write!(out, " {}", self.node_name(child))?;
                }
                writeln!(out, " [{}]", self.counts[i][0] as f64 / total)?;
            }
        }

        // start rules: path interiors grouped by right-hand side
        let mut start_rules: BTreeMap<Vec<String>, usize> = BTreeMap::new();
        for path in &self.paths {
            let path_slice: &[_] = path;
            let rhs: Vec<String> = path_slice[1..path_slice.len() - 1]
                .iter()
                .map(|&node| self.node_name(node))
                .collect();
            *start_rules.entry(rhs).or_insert(0) += 1;
        }
        let total_sentences = self.paths.len() as f64;
        for (rhs, count) in &start_rules {
            write!(out, "S ->")?;
            for symbol in rhs {
                write!(out, " {symbol}")?;
            }
            writeln!(out, " [{}]", *count as f64 / total_sentences)?;
        }

        Ok(())
    }

    /// The emitted grammar as a string. See [`RdsGraph::write_pcfg`].
    pub fn pcfg_string(&self) -> String {
        let mut buffer = Vec::new();
        self.write_pcfg(&mut buffer)
            .expect("writing to a Vec cannot fail");
        String::from_utf8(buffer).expect("grammar output is valid UTF-8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::distill::DistillParams;

    fn corpus(sentences: &[&str]) -> Vec<Vec<String>> {
        sentences
            .iter()
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .collect()
    }

    /// Groups `LHS -> ... [p]` lines by left-hand side, summing probabilities.
    fn probability_sums(grammar: &str) -> BTreeMap<String, f64> {
        let mut sums: BTreeMap<String, f64> = BTreeMap::new();
        for line in grammar.lines() {
            let lhs = line.split(" -> ").next().unwrap().to_string();
            let prob: f64 = line
                .rsplit('[')
                .next()
                .unwrap()
                .trim_end_matches(']')
                .parse()
                .unwrap();
            *sums.entry(lhs).or_insert(0.0) += prob;
        }
        sums
    }

    #[test]
    fn trivial_grammar_is_one_start_rule() {
        let mut graph = RdsGraph::from_corpus(&corpus(&["a b c"])).unwrap();
        graph.distill(&DistillParams::new(0.9, 0.01, 2, 0.5).unwrap());
        assert_eq!(graph.pcfg_string(), "S -> a b c [1]\n");
    }

    #[test]
    fn identical_sentences_collapse_to_one_start_rule() {
        let mut graph =
            RdsGraph::from_corpus(&corpus(&["a b c", "a b c", "a b c"])).unwrap();
        graph.distill(&DistillParams::new(0.9, 0.01, 2, 0.5).unwrap());
        let grammar = graph.pcfg_string();
        let start_rules: Vec<&str> = grammar.lines().filter(|l| l.starts_with("S ->")).collect();
        assert_eq!(start_rules, vec!["S -> a b c [1]"]);
    }

    #[test]
    fn pattern_rules_have_probability_one() {
        let mut graph = RdsGraph::from_corpus(&corpus(&[
            "a b c d",
            "e b c f",
            "g b c h",
            "i b c j",
            "k b c l",
        ]))
        .unwrap();
        graph.distill(&DistillParams::new(0.9, 0.01, 2, 0.5).unwrap());
        let grammar = graph.pcfg_string();
        let pattern_rules: Vec<&str> = grammar.lines().filter(|l| l.starts_with('P')).collect();
        assert_eq!(pattern_rules.len(), 1);
        assert!(pattern_rules[0].contains("-> b c [1]"), "{}", pattern_rules[0]);
        // five distinct sentences, each one start rule with probability 1/5
        let start_rules: Vec<&str> = grammar.lines().filter(|l| l.starts_with("S ->")).collect();
        assert_eq!(start_rules.len(), 5);
        for rule in start_rules {
            assert!(rule.ends_with("[0.2]"), "{rule}");
        }
    }

    #[test]
    fn class_probabilities_reflect_member_usage() {
        let mut graph = RdsGraph::from_corpus(&corpus(&[
            "a p u q b",
            "c p v q d",
            "e p u q f",
            "g p v q h",
            "i p u q j",
        ]))
        .unwrap();
        graph.distill(&DistillParams::new(0.9, 0.1, 3, 0.5).unwrap());
        let grammar = graph.pcfg_string();
        // u stood in three times, v twice
        let class_rules: Vec<&str> = grammar.lines().filter(|l| l.starts_with('E')).collect();
        assert_eq!(class_rules.len(), 2);
        assert!(class_rules[0].contains("-> u [0.6]"), "{}", class_rules[0]);
        assert!(class_rules[1].contains("-> v [0.4]"), "{}", class_rules[1]);
    }

    #[test]
    fn probabilities_normalise_per_lhs() {
        let mut graph = RdsGraph::from_corpus(&corpus(&[
            "a p u q b",
            "c p v q d",
            "e p u q f",
            "g p v q h",
            "i p u q j",
        ]))
        .unwrap();
        graph.distill(&DistillParams::new(0.9, 0.1, 3, 0.5).unwrap());
        for (lhs, sum) in probability_sums(&graph.pcfg_string()) {
            assert!((sum - 1.0).abs() < 1e-6, "{lhs} sums to {sum}");
        }
    }
}
