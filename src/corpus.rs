//! Corpus reading: one sentence per line, whitespace-tokenised.
//!
//! The `*` and `#` boundary markers are optional in input files; the reader
//! strips them (the graph inserts its own Start/End sentinels). A single
//! warning is emitted the first time a line carries neither marker; such
//! lines are still accepted as plain sequences.

use std::fs;
use std::io;
use std::path::Path;
use tracing::warn;

/// Splits a line on whitespace.
pub fn tokenise(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Parses corpus text into token sequences, skipping empty lines and
/// stripping the optional boundary markers.
pub fn parse_corpus(text: &str) -> Vec<Vec<String>> {
    let mut sequences = Vec::new();
    let mut warned = false;
    for line in text.lines() {
        let mut tokens = tokenise(line);
        if tokens.is_empty() {
            continue;
        }
        let has_start = tokens.first().map(String::as_str) == Some("*");
        let has_end = tokens.last().map(String::as_str) == Some("#");
        if !has_start && !has_end && !warned {
            warn!("corpus line without boundary markers, treating as plain sequence: {line:?}");
            warned = true;
        }
        if has_start {
            tokens.remove(0);
        }
        if has_end {
            tokens.pop();
        }
        if !tokens.is_empty() {
            sequences.push(tokens);
        }
    }
    sequences
}

/// Reads a corpus file. See [`parse_corpus`] for the accepted format.
pub fn read_corpus_file<P: AsRef<Path>>(path: P) -> io::Result<Vec<Vec<String>>> {
    let text = fs::read_to_string(path)?;
    Ok(parse_corpus(&text))
}
