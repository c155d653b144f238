//! Command-line front end for the distillation engine.
//!
//! Reads a corpus file, runs distillation and prints the result in one of
//! three forms: a human-readable dump (default), the bare PCFG (`--pcfg`)
//! or a JSON document carrying the corpus, search paths, lexicon and
//! grammar (`--json`). Optionally generates fresh sequences from the
//! learned grammar afterwards.

use adios::corpus::read_corpus_file;
use adios::graph::distill::DistillParams;
use adios::graph::RdsGraph;
use adios::lexicon::NodeId;
use adios::maths::special::{reseed, uniform_rand};
use clap::Parser;
use serde_json::json;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "ADIOS grammar induction over token sequences")]
struct Cli {
    /// Input corpus file, one whitespace-tokenised sentence per line
    input: PathBuf,

    /// Divergence threshold (e.g. 0.9)
    eta: f64,

    /// Significance threshold (e.g. 0.01)
    alpha: f64,

    /// Context window size (e.g. 5); below 3 disables generalisation
    context_size: usize,

    /// Minimum member-overlap ratio for reusing an equivalence class
    overlap_threshold: f64,

    /// Number of new sequences to generate after convergence
    number_of_new_sequences: Option<usize>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit all results as JSON
    #[arg(long)]
    json: bool,

    /// Emit only the learned grammar in PCFG form
    #[arg(long)]
    pcfg: bool,

    /// Suppress the human-readable dump
    #[arg(long)]
    quiet: bool,

    /// Seed for the process RNG, for reproducible generation
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Some(seed) = cli.seed {
        reseed(seed);
    }

    let sequences = read_corpus_file(&cli.input)
        .map_err(|err| format!("cannot read corpus file {}: {err}", cli.input.display()))?;
    let params = DistillParams::new(cli.eta, cli.alpha, cli.context_size, cli.overlap_threshold)?;
    let mut graph = RdsGraph::from_corpus(&sequences)?;

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };

    let human = !cli.json && !cli.pcfg && !cli.quiet;
    if human {
        writeln!(out, "eta = {}", params.eta)?;
        writeln!(out, "alpha = {}", params.alpha)?;
        writeln!(out, "contextSize = {}", params.context_size)?;
        writeln!(out, "overlapThreshold = {}", params.overlap_threshold)?;
        writeln!(out, "BEGIN CORPUS ----------")?;
        for sequence in &sequences {
            writeln!(out, "{}", sequence.join(" "))?;
        }
        writeln!(out, "END CORPUS ----------\n")?;
        writeln!(out, "{graph}")?;
    }

    let started = Instant::now();
    graph.distill(&params);
    let elapsed = started.elapsed().as_secs_f64();

    if cli.json {
        let search_paths: Vec<Vec<String>> = graph
            .paths()
            .iter()
            .map(|path| path.iter().map(|&id| graph.node_name(id)).collect())
            .collect();
        let lexicon: Vec<serde_json::Value> = graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let parents: Vec<u32> = node
                    .parents
                    .iter()
                    .map(|link| link.node.index() as u32)
                    .collect();
                json!({
                    "id": i,
                    "kind": node.lexicon.kind_tag(),
                    "string": graph.node_string(NodeId::new(i as u32)),
                    "parents": parents,
                })
            })
            .collect();
        let document = json!({
            "corpus": sequences,
            "search_paths": search_paths,
            "lexicon": lexicon,
            "grammar": graph.pcfg_string(),
            "timing": elapsed,
        });
        serde_json::to_writer_pretty(&mut out, &document)?;
        writeln!(out)?;
    } else if cli.pcfg {
        graph.write_pcfg(&mut out)?;
    } else if human {
        writeln!(out, "BEGIN DISTILLATION ----------")?;
        writeln!(out, "{graph}")?;
        writeln!(out, "END DISTILLATION ----------\n")?;
        writeln!(out, "Time elapsed: {elapsed} seconds\n")?;
        graph.write_pcfg(&mut out)?;
    } else {
        graph.write_pcfg(&mut out)?;
    }

    if let Some(count) = cli.number_of_new_sequences {
        for _ in 0..count {
            let pick = (graph.paths().len() as f64 * uniform_rand()).floor() as usize;
            let pick = pick.min(graph.paths().len() - 1);
            let sequence = graph.generate_path(&graph.paths()[pick]);
            writeln!(out, "{}", sequence.join(" "))?;
        }
    }
    out.flush()?;

    info!(
        patterns = graph.pattern_count(),
        rewirings = graph.rewiring_count(),
        nodes = graph.nodes().len(),
        elapsed,
        "run finished"
    );
    Ok(())
}
