// src/bin/pagerank.rs
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use rapid_pagerank::codec::matrix_market::read_matrix_market_file;
use rapid_pagerank::graph::csr::InlinkGraph;
use rapid_pagerank::pagerank::TracingObserver;
use rapid_pagerank::types::DEFAULT_MAX_NODES;
use rapid_pagerank::{init_logging, Pipeline, RankConfig};

/// Compute PageRank for a directed graph stored in Matrix Market format.
///
/// Uses teleporting and dead-end redistribution with the given damping
/// factor and prints the K highest ranked nodes.
#[derive(Parser)]
#[command(name = "pagerank", version)]
struct Args {
    /// Input file (Matrix Market coordinate pattern)
    infile: PathBuf,
    /// Show top K nodes
    #[arg(short = 'k', default_value_t = 3)]
    top_k: usize,
    /// Maximum number of iterations
    #[arg(short = 'm', default_value_t = 100)]
    max_iterations: usize,
    /// Damping factor
    #[arg(short = 'd', default_value_t = 0.9)]
    damping: f64,
    /// Max error (L1 delta) for convergence
    #[arg(short = 'e', default_value_t = 1.0e-7)]
    epsilon: f64,
    /// Worker threads (defaults to available parallelism)
    #[arg(short = 't')]
    threads: Option<usize>,
    /// Print inlinks and out-degrees of the built graph
    #[arg(short = 'v')]
    verbose: bool,
    /// Refuse graphs with more nodes than this
    #[arg(long, default_value_t = DEFAULT_MAX_NODES)]
    max_nodes: usize,
    /// Emit the report as JSON
    #[arg(long)]
    json: bool,
    /// Log progress every N iterations (needs RUST_LOG=debug)
    #[arg(long, default_value_t = 10)]
    progress_every: usize,
}

fn main() {
    init_logging("warn");
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let defaults = RankConfig::default();
    let config = RankConfig {
        damping: args.damping,
        epsilon: args.epsilon,
        max_iterations: args.max_iterations,
        top_k: args.top_k,
        threads: args.threads.unwrap_or(defaults.threads),
        max_nodes: args.max_nodes,
        ..defaults
    };
    let pipeline = Pipeline::new(config)?;

    let submission = read_matrix_market_file(&args.infile)
        .with_context(|| format!("reading {}", args.infile.display()))?;

    let mut observer = TracingObserver::new(args.progress_every);
    let outcome = pipeline.rank(&submission, &mut observer)?;

    if args.verbose {
        print_graph(&outcome.built.graph);
    }

    if args.json {
        println!("{}", outcome.report.to_json()?);
    } else {
        print!("{}", outcome.report);
    }
    Ok(())
}

fn print_graph(graph: &InlinkGraph) {
    let nodes = || (0..graph.num_nodes).map(|n| n as u32);
    println!("--- incoming edges");
    for node in nodes() {
        println!("{node}: {:?}", graph.inlinks(node));
    }
    println!("--- outdegrees");
    for node in nodes() {
        println!("{node}: {}", graph.degree(node));
    }
}
