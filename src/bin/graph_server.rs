// src/bin/graph_server.rs
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use rapid_pagerank::init_logging;
use rapid_pagerank::server::{GraphServer, ServerConfig};

/// Rank graphs received over TCP.
#[derive(Parser)]
#[command(name = "graph-server", version)]
struct Args {
    /// JSON configuration file; flags below override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Address to listen on
    #[arg(long)]
    addr: Option<String>,
    /// Maximum submissions ranked at once
    #[arg(long)]
    workers: Option<usize>,
    /// Per-submission time budget in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging("info");
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            ServerConfig::from_json(&text)?
        }
        None => ServerConfig::default(),
    };
    if let Some(addr) = args.addr {
        config.addr = addr;
    }
    if let Some(workers) = args.workers {
        config.max_workers = workers;
    }
    if args.timeout.is_some() {
        config.solve_timeout_secs = args.timeout;
    }

    let server = GraphServer::new(config)?;
    let listener = server.bind().await?;
    server
        .serve(listener, async {
            let _ = tokio::signal::ctrl_c().await;
            info!("interrupt received");
        })
        .await?;
    Ok(())
}
