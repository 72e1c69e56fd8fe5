// src/bin/graph_client.rs
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use rapid_pagerank::client::submit_file;
use rapid_pagerank::init_logging;
use rapid_pagerank::server::DEFAULT_ADDR;

/// Send Matrix Market files to a ranking server, one connection per file.
#[derive(Parser)]
#[command(name = "graph-client", version)]
struct Args {
    /// Server address
    #[arg(long, default_value = DEFAULT_ADDR)]
    addr: String,
    /// Files to rank
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging("warn");
    let args = Args::parse();

    let mut tasks = tokio::task::JoinSet::new();
    for file in args.files {
        let addr = args.addr.clone();
        tasks.spawn(async move {
            let name = file.display().to_string();
            match submit_file(addr.as_str(), &file).await {
                Ok(response) => {
                    println!(
                        "{name} Exit code: {}\n{}\n{name} Bye",
                        response.status, response.body
                    );
                }
                Err(e) => error!(file = %name, error = %e, "request failed"),
            }
        });
    }
    while tasks.join_next().await.is_some() {}
    Ok(())
}
