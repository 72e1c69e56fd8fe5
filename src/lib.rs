//! # rapid-pagerank
//!
//! PageRank over directed graphs submitted as Matrix Market files or over a
//! compact little-endian binary protocol.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rapid_pagerank::codec::matrix_market::read_matrix_market_file;
//! use rapid_pagerank::{Pipeline, RankConfig};
//!
//! let submission = read_matrix_market_file("graph.mtx")?;
//! let pipeline = Pipeline::new(RankConfig::default())?;
//! let report = pipeline.run(&submission)?;
//! println!("{report}");
//! # Ok::<(), rapid_pagerank::RankError>(())
//! ```
//!
//! ## Layout
//!
//! - [`graph`]: arc validation, deduplication and the inlink CSR graph
//! - [`pagerank`]: the power-iteration solver
//! - [`codec`]: Matrix Market reader and the binary wire format
//! - [`pipeline`]: config validation and the build/rank/report runner
//! - [`server`] and [`client`]: the TCP transport

pub mod client;
pub mod codec;
pub mod errors;
pub mod graph;
pub mod pagerank;
pub mod pipeline;
pub mod report;
pub mod server;
pub mod types;

pub use errors::{RankError, Result};
pub use pagerank::PageRankResult;
pub use pipeline::Pipeline;
pub use report::RankReport;
pub use types::{IdBase, RankConfig, Submission};

/// Install the `tracing` subscriber used by the binaries.
///
/// `RUST_LOG` overrides `default_filter`.
pub fn init_logging(default_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
