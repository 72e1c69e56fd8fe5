//! Error taxonomy for graph submissions.
//!
//! Fatal problems with a submission (bad header, wrong arc count, truncated
//! stream, invalid configuration) are [`RankError`] variants. Out-of-range
//! arcs and non-convergence are not errors: they are tallied in the
//! [`BuiltGraph`](crate::graph::builder::BuiltGraph) and reported in the
//! [`PageRankResult`](crate::pagerank::PageRankResult) respectively.

use thiserror::Error;

use crate::pipeline::validation::ValidationReport;

/// Wire status for a successful run.
pub const STATUS_OK: u32 = 0;
/// Wire status for malformed or unusable input.
pub const STATUS_INPUT: u32 = 1;
/// Wire status for a rejected [`RankConfig`](crate::types::RankConfig).
pub const STATUS_CONFIG: u32 = 2;
/// Wire status when the per-submission time budget ran out.
pub const STATUS_TIMEOUT: u32 = 3;
/// Wire status for I/O and serialization failures.
pub const STATUS_IO: u32 = 4;

#[derive(Debug, Error)]
pub enum RankError {
    #[error("malformed header at line {line}: {reason}")]
    MalformedHeader { line: usize, reason: String },

    #[error("malformed arc at line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("number of arcs does not match the header: declared {declared}, found {found}")]
    ArcCountMismatch { declared: usize, found: usize },

    #[error("stream ended after {received} of {expected} arcs")]
    Truncated { expected: usize, received: usize },

    #[error("graph has no valid arc endpoints")]
    EmptyGraph,

    #[error("graph has {nodes} nodes, more than the limit of {limit}")]
    TooManyNodes { nodes: u64, limit: usize },

    #[error("ranking was cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    InvalidConfig(ValidationReport),

    #[error("ranking failed with status {status}: {message}")]
    Downstream { status: u32, message: String },

    #[error("ranking did not finish within {secs}s")]
    Timeout { secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RankError {
    /// Status code sent in the response frame when this error ends a submission.
    pub fn status_code(&self) -> u32 {
        match self {
            Self::MalformedHeader { .. }
            | Self::MalformedLine { .. }
            | Self::ArcCountMismatch { .. }
            | Self::Truncated { .. }
            | Self::EmptyGraph
            | Self::TooManyNodes { .. } => STATUS_INPUT,
            Self::InvalidConfig(_) => STATUS_CONFIG,
            Self::Timeout { .. } | Self::Cancelled => STATUS_TIMEOUT,
            Self::Io(_) | Self::Json(_) => STATUS_IO,
            Self::Downstream { status, .. } => *status,
        }
    }
}

pub type Result<T> = std::result::Result<T, RankError>;
