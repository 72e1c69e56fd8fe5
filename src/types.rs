//! Core types shared across the crate.

use serde::{Deserialize, Serialize};

/// Default cap on graph size; about 40 bytes of state per node.
pub const DEFAULT_MAX_NODES: usize = 10_000_000;

/// How arc endpoints are numbered by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdBase {
    /// Ids run from 1 to n (Matrix Market and the wire protocol).
    #[default]
    One,
    /// Ids run from 0 to n - 1.
    Zero,
}

impl IdBase {
    /// Offset subtracted from incoming ids.
    pub fn offset(self) -> u32 {
        match self {
            IdBase::One => 1,
            IdBase::Zero => 0,
        }
    }
}

/// Configuration for a ranking run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    /// Probability of following an edge instead of teleporting.
    pub damping: f64,
    /// L1 delta below which the iteration stops.
    pub epsilon: f64,
    /// Hard cap on the number of iterations.
    pub max_iterations: usize,
    /// Number of top-ranked nodes to report.
    pub top_k: usize,
    /// Worker threads for the parallel build and solve paths.
    pub threads: usize,
    /// Graphs with at least this many nodes are solved in parallel.
    pub parallel_nodes: usize,
    /// Submissions with at least this many arcs are ingested in parallel.
    pub parallel_arcs: usize,
    /// Largest graph (1 + highest node id) accepted for ranking.
    pub max_nodes: usize,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            damping: 0.9,
            epsilon: 1.0e-7,
            max_iterations: 100,
            top_k: 3,
            threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            parallel_nodes: 50_000,
            parallel_arcs: 200_000,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

impl RankConfig {
    /// Load a configuration from a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> crate::errors::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A graph as submitted by a caller: declared node count plus raw arcs.
///
/// The declared arc count of the source has already been checked against
/// `arcs.len()` by whichever reader produced this value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    pub declared_nodes: u32,
    pub base: IdBase,
    pub arcs: Vec<(u32, u32)>,
}

impl Submission {
    /// A submission with 1-based ids, as read from a file or the wire.
    pub fn one_based(declared_nodes: u32, arcs: Vec<(u32, u32)>) -> Self {
        Self {
            declared_nodes,
            base: IdBase::One,
            arcs,
        }
    }
}
