//! PageRank algorithms
//!
//! This module provides the power-iteration PageRank solver and the
//! per-iteration observer hooks it reports progress through.

pub mod standard;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

/// Result of a PageRank computation
#[derive(Debug, Clone)]
pub struct PageRankResult {
    /// Scores for each node (indexed by node ID)
    pub scores: Vec<f64>,
    /// Number of iterations performed
    pub iterations: usize,
    /// Final convergence delta
    pub delta: f64,
    /// Whether the threshold was met before the iteration cap ran out
    pub converged: bool,
    /// Whether the run stopped early because its [`CancelToken`] fired
    pub cancelled: bool,
}

impl PageRankResult {
    /// Create a new PageRank result
    pub fn new(scores: Vec<f64>, iterations: usize, delta: f64, converged: bool) -> Self {
        Self {
            scores,
            iterations,
            delta,
            converged,
            cancelled: false,
        }
    }

    /// Get top N nodes by score, ties broken by lower node id
    pub fn top_n(&self, n: usize) -> Vec<(u32, f64)> {
        let mut indexed: Vec<_> = self
            .scores
            .iter()
            .enumerate()
            .map(|(i, &s)| (i as u32, s))
            .collect();
        indexed.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        indexed.truncate(n);
        indexed
    }

    /// Sum of all scores; 1.0 up to rounding
    pub fn total_mass(&self) -> f64 {
        self.scores.iter().sum()
    }
}

/// Shared flag that asks a running solver to stop after its current iteration.
///
/// Clones share the same flag, so one clone can be handed to the solver
/// while another stays with whoever enforces the deadline.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Receives the rank vector after every completed iteration.
///
/// Observers must be `Send` because the solver may run on a rayon worker.
pub trait IterationObserver: Send {
    fn on_iteration(&mut self, iteration: usize, delta: f64, scores: &[f64]);
}

/// Observer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl IterationObserver for NoopObserver {
    #[inline]
    fn on_iteration(&mut self, _iteration: usize, _delta: f64, _scores: &[f64]) {}
}

/// Logs the current leading node every `every` iterations at debug level.
#[derive(Debug, Clone, Copy)]
pub struct TracingObserver {
    every: usize,
}

impl TracingObserver {
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new(1)
    }
}

impl IterationObserver for TracingObserver {
    fn on_iteration(&mut self, iteration: usize, delta: f64, scores: &[f64]) {
        if iteration % self.every != 0 {
            return;
        }
        let leader = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1).then(b.0.cmp(&a.0)));
        if let Some((node, &score)) = leader {
            debug!(iteration, delta, leader = node, score, "pagerank iteration");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_n_orders_by_score_then_id() {
        let result = PageRankResult::new(vec![0.2, 0.4, 0.2, 0.2], 1, 0.0, true);
        let top = result.top_n(3);
        assert_eq!(top.iter().map(|t| t.0).collect::<Vec<_>>(), vec![1, 0, 2]);
    }

    #[test]
    fn test_top_n_truncates_to_available() {
        let result = PageRankResult::new(vec![0.5, 0.5], 1, 0.0, true);
        assert_eq!(result.top_n(10).len(), 2);
    }

    #[test]
    fn test_total_mass() {
        let result = PageRankResult::new(vec![0.25, 0.75], 1, 0.0, true);
        assert!((result.total_mass() - 1.0).abs() < 1e-12);
        assert!(!result.cancelled);
    }

    #[test]
    fn test_cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let solver_side = token.clone();
        assert!(!solver_side.is_cancelled());
        token.cancel();
        assert!(solver_side.is_cancelled());
    }

    #[test]
    fn test_tracing_observer_never_divides_by_zero() {
        let mut observer = TracingObserver::new(0);
        observer.on_iteration(3, 0.1, &[0.5, 0.5]);
        observer.on_iteration(4, 0.1, &[]);
    }
}
