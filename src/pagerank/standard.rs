//! Standard PageRank algorithm
//!
//! Implements the classic PageRank with power iteration, uniform
//! teleportation and uniform redistribution of dead-end mass.

use rayon::prelude::*;

use super::{CancelToken, IterationObserver, NoopObserver, PageRankResult};
use crate::graph::csr::InlinkGraph;

/// Standard PageRank implementation
#[derive(Debug, Clone)]
pub struct StandardPageRank {
    /// Damping factor (typically 0.85 to 0.9)
    pub damping: f64,
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Convergence threshold on the L1 delta
    pub threshold: f64,
    /// Graphs with at least this many nodes are updated in parallel
    pub parallel_threshold: usize,
    /// Checked before every iteration; the run stops once it fires
    pub cancel: Option<CancelToken>,
}

impl Default for StandardPageRank {
    fn default() -> Self {
        Self {
            damping: 0.9,
            max_iterations: 100,
            threshold: 1e-7,
            parallel_threshold: 50_000,
            cancel: None,
        }
    }
}

impl StandardPageRank {
    /// Create a new StandardPageRank with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the damping factor
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    /// Set the maximum iterations
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the node count from which the update runs on the rayon pool
    pub fn with_parallel_threshold(mut self, nodes: usize) -> Self {
        self.parallel_threshold = nodes;
        self
    }

    /// Stop early once `token` is cancelled
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Run PageRank on a graph
    ///
    /// Returns the result even if convergence wasn't achieved, with `converged=false`.
    pub fn run(&self, graph: &InlinkGraph) -> PageRankResult {
        self.run_observed(graph, &mut NoopObserver)
    }

    /// Run PageRank, notifying `observer` after every iteration.
    ///
    /// Iteration stops once the L1 delta drops below `threshold` or after
    /// `max_iterations` iterations. A run that used every iteration is
    /// reported as not converged even if its last delta was small. A
    /// cancelled run returns the scores of its last full iteration with
    /// `cancelled` set.
    pub fn run_observed(
        &self,
        graph: &InlinkGraph,
        observer: &mut dyn IterationObserver,
    ) -> PageRankResult {
        let n = graph.num_nodes;
        if n == 0 {
            return PageRankResult::new(vec![], 0, 0.0, true);
        }

        let parallel = n >= self.parallel_threshold;
        let n_f = n as f64;
        let teleport = (1.0 - self.damping) / n_f;

        // Initialize scores uniformly
        let mut scores = vec![1.0 / n_f; n];
        let mut new_scores = vec![0.0; n];
        // Share of each node's score sent along every outgoing edge
        let mut share = vec![0.0; n];

        let mut iterations = 0;
        let mut delta = f64::MAX;
        let mut cancelled = false;

        while iterations < self.max_iterations && delta >= self.threshold {
            if self.is_cancelled() {
                cancelled = true;
                break;
            }
            iterations += 1;

            let dangling_mass: f64 = graph
                .dead_ends()
                .iter()
                .map(|&d| scores[d as usize])
                .sum();
            let base = teleport + self.damping * dangling_mass / n_f;

            if parallel {
                share
                    .par_iter_mut()
                    .zip(scores.par_iter())
                    .zip(graph.out_degree.par_iter())
                    .for_each(|((s, &score), &deg)| *s = out_share(score, deg));
                new_scores
                    .par_iter_mut()
                    .enumerate()
                    .for_each(|(node, slot)| {
                        *slot = base + self.damping * inflow(graph, &share, node);
                    });
            } else {
                for ((s, &score), &deg) in share.iter_mut().zip(&scores).zip(&graph.out_degree) {
                    *s = out_share(score, deg);
                }
                for (node, slot) in new_scores.iter_mut().enumerate() {
                    *slot = base + self.damping * inflow(graph, &share, node);
                }
            }

            // Calculate convergence delta (L1 norm)
            delta = scores
                .iter()
                .zip(new_scores.iter())
                .map(|(old, new)| (old - new).abs())
                .sum();

            // Swap buffers
            std::mem::swap(&mut scores, &mut new_scores);
            observer.on_iteration(iterations, delta, &scores);
        }

        let converged =
            !cancelled && delta < self.threshold && iterations < self.max_iterations;
        PageRankResult {
            cancelled,
            ..PageRankResult::new(scores, iterations, delta, converged)
        }
    }
}

#[inline]
fn out_share(score: f64, degree: u32) -> f64 {
    if degree > 0 {
        score / degree as f64
    } else {
        0.0
    }
}

#[inline]
fn inflow(graph: &InlinkGraph, share: &[f64], node: usize) -> f64 {
    graph
        .inlinks(node as u32)
        .iter()
        .map(|&tail| share[tail as usize])
        .sum()
}
