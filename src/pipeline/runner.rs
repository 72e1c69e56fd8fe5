//! Pipeline runner: takes a submission through build, rank and report.
//!
//! A [`Pipeline`] owns a validated [`RankConfig`] and the rayon pool sized
//! by `config.threads`. Each call to [`Pipeline::run`] is independent: the
//! graph and rank vectors live only for the duration of that call, so one
//! pipeline can be shared across concurrent submissions.

use tracing::{info, info_span, warn};

use crate::errors::{RankError, Result};
use crate::graph::builder::{build_graph_parallel, BuiltGraph, GraphBuilder};
use crate::pagerank::standard::StandardPageRank;
use crate::pagerank::{CancelToken, IterationObserver, NoopObserver, PageRankResult};
use crate::pipeline::validation::ValidationEngine;
use crate::report::RankReport;
use crate::types::{RankConfig, Submission};

/// Everything produced by one run.
#[derive(Debug, Clone)]
pub struct RankOutcome {
    pub built: BuiltGraph,
    pub result: PageRankResult,
    pub report: RankReport,
}

pub struct Pipeline {
    config: RankConfig,
    pool: rayon::ThreadPool,
}

impl Pipeline {
    /// Validate `config` and set up the worker pool.
    ///
    /// Fails with [`RankError::InvalidConfig`] if any validation rule reports
    /// an error; warnings are logged and accepted.
    pub fn new(config: RankConfig) -> Result<Self> {
        let report = ValidationEngine::with_defaults().validate(&config);
        for warning in report.warnings() {
            warn!(field = warning.field, "{}", warning.message);
        }
        if report.has_errors() {
            return Err(RankError::InvalidConfig(report));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .thread_name(|i| format!("pagerank-{i}"))
            .build()
            .map_err(|e| RankError::Io(std::io::Error::other(e)))?;

        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &RankConfig {
        &self.config
    }

    /// The solver configured from this pipeline's settings.
    pub fn solver(&self) -> StandardPageRank {
        StandardPageRank::new()
            .with_damping(self.config.damping)
            .with_threshold(self.config.epsilon)
            .with_max_iterations(self.config.max_iterations)
            .with_parallel_threshold(self.config.parallel_nodes)
    }

    /// Validate and aggregate the submitted arcs.
    ///
    /// Graphs larger than `config.max_nodes` are rejected with
    /// [`RankError::TooManyNodes`] before any per-node storage is allocated.
    pub fn build(&self, submission: &Submission) -> Result<BuiltGraph> {
        let _span = info_span!("pipeline_stage", stage = "build").entered();
        if submission.arcs.len() >= self.config.parallel_arcs {
            self.pool.install(|| {
                build_graph_parallel(
                    submission.declared_nodes,
                    submission.base,
                    &submission.arcs,
                    self.config.max_nodes,
                )
            })
        } else {
            let mut builder = GraphBuilder::with_capacity(
                submission.declared_nodes,
                submission.base,
                submission.arcs.len(),
            )
            .with_node_limit(self.config.max_nodes);
            builder.extend_arcs(submission.arcs.iter().copied());
            builder.finish()
        }
    }

    /// Run the full pipeline and keep every intermediate result.
    pub fn rank(
        &self,
        submission: &Submission,
        observer: &mut dyn IterationObserver,
    ) -> Result<RankOutcome> {
        self.rank_cancellable(submission, observer, &CancelToken::new())
    }

    /// Like [`rank`](Self::rank), but gives up with [`RankError::Cancelled`]
    /// once `cancel` fires. The token is checked after the build and before
    /// every solver iteration.
    pub fn rank_cancellable(
        &self,
        submission: &Submission,
        observer: &mut dyn IterationObserver,
        cancel: &CancelToken,
    ) -> Result<RankOutcome> {
        info!(
            declared_nodes = submission.declared_nodes,
            arcs = submission.arcs.len(),
            "ranking submission"
        );

        let built = self.build(submission)?;
        if cancel.is_cancelled() {
            return Err(RankError::Cancelled);
        }

        let result = {
            let _span = info_span!("pipeline_stage", stage = "rank").entered();
            let solver = self.solver().with_cancel(cancel.clone());
            self.pool
                .install(|| solver.run_observed(&built.graph, observer))
        };
        if result.cancelled {
            warn!(iterations = result.iterations, "ranking cancelled");
            return Err(RankError::Cancelled);
        }

        let report = RankReport::new(
            &built,
            &result,
            self.config.max_iterations,
            self.config.top_k,
        );
        info!(
            nodes = report.nodes,
            valid_arcs = report.valid_arcs,
            valid_pairs = report.valid_pairs,
            invalid_arcs = report.invalid_arcs,
            iterations = report.iterations,
            converged = report.converged,
            "ranking finished"
        );

        Ok(RankOutcome {
            built,
            result,
            report,
        })
    }

    /// Run the full pipeline and return the report.
    pub fn run(&self, submission: &Submission) -> Result<RankReport> {
        self.rank(submission, &mut NoopObserver)
            .map(|outcome| outcome.report)
    }

    /// Run the full pipeline, stopping early if `cancel` fires.
    pub fn run_cancellable(
        &self,
        submission: &Submission,
        cancel: &CancelToken,
    ) -> Result<RankReport> {
        self.rank_cancellable(submission, &mut NoopObserver, cancel)
            .map(|outcome| outcome.report)
    }
}
