//! Ranking pipeline
//!
//! [`validation`] checks a [`RankConfig`](crate::types::RankConfig) before
//! any work starts; [`runner`] takes a submission through graph build,
//! PageRank and report assembly.

pub mod runner;
pub mod validation;

pub use runner::{Pipeline, RankOutcome};
