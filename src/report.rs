//! Human-readable and JSON ranking reports.

use std::fmt;

use serde::Serialize;

use crate::graph::builder::BuiltGraph;
use crate::pagerank::PageRankResult;

/// One entry of the top-K list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedNode {
    /// Zero-based node id
    pub node: u32,
    pub score: f64,
}

/// Summary of one ranking run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankReport {
    pub nodes: usize,
    pub dead_ends: usize,
    /// Distinct edges kept after dropping self-loops and duplicates
    pub valid_arcs: usize,
    /// In-range arcs as submitted, self-loops and duplicates included
    pub valid_pairs: usize,
    /// Arcs dropped because an endpoint was out of range
    pub invalid_arcs: usize,
    pub iterations: usize,
    pub max_iterations: usize,
    pub delta: f64,
    pub converged: bool,
    pub rank_sum: f64,
    /// Requested K
    pub top_k: usize,
    /// Top-ranked nodes; empty when K exceeds the node count
    pub top: Vec<RankedNode>,
}

impl RankReport {
    pub fn new(
        built: &BuiltGraph,
        result: &PageRankResult,
        max_iterations: usize,
        top_k: usize,
    ) -> Self {
        let nodes = built.graph.num_nodes;
        let top = if top_k > nodes {
            Vec::new()
        } else {
            result
                .top_n(top_k)
                .into_iter()
                .map(|(node, score)| RankedNode { node, score })
                .collect()
        };

        Self {
            nodes,
            dead_ends: built.graph.dead_ends().len(),
            valid_arcs: built.graph.num_edges(),
            valid_pairs: built.valid_arcs,
            invalid_arcs: built.invalid_arcs,
            iterations: result.iterations,
            max_iterations,
            delta: result.delta,
            converged: result.converged,
            rank_sum: result.total_mass(),
            top_k,
            top,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for RankReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of nodes: {}", self.nodes)?;
        writeln!(f, "Number of dead-end nodes: {}", self.dead_ends)?;
        writeln!(f, "Number of valid arcs: {}", self.valid_arcs)?;
        writeln!(f, "Number of invalid arcs: {}", self.invalid_arcs)?;
        if self.converged {
            writeln!(f, "Converged after {} iterations", self.iterations)?;
        } else {
            writeln!(f, "Did not converge after {} iterations", self.iterations)?;
        }
        writeln!(f, "Sum of ranks: {:.4}   (should be 1)", self.rank_sum)?;
        if self.top_k > self.nodes {
            return Ok(());
        }
        writeln!(f, "Top {} nodes:", self.top_k)?;
        for entry in &self.top {
            writeln!(f, "  {} {:.6}", entry.node, entry.score)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::csr::InlinkGraph;

    fn built() -> BuiltGraph {
        BuiltGraph {
            graph: InlinkGraph::from_edges(3, vec![(0, 1), (1, 2)]),
            valid_arcs: 3,
            invalid_arcs: 1,
        }
    }

    fn result(converged: bool) -> PageRankResult {
        PageRankResult::new(vec![0.2, 0.3, 0.5], 12, 1e-8, converged)
    }

    #[test]
    fn test_text_report() {
        let report = RankReport::new(&built(), &result(true), 100, 2);
        let expected = "Number of nodes: 3\n\
                        Number of dead-end nodes: 1\n\
                        Number of valid arcs: 2\n\
                        Number of invalid arcs: 1\n\
                        Converged after 12 iterations\n\
                        Sum of ranks: 1.0000   (should be 1)\n\
                        Top 2 nodes:\n  \
                        2 0.500000\n  \
                        1 0.300000\n";
        assert_eq!(report.to_string(), expected);
    }

    #[test]
    fn test_raw_in_range_count_kept_out_of_text() {
        let report = RankReport::new(&built(), &result(true), 100, 1);
        assert_eq!(report.valid_pairs, 3);
        assert_eq!(report.valid_arcs, 2);
        let text = report.to_string();
        assert!(text.contains("Number of valid arcs: 2\n"));
        assert!(!text.contains("pairs"));
    }

    #[test]
    fn test_non_convergence_is_spelled_out() {
        let report = RankReport::new(&built(), &result(false), 12, 1);
        assert!(report
            .to_string()
            .contains("Did not converge after 12 iterations"));
        assert!(!report.to_string().contains("Converged"));
    }

    #[test]
    fn test_top_list_omitted_when_k_exceeds_nodes() {
        let report = RankReport::new(&built(), &result(true), 100, 4);
        assert!(report.top.is_empty());
        assert!(!report.to_string().contains("Top"));
    }

    #[test]
    fn test_json_report() {
        let report = RankReport::new(&built(), &result(true), 100, 1);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["nodes"], 3);
        assert_eq!(value["invalid_arcs"], 1);
        assert_eq!(value["valid_arcs"], 2);
        assert_eq!(value["valid_pairs"], 3);
        assert_eq!(value["converged"], true);
        assert_eq!(value["top"][0]["node"], 2);
    }
}
