//! Graph builder with range validation and edge tallies
//!
//! Arcs arrive with caller-numbered ids (1-based or 0-based). Arcs with an
//! endpoint outside the declared node range are counted and dropped; every
//! other arc is kept and later collapsed into an [`InlinkGraph`].

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use tracing::debug;

use super::csr::InlinkGraph;
use crate::errors::{RankError, Result};
use crate::types::{IdBase, DEFAULT_MAX_NODES};

/// Arcs per chunk in the parallel ingest path
const PARALLEL_CHUNK: usize = 64 * 1024;

/// The finished graph together with the ingest tallies
#[derive(Debug, Clone)]
pub struct BuiltGraph {
    pub graph: InlinkGraph,
    /// Arcs whose endpoints were both in range (self-loops and duplicates included)
    pub valid_arcs: usize,
    /// Arcs dropped because an endpoint was out of range
    pub invalid_arcs: usize,
}

/// A mutable builder fed one arc at a time
#[derive(Debug)]
pub struct GraphBuilder {
    declared_nodes: u32,
    base: IdBase,
    /// Zero-based (tail, head) pairs, self-loops already removed
    edges: Vec<(u32, u32)>,
    max_id: Option<u32>,
    /// Largest `max_id + 1` that [`finish`](Self::finish) will allocate for
    node_limit: usize,
    valid_arcs: usize,
    invalid_arcs: usize,
}

impl GraphBuilder {
    /// Create a builder for a graph with `declared_nodes` nodes
    pub fn new(declared_nodes: u32, base: IdBase) -> Self {
        Self {
            declared_nodes,
            base,
            edges: Vec::new(),
            max_id: None,
            node_limit: DEFAULT_MAX_NODES,
            valid_arcs: 0,
            invalid_arcs: 0,
        }
    }

    /// Create a builder with room for `arc_capacity` arcs
    pub fn with_capacity(declared_nodes: u32, base: IdBase, arc_capacity: usize) -> Self {
        let mut builder = Self::new(declared_nodes, base);
        builder.edges.reserve(arc_capacity);
        builder
    }

    /// Refuse to build graphs with more than `limit` nodes
    pub fn with_node_limit(mut self, limit: usize) -> Self {
        self.node_limit = limit;
        self
    }

    /// Map a caller id to a zero-based node id, or `None` if out of range
    fn zero_based(&self, id: u32) -> Option<u32> {
        id.checked_sub(self.base.offset())
            .filter(|&node| node < self.declared_nodes)
    }

    /// Add one arc. Returns `false` if it was out of range and dropped.
    pub fn push_arc(&mut self, tail: u32, head: u32) -> bool {
        let (Some(tail), Some(head)) = (self.zero_based(tail), self.zero_based(head)) else {
            self.invalid_arcs += 1;
            return false;
        };

        self.valid_arcs += 1;
        self.max_id = self.max_id.max(Some(tail.max(head)));
        if tail != head {
            self.edges.push((tail, head));
        }
        true
    }

    /// Add every arc from an iterator
    pub fn extend_arcs<I>(&mut self, arcs: I)
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        for (tail, head) in arcs {
            self.push_arc(tail, head);
        }
    }

    /// Freeze the builder into an [`InlinkGraph`].
    ///
    /// Fails with [`RankError::EmptyGraph`] if no in-range arc was seen, and
    /// with [`RankError::TooManyNodes`] if the highest id exceeds the node
    /// limit. Both checks run before any per-node storage is allocated.
    pub fn finish(self) -> Result<BuiltGraph> {
        let max_id = self.max_id.ok_or(RankError::EmptyGraph)?;
        let nodes = u64::from(max_id) + 1;
        if nodes > self.node_limit as u64 {
            return Err(RankError::TooManyNodes {
                nodes,
                limit: self.node_limit,
            });
        }
        let graph = InlinkGraph::from_edges(nodes as usize, self.edges);

        debug!(
            nodes = graph.num_nodes,
            edges = graph.num_edges(),
            dead_ends = graph.dead_ends().len(),
            valid = self.valid_arcs,
            invalid = self.invalid_arcs,
            "graph built"
        );

        Ok(BuiltGraph {
            graph,
            valid_arcs: self.valid_arcs,
            invalid_arcs: self.invalid_arcs,
        })
    }
}

/// Build a graph from a slice of arcs in parallel (for large submissions)
///
/// Each chunk is validated and locally deduplicated on its own, and the
/// chunks are then merged. The result is identical to feeding every arc
/// through [`GraphBuilder::push_arc`].
pub fn build_graph_parallel(
    declared_nodes: u32,
    base: IdBase,
    arcs: &[(u32, u32)],
    node_limit: usize,
) -> Result<BuiltGraph> {
    // For small inputs, sequential is faster
    if arcs.len() < PARALLEL_CHUNK {
        let mut builder = GraphBuilder::with_capacity(declared_nodes, base, arcs.len())
            .with_node_limit(node_limit);
        builder.extend_arcs(arcs.iter().copied());
        return builder.finish();
    }

    let partials: Vec<GraphBuilder> = arcs
        .par_chunks(PARALLEL_CHUNK)
        .map(|chunk| {
            let mut partial = GraphBuilder::with_capacity(declared_nodes, base, chunk.len());
            partial.extend_arcs(chunk.iter().copied());
            let unique: FxHashSet<(u32, u32)> = partial.edges.drain(..).collect();
            partial.edges.extend(unique);
            partial
        })
        .collect();

    // Merge partial builders
    let mut merged = GraphBuilder::new(declared_nodes, base).with_node_limit(node_limit);
    for mut partial in partials {
        merged.valid_arcs += partial.valid_arcs;
        merged.invalid_arcs += partial.invalid_arcs;
        merged.max_id = merged.max_id.max(partial.max_id);
        merged.edges.append(&mut partial.edges);
    }

    merged.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagerank::standard::StandardPageRank;

    fn build(n: u32, arcs: &[(u32, u32)]) -> BuiltGraph {
        let mut builder = GraphBuilder::new(n, IdBase::One);
        builder.extend_arcs(arcs.iter().copied());
        builder.finish().unwrap()
    }

    #[test]
    fn test_one_based_ids_are_shifted() {
        let built = build(3, &[(1, 2), (2, 3), (3, 1)]);
        assert_eq!(built.graph.num_nodes, 3);
        assert_eq!(built.graph.inlinks(1), &[0]);
        assert_eq!(built.graph.inlinks(0), &[2]);
        assert_eq!(built.valid_arcs, 3);
        assert_eq!(built.invalid_arcs, 0);
    }

    #[test]
    fn test_out_of_range_arcs_are_tallied() {
        let built = build(3, &[(1, 2), (5, 1), (0, 1), (2, 4)]);
        assert_eq!(built.invalid_arcs, 3);
        assert_eq!(built.valid_arcs, 1);
        assert_eq!(built.graph.num_edges(), 1);
    }

    #[test]
    fn test_zero_based_range() {
        let mut builder = GraphBuilder::new(2, IdBase::Zero);
        assert!(builder.push_arc(0, 1));
        assert!(!builder.push_arc(2, 0));
        let built = builder.finish().unwrap();
        assert_eq!(built.graph.num_nodes, 2);
        assert_eq!(built.graph.inlinks(1), &[0]);
    }

    #[test]
    fn test_total_nodes_is_max_observed_id() {
        // Declared 10 nodes, but the highest id used is 4
        let built = build(10, &[(1, 4), (2, 3)]);
        assert_eq!(built.graph.num_nodes, 4);
    }

    #[test]
    fn test_self_loop_counts_toward_node_existence() {
        let built = build(5, &[(1, 2), (5, 5)]);
        assert_eq!(built.graph.num_nodes, 5);
        assert_eq!(built.graph.num_edges(), 1);
        assert_eq!(built.valid_arcs, 2);
        assert_eq!(built.graph.dead_ends(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_self_loop_above_max_id_adds_a_node() {
        let plain = build(5, &[(1, 2), (2, 1)]);
        let looped = build(5, &[(1, 2), (2, 1), (3, 3)]);
        assert_eq!(plain.graph.num_nodes, 2);
        assert_eq!(looped.graph.num_nodes, 3);
        assert_eq!(looped.graph.dead_ends(), &[2]);

        let plain = StandardPageRank::new().run(&plain.graph);
        let looped = StandardPageRank::new().run(&looped.graph);
        assert_eq!(plain.scores.len(), 2);
        assert_eq!(looped.scores.len(), 3);
        assert!(looped.scores[2] > 0.0);
        assert!((looped.total_mass() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_self_loops_and_duplicates_do_not_change_scores() {
        let plain = build(4, &[(1, 2), (2, 3), (3, 1), (3, 4)]);
        let noisy = build(
            4,
            &[(1, 2), (1, 1), (2, 3), (2, 3), (3, 3), (3, 1), (3, 4), (3, 4), (4, 4)],
        );
        let plain = StandardPageRank::new().run(&plain.graph);
        let noisy = StandardPageRank::new().run(&noisy.graph);
        assert_eq!(plain.iterations, noisy.iterations);
        for (a, b) in plain.scores.iter().zip(&noisy.scores) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_node_limit_rejects_huge_ids() {
        let mut builder = GraphBuilder::new(u32::MAX, IdBase::One).with_node_limit(1_000);
        assert!(builder.push_arc(u32::MAX, u32::MAX));
        match builder.finish() {
            Err(RankError::TooManyNodes { nodes, limit }) => {
                assert_eq!(nodes, u64::from(u32::MAX));
                assert_eq!(limit, 1_000);
            }
            other => panic!("expected TooManyNodes, got {other:?}"),
        }
    }

    #[test]
    fn test_node_limit_is_inclusive() {
        let mut builder = GraphBuilder::new(10, IdBase::One).with_node_limit(4);
        builder.push_arc(1, 4);
        assert_eq!(builder.finish().unwrap().graph.num_nodes, 4);

        let arcs = [(1, 5)];
        let err = build_graph_parallel(10, IdBase::One, &arcs, 4).unwrap_err();
        assert!(matches!(err, RankError::TooManyNodes { nodes: 5, limit: 4 }));
    }

    #[test]
    fn test_self_loops_do_not_change_adjacency() {
        let plain = build(3, &[(1, 2), (2, 3), (3, 1)]);
        let looped = build(3, &[(1, 2), (2, 2), (2, 3), (3, 1), (1, 1)]);
        assert_eq!(plain.graph.row_ptr, looped.graph.row_ptr);
        assert_eq!(plain.graph.col_idx, looped.graph.col_idx);
        assert_eq!(plain.graph.out_degree, looped.graph.out_degree);
    }

    #[test]
    fn test_duplicate_edges_are_collapsed() {
        let once = build(3, &[(1, 2), (2, 3)]);
        let twice = build(3, &[(1, 2), (1, 2), (2, 3)]);
        assert_eq!(once.graph.col_idx, twice.graph.col_idx);
        assert_eq!(once.graph.out_degree, twice.graph.out_degree);
        assert_eq!(twice.graph.degree(0), 1);
    }

    #[test]
    fn test_no_valid_arcs_is_empty_graph() {
        let mut builder = GraphBuilder::new(3, IdBase::One);
        builder.push_arc(7, 8);
        assert!(matches!(builder.finish(), Err(RankError::EmptyGraph)));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let n = 5_000u32;
        let arcs: Vec<(u32, u32)> = (0..(PARALLEL_CHUNK as u32 * 3))
            .map(|i| {
                let tail = (i.wrapping_mul(2_654_435_761) % (n + 3)) + 1;
                let head = (i.wrapping_mul(40_503) % n) + 1;
                (tail, head)
            })
            .collect();

        let sequential = build(n, &arcs);
        let parallel = build_graph_parallel(n, IdBase::One, &arcs, DEFAULT_MAX_NODES).unwrap();

        assert_eq!(parallel.valid_arcs, sequential.valid_arcs);
        assert_eq!(parallel.invalid_arcs, sequential.invalid_arcs);
        assert_eq!(parallel.graph.num_nodes, sequential.graph.num_nodes);
        assert_eq!(parallel.graph.row_ptr, sequential.graph.row_ptr);
        assert_eq!(parallel.graph.col_idx, sequential.graph.col_idx);
        assert_eq!(parallel.graph.out_degree, sequential.graph.out_degree);
    }
}
