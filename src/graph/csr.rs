//! Compressed Sparse Row (CSR) inlink graph
//!
//! Rows are indexed by head node and hold the sorted, deduplicated tails of
//! every edge entering that node. This is the layout the pull-style PageRank
//! update reads: each node sums over its own row only, so rows can be
//! computed independently.

/// An immutable directed graph stored as inlink rows.
#[derive(Debug, Clone)]
pub struct InlinkGraph {
    /// Number of nodes (1 + highest node id observed)
    pub num_nodes: usize,
    /// Row pointers: node i's inlinks are at indices row_ptr[i]..row_ptr[i+1]
    pub row_ptr: Vec<usize>,
    /// Tail node of each inlink, sorted within a row
    pub col_idx: Vec<u32>,
    /// Number of distinct outgoing edges for each node
    pub out_degree: Vec<u32>,
    /// Nodes with no outgoing edges, ascending
    pub dead_ends: Vec<u32>,
}

impl InlinkGraph {
    /// Build from zero-based `(tail, head)` edges.
    ///
    /// Self-loops and duplicate edges are dropped. Every id must be below
    /// `num_nodes`, which is at most `u32::MAX + 1`.
    pub fn from_edges(num_nodes: usize, mut edges: Vec<(u32, u32)>) -> Self {
        edges.retain(|&(tail, head)| tail != head);
        edges.sort_unstable_by_key(|&(tail, head)| (head, tail));
        edges.dedup();

        let mut row_ptr = vec![0usize; num_nodes + 1];
        let mut col_idx = Vec::with_capacity(edges.len());
        let mut out_degree = vec![0u32; num_nodes];

        for &(tail, head) in &edges {
            row_ptr[head as usize + 1] += 1;
            out_degree[tail as usize] += 1;
            col_idx.push(tail);
        }
        for i in 0..num_nodes {
            row_ptr[i + 1] += row_ptr[i];
        }

        let dead_ends = (0..num_nodes)
            .filter(|&n| out_degree[n] == 0)
            .map(|n| n as u32)
            .collect();

        Self {
            num_nodes,
            row_ptr,
            col_idx,
            out_degree,
            dead_ends,
        }
    }

    /// Tails of the edges entering `node`
    pub fn inlinks(&self, node: u32) -> &[u32] {
        let start = self.row_ptr[node as usize];
        let end = self.row_ptr[node as usize + 1];
        &self.col_idx[start..end]
    }

    /// Get the out-degree of a node
    pub fn degree(&self, node: u32) -> u32 {
        self.out_degree[node as usize]
    }

    /// Nodes with no outgoing edges
    pub fn dead_ends(&self) -> &[u32] {
        &self.dead_ends
    }

    /// Number of distinct edges
    pub fn num_edges(&self) -> usize {
        self.col_idx.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InlinkGraph {
        // 0->1, 0->2, 1->2, 2->0, plus a duplicate and a self-loop
        InlinkGraph::from_edges(4, vec![(0, 1), (0, 2), (1, 2), (2, 0), (0, 2), (3, 3)])
    }

    #[test]
    fn test_inlink_rows_sorted_and_deduplicated() {
        let g = sample();
        assert_eq!(g.inlinks(0), &[2]);
        assert_eq!(g.inlinks(1), &[0]);
        assert_eq!(g.inlinks(2), &[0, 1]);
        assert!(g.inlinks(3).is_empty());
        assert_eq!(g.num_edges(), 4);
    }

    #[test]
    fn test_out_degree_matches_inlink_rows() {
        let g = sample();
        for node in 0..g.num_nodes as u32 {
            let appearances = (0..g.num_nodes as u32)
                .map(|h| g.inlinks(h).iter().filter(|&&t| t == node).count())
                .sum::<usize>();
            assert_eq!(g.degree(node) as usize, appearances);
        }
    }

    #[test]
    fn test_dead_ends() {
        let g = sample();
        assert_eq!(g.dead_ends(), &[3]);
        assert_eq!(g.degree(3), 0);
        assert_eq!(g.degree(0), 2);
    }

    #[test]
    fn test_highest_node_listed_as_dead_end() {
        let g = InlinkGraph::from_edges(3, vec![(0, 1), (1, 0)]);
        assert_eq!(g.dead_ends(), &[2]);
        assert_eq!(g.row_ptr.len(), 4);
    }
}
