//! Graph construction and representation
//!
//! This module validates submitted arcs and stores the resulting directed
//! graph as inlink rows for the PageRank solver.

pub mod builder;
pub mod csr;
