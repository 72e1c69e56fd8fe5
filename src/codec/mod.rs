//! Input and output formats
//!
//! Graphs arrive either as Matrix Market text files or as binary request
//! frames; results leave as binary response frames.

pub mod matrix_market;
pub mod wire;
