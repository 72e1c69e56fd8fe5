//! Matrix Market coordinate pattern reader.
//!
//! ```text
//! %%MatrixMarket matrix coordinate pattern general
//! % comments start with a percent sign
//! 3 3 3          <- rows cols entries
//! 1 2            <- tail head, 1-based
//! 2 3
//! 3 1
//! ```
//!
//! Structural problems (bad size line, unparseable arc, wrong arc count)
//! are fatal. Ids outside `[1, rows]` are passed through untouched so the
//! graph builder can tally them as invalid.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::errors::{RankError, Result};
use crate::types::Submission;

/// The size line of a Matrix Market file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixHeader {
    pub rows: u32,
    pub cols: u32,
    pub entries: usize,
}

/// Parse the integers on a line, requiring exactly `N` of them.
fn parse_ints<const N: usize>(line: &str) -> Option<[i64; N]> {
    let mut out = [0i64; N];
    let mut fields = line.split_whitespace();
    for slot in out.iter_mut() {
        *slot = fields.next()?.parse().ok()?;
    }
    fields.next().is_none().then_some(out)
}

fn parse_header(line: &str, line_no: usize) -> Result<MatrixHeader> {
    let malformed = |reason: &str| RankError::MalformedHeader {
        line: line_no,
        reason: reason.to_string(),
    };

    let [rows, cols, entries] =
        parse_ints::<3>(line).ok_or_else(|| malformed("3 integers expected"))?;
    if rows <= 0 || cols <= 0 {
        return Err(malformed("illegal number of rows or columns"));
    }
    if entries <= 0 {
        return Err(malformed("illegal number of entries"));
    }
    if rows != cols {
        return Err(malformed("number of rows and columns must be equal"));
    }
    let rows = u32::try_from(rows).map_err(|_| malformed("too many rows"))?;
    let entries = usize::try_from(entries).map_err(|_| malformed("too many entries"))?;

    Ok(MatrixHeader {
        rows,
        cols: rows,
        entries,
    })
}

/// Read a Matrix Market graph into a 1-based [`Submission`].
pub fn read_matrix_market<R: BufRead>(reader: R) -> Result<Submission> {
    let mut header = None;
    let mut arcs = Vec::new();
    let mut line_no = 0;

    for line in reader.lines() {
        let line = line?;
        line_no += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('%') {
            continue;
        }

        match header {
            None => header = Some(parse_header(trimmed, line_no)?),
            Some(_) => {
                let [tail, head] =
                    parse_ints::<2>(trimmed).ok_or_else(|| RankError::MalformedLine {
                        line: line_no,
                        reason: "2 integers expected".to_string(),
                    })?;
                // Ids that do not fit in u32 are mapped to 0, which is out of
                // range for 1-based input and gets tallied as invalid.
                let id = |v: i64| u32::try_from(v).unwrap_or(0);
                arcs.push((id(tail), id(head)));
            }
        }
    }

    let header = header.ok_or_else(|| RankError::MalformedHeader {
        line: line_no,
        reason: "size line not found".to_string(),
    })?;
    if arcs.len() != header.entries {
        return Err(RankError::ArcCountMismatch {
            declared: header.entries,
            found: arcs.len(),
        });
    }

    Ok(Submission::one_based(header.rows, arcs))
}

/// Read a Matrix Market file from disk.
pub fn read_matrix_market_file(path: impl AsRef<Path>) -> Result<Submission> {
    let file = File::open(path.as_ref())?;
    read_matrix_market(BufReader::new(file))
}
