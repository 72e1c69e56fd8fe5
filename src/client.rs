//! TCP client for the ranking server.

use std::path::{Path, PathBuf};

use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::debug;

use crate::codec::matrix_market::read_matrix_market_file;
use crate::codec::wire::{read_response_async, write_request_async, Response};
use crate::errors::{RankError, Result};
use crate::types::Submission;

/// Send one submission and wait for the response frame.
pub async fn submit<A: ToSocketAddrs>(addr: A, submission: &Submission) -> Result<Response> {
    let mut stream = TcpStream::connect(addr).await?;
    write_request_async(&mut stream, submission).await?;
    debug!(arcs = submission.arcs.len(), "request sent");
    read_response_async(&mut stream).await
}

/// Read a Matrix Market file and submit it.
pub async fn submit_file<A: ToSocketAddrs>(addr: A, path: &Path) -> Result<Response> {
    let owned: PathBuf = path.to_path_buf();
    let submission = tokio::task::spawn_blocking(move || read_matrix_market_file(owned))
        .await
        .map_err(|e| RankError::Io(std::io::Error::other(e)))??;
    submit(addr, &submission).await
}
