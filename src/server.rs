//! TCP ranking server.
//!
//! Each connection carries one request frame and receives one response
//! frame. Ranking runs on tokio's blocking pool, and a semaphore caps how
//! many submissions are ranked at once so a burst of large graphs cannot
//! starve the host.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::codec::wire::{read_request_async, write_response_async, Response};
use crate::errors::{RankError, Result};
use crate::pagerank::CancelToken;
use crate::pipeline::Pipeline;
use crate::report::RankReport;
use crate::types::{RankConfig, Submission};

/// Default listening address.
pub const DEFAULT_ADDR: &str = "127.0.0.1:54348";

/// Server settings, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    /// Maximum number of submissions ranked concurrently
    pub max_workers: usize,
    /// Wall-clock budget per submission, queueing for a worker included;
    /// `None` waits indefinitely
    pub solve_timeout_secs: Option<u64>,
    pub rank: RankConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            max_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            solve_timeout_secs: None,
            rank: RankConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Shared state handed to every connection task.
struct Shared {
    pipeline: Pipeline,
    workers: Arc<Semaphore>,
    timeout: Option<Duration>,
}

pub struct GraphServer {
    config: ServerConfig,
    shared: Arc<Shared>,
}

impl GraphServer {
    pub fn new(config: ServerConfig) -> Result<Self> {
        let pipeline = Pipeline::new(config.rank.clone())?;
        let shared = Shared {
            pipeline,
            workers: Arc::new(Semaphore::new(config.max_workers.max(1))),
            timeout: config.solve_timeout_secs.map(Duration::from_secs),
        };
        Ok(Self {
            config,
            shared: Arc::new(shared),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        info!(addr = %listener.local_addr()?, "server started");
        Ok(listener)
    }

    /// Accept connections until `shutdown` resolves, then wait for every
    /// in-flight connection to finish.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            info!(%peer, "accepted connection");
                            let shared = Arc::clone(&self.shared);
                            connections.spawn(handle_connection(stream, peer, shared));
                        }
                        Err(e) => warn!(error = %e, "accept failed"),
                    }
                }
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "connection task panicked");
                    }
                }
                _ = &mut shutdown => break,
            }
        }

        info!(in_flight = connections.len(), "shutting down");
        while connections.join_next().await.is_some() {}
        info!("server shutdown");
        Ok(())
    }
}

async fn handle_connection(mut stream: TcpStream, peer: SocketAddr, shared: Arc<Shared>) {
    let outcome = match read_request_async(&mut stream).await {
        Ok(submission) => {
            info!(
                %peer,
                nodes = submission.declared_nodes,
                arcs = submission.arcs.len(),
                "received graph"
            );
            rank_submission(&shared, submission).await
        }
        Err(e) => Err(e),
    };

    let response = match &outcome {
        Ok(report) => {
            info!(
                %peer,
                valid_arcs = report.valid_arcs,
                valid_pairs = report.valid_pairs,
                invalid_arcs = report.invalid_arcs,
                converged = report.converged,
                "ranking succeeded"
            );
            Response::ok(report.to_string())
        }
        Err(e) => {
            warn!(%peer, status = e.status_code(), error = %e, "ranking failed");
            Response::failure(e)
        }
    };

    if let Err(e) = write_response_async(&mut stream, &response).await {
        warn!(%peer, error = %e, "failed to send response");
        return;
    }
    if let Err(e) = stream.shutdown().await {
        warn!(%peer, error = %e, "failed to close connection");
    }
}

/// Rank one submission on the blocking pool, honoring the worker cap and
/// the optional time budget.
///
/// The budget covers the wait for a worker as well as the ranking itself.
/// When it runs out the solver is cancelled, so the worker slot frees up
/// after at most one more iteration.
async fn rank_submission(shared: &Arc<Shared>, submission: Submission) -> Result<RankReport> {
    let cancel = CancelToken::new();
    let work = run_on_worker(Arc::clone(shared), submission, cancel.clone());

    match shared.timeout {
        Some(limit) => match tokio::time::timeout(limit, work).await {
            Ok(outcome) => outcome,
            Err(_) => {
                cancel.cancel();
                Err(RankError::Timeout {
                    secs: limit.as_secs(),
                })
            }
        },
        None => work.await,
    }
}

async fn run_on_worker(
    shared: Arc<Shared>,
    submission: Submission,
    cancel: CancelToken,
) -> Result<RankReport> {
    let permit = Arc::clone(&shared.workers)
        .acquire_owned()
        .await
        .map_err(|e| RankError::Io(std::io::Error::other(e)))?;

    let task = tokio::task::spawn_blocking(move || {
        // Held until the solver returns, even if the caller stopped waiting.
        let _permit = permit;
        shared.pipeline.run_cancellable(&submission, &cancel)
    });

    task.await
        .map_err(|e| RankError::Io(std::io::Error::other(e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.addr, DEFAULT_ADDR);
        assert!(cfg.max_workers >= 1);
        assert_eq!(cfg.solve_timeout_secs, None);
    }

    #[test]
    fn test_config_from_json() {
        let cfg = ServerConfig::from_json(
            r#"{ "addr": "0.0.0.0:9000", "max_workers": 2, "rank": { "top_k": 5 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.addr, "0.0.0.0:9000");
        assert_eq!(cfg.max_workers, 2);
        assert_eq!(cfg.rank.top_k, 5);
        assert_eq!(cfg.rank.damping, 0.9);
    }

    #[test]
    fn test_invalid_rank_config_rejected() {
        let cfg = ServerConfig {
            rank: RankConfig {
                max_iterations: 0,
                ..RankConfig::default()
            },
            ..ServerConfig::default()
        };
        assert!(matches!(
            GraphServer::new(cfg),
            Err(RankError::InvalidConfig(_))
        ));
    }
}
