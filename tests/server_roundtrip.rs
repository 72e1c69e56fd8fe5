use std::io::Write;
use std::net::SocketAddr;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use rapid_pagerank::client::{submit, submit_file};
use rapid_pagerank::codec::wire::{read_response_async, RequestHeader};
use rapid_pagerank::errors::{RankError, STATUS_INPUT, STATUS_OK, STATUS_TIMEOUT};
use rapid_pagerank::server::{GraphServer, ServerConfig};
use rapid_pagerank::{RankConfig, Submission};

struct TestServer {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<rapid_pagerank::Result<()>>,
}

impl TestServer {
    async fn start(rank: RankConfig) -> Self {
        Self::start_with(ServerConfig {
            addr: "127.0.0.1:0".to_string(),
            max_workers: 2,
            solve_timeout_secs: Some(30),
            rank: RankConfig { threads: 2, ..rank },
        })
        .await
    }

    async fn start_with(config: ServerConfig) -> Self {
        let server = GraphServer::new(config).unwrap();
        let listener = server.bind().await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve(listener, async {
            let _ = stopped.await;
        }));
        Self { addr, stop, handle }
    }

    async fn shutdown(self) {
        let _ = self.stop.send(());
        self.handle.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_three_cycle_over_tcp() {
    let server = TestServer::start(RankConfig::default()).await;

    let sub = Submission::one_based(3, vec![(1, 2), (2, 3), (3, 1)]);
    let response = submit(server.addr, &sub).await.unwrap();

    assert_eq!(response.status, STATUS_OK);
    assert!(response.body.contains("Number of nodes: 3"));
    assert!(response.body.contains("Converged after"));
    assert!(response.body.contains("0.333333"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_out_of_range_arc_reported() {
    let server = TestServer::start(RankConfig::default()).await;

    let sub = Submission::one_based(3, vec![(1, 2), (2, 3), (5, 1)]);
    let body = submit(server.addr, &sub)
        .await
        .unwrap()
        .into_result()
        .unwrap();

    assert!(body.contains("Number of invalid arcs: 1"));
    assert!(body.contains("Number of valid arcs: 2"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_iteration_cap_over_tcp() {
    let server = TestServer::start(RankConfig {
        max_iterations: 1,
        ..RankConfig::default()
    })
    .await;

    let sub = Submission::one_based(3, vec![(1, 2), (2, 3), (3, 1)]);
    let body = submit(server.addr, &sub).await.unwrap().body;
    assert!(body.contains("Did not converge after 1 iterations"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_truncated_request_gets_error_status() {
    let server = TestServer::start(RankConfig::default()).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream
        .write_all(&RequestHeader { nodes: 3, arcs: 2 }.to_bytes())
        .await
        .unwrap();
    stream.write_all(&[1, 0, 0, 0, 2, 0, 0, 0]).await.unwrap();
    stream.shutdown().await.unwrap();

    let response = read_response_async(&mut stream).await.unwrap();
    assert_eq!(response.status, STATUS_INPUT);
    assert_eq!(response.body, "stream ended after 1 of 2 arcs");

    let err = response.into_result().unwrap_err();
    assert!(matches!(err, RankError::Downstream { status: STATUS_INPUT, .. }));

    server.shutdown().await;
}

#[tokio::test]
async fn test_empty_graph_is_error_response() {
    let server = TestServer::start(RankConfig::default()).await;

    let sub = Submission::one_based(2, vec![(9, 9)]);
    let response = submit(server.addr, &sub).await.unwrap();
    assert_eq!(response.status, STATUS_INPUT);
    assert!(response.body.contains("no valid arc"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_huge_node_id_is_rejected_and_server_survives() {
    let server = TestServer::start(RankConfig::default()).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    for word in [u32::MAX, 1, u32::MAX, u32::MAX] {
        stream.write_all(&word.to_le_bytes()).await.unwrap();
    }
    stream.shutdown().await.unwrap();

    let response = read_response_async(&mut stream).await.unwrap();
    assert_eq!(response.status, STATUS_INPUT);
    assert!(response.body.contains("more than the limit"));

    let sub = Submission::one_based(3, vec![(1, 2), (2, 3), (3, 1)]);
    let response = submit(server.addr, &sub).await.unwrap();
    assert_eq!(response.status, STATUS_OK);

    server.shutdown().await;
}

#[tokio::test]
async fn test_timeout_cancels_solver_and_frees_worker() {
    // One worker and a threshold that is never met, so the 3-cycle would
    // otherwise iterate far past the one second budget.
    let server = TestServer::start_with(ServerConfig {
        addr: "127.0.0.1:0".to_string(),
        max_workers: 1,
        solve_timeout_secs: Some(1),
        rank: RankConfig {
            threads: 1,
            epsilon: 0.0,
            max_iterations: 1_000_000_000,
            ..RankConfig::default()
        },
    })
    .await;

    let sub = Submission::one_based(3, vec![(1, 2), (2, 3), (3, 1)]);
    let response = submit(server.addr, &sub).await.unwrap();
    assert_eq!(response.status, STATUS_TIMEOUT);
    assert_eq!(response.body, "ranking did not finish within 1s");

    // Only reachable once the cancelled solver gave its worker back.
    let empty = Submission::one_based(2, vec![(9, 9)]);
    let response = submit(server.addr, &empty).await.unwrap();
    assert_eq!(response.status, STATUS_INPUT);

    server.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_file_submissions() {
    let server = TestServer::start(RankConfig::default()).await;

    let mut files = Vec::new();
    for n in 3..7u32 {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "%%MatrixMarket matrix coordinate pattern general").unwrap();
        writeln!(file, "{n} {n} {n}").unwrap();
        for i in 1..=n {
            writeln!(file, "{} {}", i, i % n + 1).unwrap();
        }
        files.push((n, file));
    }

    let mut tasks = Vec::new();
    for (n, file) in &files {
        let addr = server.addr;
        let path = file.path().to_path_buf();
        let n = *n;
        tasks.push(tokio::spawn(async move {
            (n, submit_file(addr, &path).await)
        }));
    }

    for task in tasks {
        let (n, response) = task.await.unwrap();
        let response = response.unwrap();
        assert_eq!(response.status, STATUS_OK);
        assert!(response.body.contains(&format!("Number of nodes: {n}")));
    }

    server.shutdown().await;
}
