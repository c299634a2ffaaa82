use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use jobdex::client::{Client, run_repl};
use jobdex::index::{Indexer, SkillIndex};
use jobdex::query::projector::{DEFAULT_BUDGET, DEFAULT_TRUNCATION_MARKER};
use jobdex::query::{QueryEngine, RecordProjector};
use jobdex::server::{ServeSummary, Server};

use crate::common::{JOBS, Workspace, generated_store};

struct Running {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<ServeSummary>,
}

impl Running {
    async fn client(&self) -> Client {
        Client::connect(&self.addr.to_string(), Duration::from_secs(5), 1 << 20)
            .await
            .unwrap()
    }

    async fn shutdown(self) -> ServeSummary {
        self.stop.send(()).unwrap();
        self.handle.await.unwrap()
    }
}

fn engine_for(ws: &Workspace) -> QueryEngine {
    Indexer::new(ws.store(), ws.artifact())
        .with_workers(2)
        .build()
        .unwrap();
    let index = SkillIndex::load(ws.artifact()).unwrap();
    QueryEngine::new(index, RecordProjector::new(ws.store()))
}

async fn serve(engine: QueryEngine) -> Running {
    let server = Server::bind(engine, "127.0.0.1:0", 4096).await.unwrap();
    let addr = server.local_addr().unwrap();
    let (stop, rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        server
            .serve_until(async {
                let _ = rx.await;
            })
            .await
            .unwrap()
    });
    Running { addr, stop, handle }
}

#[tokio::test]
async fn test_match_cascade_over_the_wire() {
    let ws = Workspace::new(JOBS);
    let running = serve(engine_for(&ws)).await;
    let mut client = running.client().await;

    let cases = [
        ("Java", "1,Java,Python\n3,Java,Go,Docker"),
        ("Java;Go", "3,Java,Go,Docker"),
        ("  go ; docker ", "3,Java,Go,Docker"),
        ("rust", "2,Go,Rust\n4,\"Rust\", Kubernetes"),
        ("\"Rust\"", "2,Go,Rust\n4,\"Rust\", Kubernetes"),
        ("\"rust\"", "NA"),
        ("Kubernetes;Go", "NA"),
        ("Cobol", "NA"),
        ("Java;Cobol", "NA"),
        ("", "NA"),
        (";;", "NA"),
        ("Go;Java;Docker;Nonexistent", "3,Java,Go,Docker"),
    ];
    for (query, expected) in cases {
        assert_eq!(client.query(query).await.unwrap(), expected, "query {query:?}");
    }
    drop(client);

    let summary = running.shutdown().await;
    assert_eq!(summary.connections, 1);
    assert_eq!(summary.queries, cases.len() as u64);
    assert_eq!(summary.transport_errors, 0);
}

#[tokio::test]
async fn test_large_result_is_truncated_within_budget() {
    let (content, _) = generated_store(2_000);
    let ws = Workspace::new(&content);
    let running = serve(engine_for(&ws)).await;
    let mut client = running.client().await;

    let body = client.query("all").await.unwrap();
    assert!(body.len() <= DEFAULT_BUDGET);
    assert!(body.ends_with(DEFAULT_TRUNCATION_MARKER));
    assert!(body.starts_with("0,s0,t0,all\n1,s1,t1,all\n"));
    let marker_line = body.lines().last().unwrap();
    assert_eq!(marker_line, DEFAULT_TRUNCATION_MARKER);

    drop(client);
    running.shutdown().await;
}

#[tokio::test]
async fn test_intersection_matches_brute_force() {
    let (content, offsets) = generated_store(1_000);
    let ws = Workspace::new(&content);
    let engine = engine_for(&ws);

    let expected: Vec<u64> = offsets
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 7 == 2 && i % 11 == 5)
        .map(|(_, &offset)| offset)
        .collect();
    assert!(!expected.is_empty());

    for query in ["s2;t5;all", "all;t5;s2", "t5;s2"] {
        let resolution = engine.evaluate(query).unwrap();
        assert_eq!(resolution.offsets, expected, "query {query}");
    }
    let resolution = engine.evaluate("all;t5;s2").unwrap();
    let sizes: Vec<usize> = resolution.criteria.iter().map(|c| c.len()).collect();
    assert!(sizes.windows(2).all(|w| w[0] <= w[1]));

    let running = serve(engine).await;
    let mut client = running.client().await;
    let body = client.query("s2;t5").await.unwrap();
    assert_eq!(body.lines().count(), expected.len());
    for line in body.lines() {
        let id: usize = line.split(',').next().unwrap().parse().unwrap();
        assert_eq!((id % 7, id % 11), (2, 5));
    }
    drop(client);
    running.shutdown().await;
}

#[tokio::test]
async fn test_clients_are_served_one_after_another() {
    let ws = Workspace::new(JOBS);
    let running = serve(engine_for(&ws)).await;

    for _ in 0..3 {
        let mut client = running.client().await;
        assert_eq!(client.query("Python").await.unwrap(), "1,Java,Python");
    }

    let summary = running.shutdown().await;
    assert_eq!(summary.connections, 3);
    assert_eq!(summary.queries, 3);
}

#[tokio::test]
async fn test_missing_store_at_query_time_answers_na() {
    let ws = Workspace::new(JOBS);
    let engine = engine_for(&ws);
    std::fs::remove_file(ws.store()).unwrap();

    let running = serve(engine).await;
    let mut client = running.client().await;
    assert_eq!(client.query("Java").await.unwrap(), "NA");
    // The engine keeps serving after a failed projection.
    assert_eq!(client.query("Go").await.unwrap(), "NA");
    drop(client);
    running.shutdown().await;
}

#[tokio::test]
async fn test_single_and_shared_record_scenarios() {
    let ws = Workspace::new("1,Java,Python\n2,Go\n3,Go\n");
    let running = serve(engine_for(&ws)).await;
    let mut client = running.client().await;

    assert_eq!(client.query("Java").await.unwrap(), "1,Java,Python");
    assert_eq!(client.query("Java;Python").await.unwrap(), "1,Java,Python");
    assert_eq!(client.query("Java;Go").await.unwrap(), "NA");
    assert_eq!(client.query("Go").await.unwrap(), "2,Go\n3,Go");

    drop(client);
    running.shutdown().await;
}

#[tokio::test]
async fn test_repl_survives_query_over_engine_limit() {
    let ws = Workspace::new(JOBS);
    let running = serve(engine_for(&ws)).await;
    let mut client = running.client().await.with_max_query_bytes(4096);

    let input = format!("{}\nJava\n", "x".repeat(5000));
    let mut output = Vec::new();
    let summary = run_repl(&mut client, input.as_bytes(), &mut output)
        .await
        .unwrap();

    let text = String::from_utf8(output).unwrap();
    assert_eq!(summary.queries, 1);
    assert!(text.contains("1,Java,Python\n3,Java,Go,Docker"));
    drop(client);

    let summary = running.shutdown().await;
    assert_eq!(summary.queries, 1);
    assert_eq!(summary.transport_errors, 0);
}
