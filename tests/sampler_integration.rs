//! End-to-end: sample a session, then read it back over HTTP.

use std::time::Duration;

use linkwatch::config::SamplerConfig;
use linkwatch::sampler::Sampler;
use linkwatch::server::{create_router, AppState, StatusProxy};
use linkwatch::store::{SessionDocument, SessionStore, SourceMap};
use tempfile::TempDir;
use tokio::net::TcpListener;

#[tokio::test]
async fn test_sample_then_serve_round_trip() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");

    // Test mode: three probes, no pacing, `true` standing in for ping.
    let config = SamplerConfig::new("127.0.0.1")
        .with_pings_per_file(3)
        .with_interval(Duration::ZERO)
        .with_data_dir(&data_dir)
        .with_ping_program("true");
    config.validate().unwrap();

    let mut sampler = Sampler::from_config(&config).unwrap();
    let path = sampler.run_session().await.unwrap();

    // The published document has exactly the configured session size.
    let store = SessionStore::new(&data_dir);
    let ids = store.list().unwrap();
    assert_eq!(ids.len(), 1);
    let on_disk = store.read(&ids[0]).unwrap();
    let doc: SessionDocument = serde_json::from_slice(&on_disk).unwrap();
    assert_eq!(doc.samples, vec![0, 0, 0]);
    assert!(doc.start_time <= doc.end_time);
    assert!(path.ends_with(format!("{}.json", ids[0])));

    // Serve the directory and fetch the same document back.
    let state = AppState {
        sources: SourceMap::new([("starlink".to_string(), data_dir.clone())]),
        proxy: StatusProxy::default(),
        static_root: dir.path().join("static"),
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{}/data/starlink/{}", addr, ids[0]))
        .send()
        .await
        .expect("Failed to fetch session");
    assert_eq!(resp.status(), 200);
    let body = resp.bytes().await.expect("Failed to read body");
    assert_eq!(body.as_ref(), on_disk.as_slice());
}

#[tokio::test]
async fn test_back_to_back_sessions_are_chronological() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");

    let config = SamplerConfig::new("127.0.0.1")
        .with_pings_per_file(2)
        .with_interval(Duration::ZERO)
        .with_data_dir(&data_dir)
        .with_ping_program("true");

    let mut sampler = Sampler::from_config(&config).unwrap();
    sampler.run_session().await.unwrap();
    sampler.run_session().await.unwrap();
    sampler.run_session().await.unwrap();

    let store = SessionStore::new(&data_dir);
    let ids = store.list().unwrap();
    assert_eq!(ids.len(), 3);
    assert!(ids.windows(2).all(|w| w[0] < w[1]));

    // Each document is complete and internally consistent.
    for id in &ids {
        let doc: SessionDocument = serde_json::from_slice(&store.read(id).unwrap()).unwrap();
        assert_eq!(doc.samples.len(), 2);
        assert!(doc.start_time <= doc.end_time);
        assert_eq!(doc.id(), *id);
    }
}

#[tokio::test]
async fn test_failed_probes_are_data_not_errors() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");

    // `false` stands in for a ping that always reports unreachable.
    let config = SamplerConfig::new("127.0.0.1")
        .with_pings_per_file(3)
        .with_interval(Duration::ZERO)
        .with_data_dir(&data_dir)
        .with_ping_program("false");

    let mut sampler = Sampler::from_config(&config).unwrap();
    sampler.run_session().await.unwrap();

    let store = SessionStore::new(&data_dir);
    let ids = store.list().unwrap();
    let doc: SessionDocument = serde_json::from_slice(&store.read(&ids[0]).unwrap()).unwrap();
    assert_eq!(doc.samples, vec![1, 1, 1]);
}
