//! `/metrics` exposition with the Prometheus recorder installed.
//!
//! The recorder is process-global, so this file holds a single test.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;

use pos_sequencer::api::{AppState, create_router};
use pos_sequencer::config::{AppConfig, FileStorageConfig, StorageBackend, StorageConfig};
use pos_sequencer::storage::create_store;

#[tokio::test]
async fn test_metrics_count_issued_and_rejected_requests() {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install recorder");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let config = AppConfig {
        storage: StorageConfig {
            backend: StorageBackend::File,
            file: FileStorageConfig {
                data_dir: temp_dir.path().to_path_buf(),
            },
            ..Default::default()
        },
        ..Default::default()
    };
    let store = create_store(&config.storage)
        .await
        .expect("Failed to create store");
    let app = create_router(AppState::new(Arc::new(config), store).with_metrics(handle));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::new();
    let next = |body: Value| {
        client
            .post(format!("{base_url}/v1/sequence/next"))
            .json(&body)
            .send()
    };

    let response = next(json!({ "tenant_id": "pharmacy-1", "sequence_class": "sale" }))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = next(json!({ "tenant_id": "", "sequence_class": "sale" }))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let text = client
        .get(format!("{base_url}/metrics"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(text.contains("pos_sequencer_up 1"));
    assert!(text.contains(r#"pos_sequencer_issued_total{class="sale"} 1"#));
    assert!(text.contains(r#"pos_sequencer_failures_total{kind="invalid_key"} 1"#));
}
