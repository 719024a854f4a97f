//! Behavioral tests for `SequenceService` over the file store.
//!
//! Several store instances over one data directory stand in for independently
//! scaled worker processes: they share nothing but the files.

use std::collections::HashSet;
use std::sync::Arc;

use tempfile::TempDir;

use pos_sequencer::config::{FileStorageConfig, SequenceConfig};
use pos_sequencer::domain::{FormattedId, SequenceClass};
use pos_sequencer::error::SequenceError;
use pos_sequencer::service::SequenceService;
use pos_sequencer::storage::{CounterStore, FileCounterStore};

fn file_service(dir: &TempDir) -> SequenceService {
    let store = FileCounterStore::new(&FileStorageConfig {
        data_dir: dir.path().to_path_buf(),
    })
    .unwrap();
    SequenceService::new(Arc::new(store), &SequenceConfig::default())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_workers_never_duplicate() {
    let dir = TempDir::new().unwrap();
    let workers: Vec<Arc<SequenceService>> =
        (0..4).map(|_| Arc::new(file_service(&dir))).collect();

    let handles: Vec<_> = (0..400)
        .map(|i| {
            let service = Arc::clone(&workers[i % workers.len()]);
            tokio::spawn(async move { service.next("pharmacy-1", "sale").await.unwrap() })
        })
        .collect();

    let mut seqs = Vec::with_capacity(handles.len());
    let mut rendered = HashSet::new();
    for handle in handles {
        let id = handle.await.unwrap();
        assert!(rendered.insert(id.to_string()));
        seqs.push(id.seq());
    }

    // Every committed increment is observed exactly once: 1..=400 with no repeats or holes
    seqs.sort_unstable();
    assert_eq!(seqs, (1..=400).collect::<Vec<u64>>());
    assert_eq!(
        workers[0].current("pharmacy-1", "sale").await.unwrap(),
        Some(400)
    );
}

#[tokio::test]
async fn test_sequential_calls_increase_by_exactly_one() {
    let dir = TempDir::new().unwrap();
    let service = file_service(&dir);

    let mut previous = 0;
    for _ in 0..25 {
        let seq = service.next("pharmacy-1", "purchase").await.unwrap().seq();
        assert_eq!(seq, previous + 1);
        previous = seq;
    }
}

#[tokio::test]
async fn test_keys_are_isolated() {
    let dir = TempDir::new().unwrap();
    let service = file_service(&dir);

    for _ in 0..3 {
        service.next("tenant-a", "sale").await.unwrap();
    }

    assert_eq!(
        service.next("tenant-a", "purchase").await.unwrap().to_string(),
        "PUR-000001"
    );
    assert_eq!(
        service.next("tenant-b", "sale").await.unwrap().to_string(),
        "SAL-000001"
    );
    assert_eq!(
        service.next("tenant-a", "sale").await.unwrap().to_string(),
        "SAL-000004"
    );
}

#[tokio::test]
async fn test_first_use_is_one() {
    let dir = TempDir::new().unwrap();
    let service = file_service(&dir);
    assert_eq!(
        service.next("fresh-tenant", "sale").await.unwrap().to_string(),
        "SAL-000001"
    );
}

#[test]
fn test_padding() {
    let sale = SequenceClass::parse("sale").unwrap();
    assert_eq!(FormattedId::new(&sale, 42).to_string(), "SAL-000042");
    assert_eq!(FormattedId::new(&sale, 1_234_567).to_string(), "SAL-1234567");
}

#[tokio::test]
async fn test_unknown_class_falls_back_to_txn() {
    let dir = TempDir::new().unwrap();
    let service = file_service(&dir);
    let id = service.next("pharmacy-1", "refund").await.unwrap();
    assert_eq!(id.prefix(), "TXN");
    assert_eq!(id.to_string(), "TXN-000001");
}

#[tokio::test]
async fn test_counters_survive_restart() {
    let dir = TempDir::new().unwrap();
    {
        let service = file_service(&dir);
        for _ in 0..7 {
            service.next("pharmacy-1", "sale").await.unwrap();
        }
    }

    let restarted = file_service(&dir);
    assert_eq!(
        restarted.next("pharmacy-1", "sale").await.unwrap().to_string(),
        "SAL-000008"
    );
}

#[tokio::test]
async fn test_tenant_delimiters_cannot_collide() {
    let dir = TempDir::new().unwrap();
    let service = file_service(&dir);

    // Both would have rendered as "txn:a:b:sale" under naive key concatenation
    service.next("a:b", "sale").await.unwrap();
    service.next("a:b", "sale").await.unwrap();
    let id = service.next("a", "b:sale").await.unwrap();

    assert_eq!(id.to_string(), "TXN-000001");
}

#[tokio::test]
async fn test_unavailable_store_directory() {
    let dir = TempDir::new().unwrap();
    let store = FileCounterStore::new(&FileStorageConfig {
        data_dir: dir.path().to_path_buf(),
    })
    .unwrap();
    let service = SequenceService::new(Arc::new(store), &SequenceConfig::default());
    service.next("pharmacy-1", "sale").await.unwrap();

    std::fs::remove_dir_all(dir.path().join("counters")).unwrap();

    let err = service.next("pharmacy-1", "sale").await.unwrap_err();
    assert!(matches!(err, SequenceError::StoreUnavailable(_)));
}

#[tokio::test]
async fn test_store_reports_backend() {
    let dir = TempDir::new().unwrap();
    let store = FileCounterStore::new(&FileStorageConfig {
        data_dir: dir.path().to_path_buf(),
    })
    .unwrap();
    assert_eq!(store.backend_name(), "file");

    let service = SequenceService::new(Arc::new(store), &SequenceConfig::default());
    assert_eq!(service.backend_name(), "file");
}
