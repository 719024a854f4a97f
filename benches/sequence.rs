//! Sequence service throughput over the memory and file stores.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use tempfile::TempDir;
use tokio::runtime::Runtime;

use pos_sequencer::config::{FileStorageConfig, SequenceConfig};
use pos_sequencer::domain::{FormattedId, SequenceClass};
use pos_sequencer::service::SequenceService;
use pos_sequencer::storage::{FileCounterStore, MemoryCounterStore};

const TENANTS: usize = 64;

fn tenants() -> Vec<String> {
    (0..TENANTS).map(|i| format!("pharmacy-{i}")).collect()
}

fn bench_format(c: &mut Criterion) {
    let sale = SequenceClass::parse("sale").unwrap();
    c.bench_function("format_id", |b| {
        b.iter(|| FormattedId::new(black_box(&sale), black_box(1_234_567)).to_string());
    });
}

fn bench_memory_store(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let service = Arc::new(SequenceService::new(
        Arc::new(MemoryCounterStore::new()),
        &SequenceConfig::default(),
    ));
    let tenants = tenants();

    c.bench_function("next_memory_store", |b| {
        b.to_async(&runtime).iter(|| {
            let service = Arc::clone(&service);
            let tenant = &tenants[rand::rng().random_range(0..TENANTS)];
            async move { black_box(service.next(tenant, "sale").await.unwrap()) }
        });
    });
}

fn bench_file_store(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let dir = TempDir::new().unwrap();
    let store = FileCounterStore::new(&FileStorageConfig {
        data_dir: dir.path().to_path_buf(),
    })
    .unwrap();
    let service = Arc::new(SequenceService::new(
        Arc::new(store),
        &SequenceConfig::default(),
    ));
    let tenants = tenants();

    c.bench_function("next_file_store", |b| {
        b.to_async(&runtime).iter(|| {
            let service = Arc::clone(&service);
            let tenant = &tenants[rand::rng().random_range(0..TENANTS)];
            async move { black_box(service.next(tenant, "sale").await.unwrap()) }
        });
    });
}

criterion_group!(benches, bench_format, bench_memory_store, bench_file_store);
criterion_main!(benches);
