//! Container-backed tests for the networked counter stores.
//!
//! These need a Docker daemon and are ignored by default:
//!
//! ```text
//! cargo test --test backends -- --ignored
//! ```

use std::sync::Arc;
use std::time::Duration;

use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

use pos_sequencer::config::{RedisStorageConfig, SqlStorageConfig};
use pos_sequencer::domain::CounterKey;
use pos_sequencer::storage::{
    CounterStore, MySqlCounterStore, PostgresCounterStore, RedisCounterStore, StorageError,
};

/// Increment one key from many tasks and check every value 1..=n shows up once.
async fn assert_atomic_increments(store: Arc<dyn CounterStore>, n: u64) {
    let key = CounterKey::parse("pharmacy:1", "sale").unwrap();
    let other = CounterKey::parse("pharmacy", "1:sale").unwrap();

    assert_eq!(store.current(&key).await.unwrap(), None);

    let handles: Vec<_> = (0..n)
        .map(|_| {
            let store = Arc::clone(&store);
            let key = key.clone();
            tokio::spawn(async move { store.increment(&key).await.unwrap() })
        })
        .collect();

    let mut values = Vec::with_capacity(handles.len());
    for handle in handles {
        values.push(handle.await.unwrap());
    }
    values.sort_unstable();

    assert_eq!(values, (1..=n).collect::<Vec<u64>>());
    assert_eq!(store.current(&key).await.unwrap(), Some(n));
    assert_eq!(store.increment(&other).await.unwrap(), 1);
}

/// Retry a connect until the containerized server accepts it.
async fn connect_with_retry<T, F, Fut>(mut connect: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StorageError>>,
{
    let mut last_error = None;
    for _ in 0..30 {
        match connect().await {
            Ok(value) => return value,
            Err(e) => last_error = Some(e),
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    panic!("server never became reachable: {last_error:?}");
}

async fn host_port(container: &ContainerAsync<GenericImage>, port: u16) -> (String, u16) {
    let host = container.get_host().await.unwrap().to_string();
    let port = container.get_host_port_ipv4(port).await.unwrap();
    (host, port)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires docker"]
async fn test_redis_store() {
    let container = GenericImage::new("redis", "7.2-alpine")
        .with_exposed_port(6379.tcp())
        .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"))
        .start()
        .await
        .unwrap();
    let (host, port) = host_port(&container, 6379).await;

    let config = RedisStorageConfig {
        url: format!("redis://{host}:{port}"),
        ..Default::default()
    };
    let store = RedisCounterStore::new(&config).unwrap();
    store.health_check().await.unwrap();

    assert_atomic_increments(Arc::new(store), 300).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires docker"]
async fn test_postgres_store() {
    let container = GenericImage::new("postgres", "16-alpine")
        .with_exposed_port(5432.tcp())
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_USER", "pos")
        .with_env_var("POSTGRES_PASSWORD", "pos")
        .with_env_var("POSTGRES_DB", "pos")
        .start()
        .await
        .unwrap();
    let (host, port) = host_port(&container, 5432).await;

    let config = SqlStorageConfig {
        url: format!("postgres://pos:pos@{host}:{port}/pos"),
        ..Default::default()
    };
    let store = connect_with_retry(|| PostgresCounterStore::connect(&config)).await;

    assert_atomic_increments(Arc::new(store), 300).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires docker"]
async fn test_mysql_store() {
    let container = GenericImage::new("mysql", "8.4")
        .with_exposed_port(3306.tcp())
        .with_wait_for(WaitFor::message_on_stderr("ready for connections"))
        .with_env_var("MYSQL_ROOT_PASSWORD", "pos")
        .with_env_var("MYSQL_DATABASE", "pos")
        .start()
        .await
        .unwrap();
    let (host, port) = host_port(&container, 3306).await;

    let config = SqlStorageConfig {
        url: format!("mysql://root:pos@{host}:{port}/pos"),
        ..Default::default()
    };
    let store = connect_with_retry(|| MySqlCounterStore::connect(&config)).await;

    assert_atomic_increments(Arc::new(store), 300).await;
}
