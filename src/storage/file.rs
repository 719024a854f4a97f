//! File-based counter storage.
//!
//! Each counter is a JSON record guarded by its own lock file. `flock` on the
//! lock file serializes every thread and process on the host, and the record is
//! replaced by renaming a fully written temporary file over it, so a crash or
//! error before the rename leaves the previous value intact.
//!
//! Directory structure:
//! ```text
//! data/
//! └── counters/
//!     ├── {tenant}.{class}.json
//!     └── {tenant}.{class}.lock
//! ```
//!
//! Tenant and class are URL-safe base64 encoded. `.` is outside that alphabet,
//! so distinct keys can never map to the same file name.
//!
//! File locks may not work correctly on network filesystems; share counters
//! across hosts with the Redis or SQL backends instead.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use fs2::FileExt;

use crate::config::FileStorageConfig;
use crate::domain::{CounterKey, CounterRecord};
use crate::error::{StorageError, StorageResult};
use crate::storage::traits::CounterStore;

/// File-based counter store.
pub struct FileCounterStore {
    /// Base data directory.
    base_dir: PathBuf,
    /// Directory for counter records and their lock files.
    counters_dir: PathBuf,
}

impl FileCounterStore {
    /// Create a new file counter store.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directories cannot be created.
    pub fn new(config: &FileStorageConfig) -> StorageResult<Self> {
        let base_dir = config.data_dir.clone();
        let counters_dir = base_dir.join("counters");

        fs::create_dir_all(&counters_dir).map_err(|e| {
            StorageError::FileIO(format!(
                "Failed to create directory {}: {e}",
                counters_dir.display()
            ))
        })?;

        Ok(Self {
            base_dir,
            counters_dir,
        })
    }

    /// File stem for a key.
    fn stem(key: &CounterKey) -> String {
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(key.tenant.as_str()),
            URL_SAFE_NO_PAD.encode(key.class.as_str())
        )
    }

    fn paths(&self, key: &CounterKey) -> CounterPaths {
        let stem = Self::stem(key);
        CounterPaths {
            record: self.counters_dir.join(format!("{stem}.json")),
            temp: self.counters_dir.join(format!("{stem}.json.tmp")),
            lock: self.counters_dir.join(format!("{stem}.lock")),
        }
    }

    /// Run blocking file work off the async executor.
    async fn blocking<T, F>(f: F) -> StorageResult<T>
    where
        F: FnOnce() -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| StorageError::FileIO(format!("blocking task failed: {e}")))?
    }
}

/// Interval between attempts to take a contended lock before a deadline.
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(2);

/// Point in time after which an increment must not commit.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    timeout: Duration,
}

impl Deadline {
    fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
            timeout,
        }
    }

    fn expired(self) -> bool {
        Instant::now() >= self.at
    }

    fn error(self) -> StorageError {
        StorageError::timeout(self.timeout)
    }
}

/// Files backing one counter.
struct CounterPaths {
    record: PathBuf,
    temp: PathBuf,
    lock: PathBuf,
}

impl CounterPaths {
    /// Open the lock file and hold an exclusive lock on it until drop.
    ///
    /// Without a deadline this blocks until the lock is free.
    fn lock_exclusive(&self, deadline: Option<Deadline>) -> StorageResult<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock)?;

        let Some(deadline) = deadline else {
            FileExt::lock_exclusive(&file).map_err(|e| StorageError::LockFailed(e.to_string()))?;
            return Ok(file);
        };

        let contended = fs2::lock_contended_error().raw_os_error();
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => return Ok(file),
                Err(e) if e.raw_os_error() == contended => {}
                Err(e) => return Err(StorageError::LockFailed(e.to_string())),
            }
            if deadline.expired() {
                return Err(deadline.error());
            }
            thread::sleep(LOCK_RETRY_INTERVAL);
        }
    }

    fn lock_shared(&self) -> StorageResult<Option<File>> {
        let file = match File::open(&self.lock) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        FileExt::lock_shared(&file).map_err(|e| StorageError::LockFailed(e.to_string()))?;
        Ok(Some(file))
    }

    fn read(&self) -> StorageResult<Option<CounterRecord>> {
        match fs::read(&self.record) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the next record next to the live one.
    fn stage(&self, record: &CounterRecord) -> StorageResult<()> {
        let json = serde_json::to_vec_pretty(record)?;

        let mut temp = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&self.temp)?;
        temp.write_all(&json)?;
        temp.sync_all()?;
        Ok(())
    }

    /// Replace the record with the staged one. This is the commit point.
    fn commit(&self) -> StorageResult<()> {
        fs::rename(&self.temp, &self.record)?;
        Ok(())
    }
}

/// Locked read, advance, stage and commit.
///
/// Every error, a passed deadline included, is returned before `commit`, so a
/// failed call never consumes a number. The lock is released on drop.
fn increment_locked(
    paths: &CounterPaths,
    key: CounterKey,
    deadline: Option<Deadline>,
) -> StorageResult<u64> {
    let _lock = paths.lock_exclusive(deadline)?;

    let mut record = paths
        .read()?
        .unwrap_or_else(|| CounterRecord::new(key.clone()));

    if record.key != key {
        return Err(StorageError::Serialization(format!(
            "record at {} belongs to {}, expected {key}",
            paths.record.display(),
            record.key
        )));
    }

    let seq = record
        .advance()
        .ok_or_else(|| StorageError::Rejected(format!("counter {key} overflowed")))?;
    paths.stage(&record)?;

    if let Some(deadline) = deadline
        && deadline.expired()
    {
        fs::remove_file(&paths.temp).ok();
        return Err(deadline.error());
    }

    paths.commit()?;
    Ok(seq)
}

fn current_locked(paths: &CounterPaths) -> StorageResult<Option<u64>> {
    let Some(_lock) = paths.lock_shared()? else {
        return Ok(None);
    };
    Ok(paths.read()?.map(|record| record.seq))
}

fn probe_dir(dir: &Path) -> StorageResult<()> {
    let probe = dir.join(".health_check");
    fs::write(&probe, b"ok")
        .map_err(|e| StorageError::FileIO(format!("Health check failed: {e}")))?;
    fs::remove_file(&probe)
        .map_err(|e| StorageError::FileIO(format!("Health check cleanup failed: {e}")))?;
    Ok(())
}

#[async_trait]
impl CounterStore for FileCounterStore {
    async fn increment(&self, key: &CounterKey) -> StorageResult<u64> {
        let paths = self.paths(key);
        let key = key.clone();
        Self::blocking(move || increment_locked(&paths, key, None)).await
    }

    async fn increment_within(&self, key: &CounterKey, timeout: Duration) -> StorageResult<u64> {
        // The blocking task cannot be cancelled, so it enforces the deadline itself
        let deadline = Deadline::after(timeout);
        let paths = self.paths(key);
        let key = key.clone();
        Self::blocking(move || increment_locked(&paths, key, Some(deadline))).await
    }

    async fn current(&self, key: &CounterKey) -> StorageResult<Option<u64>> {
        let paths = self.paths(key);
        Self::blocking(move || current_locked(&paths)).await
    }

    async fn health_check(&self) -> StorageResult<()> {
        if !self.base_dir.exists() {
            return Err(StorageError::Unavailable);
        }
        let dir = self.counters_dir.clone();
        Self::blocking(move || probe_dir(&dir)).await
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
