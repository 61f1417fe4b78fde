//! Background data ingester - periodic logdir scanning for board instances
//!
//! Each ingester owns one tokio task that rescans an instance's logdir on a
//! fixed interval and publishes the result into the application's shared
//! snapshot. The task is only ever signaled, never awaited or aborted:
//! setting the reload interval to zero makes the loop exit on its next
//! polling cycle.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{watch, RwLock};

// ─── Snapshot ────────────────────────────────────────────────

/// The set of data files found under a logdir, keyed by path with the
/// last-seen size in bytes.
#[derive(Debug, Clone, Default)]
pub struct DirSnapshot {
    pub files: BTreeMap<PathBuf, u64>,
    /// Unix timestamp (seconds) of the scan that produced this snapshot.
    pub scanned_at: u64,
}

impl DirSnapshot {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.values().sum()
    }
}

/// Scan a logdir recursively and collect every regular file.
///
/// A missing directory is not an error: boards are routinely created before
/// the first data file lands, so it scans as empty.
pub async fn scan_directory(dir: &Path) -> std::io::Result<DirSnapshot> {
    let mut snapshot = DirSnapshot {
        files: BTreeMap::new(),
        scanned_at: current_timestamp(),
    };

    if !dir.exists() {
        return Ok(snapshot);
    }

    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                let size = entry.metadata().await?.len();
                snapshot.files.insert(entry.path(), size);
            }
        }
    }

    Ok(snapshot)
}

/// Rescan `dir` and publish the result into `data`.
///
/// With `purge` set, files that vanished since the last scan are dropped
/// from the snapshot; otherwise they are retained with their last-seen size.
/// Scan failures are logged and leave the previous snapshot in place.
pub async fn refresh(dir: &Path, data: &Arc<RwLock<DirSnapshot>>, purge: bool) {
    match scan_directory(dir).await {
        Ok(fresh) => {
            let mut guard = data.write().await;
            if purge {
                *guard = fresh;
            } else {
                for (path, size) in fresh.files {
                    guard.files.insert(path, size);
                }
                guard.scanned_at = fresh.scanned_at;
            }
        }
        Err(e) => {
            tracing::warn!("Failed to scan logdir '{}': {}", dir.display(), e);
        }
    }
}

// ─── Ingester Handle ─────────────────────────────────────────

/// Handle to a running ingester task.
///
/// Cloneable; all clones share the same reload-interval cell. Dropping the
/// handle does not stop the task - call `stop()` and let the loop observe
/// it on its next cycle.
#[derive(Clone, Debug)]
pub struct IngesterHandle {
    reload_interval: Arc<AtomicU64>,
    running_rx: watch::Receiver<bool>,
}

impl IngesterHandle {
    /// Spawn the ingestion loop for `directory`, publishing into `data`
    /// every `reload_interval` seconds.
    pub fn spawn(
        directory: PathBuf,
        data: Arc<RwLock<DirSnapshot>>,
        reload_interval: u64,
        purge: bool,
    ) -> Self {
        let interval = Arc::new(AtomicU64::new(reload_interval));
        let (running_tx, running_rx) = watch::channel(true);

        let loop_interval = interval.clone();
        tokio::spawn(async move {
            loop {
                let secs = loop_interval.load(Ordering::Relaxed);
                if secs == 0 {
                    break;
                }
                tokio::time::sleep(Duration::from_secs(secs)).await;
                // re-check after the sleep: a stop signal sent mid-cycle
                // must not trigger one more scan
                if loop_interval.load(Ordering::Relaxed) == 0 {
                    break;
                }
                refresh(&directory, &data, purge).await;
                let file_count = data.read().await.len();
                tracing::debug!(
                    "Ingester rescanned '{}': {} files",
                    directory.display(),
                    file_count
                );
            }
            tracing::info!("Ingester for '{}' stopped", directory.display());
            let _ = running_tx.send(false);
        });

        Self {
            reload_interval: interval,
            running_rx,
        }
    }

    pub fn reload_interval(&self) -> u64 {
        self.reload_interval.load(Ordering::Relaxed)
    }

    pub fn set_reload_interval(&self, secs: u64) {
        self.reload_interval.store(secs, Ordering::Relaxed);
    }

    /// Signal the ingestion loop to stop. Cooperative: the task observes the
    /// zero interval on its own polling cycle, so this returns immediately
    /// without waiting for the loop to exit.
    pub fn stop(&self) {
        self.reload_interval.store(0, Ordering::Relaxed);
    }

    /// Whether the ingestion loop is still alive.
    pub fn is_running(&self) -> bool {
        *self.running_rx.borrow()
    }

    /// Wait until the ingestion loop exits.
    #[allow(dead_code)]
    pub async fn wait_for_exit(&mut self) {
        while self.is_running() {
            if self.running_rx.changed().await.is_err() {
                break;
            }
        }
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

// ─── Tests ───────────────────────────────────────────────────
