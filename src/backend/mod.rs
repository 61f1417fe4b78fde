//! Board backend - the seam between the registry and the library that
//! actually runs embedded board applications.
//!
//! The registry only ever sees the normalized factory signature exposed by
//! [`BoardBackend`]; everything behind it (how an application loads data,
//! whether a separate ingester exists) is the backend's business.

pub mod local;

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

use crate::ingester::{DirSnapshot, IngesterHandle};

/// Parameters for constructing one application instance.
#[derive(Debug, Clone)]
pub struct CreateApplication {
    pub directory: PathBuf,
    /// Data reload interval in seconds. Already defaulted by the caller;
    /// never zero.
    pub reload_interval: u64,
    pub purge_orphaned_data: bool,
}

/// A freshly constructed application plus, in the ingesting integration
/// mode, the paired background ingester.
pub struct BoardApp {
    pub app: Arc<AppHandle>,
    pub ingester: Option<IngesterHandle>,
}

/// Factory capability the registry requires from the board library.
///
/// Construction failures are propagated to the caller unmodified; the
/// registry neither interprets nor retries them.
#[async_trait]
pub trait BoardBackend: Send + Sync {
    async fn create_application(&self, req: CreateApplication) -> Result<BoardApp>;
}

// ─── Application Handle ──────────────────────────────────────

/// Opaque handle to one running embedded board application.
///
/// Owned by the registry once created; callers get `Arc` clones. In the
/// embedded integration mode the application refreshes its own data through
/// an internal loop that is not surfaced to the registry - it is stopped
/// when the last handle clone is dropped.
#[derive(Debug)]
pub struct AppHandle {
    directory: PathBuf,
    reload_interval: u64,
    started_at: u64,
    data: Arc<RwLock<DirSnapshot>>,
    internal: Option<IngesterHandle>,
}

impl AppHandle {
    pub fn new(
        directory: PathBuf,
        reload_interval: u64,
        data: Arc<RwLock<DirSnapshot>>,
        internal: Option<IngesterHandle>,
    ) -> Self {
        Self {
            directory,
            reload_interval,
            started_at: current_timestamp(),
            data,
            internal,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The reload interval the application was constructed with.
    pub fn reload_interval(&self) -> u64 {
        self.reload_interval
    }

    pub fn uptime_seconds(&self) -> u64 {
        current_timestamp().saturating_sub(self.started_at)
    }

    /// Current view of the data files under the application's logdir.
    pub async fn snapshot(&self) -> DirSnapshot {
        self.data.read().await.clone()
    }
}

impl Drop for AppHandle {
    fn drop(&mut self) {
        if let Some(internal) = &self.internal {
            internal.stop();
        }
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
