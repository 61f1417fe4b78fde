//! In-process board backend.
//!
//! Builds applications over a shared logdir snapshot. Which of the two
//! integration modes is used gets decided once, when the backend is
//! constructed - call sites never branch on it again.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{AppHandle, BoardApp, BoardBackend, CreateApplication};
use crate::config::IntegrationMode;
use crate::ingester::{self, DirSnapshot, IngesterHandle};

/// Integration mode after `auto` has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    Embedded,
    Ingesting,
}

pub struct LocalBackend {
    mode: BackendMode,
}

impl LocalBackend {
    /// Resolve the configured integration mode against what this backend
    /// supports. `auto` resolves to the ingesting mode, the richest one the
    /// local backend offers.
    pub fn detect(configured: IntegrationMode) -> Self {
        let mode = match configured {
            IntegrationMode::Embedded => BackendMode::Embedded,
            IntegrationMode::Ingesting => BackendMode::Ingesting,
            IntegrationMode::Auto => BackendMode::Ingesting,
        };
        tracing::info!("Board backend initialized ({:?} integration)", mode);
        Self { mode }
    }

    pub fn mode(&self) -> BackendMode {
        self.mode
    }
}

#[async_trait]
impl BoardBackend for LocalBackend {
    async fn create_application(&self, req: CreateApplication) -> Result<BoardApp> {
        let directory = &req.directory;
        if directory.exists() && !directory.is_dir() {
            anyhow::bail!("'{}' is not a directory", directory.display());
        }

        // initial load, so the application has data before the first
        // reload cycle fires
        let data = Arc::new(RwLock::new(DirSnapshot::default()));
        ingester::refresh(directory, &data, req.purge_orphaned_data).await;
        let file_count = data.read().await.len();
        tracing::info!(
            "Created board application for '{}' ({} data files, reload every {}s)",
            directory.display(),
            file_count,
            req.reload_interval
        );

        match self.mode {
            BackendMode::Ingesting => {
                let ingester = IngesterHandle::spawn(
                    directory.clone(),
                    data.clone(),
                    req.reload_interval,
                    req.purge_orphaned_data,
                );
                let app = AppHandle::new(directory.clone(), req.reload_interval, data, None);
                Ok(BoardApp {
                    app: Arc::new(app),
                    ingester: Some(ingester),
                })
            }
            BackendMode::Embedded => {
                // the application owns its refresh loop; nothing is
                // surfaced for the host to signal
                let internal = IngesterHandle::spawn(
                    directory.clone(),
                    data.clone(),
                    req.reload_interval,
                    req.purge_orphaned_data,
                );
                let app =
                    AppHandle::new(directory.clone(), req.reload_interval, data, Some(internal));
                Ok(BoardApp {
                    app: Arc::new(app),
                    ingester: None,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_auto_resolves_to_ingesting() {
        assert_eq!(
            LocalBackend::detect(IntegrationMode::Auto).mode(),
            BackendMode::Ingesting
        );
        assert_eq!(
            LocalBackend::detect(IntegrationMode::Embedded).mode(),
            BackendMode::Embedded
        );
    }

    #[tokio::test]
    async fn test_create_ingesting_surfaces_ingester() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a.log"), b"data").unwrap();

        let backend = LocalBackend::detect(IntegrationMode::Ingesting);
        let board = backend
            .create_application(CreateApplication {
                directory: tmp.path().to_path_buf(),
                reload_interval: 30,
                purge_orphaned_data: true,
            })
            .await
            .unwrap();

        assert!(board.ingester.is_some());
        assert_eq!(board.app.snapshot().await.len(), 1);
        assert_eq!(board.app.reload_interval(), 30);

        board.ingester.unwrap().stop();
    }

    #[tokio::test]
    async fn test_create_embedded_hides_ingester() {
        let tmp = TempDir::new().unwrap();

        let backend = LocalBackend::detect(IntegrationMode::Embedded);
        let board = backend
            .create_application(CreateApplication {
                directory: tmp.path().to_path_buf(),
                reload_interval: 30,
                purge_orphaned_data: true,
            })
            .await
            .unwrap();

        assert!(board.ingester.is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_non_directory() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();

        let backend = LocalBackend::detect(IntegrationMode::Auto);
        let result = backend
            .create_application(CreateApplication {
                directory: file,
                reload_interval: 30,
                purge_orphaned_data: true,
            })
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_create_missing_directory_is_empty_board() {
        let backend = LocalBackend::detect(IntegrationMode::Auto);
        let board = backend
            .create_application(CreateApplication {
                directory: PathBuf::from("/nonexistent/boardhost-test-logs"),
                reload_interval: 30,
                purge_orphaned_data: true,
            })
            .await
            .unwrap();

        assert!(board.app.snapshot().await.is_empty());
        board.ingester.unwrap().stop();
    }
}
