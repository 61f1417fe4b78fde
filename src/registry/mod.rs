//! Board instance registry.
//!
//! Maps a generated short name and a logdir to a running application
//! instance. Two indices are kept over the same set of instances - name
//! (primary) and directory (secondary) - and are always mutated together.
//! The registry does no locking of its own; the daemon wraps it in a single
//! `RwLock` so both indices stay consistent under concurrent handlers.

pub mod error;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backend::{AppHandle, BoardBackend, CreateApplication};
use crate::config::GlobalConfig;
use crate::ingester::IngesterHandle;
use error::RegistryError;

/// One running board application bound to a single logdir and name.
#[derive(Clone)]
pub struct BoardInstance {
    /// Decimal-string name, unique in the registry ("1", "2", ...).
    pub name: String,
    /// Absolute logdir this instance serves; unique in the registry.
    pub directory: PathBuf,
    pub app: Arc<AppHandle>,
    /// Present only in the ingesting integration mode.
    pub ingester: Option<IngesterHandle>,
}

pub struct InstanceRegistry {
    backend: Arc<dyn BoardBackend>,
    /// Base directory that relative logdirs resolve against, when set.
    base_dir: Option<PathBuf>,
    default_reload_interval: u64,
    purge_orphaned_data: bool,
    by_name: HashMap<String, BoardInstance>,
    by_directory: HashMap<PathBuf, String>,
}

impl InstanceRegistry {
    pub fn new(config: &GlobalConfig, backend: Arc<dyn BoardBackend>) -> Self {
        Self {
            backend,
            base_dir: config.base_dir.clone(),
            default_reload_interval: config.reload_interval,
            purge_orphaned_data: config.purge_orphaned_data,
            by_name: HashMap::new(),
            by_directory: HashMap::new(),
        }
    }

    /// Resolve a requested logdir: relative paths are joined onto the
    /// configured base directory, absolute paths pass through unchanged.
    fn resolve_directory(&self, directory: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if directory.is_relative() => base.join(directory),
            _ => directory.to_path_buf(),
        }
    }

    /// Smallest positive integer whose decimal form is not a live name.
    /// Names freed by termination are handed out again.
    fn next_available_name(&self) -> String {
        let mut n: u64 = 1;
        loop {
            let name = n.to_string();
            if !self.by_name.contains_key(&name) {
                return name;
            }
            n += 1;
        }
    }

    /// Return the application serving `directory`, constructing it first if
    /// no instance exists for that logdir.
    ///
    /// On reuse the `reload_interval` argument is ignored: the instance
    /// keeps whatever interval it was created with. A missing or zero
    /// interval falls back to the configured default. Backend construction
    /// failures propagate unmodified and leave both indices untouched.
    pub async fn get_or_create(
        &mut self,
        directory: &Path,
        reload_interval: Option<u64>,
    ) -> Result<Arc<AppHandle>, RegistryError> {
        let directory = self.resolve_directory(directory);

        if let Some(name) = self.by_directory.get(&directory) {
            if let Some(instance) = self.by_name.get(name) {
                tracing::debug!(
                    "Reusing board instance '{}' for '{}'",
                    name,
                    directory.display()
                );
                return Ok(instance.app.clone());
            }
        }

        let reload_interval = match reload_interval {
            Some(secs) if secs > 0 => secs,
            _ => self.default_reload_interval,
        };

        let board = self
            .backend
            .create_application(CreateApplication {
                directory: directory.clone(),
                reload_interval,
                purge_orphaned_data: self.purge_orphaned_data,
            })
            .await?;

        let name = self.next_available_name();
        tracing::info!(
            "Registered board instance '{}' for '{}'",
            name,
            directory.display()
        );

        let app = board.app.clone();
        self.by_directory.insert(directory.clone(), name.clone());
        self.by_name.insert(
            name.clone(),
            BoardInstance {
                name,
                directory,
                app: board.app,
                ingester: board.ingester,
            },
        );

        Ok(app)
    }

    /// Terminate the instance registered under `name`, removing it from
    /// both indices. An ingester, if present, is signaled to stop; the
    /// signal is cooperative and this does not wait for the loop to exit.
    pub fn terminate(&mut self, name: &str, force: bool) -> Result<(), RegistryError> {
        let instance = self
            .by_name
            .remove(name)
            .ok_or_else(|| RegistryError::InstanceNotFound(name.to_string()))?;

        tracing::info!(
            "Terminating board instance '{}' for '{}' (force: {})",
            name,
            instance.directory.display(),
            force
        );
        if let Some(ingester) = &instance.ingester {
            ingester.stop();
        }
        self.by_directory.remove(&instance.directory);
        Ok(())
    }

    /// Terminate every live instance. Used on daemon shutdown.
    pub fn terminate_all(&mut self) {
        for (name, instance) in self.by_name.drain() {
            tracing::info!(
                "Terminating board instance '{}' for '{}'",
                name,
                instance.directory.display()
            );
            if let Some(ingester) = &instance.ingester {
                ingester.stop();
            }
        }
        self.by_directory.clear();
    }

    pub fn get(&self, name: &str) -> Option<&BoardInstance> {
        self.by_name.get(name)
    }

    /// Directory-index lookup; `directory` is resolved the same way
    /// `get_or_create` resolves it.
    pub fn find_by_directory(&self, directory: &Path) -> Option<&BoardInstance> {
        let resolved = self.resolve_directory(directory);
        self.by_directory
            .get(&resolved)
            .and_then(|name| self.by_name.get(name))
    }

    /// All live instances, ordered by name.
    pub fn list(&self) -> Vec<&BoardInstance> {
        let mut instances: Vec<&BoardInstance> = self.by_name.values().collect();
        instances.sort_by_key(|i| i.name.parse::<u64>().unwrap_or(u64::MAX));
        instances
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

// ─── Tests ───────────────────────────────────────────────────
