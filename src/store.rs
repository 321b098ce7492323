//! Persistence of the task collection.
//!
//! Storage is whole-file: `load` reads everything, `save` overwrites
//! everything with the latest snapshot. Overlapping saves are not
//! coordinated; the last one to finish wins.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use tokio::task::spawn_blocking;

use crate::core::Snapshot;
use crate::{glog_debug, glog_error, glog_warn, Error, Result};

/// Where the task collection is kept between sessions.
pub trait Store {
    /// Read the stored snapshot. Any failure yields an empty snapshot.
    fn load(&self) -> impl Future<Output = Snapshot> + Send;

    /// Overwrite storage with `snapshot`. Returns `false` on failure; the
    /// caller decides how to tell the user.
    fn save(&self, snapshot: &Snapshot) -> impl Future<Output = bool> + Send;
}

async fn blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    spawn_blocking(f)
        .await
        .map_err(|e| Error::TaskJoin(e.to_string()))?
}

/// Pretty-printed JSON file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_sync(path: &Path) -> Result<Snapshot> {
        if !path.exists() {
            glog_debug!("Data file not found: {}", path.display());
            return Ok(Snapshot::empty());
        }
        let contents = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&contents)?;
        glog_debug!("Loaded {} tasks from {}", snapshot.tasks.len(), path.display());
        Ok(snapshot)
    }

    fn write_sync(path: &Path, contents: &str) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                glog_debug!("Creating data directory: {}", dir.display());
                fs::create_dir_all(dir)?;
            }
        }
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, contents)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }

    async fn try_save(&self, snapshot: &Snapshot) -> Result<()> {
        let contents = serde_json::to_string_pretty(snapshot)?;
        let path = self.path.clone();
        blocking(move || Self::write_sync(&path, &contents)).await
    }
}

impl Store for JsonFileStore {
    async fn load(&self) -> Snapshot {
        let path = self.path.clone();
        match blocking(move || Self::read_sync(&path)).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                glog_warn!("Could not load {}: {}", self.path.display(), e);
                Snapshot::empty()
            }
        }
    }

    async fn save(&self, snapshot: &Snapshot) -> bool {
        match self.try_save(snapshot).await {
            Ok(()) => {
                glog_debug!(
                    "Saved {} tasks to {}",
                    snapshot.tasks.len(),
                    self.path.display()
                );
                true
            }
            Err(e) => {
                glog_error!("Could not save {}: {}", self.path.display(), e);
                false
            }
        }
    }
}

/// Store kept in memory as serialized JSON. Saves can be made to fail.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Option<String>>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `snapshot` already stored.
    pub fn with_snapshot(snapshot: &Snapshot) -> Result<Self> {
        let store = Self::new();
        *store.lock() = Some(serde_json::to_string(snapshot)?);
        Ok(store)
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn raw(&self) -> Option<String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Store for MemoryStore {
    async fn load(&self) -> Snapshot {
        let raw = self.lock().clone();
        match raw {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                glog_warn!("MemoryStore holds unreadable data: {}", e);
                Snapshot::empty()
            }),
            None => Snapshot::empty(),
        }
    }

    async fn save(&self, snapshot: &Snapshot) -> bool {
        if self.fail_saves.load(Ordering::SeqCst) {
            return false;
        }
        match serde_json::to_string(snapshot) {
            Ok(json) => {
                *self.lock() = Some(json);
                self.saves.fetch_add(1, Ordering::SeqCst);
                true
            }
            Err(_) => false,
        }
    }
}
