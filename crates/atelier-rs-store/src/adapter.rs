//! Persistence adapters holding one named blob per collection.

use crate::error::StoreError;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Synchronous single-slot persistence used by bounded collections.
///
/// Methods take `&self`; implementations use interior mutability. A `store`
/// call either replaces the previous blob completely or leaves it untouched.
pub trait PersistenceAdapter: Send + Sync {
    /// Read the persisted blob, `None` when nothing was stored yet.
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the persisted blob.
    fn store(&self, bytes: &[u8]) -> Result<(), StoreError>;

    /// Size of the persisted blob in bytes.
    fn size_hint(&self) -> usize {
        self.load().ok().flatten().map_or(0, |bytes| bytes.len())
    }
}

impl<A: PersistenceAdapter + ?Sized> PersistenceAdapter for Arc<A> {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).load()
    }

    fn store(&self, bytes: &[u8]) -> Result<(), StoreError> {
        (**self).store(bytes)
    }

    fn size_hint(&self) -> usize {
        (**self).size_hint()
    }
}

fn check_quota(quota: Option<usize>, needed: usize) -> Result<(), StoreError> {
    match quota {
        Some(quota) if needed > quota => Err(StoreError::QuotaExceeded { needed, quota }),
        _ => Ok(()),
    }
}

/// In-process adapter. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryAdapter {
    slot: Arc<Mutex<Option<Vec<u8>>>>,
    quota: Option<usize>,
}

impl MemoryAdapter {
    /// Create an empty adapter without a quota.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes larger than `quota` bytes.
    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Seed the slot with existing bytes.
    pub fn with_contents(self, bytes: impl Into<Vec<u8>>) -> Self {
        *self.slot.lock() = Some(bytes.into());
        self
    }

    /// Copy of the raw slot contents.
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.slot.lock().clone()
    }
}

impl PersistenceAdapter for MemoryAdapter {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.slot.lock().clone())
    }

    fn store(&self, bytes: &[u8]) -> Result<(), StoreError> {
        check_quota(self.quota, bytes.len())?;
        *self.slot.lock() = Some(bytes.to_vec());
        Ok(())
    }
}

/// File-backed adapter storing `<name>.json` under a root directory.
#[derive(Debug, Clone)]
pub struct FileAdapter {
    /// Root directory for collection files.
    root: PathBuf,
    /// Collection name used for the file stem.
    name: String,
    /// Optional byte quota per write.
    quota: Option<usize>,
}

impl FileAdapter {
    /// Create a file adapter for `name` under `root`, creating the directory.
    pub fn new(root: impl AsRef<Path>, name: impl Into<String>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        let name = name.into();
        if name.trim().is_empty() {
            return Err(StoreError::InvalidInput(
                "collection name must not be empty".to_string(),
            ));
        }
        fs::create_dir_all(&root)?;
        info!(
            "initialized file adapter (root={}, name={})",
            root.display(),
            name
        );
        Ok(Self {
            root,
            name,
            quota: None,
        })
    }

    /// Reject writes larger than `quota` bytes.
    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Path of the persisted collection file.
    pub fn path(&self) -> PathBuf {
        self.root.join(format!("{}.json", self.name))
    }

    /// Path of the temporary file used for atomic replacement.
    fn temp_path(&self) -> PathBuf {
        self.root.join(format!("{}.json.tmp", self.name))
    }
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

impl PersistenceAdapter for FileAdapter {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(path)?))
    }

    /// Write to a temp file and rename it over the collection file.
    ///
    /// The temp file is removed when any step fails.
    fn store(&self, bytes: &[u8]) -> Result<(), StoreError> {
        check_quota(self.quota, bytes.len())?;
        let temp_path = self.temp_path();
        let written = write_and_sync(&temp_path, bytes)
            .and_then(|()| fs::rename(&temp_path, self.path()));
        if let Err(err) = written {
            if let Err(cleanup) = fs::remove_file(&temp_path)
                && cleanup.kind() != std::io::ErrorKind::NotFound
            {
                warn!(
                    "failed to remove temp file (path={}, error={})",
                    temp_path.display(),
                    cleanup
                );
            }
            return Err(err.into());
        }
        debug!(
            "wrote collection file (name={}, bytes={})",
            self.name,
            bytes.len()
        );
        Ok(())
    }

    fn size_hint(&self) -> usize {
        fs::metadata(self.path()).map_or(0, |meta| meta.len() as usize)
    }
}
