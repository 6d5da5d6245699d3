use atelier_rs_store::{MemoryAdapter, PersistenceAdapter, StoreError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Memory adapter whose next writes can be scripted to fail.
///
/// Clones share the blob, the failure script and the write log, so a test can
/// keep a handle after moving the adapter into a collection.
#[derive(Clone, Default)]
pub struct FlakyAdapter {
    inner: MemoryAdapter,
    failures: Arc<Mutex<VecDeque<bool>>>,
    broken: Arc<Mutex<bool>>,
    writes: Arc<Mutex<Vec<usize>>>,
}

impl FlakyAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing memory adapter (for quotas or preloaded contents).
    pub fn wrapping(inner: MemoryAdapter) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Fail the next `count` writes.
    pub fn fail_next(&self, count: usize) {
        self.failures.lock().extend(std::iter::repeat_n(true, count));
    }

    /// Fail every write until [`FlakyAdapter::heal`] is called.
    pub fn fail_always(&self) {
        *self.broken.lock() = true;
    }

    /// Drop any scripted failures.
    pub fn heal(&self) {
        self.failures.lock().clear();
        *self.broken.lock() = false;
    }

    /// Byte sizes of every successful write, oldest first.
    pub fn writes(&self) -> Vec<usize> {
        self.writes.lock().clone()
    }

    /// Number of `store` calls that succeeded.
    pub fn write_count(&self) -> usize {
        self.writes.lock().len()
    }

    /// Currently persisted bytes.
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.inner.contents()
    }
}

impl PersistenceAdapter for FlakyAdapter {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.load()
    }

    fn store(&self, bytes: &[u8]) -> Result<(), StoreError> {
        let scripted = self.failures.lock().pop_front().unwrap_or(false);
        if scripted || *self.broken.lock() {
            return Err(StoreError::Io(std::io::Error::other("scripted write failure")));
        }
        self.inner.store(bytes)?;
        self.writes.lock().push(bytes.len());
        Ok(())
    }

    fn size_hint(&self) -> usize {
        self.inner.size_hint()
    }
}
