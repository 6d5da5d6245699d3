//! Size-capped, newest-first collection persisted through an adapter.

use crate::adapter::PersistenceAdapter;
use crate::error::StoreError;
use crate::factory::{IdStrategy, RecordFactory};
use crate::record::{Payload, Record, RecordId};
use log::{debug, error, info, warn};

/// Sentinel tag that disables tag filtering.
pub const ALL_TAGS: &str = "all";
/// Records kept when a write fails and the store shrinks before retrying.
pub const DEFAULT_DEGRADE_RETAIN: usize = 10;
/// Default maximum number of records.
pub const DEFAULT_MAX_SIZE: usize = 50;

/// Sizing and identity options for a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionOptions {
    /// Maximum number of records kept.
    pub max_size: usize,
    /// Records kept after a failed write, before the single retry.
    pub degrade_retain: usize,
    /// Record id strategy.
    pub id_strategy: IdStrategy,
}

impl CollectionOptions {
    /// Options with the given maximum size and default degrade policy.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            ..Self::default()
        }
    }

    /// Override the number of records kept on degrade.
    pub fn with_degrade_retain(mut self, degrade_retain: usize) -> Self {
        self.degrade_retain = degrade_retain;
        self
    }

    /// Override the id strategy.
    pub fn with_id_strategy(mut self, id_strategy: IdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            degrade_retain: DEFAULT_DEGRADE_RETAIN,
            id_strategy: IdStrategy::default(),
        }
    }
}

/// Outcome of the persistence step of a mutating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistStatus {
    /// The full in-memory list was written.
    Saved,
    /// Nothing changed, nothing was written.
    Unchanged,
    /// The first write failed; the list was shrunk and the retry succeeded.
    Degraded { retained: usize },
    /// Both writes failed; in-memory state is kept but not durable.
    Failed { reason: String },
}

impl PersistStatus {
    /// Whether the persisted blob matches the in-memory list.
    pub fn is_durable(&self) -> bool {
        !matches!(self, PersistStatus::Failed { .. })
    }
}

/// Result of [`BoundedCollection::add`].
#[derive(Debug, Clone)]
pub struct AddOutcome<P> {
    /// The record that was created and inserted.
    pub record: Record<P>,
    /// Persistence outcome.
    pub status: PersistStatus,
}

/// Authoritative in-memory and persisted view of one named collection.
pub struct BoundedCollection<P, A> {
    name: String,
    adapter: A,
    records: Vec<Record<P>>,
    options: CollectionOptions,
    factory: RecordFactory,
}

impl<P, A> BoundedCollection<P, A>
where
    P: Payload,
    A: PersistenceAdapter,
{
    /// Load the collection from its adapter.
    ///
    /// Missing, unreadable or malformed data yields an empty collection.
    pub fn initialize(name: impl Into<String>, adapter: A, options: CollectionOptions) -> Self {
        let name = name.into();
        let mut records = match adapter.load() {
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<Record<P>>>(&bytes) {
                Ok(records) => records,
                Err(err) => {
                    warn!(
                        "discarding malformed collection data (name={}, error={})",
                        name, err
                    );
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(
                    "failed to load collection, starting empty (name={}, error={})",
                    name, err
                );
                Vec::new()
            }
        };
        records.truncate(options.max_size);
        info!(
            "loaded collection (name={}, records={}, max_size={})",
            name,
            records.len(),
            options.max_size
        );
        Self {
            name,
            adapter,
            records,
            options,
            factory: RecordFactory::new(options.id_strategy),
        }
    }

    /// Create a record, insert it at the head, evict overflow and persist.
    ///
    /// The in-memory list is updated whatever the persistence outcome.
    pub fn add(&mut self, payload: P) -> AddOutcome<P> {
        let record = self.factory.create(payload);
        self.records.insert(0, record.clone());
        if self.records.len() > self.options.max_size {
            let evicted = self.records.len() - self.options.max_size;
            self.records.truncate(self.options.max_size);
            debug!(
                "evicted oldest records (name={}, evicted={})",
                self.name, evicted
            );
        }
        let status = self.persist(None);
        AddOutcome { record, status }
    }

    /// Remove a record by id. Absent ids are a no-op.
    pub fn delete(&mut self, id: &RecordId) -> PersistStatus {
        let Some(index) = self.records.iter().position(|record| record.id() == id) else {
            debug!("delete of absent record (name={}, id={})", self.name, id);
            return PersistStatus::Unchanged;
        };
        self.records.remove(index);
        self.persist(None)
    }

    /// Remove every record.
    pub fn clear(&mut self) -> PersistStatus {
        info!(
            "clearing collection (name={}, records={})",
            self.name,
            self.records.len()
        );
        self.records.clear();
        self.persist(None)
    }

    /// Records, newest first.
    pub fn list(&self) -> &[Record<P>] {
        &self.records
    }

    /// Iterate records, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Record<P>> {
        self.records.iter()
    }

    /// Look up a record by id.
    pub fn get(&self, id: &RecordId) -> Option<&Record<P>> {
        self.records.iter().find(|record| record.id() == id)
    }

    /// Case-insensitive substring search over the payload text and tags.
    ///
    /// An empty or absent query returns every record.
    pub fn search(&self, query: Option<&str>) -> Vec<&Record<P>> {
        let query = match query {
            Some(query) if !query.is_empty() => query.to_lowercase(),
            _ => return self.records.iter().collect(),
        };
        self.records
            .iter()
            .filter(|record| {
                record.payload().search_text().to_lowercase().contains(&query)
                    || record
                        .tags()
                        .iter()
                        .any(|tag| tag.to_lowercase().contains(&query))
            })
            .collect()
    }

    /// Records carrying exactly `tag`. `None` or [`ALL_TAGS`] returns every record.
    pub fn filter_by_tag(&self, tag: Option<&str>) -> Vec<&Record<P>> {
        match tag {
            Some(tag) if tag != ALL_TAGS => self
                .records
                .iter()
                .filter(|record| record.tags().iter().any(|candidate| candidate == tag))
                .collect(),
            _ => self.records.iter().collect(),
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum number of records.
    pub fn max_size(&self) -> usize {
        self.options.max_size
    }

    /// Options the collection was opened with.
    pub fn options(&self) -> CollectionOptions {
        self.options
    }

    /// Persisted size in bytes as reported by the adapter.
    pub fn stored_size(&self) -> usize {
        self.adapter.size_hint()
    }

    /// Backing adapter.
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Mutate one record's payload in place and persist.
    ///
    /// The modified record survives a degrade even when it is older than the
    /// newest `degrade_retain` records. Returns `None` when the id is absent.
    pub(crate) fn modify<R>(
        &mut self,
        id: &RecordId,
        f: impl FnOnce(&mut P) -> R,
    ) -> Option<(R, PersistStatus)> {
        let record = self.records.iter_mut().find(|record| record.id() == id)?;
        let result = f(record.payload_mut());
        Some((result, self.persist(Some(id))))
    }

    /// Write the list; on failure shrink to `degrade_retain` and retry once.
    fn persist(&mut self, pinned: Option<&RecordId>) -> PersistStatus {
        let err = match self.write() {
            Ok(()) => {
                debug!(
                    "stored collection (name={}, records={})",
                    self.name,
                    self.records.len()
                );
                return PersistStatus::Saved;
            }
            Err(err) => err,
        };
        warn!(
            "collection write failed, degrading (name={}, records={}, retain={}, error={})",
            self.name,
            self.records.len(),
            self.options.degrade_retain,
            err
        );
        self.degrade(pinned);
        match self.write() {
            Ok(()) => PersistStatus::Degraded {
                retained: self.records.len(),
            },
            Err(retry_err) => {
                error!(
                    "collection retry failed; records kept in memory only (name={}, records={}, error={})",
                    self.name,
                    self.records.len(),
                    retry_err
                );
                PersistStatus::Failed {
                    reason: retry_err.to_string(),
                }
            }
        }
    }

    /// Keep the newest `degrade_retain` records, trading the oldest of them
    /// for `pinned` when it would otherwise be dropped.
    fn degrade(&mut self, pinned: Option<&RecordId>) {
        let retain = self.options.degrade_retain;
        let pinned_index = pinned
            .and_then(|id| self.records.iter().position(|record| record.id() == id))
            .filter(|index| *index >= retain);
        match pinned_index {
            Some(index) => {
                let kept = self.records.remove(index);
                self.records.truncate(retain.saturating_sub(1));
                self.records.push(kept);
            }
            None => self.records.truncate(retain),
        }
    }

    fn write(&self) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(&self.records)?;
        self.adapter.store(&bytes)
    }
}
