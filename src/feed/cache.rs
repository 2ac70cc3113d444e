// Viewer-scoped feed cache
// One entry per viewer plus one for anonymous visitors. Only the latest
// fetch issued for a key may land. A failed fetch keeps the previous items.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::auth::Viewer;
use crate::feed::FeedItem;

/// Viewer entries kept before idle ones are evicted.
pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeedKey {
    Anonymous,
    Viewer(String),
}

impl FeedKey {
    pub fn for_viewer(viewer: Option<&Viewer>) -> Self {
        match viewer {
            Some(viewer) => FeedKey::Viewer(viewer.id.clone()),
            None => FeedKey::Anonymous,
        }
    }
}

impl fmt::Display for FeedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedKey::Anonymous => write!(f, "feed:anon"),
            FeedKey::Viewer(id) => write!(f, "feed:user:{}", id),
        }
    }
}

/// Handle for one in-flight fetch.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    key: FeedKey,
    generation: u64,
    epoch: u64,
}

/// What a reader sees for one key.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    pub items: Arc<Vec<FeedItem>>,
    pub loading: bool,
    /// Items predate the latest write (or were never fetched).
    pub stale: bool,
}

#[derive(Debug, Default)]
struct Entry {
    items: Arc<Vec<FeedItem>>,
    issued: u64,
    loading: bool,
    /// Epoch the items were fetched in; `None` until the first commit.
    fetched_epoch: Option<u64>,
    last_used: u64,
}

#[derive(Debug)]
struct Inner {
    epoch: u64,
    clock: u64,
    capacity: usize,
    entries: HashMap<FeedKey, Entry>,
}

impl Inner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Drop the least recently used idle entry other than `keep`.
    fn evict_one(&mut self, keep: &FeedKey) -> bool {
        let victim = self
            .entries
            .iter()
            .filter(|(key, entry)| *key != keep && !entry.loading)
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());

        match victim {
            Some(key) => {
                tracing::debug!(key = %key, "Evicting feed entry");
                self.entries.remove(&key);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug)]
pub struct FeedCache {
    inner: Mutex<Inner>,
}

impl Default for FeedCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl FeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                epoch: 0,
                clock: 0,
                capacity: capacity.max(1),
                entries: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items for `key` if they were fetched after the latest invalidation.
    pub fn fresh(&self, key: &FeedKey) -> Option<Arc<Vec<FeedItem>>> {
        let mut inner = self.lock();
        let now = inner.tick();
        let epoch = inner.epoch;
        let entry = inner.entries.get_mut(key)?;
        entry.last_used = now;
        (entry.fetched_epoch == Some(epoch)).then(|| entry.items.clone())
    }

    pub fn snapshot(&self, key: &FeedKey) -> FeedSnapshot {
        let inner = self.lock();
        match inner.entries.get(key) {
            Some(entry) => FeedSnapshot {
                items: entry.items.clone(),
                loading: entry.loading,
                stale: entry.fetched_epoch != Some(inner.epoch),
            },
            None => FeedSnapshot {
                stale: true,
                ..FeedSnapshot::default()
            },
        }
    }

    /// Start a fetch for `key`, superseding any fetch already in flight.
    /// A new key past capacity evicts the least recently used idle entry.
    pub fn begin(&self, key: &FeedKey) -> FetchTicket {
        let mut inner = self.lock();
        if !inner.entries.contains_key(key) && inner.entries.len() >= inner.capacity {
            inner.evict_one(key);
        }

        let now = inner.tick();
        let epoch = inner.epoch;
        let entry = inner.entries.entry(key.clone()).or_default();
        entry.issued += 1;
        entry.loading = true;
        entry.last_used = now;

        tracing::debug!(key = %key, generation = entry.issued, "Feed fetch started");
        FetchTicket {
            key: key.clone(),
            generation: entry.issued,
            epoch,
        }
    }

    /// Store the result of a fetch. Returns false (and drops the items) when a
    /// newer fetch for the same key has been started since, or the entry was
    /// evicted.
    pub fn commit(&self, ticket: FetchTicket, items: Vec<FeedItem>) -> bool {
        let mut inner = self.lock();
        let Some(entry) = inner.entries.get_mut(&ticket.key) else {
            return false;
        };

        if entry.issued != ticket.generation {
            tracing::warn!(
                key = %ticket.key,
                generation = ticket.generation,
                latest = entry.issued,
                "Discarding superseded feed fetch"
            );
            return false;
        }

        entry.items = Arc::new(items);
        entry.loading = false;
        entry.fetched_epoch = Some(ticket.epoch);
        true
    }

    /// Record a failed fetch. Previous items stay in place.
    pub fn fail(&self, ticket: FetchTicket) {
        let mut inner = self.lock();
        if let Some(entry) = inner.entries.get_mut(&ticket.key) {
            if entry.issued == ticket.generation {
                entry.loading = false;
            }
        }
    }

    /// Mark every entry stale and drop idle entries of other viewers. The
    /// actor's entry and the anonymous one keep their (stale) items; in-flight
    /// fetches still land, but stay stale.
    pub fn invalidate_all(&self, actor: &FeedKey) {
        let mut inner = self.lock();
        inner.epoch += 1;

        let before = inner.entries.len();
        inner.entries.retain(|key, entry| {
            key == actor || *key == FeedKey::Anonymous || entry.loading
        });

        tracing::debug!(
            epoch = inner.epoch,
            dropped = before - inner.entries.len(),
            kept = inner.entries.len(),
            "Feed cache invalidated"
        );
    }
}
