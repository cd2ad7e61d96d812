use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use dns_types::protocol::types::*;

/// A convenience wrapper around a `Cache` which lets it be shared
/// between threads.
///
/// Invoking `clone` on a `SharedCache` gives a new instance which
/// refers to the same underlying `Cache` object.
#[derive(Debug, Clone)]
pub struct SharedCache {
    cache: Arc<Mutex<Cache>>,
}

const MUTEX_POISON_MESSAGE: &str =
    "[INTERNAL ERROR] cache mutex poisoned, cannot recover from this - aborting";

impl SharedCache {
    /// Make a new, empty, shared cache.
    pub fn new() -> Self {
        SharedCache {
            cache: Arc::new(Mutex::new(Cache::new())),
        }
    }

    /// Get the cached answer to a question, if there is one and it
    /// has not expired.
    ///
    /// The TTL in the returned `ResourceRecord` is the one it was
    /// inserted with - it is not adjusted for the time spent in the
    /// cache.
    pub fn get(&self, question: &Question) -> Option<ResourceRecord> {
        self.cache
            .lock()
            .expect(MUTEX_POISON_MESSAGE)
            .get(question, Instant::now())
    }

    /// Insert an answer into the cache, replacing any previous answer
    /// to the same question.
    pub fn insert(&self, question: Question, record: ResourceRecord) {
        self.cache
            .lock()
            .expect(MUTEX_POISON_MESSAGE)
            .insert(question, record, Instant::now());
    }

    /// The number of entries in the cache, including any which have
    /// expired but not yet been looked up.
    pub fn len(&self) -> usize {
        self.cache.lock().expect(MUTEX_POISON_MESSAGE).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SharedCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Caching for answers to `Question`s.
///
/// Each question has at most one answer.  There is no size limit and
/// no background expiry: an expired entry is removed when it is next
/// looked up.
///
/// You probably want to use `SharedCache` instead.
#[derive(Debug, Clone, Default)]
pub struct Cache {
    entries: HashMap<Question, CachedRecord>,
}

/// A cached answer.
#[derive(Debug, Clone, Eq, PartialEq)]
struct CachedRecord {
    record: ResourceRecord,

    /// When this entry was inserted.  The record expires `ttl`
    /// seconds after this.
    inserted_at: Instant,
}

impl Cache {
    /// Create a new cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached answer to a question, as of `now`.
    ///
    /// If the answer has been in the cache for at least its TTL it is
    /// removed, and `None` is returned.
    pub fn get(&mut self, question: &Question, now: Instant) -> Option<ResourceRecord> {
        let entry = self.entries.get(question)?;

        if now.saturating_duration_since(entry.inserted_at) >= entry.record.ttl_duration() {
            tracing::trace!(%question, "expired");
            self.entries.remove(question);
            None
        } else {
            Some(entry.record.clone())
        }
    }

    /// Insert an answer into the cache, as of `now`.
    pub fn insert(&mut self, question: Question, record: ResourceRecord, now: Instant) {
        self.entries.insert(
            question,
            CachedRecord {
                record,
                inserted_at: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
