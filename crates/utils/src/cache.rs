//! Time-to-live cache.

use std::{
    collections::HashMap,
    hash::Hash,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use chrono::{DateTime, TimeDelta, Utc};

/// A thread-safe map whose entries expire after a fixed time-to-live.
///
/// Expired entries are never returned; they are dropped lazily on lookup,
/// eagerly with [`TtlCache::purge_expired`], or every `n` inserts when built
/// with [`TtlCache::with_purge_every`]. The `*_at` variants take an explicit
/// "now" so expiry can be tested without sleeping.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: TimeDelta,
    purge_every: usize,
    inserts: AtomicUsize,
    entries: Mutex<HashMap<K, (V, DateTime<Utc>)>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty cache.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            purge_every: 0,
            inserts: AtomicUsize::new(0),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Purge expired entries on every `n`th insert (0 = never).
    #[must_use]
    pub fn with_purge_every(mut self, n: usize) -> Self {
        self.purge_every = n;
        self
    }

    /// Configured time-to-live.
    #[must_use]
    pub const fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, (V, DateTime<Utc>)>> {
        // Entries are replaced whole, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fresh value for `key`, if any.
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Utc::now())
    }

    /// Fresh value for `key` as of `now`.
    pub fn get_at(&self, key: &K, now: DateTime<Utc>) -> Option<V> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some((value, stored)) if now - *stored < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a value stamped with the current time.
    pub fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Utc::now());
    }

    /// Store a value stamped with `now`.
    pub fn insert_at(&self, key: K, value: V, now: DateTime<Utc>) {
        let inserted = self.inserts.fetch_add(1, Ordering::Relaxed) + 1;
        let mut entries = self.lock();
        if self.purge_every > 0 && inserted % self.purge_every == 0 {
            entries.retain(|_, (_, stored)| now - *stored < self.ttl);
        }
        entries.insert(key, (value, now));
    }

    /// Drop one entry, returning whether it was present.
    pub fn invalidate(&self, key: &K) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Drop entries expired as of `now`, returning how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, (_, stored)| now - *stored < self.ttl);
        before - entries.len()
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
