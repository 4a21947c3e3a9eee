//! TTL cache
//!
//! Generic expiring key/value map used to avoid redundant lookups for
//! repeated resolutions. Expiry is enforced lazily on read; an expired
//! value is never observably returned. The table is guarded by an async
//! RwLock, which also makes interleaved get/put safe on multi-threaded
//! runtimes.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::trace;

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Expiring key/value map.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Install a value with a time-to-live.
    ///
    /// A zero TTL is equivalent to an immediate delete. Re-putting an
    /// existing key replaces both the value and its expiry instant, so a
    /// stale expiry can never evict a fresher value.
    pub async fn put(&self, key: K, value: V, ttl: Duration) {
        if ttl.is_zero() {
            self.delete(&key).await;
            return;
        }
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key, entry);
    }

    /// Fetch a value; absent and expired keys both return `None`.
    pub async fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // Entry was expired under the read lock; drop it now.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key) {
            if entry.is_expired(Instant::now()) {
                trace!("Evicting expired cache entry");
                entries.remove(key);
            } else {
                // Re-put raced the eviction and installed a fresh value.
                return Some(entry.value.clone());
            }
        }
        None
    }

    /// Remove a key. Returns true when something was removed.
    pub async fn delete(&self, key: &K) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Sweep all expired entries out of the table.
    pub async fn purge_expired(&self) {
        let now = Instant::now();
        self.entries
            .write()
            .await
            .retain(|_, entry| !entry.is_expired(now));
    }

    /// Number of stored entries, including not-yet-swept expired ones.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the table is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}
