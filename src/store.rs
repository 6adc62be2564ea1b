//! Shared key-value store interface.
//!
//! Sequence numbers and the outstanding-submit ledger live in a store shared
//! by every session in the process (and, in production, by every process
//! talking to the same SMSC). The trait below is the narrow slice of
//! Redis-style atomic operations the client needs; [`MemoryStore`] is an
//! in-process implementation suitable for single-node deployments and tests.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::{Duration, Instant};

/// Atomic operations the client performs against the shared store.
///
/// Implementations must make each operation atomic with respect to other
/// holders of the same store; the sequence-wrap protocol depends on
/// `incr` and `set_if_absent` never interleaving partially.
pub trait KeyValueStore: Clone + Send + Sync + 'static {
    /// Atomically increment a counter, creating it at 1 when absent, and
    /// return the incremented value.
    fn incr(&self, key: &str) -> impl Future<Output = crate::Result<u64>> + Send;

    fn get(&self, key: &str) -> impl Future<Output = crate::Result<Option<u64>>> + Send;

    fn del(&self, key: &str) -> impl Future<Output = crate::Result<()>> + Send;

    /// Set `key` to `value` only when absent; returns whether the write
    /// happened. Usable as a lock primitive.
    fn set_if_absent(&self, key: &str, value: u64)
    -> impl Future<Output = crate::Result<bool>> + Send;

    /// Seconds until `key` expires: `-2` when the key is missing, `-1` when
    /// it carries no expiry.
    fn ttl(&self, key: &str) -> impl Future<Output = crate::Result<i64>> + Send;

    /// Arm an expiry on an existing key; returns whether the key existed.
    fn expire(
        &self,
        key: &str,
        ttl: Duration,
    ) -> impl Future<Output = crate::Result<bool>> + Send;

    /// Prepend to a list, returning the new list length.
    fn list_push_front(
        &self,
        key: &str,
        value: u64,
    ) -> impl Future<Output = crate::Result<u64>> + Send;

    fn list_pop_front(&self, key: &str)
    -> impl Future<Output = crate::Result<Option<u64>>> + Send;

    fn list_len(&self, key: &str) -> impl Future<Output = crate::Result<u64>> + Send;
}

#[derive(Debug)]
struct Entry {
    value: u64,
    expires_at: Option<Instant>,
}

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<String, Entry>,
    lists: HashMap<String, VecDeque<u64>>,
}

impl Inner {
    // Expiry is enforced lazily, on access.
    fn purge(&mut self, key: &str) {
        if let Some(entry) = self.values.get(key) {
            if entry.expires_at.is_some_and(|at| at <= Instant::now()) {
                self.values.remove(key);
            }
        }
    }
}

/// In-process [`KeyValueStore`] backed by a mutex-protected map.
///
/// Clones share the same underlying state, so several sessions built from
/// clones of one `MemoryStore` allocate from the same sequence counter.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    fn lock(&self) -> crate::Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| crate::Error::from("store mutex poisoned"))
    }

    /// Force a counter to a value, bypassing `incr`. Test seam for driving
    /// the sequence counter up to the wrap threshold.
    #[cfg(test)]
    pub(crate) fn seed(&self, key: &str, value: u64) {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.values.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: None,
            },
        );
    }
}

impl KeyValueStore for MemoryStore {
    async fn incr(&self, key: &str) -> crate::Result<u64> {
        let mut inner = self.lock()?;
        inner.purge(key);
        let entry = inner.values.entry(key.to_string()).or_insert(Entry {
            value: 0,
            expires_at: None,
        });
        entry.value += 1;
        Ok(entry.value)
    }

    async fn get(&self, key: &str) -> crate::Result<Option<u64>> {
        let mut inner = self.lock()?;
        inner.purge(key);
        Ok(inner.values.get(key).map(|entry| entry.value))
    }

    async fn del(&self, key: &str) -> crate::Result<()> {
        self.lock()?.values.remove(key);
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: u64) -> crate::Result<bool> {
        let mut inner = self.lock()?;
        inner.purge(key);
        if inner.values.contains_key(key) {
            return Ok(false);
        }
        inner.values.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: None,
            },
        );
        Ok(true)
    }

    async fn ttl(&self, key: &str) -> crate::Result<i64> {
        let mut inner = self.lock()?;
        inner.purge(key);
        Ok(match inner.values.get(key) {
            None => -2,
            Some(Entry {
                expires_at: None, ..
            }) => -1,
            Some(Entry {
                expires_at: Some(at),
                ..
            }) => at.saturating_duration_since(Instant::now()).as_secs() as i64,
        })
    }

    async fn expire(&self, key: &str, ttl: Duration) -> crate::Result<bool> {
        let mut inner = self.lock()?;
        inner.purge(key);
        match inner.values.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_push_front(&self, key: &str, value: u64) -> crate::Result<u64> {
        let mut inner = self.lock()?;
        let list = inner.lists.entry(key.to_string()).or_default();
        list.push_front(value);
        Ok(list.len() as u64)
    }

    async fn list_pop_front(&self, key: &str) -> crate::Result<Option<u64>> {
        let mut inner = self.lock()?;
        Ok(inner.lists.get_mut(key).and_then(VecDeque::pop_front))
    }

    async fn list_len(&self, key: &str) -> crate::Result<u64> {
        let inner = self.lock()?;
        Ok(inner.lists.get(key).map_or(0, |list| list.len() as u64))
    }
}
