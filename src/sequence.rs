//! Process-global SMPP sequence number allocation.
//!
//! Valid sequence numbers are 0x00000001 to 0xFFFFFFFF. The counter lives in
//! the shared store so every session, in this process or another, hands out
//! globally monotonic values, and wraps cooperatively: allocation keeps
//! working while one allocator resets the counter.

use crate::store::KeyValueStore;
use tokio::time::Duration;
use tracing::debug;

pub const SEQUENCE_NUMBER_KEY: &str = "smpp_last_sequence_number";
pub const WRAP_LOCK_KEY: &str = "smpp_last_sequence_number_wrap";

/// Resetting starts this far below the 32-bit ceiling, leaving 0xFFFF more
/// allocations' worth of headroom while the reset is in flight.
pub const WRAP_THRESHOLD: u64 = 0xFFFF_0000;

const WRAP_LOCK_TTL: Duration = Duration::from_secs(10);

/// Allocates strictly increasing sequence numbers from the shared store,
/// restarting at 1 after a cooperative wrap reset.
#[derive(Clone, Debug)]
pub struct SequenceAllocator<K> {
    store: K,
}

impl<K: KeyValueStore> SequenceAllocator<K> {
    pub fn new(store: K) -> SequenceAllocator<K> {
        SequenceAllocator { store }
    }

    /// Next available sequence number.
    ///
    /// Once the counter crosses [`WRAP_THRESHOLD`] every allocator races to
    /// reset it; whoever wins, the value incremented here is still valid and
    /// is returned as-is.
    pub async fn next(&self) -> crate::Result<u32> {
        let seq = self.store.incr(SEQUENCE_NUMBER_KEY).await?;

        if seq >= WRAP_THRESHOLD {
            self.reset_counter().await?;
        }

        u32::try_from(seq)
            .map_err(|_| format!("sequence counter {seq} ran past the 32-bit range").into())
    }

    /// Reset the counter without two resetters clobbering values allocated
    /// in between.
    ///
    /// There is a small race left open here: if the lock expires while its
    /// holder still believes it owns it, a second reset can land between the
    /// final value check and the delete. A store-side atomic script would
    /// close it; the window is accepted as-is.
    async fn reset_counter(&self) -> crate::Result<()> {
        let locked = self.store.set_if_absent(WRAP_LOCK_KEY, 1).await?;

        // A resetter that crashed at the wrong moment leaves the lock with
        // no expiry. Re-arming the TTL from several allocators at once is
        // harmless.
        if self.store.ttl(WRAP_LOCK_KEY).await? < 0 {
            self.store.expire(WRAP_LOCK_KEY, WRAP_LOCK_TTL).await?;
        }

        if !locked {
            return Ok(());
        }

        // Another allocator may have already reset between our incr and the
        // lock acquisition.
        match self.store.get(SEQUENCE_NUMBER_KEY).await? {
            Some(current) if current >= WRAP_THRESHOLD => {}
            _ => return Ok(()),
        }

        debug!("resetting sequence counter");
        // Deleting the key lets the next incr recreate it at 1.
        self.store.del(SEQUENCE_NUMBER_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn values_are_strictly_increasing_from_one() {
        let allocator = SequenceAllocator::new(MemoryStore::new());

        let mut previous = 0;
        for _ in 0..100 {
            let seq = allocator.next().await.unwrap();
            assert!(seq > previous);
            previous = seq;
        }
        assert_eq!(previous, 100);
    }

    #[tokio::test]
    async fn allocators_on_a_shared_store_never_collide() {
        let store = MemoryStore::new();
        let a = SequenceAllocator::new(store.clone());
        let b = SequenceAllocator::new(store);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..50 {
            assert!(seen.insert(a.next().await.unwrap()));
            assert!(seen.insert(b.next().await.unwrap()));
        }
    }

    #[tokio::test]
    async fn crossing_the_threshold_resets_the_counter() {
        let store = MemoryStore::new();
        store.seed(SEQUENCE_NUMBER_KEY, WRAP_THRESHOLD - 1);
        let allocator = SequenceAllocator::new(store.clone());

        // The allocation that crosses the threshold is still handed out.
        let at_threshold = allocator.next().await.unwrap();
        assert_eq!(u64::from(at_threshold), WRAP_THRESHOLD);

        // The reset won, so the next value restarts at 1.
        assert_eq!(allocator.next().await.unwrap(), 1);
        // The reset lock stays behind with a TTL armed.
        assert!(store.ttl(WRAP_LOCK_KEY).await.unwrap() > 0);
    }

    #[tokio::test]
    async fn a_held_lock_defers_the_reset_but_not_allocation() {
        let store = MemoryStore::new();
        // Another allocator holds the wrap lock.
        store.seed(WRAP_LOCK_KEY, 1);
        store.seed(SEQUENCE_NUMBER_KEY, WRAP_THRESHOLD - 1);
        let allocator = SequenceAllocator::new(store.clone());

        assert_eq!(u64::from(allocator.next().await.unwrap()), WRAP_THRESHOLD);
        // No reset happened, so allocation continues inside the margin.
        assert_eq!(
            u64::from(allocator.next().await.unwrap()),
            WRAP_THRESHOLD + 1
        );
        // The orphaned lock had no expiry; it must have been given one so a
        // crashed resetter cannot wedge the wrap forever.
        assert!(store.ttl(WRAP_LOCK_KEY).await.unwrap() > 0);
    }

    #[tokio::test]
    async fn no_value_outside_the_valid_range_is_returned() {
        let store = MemoryStore::new();
        store.seed(SEQUENCE_NUMBER_KEY, WRAP_THRESHOLD - 2);
        let allocator = SequenceAllocator::new(store);

        for _ in 0..10 {
            let seq = allocator.next().await.unwrap();
            assert!(seq >= 1);
        }
    }
}
