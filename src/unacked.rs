//! Bookkeeping for submits awaiting their submit_sm_resp.
//!
//! The ledger is a shared list keyed by [`UNACKED_KEY`]: one push per
//! submit_sm sent, one pop per submit_sm_resp received. Both ends work the
//! front of the list, so the pop order is most-recent-first; the ledger
//! tracks depth, not request/response correlation.

use crate::store::KeyValueStore;
use tracing::debug;

pub const UNACKED_KEY: &str = "unacked";

#[derive(Clone, Debug)]
pub struct UnackedLedger<K> {
    store: K,
}

impl<K: KeyValueStore> UnackedLedger<K> {
    pub fn new(store: K) -> UnackedLedger<K> {
        UnackedLedger { store }
    }

    /// Record a sequence number as awaiting its response.
    pub async fn push(&self, sequence_number: u32) -> crate::Result<()> {
        let depth = self
            .store
            .list_push_front(UNACKED_KEY, u64::from(sequence_number))
            .await?;
        debug!(sequence_number, depth, "unacked pushed");
        Ok(())
    }

    /// Retire one outstanding entry.
    pub async fn pop(&self) -> crate::Result<Option<u32>> {
        let popped = self.store.list_pop_front(UNACKED_KEY).await?;
        let depth = self.store.list_len(UNACKED_KEY).await?;
        debug!(depth, "unacked popped");
        Ok(popped.map(|value| value as u32))
    }

    /// Number of submits still awaiting a response.
    pub async fn len(&self) -> crate::Result<u64> {
        self.store.list_len(UNACKED_KEY).await
    }
}
