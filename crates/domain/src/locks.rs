use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use common::AggregateId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per aggregate id.
///
/// Commands for the same aggregate queue up in arrival order; commands for
/// different aggregates never contend.
#[derive(Default)]
pub(crate) struct AggregateLocks {
    locks: Mutex<HashMap<AggregateId, Arc<AsyncMutex<()>>>>,
}

impl AggregateLocks {
    pub(crate) async fn acquire(&self, aggregate_id: &AggregateId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop entries nobody holds or waits on
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(aggregate_id.clone()).or_default())
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
