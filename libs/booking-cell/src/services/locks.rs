use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

/// In-process serialization of booking writes per `(provider, date)`.
/// Tokio's mutex queues waiters in FIFO order, so racing bookings for the
/// same provider and day resolve first-come-first-served while bookings for
/// other providers or days proceed untouched.
#[derive(Clone, Default)]
pub struct SlotLockRegistry {
    locks: Arc<Mutex<HashMap<(Uuid, NaiveDate), Arc<AsyncMutex<()>>>>>,
}

impl SlotLockRegistry {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the mutex guarding `(provider_id, date)`, creating it on
    /// first use. Hold the returned guard across the whole re-validate +
    /// insert sequence.
    pub fn lock_for(&self, provider_id: Uuid, date: NaiveDate) -> Arc<AsyncMutex<()>> {
        // Recover the map if a previous holder panicked; the entries stay valid.
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());

        // Drop entries for past dates nobody is still holding
        let today = Utc::now().date_naive();
        locks.retain(|(_, date), lock| *date >= today || Arc::strong_count(lock) > 1);

        locks
            .entry((provider_id, date))
            .or_default()
            .clone()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_same_provider_and_date_share_a_lock() {
        let registry = SlotLockRegistry::new();
        let provider = Uuid::new_v4();
        let date = Utc::now().date_naive() + Duration::days(1);

        let first = registry.lock_for(provider, date);
        let second = registry.lock_for(provider, date);

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_different_dates_do_not_contend() {
        let registry = SlotLockRegistry::new();
        let provider = Uuid::new_v4();
        let date = Utc::now().date_naive() + Duration::days(1);

        let first = registry.lock_for(provider, date);
        let _held = first.lock().await;

        // A booking for the next day must not wait on the held lock
        let other = registry.lock_for(provider, date + Duration::days(1));
        let acquired = other.try_lock();
        assert!(acquired.is_ok());
    }

    #[tokio::test]
    async fn test_past_unheld_entries_are_pruned() {
        let registry = SlotLockRegistry::new();
        let provider = Uuid::new_v4();
        let yesterday = Utc::now().date_naive() - Duration::days(1);

        drop(registry.lock_for(provider, yesterday));
        assert_eq!(registry.len(), 1);

        // The next lookup sweeps the stale entry
        let tomorrow = Utc::now().date_naive() + Duration::days(1);
        drop(registry.lock_for(provider, tomorrow));
        assert_eq!(registry.len(), 1);
    }
}
