//! Per-desk admission locks.
//!
//! Used only when [`AdmissionConfig::serialize_per_desk`] is enabled. Each
//! desk gets its own async mutex; admissions on different desks never wait
//! on each other.
//!
//! [`AdmissionConfig::serialize_per_desk`]: crate::config::AdmissionConfig::serialize_per_desk

use crate::types::DeskId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of per-desk async mutexes.
#[derive(Debug, Clone, Default)]
pub struct DeskLocks {
    locks: Arc<Mutex<HashMap<DeskId, Arc<AsyncMutex<()>>>>>,
}

impl DeskLocks {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive admission rights on the desk.
    ///
    /// The guard releases the desk when dropped.
    pub async fn acquire(&self, desk_id: DeskId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(desk_id).or_default())
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_desk_is_exclusive() {
        let locks = DeskLocks::new();
        let guard = locks.acquire(DeskId::new(1)).await;

        let second = tokio::time::timeout(Duration::from_millis(20), locks.acquire(DeskId::new(1))).await;
        assert!(second.is_err(), "second acquire should wait while the first guard lives");

        drop(guard);
        let third = tokio::time::timeout(Duration::from_millis(20), locks.acquire(DeskId::new(1))).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn test_different_desks_do_not_block() {
        let locks = DeskLocks::new();
        let _first = locks.acquire(DeskId::new(1)).await;
        let second = tokio::time::timeout(Duration::from_millis(20), locks.acquire(DeskId::new(2))).await;
        assert!(second.is_ok());
    }
}
