// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The exclusive named-resource lock pool (§4.F).

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use crate::errors::EngineError;

struct LockRecord {
    holder: String,
    release_signal: Arc<Notify>,
}

/// Invariant: at any moment, at most one event holds a given resource name (§8
/// property 4). Waiters are released in arrival order only to the extent
/// `tokio::sync::Notify` provides it — FIFO fairness is not a hard guarantee (§4.F).
#[derive(Default)]
pub struct ResourceLockPool {
    records: Mutex<HashMap<String, LockRecord>>,
}

impl ResourceLockPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// `lock(resource, event, timeout)`: if unlocked, acquire immediately; if locked
    /// by another event, wait on the current holder's release signal up to
    /// `timeout`, failing with `resource-is-locked` on expiry.
    pub async fn lock(&self, resource: &str, event: &str, timeout: Duration) -> Result<(), EngineError> {
        loop {
            let wait_on = {
                let mut records = self.records.lock();
                match records.get(resource) {
                    None => {
                        records.insert(
                            resource.to_string(),
                            LockRecord {
                                holder: event.to_string(),
                                release_signal: Arc::new(Notify::new()),
                            },
                        );
                        return Ok(());
                    }
                    Some(existing) => Arc::clone(&existing.release_signal),
                }
            };

            let holder = self
                .records
                .lock()
                .get(resource)
                .map(|r| r.holder.clone())
                .unwrap_or_default();

            match tokio::time::timeout(timeout, wait_on.notified()).await {
                Ok(()) => continue, // re-check; the resource may have been re-locked by another waiter
                Err(_) => {
                    return Err(EngineError::ResourceIsLocked {
                        resource: resource.to_string(),
                        holder,
                        timeout_secs: timeout.as_secs(),
                    });
                }
            }
        }
    }

    /// `release(resource, event)`: fails `invalid-lock-operation` if unlocked, or
    /// locked by a different event.
    pub fn release(&self, resource: &str, event: &str) -> Result<(), EngineError> {
        let mut records = self.records.lock();
        match records.get(resource) {
            None => Err(EngineError::InvalidLockOperation {
                resource: resource.to_string(),
                reason: "resource is not locked".to_string(),
            }),
            Some(existing) if existing.holder != event => Err(EngineError::InvalidLockOperation {
                resource: resource.to_string(),
                reason: format!("locked by `{}`, not `{event}`", existing.holder),
            }),
            Some(_) => {
                let record = records.remove(resource).expect("checked above");
                record.release_signal.notify_waiters();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_lock_waits_for_release() {
        let pool = Arc::new(ResourceLockPool::new());
        pool.lock("device-a", "event-1", Duration::from_secs(5)).await.unwrap();

        let waiter_pool = Arc::clone(&pool);
        let waiter = tokio::spawn(async move { waiter_pool.lock("device-a", "event-2", Duration::from_secs(5)).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        pool.release("device-a", "event-1").unwrap();

        let result = waiter.await.unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn lock_times_out_when_not_released() {
        let pool = ResourceLockPool::new();
        pool.lock("device-a", "event-1", Duration::from_secs(5)).await.unwrap();
        let result = pool.lock("device-a", "event-2", Duration::from_millis(20)).await;
        assert!(matches!(result, Err(EngineError::ResourceIsLocked { .. })));
    }

    #[tokio::test]
    async fn release_by_non_holder_fails() {
        let pool = ResourceLockPool::new();
        pool.lock("device-a", "event-1", Duration::from_secs(5)).await.unwrap();
        let result = pool.release("device-a", "event-2");
        assert!(matches!(result, Err(EngineError::InvalidLockOperation { .. })));
    }

    #[test]
    fn release_without_any_lock_fails() {
        let pool = ResourceLockPool::new();
        let result = pool.release("device-a", "event-1");
        assert!(matches!(result, Err(EngineError::InvalidLockOperation { .. })));
    }
}
