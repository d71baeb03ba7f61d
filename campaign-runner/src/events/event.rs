// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event definitions and their lifecycle (§3, §4.F).

use std::sync::Arc;
use std::time::Duration;

use crate::events::lock_pool::ResourceLockPool;
use crate::report::Reporter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventStatus {
    Idle,
    Waiting,
    Running,
    Success,
    Failure,
    Error,
}

/// The user-supplied half of an event: `pre_check`/`action`/`final` (§4.F). All
/// three are blocking calls run on the scheduler's worker; long-running actions
/// should be events with `background = true` instead of blocking the loop.
pub trait EventAction: Send + Sync {
    fn pre_check(&self) -> bool {
        true
    }

    fn action(&self) -> anyhow::Result<()>;

    fn finalize(&self) {}
}

/// `{name, description, arguments, resources, need_lock, background, interval,
/// loop_count}` (§3). `job` and `status` are tracked by the scheduler, not stored
/// here. `resources` names the resource(s) in the [`ResourceLockPool`] this event
/// contends over (e.g. S3's "device D") — distinct from `name`, which only
/// identifies the event itself as a lock holder.
pub struct EventDefinition {
    pub name: String,
    pub description: String,
    pub resources: Vec<String>,
    pub need_lock: bool,
    pub background: bool,
    pub action: Arc<dyn EventAction>,
}

/// Run one firing of `event`'s lifecycle: lock every resource in `event.resources`
/// (if `need_lock`) -> `pre_check` -> `action` -> always `finalize` -> unlock.
/// Exceptions from `action` are captured as `Error`, not propagated (§4.F, §7).
pub async fn fire(event: &EventDefinition, reporter: &Reporter, locks: &ResourceLockPool, lock_timeout: Duration) -> EventStatus {
    let group = reporter.add_event_group(&event.name);

    let mut locked = Vec::new();
    if event.need_lock {
        for resource in &event.resources {
            match locks.lock(resource, &event.name, lock_timeout).await {
                Ok(()) => locked.push(resource.as_str()),
                Err(err) => {
                    for held in &locked {
                        let _ = locks.release(held, &event.name);
                    }
                    reporter.add_to_group(&group, campaign_metadata::Status::Error, "lock failed", &err.to_string());
                    return EventStatus::Error;
                }
            }
        }
    }

    let status = if !event.action.pre_check() {
        reporter.add_to_group(&group, campaign_metadata::Status::Fail, "pre_check", "pre_check returned false");
        EventStatus::Failure
    } else {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| event.action.action())) {
            Ok(Ok(())) => {
                reporter.add_to_group(&group, campaign_metadata::Status::Pass, "action", "completed");
                EventStatus::Success
            }
            Ok(Err(err)) => {
                reporter.add_to_group(&group, campaign_metadata::Status::Error, "action", &err.to_string());
                EventStatus::Error
            }
            Err(_) => {
                reporter.add_to_group(&group, campaign_metadata::Status::Error, "action", "panicked");
                EventStatus::Error
            }
        }
    };

    event.action.finalize();

    for resource in &locked {
        let _ = locks.release(resource, &event.name);
    }

    status
}
