// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The time-driven event scheduler: a sorted heap plus a single async loop task,
//! rather than a general cron library, to keep loop-count semantics explicit (§4.F,
//! §9 design notes).

use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

use super::event::{EventDefinition, fire};
use super::lock_pool::ResourceLockPool;
use crate::report::Reporter;

/// `date`: fire once at a wall-clock instant. `interval`: fire every `period`
/// starting at `first` (§4.F).
#[derive(Clone, Copy, Debug)]
pub enum Trigger {
    Date(Instant),
    Interval { first: Instant, period: Duration },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct JobId(u64);

struct Job {
    id: JobId,
    fire_at: Instant,
    event: Arc<EventDefinition>,
    /// `Some(period)` for a recurring (interval-triggered, typically background)
    /// job; re-arms unconditionally after every fire.
    recurring_period: Option<Duration>,
    /// Remaining one-shot re-fires for a `Date`-triggered job whose event declared
    /// `loop_count > 1`; decremented each time, rescheduled at `fire_at + period`.
    remaining_loops: Option<(u32, Duration)>,
}

impl PartialEq for Job {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at
    }
}
impl Eq for Job {}
impl PartialOrd for Job {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Job {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) pops the earliest `fire_at` first.
        other.fire_at.cmp(&self.fire_at)
    }
}

/// A blocking time-driven executor over `date`/`interval` triggers (§4.F).
pub struct EventScheduler {
    queue: Arc<Mutex<BinaryHeap<Job>>>,
    wake: Arc<Notify>,
    next_id: AtomicU64,
    reporter: Arc<Reporter>,
    locks: Arc<ResourceLockPool>,
    lock_timeout: Duration,
    loop_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl EventScheduler {
    pub fn new(reporter: Arc<Reporter>, locks: Arc<ResourceLockPool>, lock_timeout: Duration) -> Arc<Self> {
        let scheduler = Arc::new(Self {
            queue: Arc::new(Mutex::new(BinaryHeap::new())),
            wake: Arc::new(Notify::new()),
            next_id: AtomicU64::new(0),
            reporter,
            locks,
            lock_timeout,
            loop_handle: Mutex::new(None),
        });
        scheduler.spawn_loop();
        scheduler
    }

    fn spawn_loop(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move { this.run_loop().await });
        *self.loop_handle.lock() = Some(handle);
    }

    async fn run_loop(self: Arc<Self>) {
        loop {
            let next_fire_at = self.queue.lock().peek().map(|job| job.fire_at);
            match next_fire_at {
                None => self.wake.notified().await,
                Some(fire_at) => {
                    tokio::select! {
                        _ = tokio::time::sleep_until(fire_at) => {
                            self.fire_due_jobs().await;
                        }
                        _ = self.wake.notified() => {}
                    }
                }
            }
        }
    }

    async fn fire_due_jobs(self: &Arc<Self>) {
        let now = Instant::now();
        let due: Vec<Job> = {
            let mut queue = self.queue.lock();
            let mut due = Vec::new();
            while matches!(queue.peek(), Some(job) if job.fire_at <= now) {
                due.push(queue.pop().expect("peeked Some above"));
            }
            due
        };
        for job in due {
            self.dispatch(job);
        }
    }

    fn dispatch(self: &Arc<Self>, job: Job) {
        let this = Arc::clone(self);
        let event = Arc::clone(&job.event);
        let recurring_period = job.recurring_period;
        let remaining_loops = job.remaining_loops;
        let fire_at = job.fire_at;
        let id = job.id;

        tokio::spawn(async move {
            fire(&event, &this.reporter, &this.locks, this.lock_timeout).await;

            if let Some(period) = recurring_period {
                this.enqueue_job(Job {
                    id,
                    fire_at: fire_at + period,
                    event,
                    recurring_period: Some(period),
                    remaining_loops: None,
                });
            } else if let Some((count, period)) = remaining_loops {
                if count > 1 {
                    this.enqueue_job(Job {
                        id,
                        fire_at: fire_at + period,
                        event,
                        recurring_period: None,
                        remaining_loops: Some((count - 1, period)),
                    });
                }
            }
        });
    }

    fn enqueue_job(&self, job: Job) {
        self.queue.lock().push(job);
        self.wake.notify_one();
    }

    /// Submit `event` under `trigger`. `loop_count > 1` only has an effect on a
    /// `Date` trigger (§4.F "loop semantics for non-background events"); background
    /// events keep firing on their native interval regardless of `loop_count`.
    pub fn add_event(&self, event: Arc<EventDefinition>, trigger: Trigger, loop_count: u32) -> JobId {
        let id = JobId(self.next_id.fetch_add(1, AtomicOrdering::SeqCst));
        let job = match trigger {
            Trigger::Date(fire_at) => Job {
                id,
                fire_at,
                event,
                recurring_period: None,
                remaining_loops: if loop_count > 1 {
                    // A bare re-fire interval must accompany a looped date trigger;
                    // callers that want looping should use `Trigger::Interval`
                    // instead if they have a natural period. As a fallback, use 1
                    // second so `loop_count` is still observable in absence of an
                    // explicit period.
                    Some((loop_count, Duration::from_secs(1)))
                } else {
                    None
                },
            },
            Trigger::Interval { first, period } => Job {
                id,
                fire_at: first,
                event,
                recurring_period: Some(period),
                remaining_loops: None,
            },
        };
        self.enqueue_job(job);
        id
    }

    /// Variant of [`Self::add_event`] that lets the caller supply an explicit
    /// re-fire period for a looped `Date` trigger, instead of the 1-second fallback.
    pub fn add_looping_event(&self, event: Arc<EventDefinition>, fire_at: Instant, period: Duration, loop_count: u32) -> JobId {
        let id = JobId(self.next_id.fetch_add(1, AtomicOrdering::SeqCst));
        self.enqueue_job(Job {
            id,
            fire_at,
            event,
            recurring_period: None,
            remaining_loops: if loop_count > 1 { Some((loop_count, period)) } else { None },
        });
        id
    }
}

impl Drop for EventScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.loop_handle.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::event::EventAction;
    use std::sync::atomic::AtomicUsize;

    struct CountingAction(Arc<AtomicUsize>);
    impl EventAction for CountingAction {
        fn action(&self) -> anyhow::Result<()> {
            self.0.fetch_add(1, AtomicOrdering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn date_trigger_fires_exactly_once() {
        let reporter = Reporter::new();
        let locks = Arc::new(ResourceLockPool::new());
        let scheduler = EventScheduler::new(reporter, locks, Duration::from_secs(1));
        let calls = Arc::new(AtomicUsize::new(0));
        let event = Arc::new(EventDefinition {
            name: "once".to_string(),
            description: String::new(),
            resources: Vec::new(),
            need_lock: false,
            background: false,
            action: Arc::new(CountingAction(Arc::clone(&calls))),
        });
        scheduler.add_event(event, Trigger::Date(Instant::now() + Duration::from_millis(10)), 1);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 1);
    }

    #[tokio::test]
    async fn interval_trigger_fires_repeatedly() {
        let reporter = Reporter::new();
        let locks = Arc::new(ResourceLockPool::new());
        let scheduler = EventScheduler::new(reporter, locks, Duration::from_secs(1));
        let calls = Arc::new(AtomicUsize::new(0));
        let event = Arc::new(EventDefinition {
            name: "repeating".to_string(),
            description: String::new(),
            resources: Vec::new(),
            need_lock: false,
            background: true,
            action: Arc::new(CountingAction(Arc::clone(&calls))),
        });
        scheduler.add_event(
            event,
            Trigger::Interval {
                first: Instant::now() + Duration::from_millis(10),
                period: Duration::from_millis(20),
            },
            1,
        );
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(calls.load(AtomicOrdering::SeqCst) >= 3, "expected several interval fires, got {}", calls.load(AtomicOrdering::SeqCst));
    }

    #[tokio::test]
    async fn looping_date_trigger_refires_loop_count_times() {
        let reporter = Reporter::new();
        let locks = Arc::new(ResourceLockPool::new());
        let scheduler = EventScheduler::new(reporter, locks, Duration::from_secs(1));
        let calls = Arc::new(AtomicUsize::new(0));
        let event = Arc::new(EventDefinition {
            name: "looped".to_string(),
            description: String::new(),
            resources: Vec::new(),
            need_lock: false,
            background: false,
            action: Arc::new(CountingAction(Arc::clone(&calls))),
        });
        scheduler.add_looping_event(event, Instant::now() + Duration::from_millis(10), Duration::from_millis(20), 3);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 3);
    }

    #[tokio::test]
    async fn two_events_serialize_over_a_shared_resource() {
        use std::sync::atomic::AtomicBool;

        struct RecordingAction {
            busy: Arc<AtomicBool>,
            overlapped: Arc<AtomicBool>,
        }
        impl EventAction for RecordingAction {
            fn action(&self) -> anyhow::Result<()> {
                if self.busy.swap(true, AtomicOrdering::SeqCst) {
                    self.overlapped.store(true, AtomicOrdering::SeqCst);
                }
                std::thread::sleep(Duration::from_millis(30));
                self.busy.store(false, AtomicOrdering::SeqCst);
                Ok(())
            }
        }

        let reporter = Reporter::new();
        let locks = Arc::new(ResourceLockPool::new());
        let scheduler = EventScheduler::new(reporter, locks, Duration::from_secs(1));
        let busy = Arc::new(AtomicBool::new(false));
        let overlapped = Arc::new(AtomicBool::new(false));

        let e1 = Arc::new(EventDefinition {
            name: "e1".to_string(),
            description: String::new(),
            resources: vec!["device D".to_string()],
            need_lock: true,
            background: false,
            action: Arc::new(RecordingAction { busy: Arc::clone(&busy), overlapped: Arc::clone(&overlapped) }),
        });
        let e2 = Arc::new(EventDefinition {
            name: "e2".to_string(),
            description: String::new(),
            resources: vec!["device D".to_string()],
            need_lock: true,
            background: false,
            action: Arc::new(RecordingAction { busy: Arc::clone(&busy), overlapped: Arc::clone(&overlapped) }),
        });

        scheduler.add_event(e1, Trigger::Date(Instant::now() + Duration::from_millis(5)), 1);
        scheduler.add_event(e2, Trigger::Date(Instant::now() + Duration::from_millis(5)), 1);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!overlapped.load(AtomicOrdering::SeqCst), "lock pool must serialize both events over `device D`");
    }
}
