//! De-duplicating, rate-limited work queue.
//!
//! Workers pull run names from this queue; it guarantees at most one
//! in-flight reconciliation per run identity. Enqueuing a name that is
//! already queued is a no-op; enqueuing a name that is currently being
//! processed marks it dirty so it is requeued once the worker finishes.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::debug;

/// Per-key exponential backoff for failed work items.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl BackoffPolicy {
    /// Delay for the given consecutive-failure count (1-based).
    fn delay_for(&self, failures: u32) -> Duration {
        let exp = failures.saturating_sub(1).min(20);
        let delay = self.base_delay.saturating_mul(2u32.saturating_pow(exp));
        delay.min(self.max_delay)
    }
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<String>,
    /// Names currently in `pending`.
    queued: HashSet<String>,
    /// Names handed to a worker and not yet marked done.
    processing: HashSet<String>,
    /// Names re-added while processing; requeued on `done`.
    dirty: HashSet<String>,
    /// Consecutive failures per name, for backoff.
    failures: HashMap<String, u32>,
    shut_down: bool,
}

/// Work queue of run names.
pub struct WorkQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    backoff: BackoffPolicy,
}

impl WorkQueue {
    pub fn new(backoff: BackoffPolicy) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            backoff,
        }
    }

    /// Enqueue a name for reconciliation. Duplicate adds collapse.
    pub fn add(&self, name: &str) {
        let mut state = self.state.lock();
        if state.shut_down || state.queued.contains(name) {
            return;
        }
        if state.processing.contains(name) {
            // Never two concurrent reconciliations of the same run; remember
            // that it needs another pass.
            state.dirty.insert(name.to_string());
            return;
        }
        state.queued.insert(name.to_string());
        state.pending.push_back(name.to_string());
        drop(state);
        self.notify.notify_one();
    }

    /// Enqueue a name after a delay.
    pub fn add_after(self: &Arc<Self>, name: &str, delay: Duration) {
        if delay.is_zero() {
            self.add(name);
            return;
        }
        let queue = Arc::clone(self);
        let name = name.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.add(&name);
        });
    }

    /// Enqueue a failed item with exponential backoff.
    pub fn add_rate_limited(self: &Arc<Self>, name: &str) {
        let failures = {
            let mut state = self.state.lock();
            let failures = state.failures.entry(name.to_string()).or_insert(0);
            *failures += 1;
            *failures
        };
        let delay = self.backoff.delay_for(failures);
        debug!(run = %name, failures, delay_ms = delay.as_millis() as u64, "Requeueing with backoff");
        self.add_after(name, delay);
    }

    /// Clear the failure history for a name after a successful pass.
    pub fn forget(&self, name: &str) {
        self.state.lock().failures.remove(name);
    }

    /// Wait for the next name. Returns `None` once the queue is shut down
    /// and drained.
    pub async fn get(&self) -> Option<String> {
        loop {
            {
                let mut state = self.state.lock();
                if let Some(name) = state.pending.pop_front() {
                    state.queued.remove(&name);
                    state.processing.insert(name.clone());
                    return Some(name);
                }
                if state.shut_down {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    /// Mark a name as finished processing; requeues it if it went dirty
    /// while in flight.
    pub fn done(&self, name: &str) {
        let requeue = {
            let mut state = self.state.lock();
            state.processing.remove(name);
            state.dirty.remove(name)
        };
        if requeue {
            self.add(name);
        }
    }

    /// Stop handing out work. Pending items drain; sleeping `get` calls
    /// wake up and return `None`.
    pub fn shutdown(&self) {
        self.state.lock().shut_down = true;
        self.notify.notify_waiters();
    }

    pub fn len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new(BackoffPolicy::default())
    }
}
