//! Worker pool driving reconciliation cycles.
//!
//! Each worker loops pulling run names off the shared [`WorkQueue`],
//! reconciles the run, persists the resulting status, and requeues the run
//! at its next due time. Store failures feed back into the queue's
//! rate limiter instead of aborting the worker.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::Reconciler;
use crate::store::RunStore;

use super::queue::WorkQueue;

/// Pool of reconciliation workers sharing one queue.
pub struct WorkerPool {
    queue: Arc<WorkQueue>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `workers` tasks processing the given queue.
    pub fn spawn(
        workers: usize,
        queue: Arc<WorkQueue>,
        reconciler: Arc<Reconciler>,
        store: Arc<dyn RunStore>,
    ) -> Self {
        let handles = (0..workers)
            .map(|id| {
                let queue = Arc::clone(&queue);
                let reconciler = Arc::clone(&reconciler);
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    worker_loop(id, queue, reconciler, store).await;
                })
            })
            .collect();

        info!(workers, "Worker pool started");
        Self { queue, handles }
    }

    /// Signal shutdown and wait for the workers to drain.
    pub async fn shutdown(self) {
        self.queue.shutdown();
        for handle in self.handles {
            let _ = handle.await;
        }
        info!("Worker pool stopped");
    }
}

async fn worker_loop(
    id: usize,
    queue: Arc<WorkQueue>,
    reconciler: Arc<Reconciler>,
    store: Arc<dyn RunStore>,
) {
    debug!(worker = id, "Worker started");
    while let Some(name) = queue.get().await {
        process_one(&name, &queue, &reconciler, store.as_ref()).await;
        queue.done(&name);
    }
    debug!(worker = id, "Worker stopped");
}

async fn process_one(
    name: &str,
    queue: &Arc<WorkQueue>,
    reconciler: &Reconciler,
    store: &dyn RunStore,
) {
    let Some(run) = store.get(name) else {
        // Deleted between enqueue and pickup; nothing to do.
        debug!(run = %name, "Run no longer in store");
        queue.forget(name);
        return;
    };

    let now = Utc::now();
    let outcome = reconciler.reconcile(&run, now).await;

    match store.update_status(&outcome.run) {
        Ok(written) => {
            queue.forget(name);
            if written {
                debug!(run = %name, phase = %outcome.run.status.phase, "Status persisted");
            }
        }
        Err(e) => {
            warn!(run = %name, error = %e, "Failed to persist status, retrying");
            queue.add_rate_limited(name);
            return;
        }
    }

    if let Some(due) = outcome.requeue_at {
        let delay = (due - now).to_std().unwrap_or(std::time::Duration::ZERO);
        queue.add_after(name, delay);
    }
}
