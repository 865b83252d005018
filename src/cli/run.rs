//! Handler for the `run` command.

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing::{error, info};

use crate::cli::{load_run, RunArgs};
use crate::config::Config;
use crate::domain::Phase;
use crate::engine::Reconciler;
use crate::error::Result;
use crate::provider::DefaultProviderFactory;
use crate::store::{InMemoryRunStore, RunStore};
use crate::worker::{BackoffPolicy, WorkQueue, WorkerPool};

/// Execute the run command: drive one analysis run to a terminal phase and
/// exit with a code reflecting the verdict.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    // Apply CLI overrides
    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }
    config.init_logging();

    let run = load_run(&args.spec)?;
    let name = run.name.clone();
    info!(run = %name, metrics = run.spec.metrics.len(), "gatecheck starting");

    let store: Arc<dyn RunStore> = Arc::new({
        let store = InMemoryRunStore::new();
        store.insert(run);
        store
    });

    let settings = config.engine.clone();
    let factory = Arc::new(DefaultProviderFactory::new(settings.clone()));
    let reconciler = Arc::new(Reconciler::new(settings.clone(), factory));

    let queue = Arc::new(WorkQueue::new(BackoffPolicy::default()));
    let pool = WorkerPool::spawn(
        settings.workers,
        Arc::clone(&queue),
        reconciler,
        Arc::clone(&store),
    );
    queue.add(&name);

    let phase = tokio::select! {
        phase = wait_for_verdict(store.as_ref(), &name) => phase,
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
            None
        }
    };

    pool.shutdown().await;

    match phase {
        Some(phase) => {
            let message = store
                .get(&name)
                .and_then(|r| r.status.message)
                .unwrap_or_default();
            match phase {
                Phase::Successful => info!(run = %name, "Analysis succeeded"),
                _ => error!(run = %name, phase = %phase, message = %message, "Analysis did not succeed"),
            }
            std::process::exit(exit_code(phase));
        }
        None => {
            info!("gatecheck stopped");
            Ok(())
        }
    }
}

/// Poll the store until the run reaches a terminal phase.
async fn wait_for_verdict(store: &dyn RunStore, name: &str) -> Option<Phase> {
    loop {
        let phase = store.get(name)?.status.phase;
        if phase.is_completed() {
            return Some(phase);
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}

fn exit_code(phase: Phase) -> i32 {
    match phase {
        Phase::Successful => 0,
        Phase::Failed => 1,
        Phase::Inconclusive => 2,
        _ => 3,
    }
}
