//! Measurement-history garbage collection.

use tracing::{debug, warn};

use crate::domain::AnalysisRun;
use crate::error::ProviderError;
use crate::provider::ProviderFactory;

/// Trim each metric's measurement history to the retention limit, asking
/// the metric's provider to release anything tied to the dropped entries.
///
/// One metric's failure does not stop collection for the others; the first
/// collected error is returned after all metrics have been processed.
pub async fn garbage_collect(
    run: &mut AnalysisRun,
    retain: usize,
    factory: &dyn ProviderFactory,
) -> Result<(), ProviderError> {
    let mut first_error: Option<ProviderError> = None;

    for metric in run.spec.metrics.clone() {
        let over_limit = run
            .result_for(&metric.name)
            .map(|r| r.measurements.len() > retain)
            .unwrap_or(false);
        if !over_limit {
            continue;
        }

        let provider = match factory.create(&metric) {
            Ok(p) => p,
            Err(e) => {
                warn!(metric = %metric.name, error = %e, "Garbage collection skipped");
                first_error.get_or_insert(e);
                continue;
            }
        };

        if let Err(e) = provider.garbage_collect(run, &metric, retain).await {
            warn!(metric = %metric.name, error = %e, "Provider garbage collection failed");
            first_error.get_or_insert(e);
            continue;
        }

        if let Some(result) = run.result_for_mut(&metric.name) {
            let dropped = result.measurements.len() - retain;
            result
                .measurements
                .drain(..dropped);
            debug!(metric = %metric.name, dropped, retained = retain, "Trimmed measurement history");
        }
    }

    match first_error {
        None => Ok(()),
        Some(e) => Err(e),
    }
}
