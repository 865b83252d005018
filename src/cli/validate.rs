//! Handler for the `validate` command.

use tracing::info;

use crate::cli::{load_run, SpecPathArg};
use crate::engine::validate::validate_metrics;
use crate::error::Result;

/// Parse and structurally validate an analysis run file.
pub fn execute(args: &SpecPathArg) -> Result<()> {
    let run = load_run(&args.spec)?;
    validate_metrics(&run.spec.metrics)?;
    info!(
        run = %run.name,
        metrics = run.spec.metrics.len(),
        "Analysis run file is valid"
    );
    Ok(())
}
