//! Structural validation of a run's metric list.
//!
//! Runs once per reconciliation before any measurement, and only matters
//! before the first metric results are populated; re-validating an already
//! validated run is wasted work but harmless.

use std::collections::HashSet;

use crate::domain::Metric;
use crate::error::ValidationError;

/// Check the metric list for structural consistency.
///
/// Pure check, no side effects. Errors identify the offending metric index.
pub fn validate_metrics(metrics: &[Metric]) -> Result<(), ValidationError> {
    if metrics.is_empty() {
        return Err(ValidationError::NoMetrics);
    }

    let mut seen = HashSet::new();
    for (index, metric) in metrics.iter().enumerate() {
        if !seen.insert(metric.name.as_str()) {
            return Err(ValidationError::DuplicateName {
                index,
                name: metric.name.clone(),
            });
        }
        validate_metric(index, metric)?;
    }
    Ok(())
}

fn validate_metric(index: usize, metric: &Metric) -> Result<(), ValidationError> {
    if let Some(count) = metric.count {
        if count > 0 {
            for (limit_field, limit) in [
                ("failureLimit", metric.failure_limit),
                ("successfulLimit", metric.successful_limit),
                ("inconclusiveLimit", metric.inconclusive_limit),
            ] {
                if count < limit {
                    return Err(ValidationError::CountBelowLimit {
                        index,
                        name: metric.name.clone(),
                        count,
                        limit_field,
                        limit,
                    });
                }
            }
        }
        if count > 1 && metric.interval.is_none() {
            return Err(ValidationError::CountWithoutInterval {
                index,
                name: metric.name.clone(),
            });
        }
    }

    // Surfaces humantime parse failures before any measurement is taken.
    metric.interval()?;
    metric.initial_delay()?;

    for (field, value) in [
        ("count", metric.count.unwrap_or(0)),
        ("failureLimit", metric.failure_limit),
        ("successfulLimit", metric.successful_limit),
        ("inconclusiveLimit", metric.inconclusive_limit),
        (
            "consecutiveErrorLimit",
            metric.consecutive_error_limit.unwrap_or(0),
        ),
    ] {
        if value < 0 {
            return Err(ValidationError::NegativeLimit {
                index,
                name: metric.name.clone(),
                field,
                value,
            });
        }
    }

    if let Some(limit) = metric.consecutive_successful_limit {
        if limit < 1 {
            return Err(ValidationError::InvalidConsecutiveSuccessfulLimit {
                index,
                name: metric.name.clone(),
                value: limit,
            });
        }
    }

    let variants = metric.provider.variant_count();
    if variants != 1 {
        return Err(ValidationError::ProviderVariants {
            index,
            name: metric.name.clone(),
            found: variants,
        });
    }

    Ok(())
}
