//! Engine-agnostic domain types: runs, metrics, measurements, phases.

pub mod measurement;
pub mod metric;
pub mod phase;
pub mod run;

pub use measurement::{Measurement, MetricResult};
pub use metric::{
    Argument, EffectiveCount, Metric, ProviderSpec, QueryProviderSpec, ResourceProviderSpec,
    WebHeader, WebProviderSpec,
};
pub use phase::Phase;
pub use run::{AnalysisRun, ExecutionPolicy, RunSpec, RunStatus};
