//! Work distribution: the de-duplicating queue and the worker pool that
//! drains it.

pub mod pool;
pub mod queue;

pub use pool::WorkerPool;
pub use queue::{BackoffPolicy, WorkQueue};
