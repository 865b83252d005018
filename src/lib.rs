//! Gatecheck - Metric analysis gating for progressive delivery.
//!
//! This crate reconciles analysis runs: named sets of metric checks whose
//! measurements, taken from pluggable providers, are folded into a single
//! verdict that gates a deployment step.
//!
//! # Architecture
//!
//! One reconciliation cycle is a pure-ish pipeline over a copy of the run:
//! validate, plan metric tasks, execute measurements concurrently, assess
//! statuses, garbage-collect old measurements, and compute the next wake
//! time. Persistence and work distribution sit outside the engine behind
//! the [`store::RunStore`] seam and the [`worker`] queue/pool.
//!
//! # Modules
//!
//! - [`config`] - Configuration loading from TOML files and engine settings
//! - [`domain`] - Runs, metrics, measurements, and phase semantics
//! - [`engine`] - The reconciler and its pipeline stages
//! - [`provider`] - Measurement providers: web, query, resource
//! - [`store`] - Run persistence seam with an in-memory implementation
//! - [`worker`] - De-duplicating work queue and worker pool
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gatecheck::config::EngineSettings;
//! use gatecheck::engine::Reconciler;
//! use gatecheck::provider::DefaultProviderFactory;
//!
//! let settings = EngineSettings::default();
//! let factory = Arc::new(DefaultProviderFactory::new(settings.clone()));
//! let reconciler = Reconciler::new(settings, factory);
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod provider;
pub mod store;
pub mod worker;
