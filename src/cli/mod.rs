//! Command-line interface definitions.

pub mod run;
pub mod validate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::AnalysisRun;
use crate::error::{ConfigError, Result};

/// Gatecheck - Metric analysis gating for progressive delivery.
#[derive(Parser, Debug)]
#[command(name = "gatecheck")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute an analysis run to completion (foreground)
    Run(RunArgs),

    /// Check an analysis run file without executing it
    Validate(SpecPathArg),
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the analysis run file
    pub spec: PathBuf,

    /// Path to engine configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty
    #[arg(long)]
    pub json_logs: bool,
}

/// Shared argument for commands that only need a run file path.
#[derive(Parser, Debug)]
pub struct SpecPathArg {
    /// Path to the analysis run file
    pub spec: PathBuf,
}

/// Load an analysis run definition from a TOML file.
pub fn load_run(path: &PathBuf) -> Result<AnalysisRun> {
    let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
    let run: AnalysisRun = toml::from_str(&content).map_err(ConfigError::Parse)?;
    Ok(run)
}
