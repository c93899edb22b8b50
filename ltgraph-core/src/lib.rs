#![forbid(unsafe_code)]

//! Loadtest analysis engine.
//!
//! Consumes already-parsed loadtest runs, validates that they can be compared, and reduces
//! each run's per-datapoint throughput/loss series into max-performance figures and
//! breaking points, grouped by traffic profile.

pub mod analysis;
pub mod channel;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod profile;
pub mod run;
pub mod validate;
pub mod warning;

pub use analysis::{analyze, analyze_with_names, Analysis, RunAnalysis};
pub use channel::{ChannelPair, ChannelStat};
pub use config::{AnalysisConfig, LossMode, UtilizationPolicy, YAxisScaling};
pub use error::{LtError, LtResult};
pub use evaluate::{BreakingPoint, MaxPerformance};
pub use profile::{ProfileNames, ProfileReport, RunSummary, Series};
pub use run::{ChannelRecord, Datapoint, Run, RunInput};
pub use validate::{validate_runs, ValidatedRuns};
pub use warning::{AnalysisWarning, Warnings};
