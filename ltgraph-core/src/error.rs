#![forbid(unsafe_code)]

//! Common error type for the ltgraph crates.

use thiserror::Error;

/// A run that could not be used for analysis, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunProblem {
    pub run: String,
    pub reason: String,
}

impl std::fmt::Display for RunProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.run, self.reason)
    }
}

#[derive(Debug, Error)]
pub enum LtError {
    /// I/O related failures.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parsing failures.
    #[error("Config parse error: {0}")]
    ConfigParse(toml::de::Error),

    /// Fail threshold outside of the accepted range.
    #[error("fail threshold {0} must be in ({min}..{max}) range", min = crate::config::FAIL_THRESHOLD_MIN, max = crate::config::FAIL_THRESHOLD_MAX)]
    InvalidThreshold(f64),

    /// Y axis scaler not in `DIVISOR:PREFIX` form or with a zero divisor.
    #[error("y axis scaler '{0}' must be formatted as DIVISOR:PREFIX and DIVISOR must be > 0")]
    InvalidScaler(String),

    /// Run could not be parsed at all.
    #[error("input '{run}' can't be parsed: {reason}")]
    UnparsableRun { run: String, reason: String },

    /// Run parsed but is missing some of the required top level keys.
    #[error("input '{run}' doesn't look like a loadtest (is missing top level keys: {})", .missing.join(", "))]
    MissingFields { run: String, missing: Vec<String> },

    /// Run has the right keys but their content is unusable.
    #[error("input '{run}' has a malformed body: {reason}")]
    MalformedRun { run: String, reason: String },

    /// One or more runs failed validation; all of them are listed.
    #[error("error while reading loadtest inputs ({}), abort", .problems.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    InvalidRuns { problems: Vec<RunProblem> },

    /// Nothing to analyze.
    #[error("looks like empty set of configs, abort")]
    NoRuns,

    /// No datapoint counts could be collected.
    #[error("looks like empty set of datapoints, abort")]
    NoDatapoints,

    /// Every run has zero datapoints.
    #[error("looks like the num of datapoints is zero, abort")]
    ZeroDatapoints,
}

impl LtError {
    /// Describe this error as a problem with a specific run, if it is one.
    pub fn run_problem(&self) -> Option<RunProblem> {
        let (run, reason) = match self {
            LtError::UnparsableRun { run, reason } | LtError::MalformedRun { run, reason } => {
                (run, reason.clone())
            }
            LtError::MissingFields { run, missing } => {
                (run, format!("missing top level keys: {}", missing.join(", ")))
            }
            _ => return None,
        };
        Some(RunProblem {
            run: run.clone(),
            reason,
        })
    }
}

/// Convenient alias for results throughout ltgraph crates.
pub type LtResult<T> = Result<T, LtError>;
