//! Non-fatal analysis issues.
//!
//! Warnings never abort an analysis; they are accumulated in the order they were raised and
//! handed to the renderer next to the results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

/// A condition that makes the output questionable but not unusable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisWarning {
    /// Runs disagree on the consistency keys.
    MultipleConfigs { configs: Vec<Vec<String>> },
    /// Runs disagree on the number of datapoints.
    MultipleDatapointCounts { counts: Vec<usize> },
    /// A run reports more channels than the two directional ones.
    ExtraChannels { run: String, channels: Vec<String> },
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisWarning::MultipleConfigs { configs } => write!(
                f,
                "multiple loadtest configs, expect the graphs to be garbled: {configs:?}"
            ),
            AnalysisWarning::MultipleDatapointCounts { counts } => write!(
                f,
                "multiple loadtest datapoint counts, expect the graphs to be garbled: {counts:?}"
            ),
            AnalysisWarning::ExtraChannels { run, channels } => write!(
                f,
                "stats for {run} have {channels:?} channels (incl. global), only the two directional ones are processed"
            ),
        }
    }
}

/// Ordered, append-only warning collector.
#[derive(Debug, Default, Clone)]
pub struct Warnings {
    items: Vec<AnalysisWarning>,
    extra_channel_runs: BTreeSet<String>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and log it.
    pub fn push(&mut self, warning: AnalysisWarning) {
        if let AnalysisWarning::ExtraChannels { run, .. } = &warning {
            // one per run is enough, every datapoint would repeat it
            if !self.extra_channel_runs.insert(run.clone()) {
                return;
            }
        }
        warn!("{warning}");
        self.items.push(warning);
    }

    /// Warnings raised so far, in order.
    pub fn as_slice(&self) -> &[AnalysisWarning] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<AnalysisWarning> {
        self.items
    }
}
