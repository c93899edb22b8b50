//! Per-profile aggregation.
//!
//! Runs sharing a `profile_file` are compared against each other: the profile gets an `ideal`
//! envelope (highest offered load of any run at each datapoint), axis hints for charts, one
//! throughput and one error series per run and direction, and a summary table sorted with
//! the best performers first.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::analysis::RunAnalysis;
use crate::channel::ChannelPair;
use crate::config::AnalysisConfig;
use crate::evaluate::{BreakingPoint, MaxPerformance};

/// Distance between x axis ticks, in datapoints.
pub const TICK_INTERVAL: usize = 100;

/// Maps raw profile file names to short display names.
#[derive(Debug, Clone)]
pub struct ProfileNames {
    aliases: BTreeMap<String, String>,
}

impl Default for ProfileNames {
    fn default() -> Self {
        let mut aliases = BTreeMap::new();
        aliases.insert("imix.py".to_string(), "imix".to_string());
        aliases.insert("udp_1pkt_simple_bdir.py".to_string(), "64B".to_string());
        Self { aliases }
    }
}

impl ProfileNames {
    /// Add or replace an alias for a profile file name.
    pub fn with_alias(mut self, file_name: impl Into<String>, display: impl Into<String>) -> Self {
        self.aliases.insert(file_name.into(), display.into());
        self
    }

    /// Display name: a known alias, else the file name without directory and extension.
    pub fn display_name(&self, profile_file: &str) -> String {
        let path = Path::new(profile_file);
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(profile_file);
        if let Some(alias) = self
            .aliases
            .get(profile_file)
            .or_else(|| self.aliases.get(file_name))
        {
            return alias.clone();
        }
        path.file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| profile_file.to_string())
    }
}

/// A labelled chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub label: String,
    pub values: Vec<f64>,
}

impl Series {
    fn rounded(label: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            label: label.into(),
            values: values.into_iter().map(round3).collect(),
        }
    }
}

/// Tabular summary of one run, both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub name: String,
    pub max_performance: [MaxPerformance; 2],
    pub breaking_point: [Option<BreakingPoint>; 2],
}

/// Everything the renderer needs for one profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileReport {
    pub name: String,
    pub profile_file: String,
    /// Largest normalized tx pps of any run and direction, for axis scaling.
    pub max: f64,
    pub yprefix: String,
    pub ticks: Vec<usize>,
    pub fail_threshold: f64,
    pub ideal: Vec<f64>,
    pub throughput_series: Vec<Series>,
    pub error_series: Vec<Series>,
    /// Sorted by descending peak line rate, forward direction first.
    pub runs: Vec<RunSummary>,
}

/// Group analyzed runs by profile file; profiles come out sorted by raw file name.
pub fn aggregate_profiles(
    runs: &[RunAnalysis],
    config: &AnalysisConfig,
    names: &ProfileNames,
) -> Vec<ProfileReport> {
    let mut groups: BTreeMap<String, Vec<&RunAnalysis>> = BTreeMap::new();
    for run in runs {
        groups.entry(run.profile_file.clone()).or_default().push(run);
    }

    groups
        .into_iter()
        .map(|(profile_file, members)| build_profile(profile_file, &members, config, names))
        .collect()
}

fn build_profile(
    profile_file: String,
    members: &[&RunAnalysis],
    config: &AnalysisConfig,
    names: &ProfileNames,
) -> ProfileReport {
    let ideal = ideal_envelope(members);
    let max = members
        .iter()
        .flat_map(|r| r.channels.iter())
        .flat_map(|ch| ch.iter().map(|s| s.tx_pps))
        .fold(0.0, f64::max);

    let mut throughput_series = vec![Series::rounded("ideal", ideal.iter().copied())];
    let mut error_series = vec![Series::rounded("txrate", ideal.iter().copied())];
    for run in members {
        for (pair, stats) in ChannelPair::BOTH.iter().zip(&run.channels) {
            throughput_series.push(Series::rounded(
                format!("{} {} rx", run.name, pair.label()),
                stats.iter().map(|s| s.rx_pps),
            ));
            error_series.push(Series::rounded(
                format!("{} {} err", run.name, pair.label()),
                stats.iter().map(|s| s.rx_loss),
            ));
        }
    }

    let mut summaries: Vec<RunSummary> = members.iter().map(|r| r.summary()).collect();
    sort_by_line_rate(&mut summaries);

    ProfileReport {
        name: names.display_name(&profile_file),
        profile_file,
        max,
        yprefix: config.yscaler.prefix.clone(),
        ticks: ticks(ideal.len()),
        fail_threshold: config.fail_threshold,
        ideal,
        throughput_series,
        error_series,
        runs: summaries,
    }
}

/// Pointwise maximum of every member's tx pps, over both directions.
pub fn ideal_envelope(members: &[&RunAnalysis]) -> Vec<f64> {
    let mut ideal: Vec<f64> = Vec::new();
    for stats in members.iter().flat_map(|r| r.channels.iter()) {
        if ideal.len() < stats.len() {
            ideal.resize(stats.len(), 0.0);
        }
        for (slot, stat) in ideal.iter_mut().zip(stats) {
            *slot = slot.max(stat.tx_pps);
        }
    }
    ideal
}

/// Tick positions every [`TICK_INTERVAL`] datapoints, up to the largest multiple not
/// exceeding `len`.
pub fn ticks(len: usize) -> Vec<usize> {
    let last = len - len % TICK_INTERVAL;
    (0..=last).step_by(TICK_INTERVAL).collect()
}

/// Best performers first: descending forward line rate, then reverse, then name.
pub fn sort_by_line_rate(summaries: &mut [RunSummary]) {
    summaries.sort_by(|a, b| {
        b.max_performance[0]
            .max_lr_perc
            .total_cmp(&a.max_performance[0].max_lr_perc)
            .then_with(|| {
                b.max_performance[1]
                    .max_lr_perc
                    .total_cmp(&a.max_performance[1].max_lr_perc)
            })
            .then_with(|| a.name.cmp(&b.name))
    });
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
