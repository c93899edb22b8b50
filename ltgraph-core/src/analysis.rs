//! Engine entry point: validation gate, per-run evaluation, per-profile aggregation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::channel::{check_channel_count, extract_channel_stats, ChannelPair, ChannelStat};
use crate::config::{AnalysisConfig, YAxisScaling};
use crate::evaluate::{detect_breaking_point, eval_max_performance, BreakingPoint, MaxPerformance};
use crate::profile::{aggregate_profiles, ProfileNames, ProfileReport, RunSummary};
use crate::run::{Run, RunInput};
use crate::validate::validate_runs;
use crate::warning::{AnalysisWarning, Warnings};
use crate::LtResult;

/// Derived statistics of one run, indexed by direction (`ChannelPair::BOTH` order).
#[derive(Debug, Clone)]
pub struct RunAnalysis {
    pub name: String,
    pub profile_file: String,
    pub channels: [Vec<ChannelStat>; 2],
    pub max_performance: [MaxPerformance; 2],
    pub breaking_point: [Option<BreakingPoint>; 2],
}

impl RunAnalysis {
    pub fn new(run: &Run, config: &AnalysisConfig, warnings: &mut Warnings) -> Self {
        check_channel_count(run, warnings);
        let [fwd, rev] = ChannelPair::BOTH;
        let per_direction = |pair: ChannelPair| {
            (
                extract_channel_stats(&run.stats, pair, config, config.error_loss),
                eval_max_performance(&run.stats, pair, config),
                detect_breaking_point(&run.stats, pair, config),
            )
        };
        let (fwd_stats, fwd_mp, fwd_bp) = per_direction(fwd);
        let (rev_stats, rev_mp, rev_bp) = per_direction(rev);

        debug!(
            run = %run.name,
            max_ok_fwd = fwd_mp.max_ok_pps,
            max_ok_rev = rev_mp.max_ok_pps,
            breaking_fwd = ?fwd_bp.map(|b| b.index),
            breaking_rev = ?rev_bp.map(|b| b.index),
            "run evaluated"
        );

        Self {
            name: run.name.clone(),
            profile_file: run.profile_file(),
            channels: [fwd_stats, rev_stats],
            max_performance: [fwd_mp, rev_mp],
            breaking_point: [fwd_bp, rev_bp],
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            name: self.name.clone(),
            max_performance: self.max_performance,
            breaking_point: self.breaking_point,
        }
    }
}

/// Complete engine output handed to renderers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub profiles: Vec<ProfileReport>,
    /// Consistency keys and their (first seen) values.
    pub config_keys: Vec<(String, String)>,
    pub warnings: Vec<AnalysisWarning>,
    pub fail_threshold: f64,
    pub yscaler: YAxisScaling,
}

impl Analysis {
    /// Warning messages in the order they were raised.
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    /// Look up a profile by display name.
    pub fn profile(&self, name: &str) -> Option<&ProfileReport> {
        self.profiles.iter().find(|p| p.name == name)
    }
}

/// Analyze runs with the default profile names.
pub fn analyze(inputs: BTreeMap<String, RunInput>, config: &AnalysisConfig) -> LtResult<Analysis> {
    analyze_with_names(inputs, config, &ProfileNames::default())
}

/// Run the whole pipeline. Fails only when the inputs do not pass validation.
pub fn analyze_with_names(
    inputs: BTreeMap<String, RunInput>,
    config: &AnalysisConfig,
    names: &ProfileNames,
) -> LtResult<Analysis> {
    config.validate()?;
    let mut warnings = Warnings::new();
    let validated = validate_runs(inputs, &mut warnings)?;

    let runs: Vec<RunAnalysis> = validated
        .runs
        .iter()
        .map(|run| RunAnalysis::new(run, config, &mut warnings))
        .collect();
    let profiles = aggregate_profiles(&runs, config, names);

    info!(
        runs = runs.len(),
        profiles = profiles.len(),
        warnings = warnings.as_slice().len(),
        "analysis complete"
    );

    Ok(Analysis {
        profiles,
        config_keys: validated.common_config(),
        warnings: warnings.into_vec(),
        fail_threshold: config.fail_threshold,
        yscaler: config.yscaler.clone(),
    })
}
