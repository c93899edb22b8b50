//! Run validation gate.
//!
//! Turns the loader's name → input mapping into typed runs, aborting if any input is broken,
//! and checks that the surviving runs are comparable (same consistency keys, same number of
//! datapoints). Incomparable runs only produce warnings.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::error::RunProblem;
use crate::run::{ConfigTuple, Run, RunInput, CONFIG_KEYS};
use crate::warning::{AnalysisWarning, Warnings};
use crate::{LtError, LtResult};

/// Runs that passed the gate, with the distinct configs and datapoint counts seen.
#[derive(Debug, Clone)]
pub struct ValidatedRuns {
    /// Sorted by run name.
    pub runs: Vec<Run>,
    /// Distinct config tuples, sorted.
    pub configs: Vec<ConfigTuple>,
    /// Distinct datapoint counts, sorted.
    pub datapoint_counts: Vec<usize>,
}

impl ValidatedRuns {
    /// Consistency keys paired with the values of the first config.
    pub fn common_config(&self) -> Vec<(String, String)> {
        match self.configs.first() {
            Some(values) => CONFIG_KEYS
                .iter()
                .map(|k| k.to_string())
                .zip(values.iter().cloned())
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Validate every input; the only fatal path of the engine.
pub fn validate_runs(
    inputs: BTreeMap<String, RunInput>,
    warnings: &mut Warnings,
) -> LtResult<ValidatedRuns> {
    let mut runs = Vec::with_capacity(inputs.len());
    let mut problems = Vec::new();

    for (name, input) in inputs {
        let parsed = match input {
            RunInput::Parsed(doc) => Run::from_json(&name, doc),
            RunInput::Unparsable { reason } => Err(LtError::UnparsableRun {
                run: name.clone(),
                reason,
            }),
        };
        match parsed {
            Ok(run) => {
                debug!(run = %run.name, datapoints = run.len(), "run accepted");
                runs.push(run);
            }
            Err(e) => {
                debug!(run = %name, error = %e, "run rejected");
                problems.push(e.run_problem().unwrap_or_else(|| RunProblem {
                    run: name,
                    reason: e.to_string(),
                }));
            }
        }
    }

    if !problems.is_empty() {
        return Err(LtError::InvalidRuns { problems });
    }

    let configs: Vec<ConfigTuple> = runs
        .iter()
        .map(Run::config_tuple)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    match configs.len() {
        0 => return Err(LtError::NoRuns),
        1 => {}
        _ => warnings.push(AnalysisWarning::MultipleConfigs {
            configs: configs.clone(),
        }),
    }

    let datapoint_counts: Vec<usize> = runs
        .iter()
        .map(Run::len)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    match datapoint_counts.as_slice() {
        [] => return Err(LtError::NoDatapoints),
        [0] => return Err(LtError::ZeroDatapoints),
        [_] => {}
        _ => warnings.push(AnalysisWarning::MultipleDatapointCounts {
            counts: datapoint_counts.clone(),
        }),
    }

    Ok(ValidatedRuns {
        runs,
        configs,
        datapoint_counts,
    })
}
