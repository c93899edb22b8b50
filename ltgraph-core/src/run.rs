//! Loadtest run model.
//!
//! A run is one executed load test: its `vars` (the generator configuration) and its `stats`,
//! an ordered sequence of datapoints, each mapping a channel id to that channel's counters.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::{LtError, LtResult};

/// Top level keys every loadtest document must carry.
pub const REQUIRED_KEYS: [&str; 2] = ["vars", "stats"];

/// `vars` keys that must match across runs for them to be comparable.
pub const CONFIG_KEYS: [&str; 5] = [
    "warmup_mult",
    "warmup_duration",
    "rampup_target",
    "rampup_duration",
    "hold_duration",
];

/// Values of [`CONFIG_KEYS`] for a single run, rendered as strings.
pub type ConfigTuple = Vec<String>;

/// What the loader hands over for a single input.
#[derive(Debug, Clone)]
pub enum RunInput {
    Parsed(Value),
    /// The input could not be read or decoded.
    Unparsable { reason: String },
}

/// Per-channel counters at one datapoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelRecord {
    pub tx_pps: f64,
    pub rx_pps: f64,
    pub tx_util: f64,
    pub rx_util: f64,
}

/// Channel id → counters.
pub type Datapoint = BTreeMap<String, ChannelRecord>;

#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub name: String,
    pub vars: BTreeMap<String, Value>,
    pub stats: Vec<Datapoint>,
}

impl Run {
    /// Build a run from a decoded loadtest document.
    ///
    /// `stats` may be an array of datapoints or an object keyed by timestamp; in the latter
    /// case document order is kept.
    pub fn from_json(name: &str, doc: Value) -> LtResult<Self> {
        let Value::Object(mut top) = doc else {
            return Err(LtError::MalformedRun {
                run: name.to_string(),
                reason: "top level is not an object".to_string(),
            });
        };

        let missing: Vec<String> = REQUIRED_KEYS
            .iter()
            .filter(|k| !top.contains_key(**k))
            .map(|k| k.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LtError::MissingFields {
                run: name.to_string(),
                missing,
            });
        }

        let malformed = |reason: String| LtError::MalformedRun {
            run: name.to_string(),
            reason,
        };

        let vars = match top.remove("vars") {
            Some(Value::Object(map)) => map.into_iter().collect(),
            _ => return Err(malformed("`vars` is not an object".to_string())),
        };

        let raw_points: Vec<Value> = match top.remove("stats") {
            Some(Value::Array(items)) => items,
            Some(Value::Object(map)) => map.into_iter().map(|(_, v)| v).collect(),
            _ => return Err(malformed("`stats` is neither an array nor an object".to_string())),
        };

        let stats = raw_points
            .into_iter()
            .enumerate()
            .map(|(idx, point)| {
                serde_json::from_value::<Datapoint>(point)
                    .map_err(|e| malformed(format!("datapoint {idx}: {e}")))
            })
            .collect::<LtResult<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            vars,
            stats,
        })
    }

    /// Values of the consistency keys, `null` when absent.
    pub fn config_tuple(&self) -> ConfigTuple {
        CONFIG_KEYS
            .iter()
            .map(|k| self.vars.get(*k).map_or_else(|| "null".to_string(), value_to_string))
            .collect()
    }

    /// Raw `vars.profile_file`, empty when absent.
    pub fn profile_file(&self) -> String {
        self.vars.get("profile_file").map(value_to_string).unwrap_or_default()
    }

    /// Number of datapoints.
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
