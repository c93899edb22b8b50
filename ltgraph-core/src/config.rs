#![forbid(unsafe_code)]

//! Analysis configuration. Parses an optional TOML file into a strongly-typed structure;
//! command line flags are layered on top by the binary before [`AnalysisConfig::validate`]
//! is called.

use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path, str::FromStr};

use crate::LtError;

/// Lowest accepted loss fraction for the fail threshold.
pub const FAIL_THRESHOLD_MIN: f64 = 0.0001;
/// Highest accepted loss fraction for the fail threshold.
pub const FAIL_THRESHOLD_MAX: f64 = 1.0;

/// How the peak line-rate percentage of a run is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilizationPolicy {
    /// Maximum utilization seen at any datapoint.
    #[default]
    RunningMax,
    /// Utilization of the last datapoint processed.
    LastObserved,
}

/// Representation of per-datapoint loss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossMode {
    /// `(tx - rx) / tx`, clamped to `>= 0`.
    #[default]
    Fraction,
    /// `(tx - rx) / divisor`, clamped to `>= 0`.
    Volume,
}

/// Y axis scaling: raw pps values are divided by `divisor` and labelled with `prefix`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YAxisScaling {
    pub divisor: u64,
    pub prefix: String,
}

impl YAxisScaling {
    pub fn new(divisor: u64, prefix: impl Into<String>) -> crate::LtResult<Self> {
        let prefix = prefix.into();
        if divisor == 0 {
            return Err(LtError::InvalidScaler(format!("{divisor}:{prefix}")));
        }
        Ok(Self { divisor, prefix })
    }

    /// Scale a raw value for display.
    pub fn scale(&self, raw: f64) -> f64 {
        raw / self.divisor as f64
    }
}

impl Default for YAxisScaling {
    fn default() -> Self {
        Self {
            divisor: 1_000_000,
            prefix: "M".to_string(),
        }
    }
}

impl fmt::Display for YAxisScaling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.divisor, self.prefix)
    }
}

impl FromStr for YAxisScaling {
    type Err = LtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LtError::InvalidScaler(s.to_string());
        let (divisor, prefix) = s.split_once(':').ok_or_else(invalid)?;
        if divisor.is_empty() || !divisor.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        // `\w*`: letters, digits and underscore only
        if !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid());
        }
        let divisor: u64 = divisor.parse().map_err(|_| invalid())?;
        Self::new(divisor, prefix).map_err(|_| invalid())
    }
}

impl TryFrom<String> for YAxisScaling {
    type Error = LtError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YAxisScaling> for String {
    fn from(value: YAxisScaling) -> Self {
        value.to_string()
    }
}

/// Configuration threaded into every extraction and evaluation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Loss fraction above which a datapoint is considered failing.
    pub fail_threshold: f64,

    /// Y axis scaler used to normalize pps values for display.
    pub yscaler: YAxisScaling,

    /// Peak line-rate derivation.
    pub utilization_policy: UtilizationPolicy,

    /// Loss representation used for the error series.
    pub error_loss: LossMode,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fail_threshold: 0.001,
            yscaler: YAxisScaling::default(),
            utilization_policy: UtilizationPolicy::default(),
            error_loss: LossMode::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration file from the given path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::LtResult<Self> {
        let data = fs::read_to_string(&path).map_err(LtError::from)?;
        let cfg = toml::from_str::<AnalysisConfig>(&data).map_err(LtError::ConfigParse)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> crate::LtResult<()> {
        validate_fail_threshold(self.fail_threshold)?;
        if self.yscaler.divisor == 0 {
            return Err(LtError::InvalidScaler(self.yscaler.to_string()));
        }
        Ok(())
    }

    /// Scale a raw pps value with the configured divisor.
    pub fn scale(&self, raw: f64) -> f64 {
        self.yscaler.scale(raw)
    }
}

/// Accept thresholds in `[FAIL_THRESHOLD_MIN, FAIL_THRESHOLD_MAX]`.
pub fn validate_fail_threshold(threshold: f64) -> crate::LtResult<f64> {
    if (FAIL_THRESHOLD_MIN..=FAIL_THRESHOLD_MAX).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(LtError::InvalidThreshold(threshold))
    }
}
