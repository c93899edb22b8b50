//! Per-direction statistic extraction.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{AnalysisConfig, LossMode};
use crate::run::{ChannelRecord, Datapoint, Run};
use crate::warning::{AnalysisWarning, Warnings};

/// A traffic direction: packets sent on `from` are received on `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelPair {
    pub from: u8,
    pub to: u8,
}

impl ChannelPair {
    pub const FORWARD: ChannelPair = ChannelPair { from: 0, to: 1 };
    pub const REVERSE: ChannelPair = ChannelPair { from: 1, to: 0 };
    /// Both directions of a bidirectional test, forward first.
    pub const BOTH: [ChannelPair; 2] = [Self::FORWARD, Self::REVERSE];

    /// `"0→1"` style label.
    pub fn label(&self) -> String {
        format!("{}→{}", self.from, self.to)
    }

    fn from_key(&self) -> String {
        self.from.to_string()
    }

    fn to_key(&self) -> String {
        self.to.to_string()
    }

    /// Counters of the sending and the receiving channel at one datapoint.
    ///
    /// A channel absent from the datapoint reads as all zeros.
    pub fn records(&self, point: &Datapoint) -> (ChannelRecord, ChannelRecord) {
        let sender = point.get(&self.from_key()).copied().unwrap_or_default();
        let receiver = point.get(&self.to_key()).copied().unwrap_or_default();
        (sender, receiver)
    }
}

impl fmt::Display for ChannelPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Normalized statistics of one direction at one datapoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelStat {
    pub tx_pps: f64,
    pub rx_pps: f64,
    /// Sender utilization.
    pub util: f64,
    pub rx_loss: f64,
}

/// Loss fraction `(tx - rx) / tx`, unclamped. Zero when nothing was sent.
pub fn loss_fraction(tx_pps: f64, rx_pps: f64) -> f64 {
    if tx_pps > 0.0 {
        (tx_pps - rx_pps) / tx_pps
    } else {
        0.0
    }
}

/// Build the normalized per-datapoint sequence for one direction of a run.
pub fn extract_channel_stats(
    stats: &[Datapoint],
    pair: ChannelPair,
    config: &AnalysisConfig,
    loss_mode: LossMode,
) -> Vec<ChannelStat> {
    stats
        .iter()
        .map(|point| {
            let (sender, receiver) = pair.records(point);
            let rx_loss = match loss_mode {
                LossMode::Fraction => loss_fraction(sender.tx_pps, receiver.rx_pps),
                LossMode::Volume => config.scale(sender.tx_pps - receiver.rx_pps),
            };
            ChannelStat {
                tx_pps: config.scale(sender.tx_pps),
                rx_pps: config.scale(receiver.rx_pps),
                util: sender.tx_util,
                rx_loss: rx_loss.max(0.0),
            }
        })
        .collect()
}

/// Warn when a run carries channels beyond the two directional ones (e.g. a global
/// aggregate); those are ignored by extraction.
pub fn check_channel_count(run: &Run, warnings: &mut Warnings) {
    if let Some(point) = run.stats.iter().find(|p| p.len() > 2) {
        warnings.push(AnalysisWarning::ExtraChannels {
            run: run.name.clone(),
            channels: point.keys().cloned().collect(),
        });
    }
}
