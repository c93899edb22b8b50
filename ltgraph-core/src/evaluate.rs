//! Max-performance evaluation and breaking-point detection.
//!
//! Both walk a run's datapoints once with the same hysteresis: a datapoint whose loss exceeds
//! the fail threshold opens a failing streak and records a snapshot, further failing
//! datapoints keep the first snapshot, and any datapoint at or below the threshold closes the
//! streak and drops the snapshot. Only a streak still open at the end of the run counts.

use serde::{Deserialize, Serialize};

use crate::channel::{loss_fraction, ChannelPair};
use crate::config::{AnalysisConfig, UtilizationPolicy};
use crate::run::Datapoint;

/// Peak line-rate percentage is capped here.
pub const MAX_LINE_RATE_PERC: f64 = 100.0;

/// Tracks the currently open failing streak and the value recorded at its start.
#[derive(Debug, Clone, Default)]
pub struct FailureTracker<T> {
    onset: Option<T>,
}

impl<T> FailureTracker<T> {
    pub fn new() -> Self {
        Self { onset: None }
    }

    /// Feed one datapoint. `snapshot` is evaluated only when a new streak opens.
    pub fn observe(&mut self, failing: bool, snapshot: impl FnOnce() -> T) {
        if failing {
            if self.onset.is_none() {
                self.onset = Some(snapshot());
            }
        } else {
            self.onset = None;
        }
    }

    /// Snapshot of the open streak, if the sequence ended while failing.
    pub fn finish(self) -> Option<T> {
        self.onset
    }
}

/// Summary of how far a run got in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaxPerformance {
    /// Throughput at the onset of the unresolved failure, or `max_pps` if there is none.
    pub max_ok_pps: f64,
    /// Peak received throughput.
    pub max_pps: f64,
    /// Peak percentage of line rate, at most 100.
    pub max_lr_perc: f64,
}

/// Snapshot at the onset of a run's final, unresolved failing streak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakingPoint {
    /// Datapoint index where the streak began.
    pub index: usize,
    pub tx_pps: f64,
    pub rx_pps: f64,
    /// Receiver utilization, percent of line rate.
    pub util: f64,
}

/// Reduce one direction of a run to its max-performance figures.
pub fn eval_max_performance(
    stats: &[Datapoint],
    pair: ChannelPair,
    config: &AnalysisConfig,
) -> MaxPerformance {
    let mut tracker = FailureTracker::new();
    let mut max_pps: f64 = 0.0;
    let mut max_lr_perc: f64 = 0.0;

    for point in stats {
        let (sender, receiver) = pair.records(point);
        let failing = loss_fraction(sender.tx_pps, receiver.rx_pps) > config.fail_threshold;
        tracker.observe(failing, || receiver.rx_pps);

        max_lr_perc = match config.utilization_policy {
            UtilizationPolicy::RunningMax => max_lr_perc.max(receiver.rx_util),
            UtilizationPolicy::LastObserved => receiver.rx_util,
        };
        max_pps = max_pps.max(receiver.rx_pps);
    }

    let max_ok_pps = tracker.finish().unwrap_or(max_pps);
    MaxPerformance {
        max_ok_pps: config.scale(max_ok_pps),
        max_pps: config.scale(max_pps),
        max_lr_perc: max_lr_perc.min(MAX_LINE_RATE_PERC),
    }
}

/// Find where the run's last unresolved failing streak began, if it ended failing.
pub fn detect_breaking_point(
    stats: &[Datapoint],
    pair: ChannelPair,
    config: &AnalysisConfig,
) -> Option<BreakingPoint> {
    let mut tracker = FailureTracker::new();

    for (index, point) in stats.iter().enumerate() {
        let (sender, receiver) = pair.records(point);
        let failing = loss_fraction(sender.tx_pps, receiver.rx_pps) > config.fail_threshold;
        tracker.observe(failing, || BreakingPoint {
            index,
            tx_pps: config.scale(sender.tx_pps),
            rx_pps: config.scale(receiver.rx_pps),
            util: receiver.rx_util,
        });
    }

    tracker.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::YAxisScaling;
    use crate::run::ChannelRecord;
    use std::collections::BTreeMap;

    fn series(tx: &[f64], rx: &[f64], util: &[f64]) -> Vec<Datapoint> {
        tx.iter()
            .zip(rx)
            .zip(util)
            .map(|((&tx, &rx), &util)| {
                let mut p = BTreeMap::new();
                p.insert("0".to_string(), ChannelRecord { tx_pps: tx, ..Default::default() });
                p.insert(
                    "1".to_string(),
                    ChannelRecord { rx_pps: rx, rx_util: util, ..Default::default() },
                );
                p
            })
            .collect()
    }

    fn config(threshold: f64) -> AnalysisConfig {
        AnalysisConfig {
            fail_threshold: threshold,
            yscaler: YAxisScaling::new(1, "").unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn tracker_keeps_first_snapshot_and_clears_on_recovery() {
        let mut t = FailureTracker::new();
        t.observe(true, || 1);
        t.observe(true, || 2);
        assert_eq!(t.clone().finish(), Some(1));
        t.observe(false, || 3);
        assert_eq!(t.clone().finish(), None);
        t.observe(true, || 4);
        assert_eq!(t.finish(), Some(4));
    }

    #[test]
    fn healthy_run_reports_peak_as_ok() {
        let stats = series(&[10.0, 20.0, 30.0], &[10.0, 20.0, 30.0], &[10.0, 20.0, 30.0]);
        let mp = eval_max_performance(&stats, ChannelPair::FORWARD, &config(0.1));
        assert_eq!(mp.max_ok_pps, 30.0);
        assert_eq!(mp.max_pps, 30.0);
        assert_eq!(mp.max_lr_perc, 30.0);
        assert!(detect_breaking_point(&stats, ChannelPair::FORWARD, &config(0.1)).is_none());
    }

    #[test]
    fn failing_tail_reports_onset() {
        let stats = series(&[10.0, 20.0, 30.0, 40.0], &[10.0, 20.0, 15.0, 35.0], &[1.0; 4]);
        let mp = eval_max_performance(&stats, ChannelPair::FORWARD, &config(0.1));
        assert_eq!(mp.max_ok_pps, 15.0);
        assert_eq!(mp.max_pps, 35.0);

        let bp = detect_breaking_point(&stats, ChannelPair::FORWARD, &config(0.1)).unwrap();
        assert_eq!(bp.index, 2);
        assert_eq!(bp.tx_pps, 30.0);
        assert_eq!(bp.rx_pps, 15.0);
    }

    #[test]
    fn recovery_clears_candidate() {
        let stats = series(&[10.0, 10.0, 10.0], &[10.0, 2.0, 10.0], &[1.0; 3]);
        let mp = eval_max_performance(&stats, ChannelPair::FORWARD, &config(0.1));
        assert_eq!(mp.max_ok_pps, mp.max_pps);
        assert!(detect_breaking_point(&stats, ChannelPair::FORWARD, &config(0.1)).is_none());
    }

    #[test]
    fn only_last_episode_counts() {
        let stats = series(
            &[10.0, 10.0, 10.0, 10.0, 10.0],
            &[5.0, 10.0, 10.0, 6.0, 4.0],
            &[1.0; 5],
        );
        let bp = detect_breaking_point(&stats, ChannelPair::FORWARD, &config(0.1)).unwrap();
        assert_eq!(bp.index, 3);
        assert_eq!(bp.rx_pps, 6.0);
    }

    #[test]
    fn loss_equal_to_threshold_is_not_failing() {
        let stats = series(&[100.0], &[90.0], &[1.0]);
        assert!(detect_breaking_point(&stats, ChannelPair::FORWARD, &config(0.1)).is_none());
    }

    #[test]
    fn line_rate_is_clamped() {
        let stats = series(&[10.0, 10.0], &[10.0, 10.0], &[104.2, 99.0]);
        let mp = eval_max_performance(&stats, ChannelPair::FORWARD, &config(0.1));
        assert_eq!(mp.max_lr_perc, 100.0);
    }

    #[test]
    fn last_observed_policy_uses_final_utilization() {
        let stats = series(&[10.0, 10.0], &[10.0, 10.0], &[80.0, 40.0]);
        let cfg = AnalysisConfig {
            utilization_policy: UtilizationPolicy::LastObserved,
            ..config(0.1)
        };
        assert_eq!(eval_max_performance(&stats, ChannelPair::FORWARD, &cfg).max_lr_perc, 40.0);
        assert_eq!(
            eval_max_performance(&stats, ChannelPair::FORWARD, &config(0.1)).max_lr_perc,
            80.0
        );
    }

    #[test]
    fn values_are_scaled_for_display() {
        let stats = series(&[2_000_000.0, 2_000_000.0], &[2_000_000.0, 500_000.0], &[1.0; 2]);
        let cfg = AnalysisConfig {
            fail_threshold: 0.1,
            ..Default::default()
        };
        let mp = eval_max_performance(&stats, ChannelPair::FORWARD, &cfg);
        assert_eq!(mp.max_pps, 2.0);
        assert_eq!(mp.max_ok_pps, 0.5);
    }
}
