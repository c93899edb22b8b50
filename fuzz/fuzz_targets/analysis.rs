#![no_main]

use libfuzzer_sys::fuzz_target;
use ltgraph_core::{analyze, AnalysisConfig, RunInput};
use std::collections::BTreeMap;

// Input is split on NUL bytes, each chunk becomes one loadtest file.
fuzz_target!(|data: &[u8]| {
    let inputs: BTreeMap<String, RunInput> = data
        .split(|&b| b == 0)
        .take(8)
        .enumerate()
        .map(|(i, chunk)| {
            let input = match serde_json::from_slice(chunk) {
                Ok(doc) => RunInput::Parsed(doc),
                Err(e) => RunInput::Unparsable { reason: e.to_string() },
            };
            (format!("run{i}"), input)
        })
        .collect();

    let Ok(analysis) = analyze(inputs, &AnalysisConfig::default()) else {
        return;
    };
    for profile in &analysis.profiles {
        for run in &profile.runs {
            for mp in &run.max_performance {
                assert!(mp.max_lr_perc <= 100.0 || mp.max_lr_perc.is_nan());
            }
        }
        for series in profile.throughput_series.iter().chain(&profile.error_series) {
            assert!(series.values.len() <= profile.ideal.len());
        }
    }
    let _ = serde_json::to_string(&analysis);
});
