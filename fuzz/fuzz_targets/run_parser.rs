#![no_main]

use libfuzzer_sys::fuzz_target;
use ltgraph_core::Run;

fuzz_target!(|data: &[u8]| {
    let Ok(doc) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    if let Ok(run) = Run::from_json("fuzz", doc) {
        // a parsed run always exposes its config tuple
        let tuple = run.config_tuple();
        assert_eq!(tuple.len(), ltgraph_core::run::CONFIG_KEYS.len());
        let _ = run.profile_file();
    }
});
