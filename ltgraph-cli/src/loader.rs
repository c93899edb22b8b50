//! Loadtest input acquisition.
//!
//! Reads each input file and decodes it as JSON. Failures do not stop loading: they are
//! turned into [`RunInput::Unparsable`] markers so the validator can report every broken
//! input at once.

use ltgraph_core::RunInput;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, error, warn};

/// Run name for an input path: the file name without its `.json` extension.
pub fn run_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    match file_name.strip_suffix(".json") {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => file_name,
    }
}

/// Load a single input file.
pub fn load_run(path: &Path) -> RunInput {
    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|data| serde_json::from_str(&data).map_err(|e| e.to_string()));
    match parsed {
        Ok(doc) => {
            debug!(path = %path.display(), "loaded loadtest");
            RunInput::Parsed(doc)
        }
        Err(reason) => {
            // keep the first line only, decoder errors can be long
            let reason = reason.lines().next().unwrap_or_default().to_string();
            error!("input '{}' can't be parsed as json: {}", path.display(), reason);
            RunInput::Unparsable { reason }
        }
    }
}

/// Load every input, keyed by run name. A later file with the same name replaces an earlier one.
pub fn load_runs<P: AsRef<Path>>(paths: &[P]) -> BTreeMap<String, RunInput> {
    let mut runs = BTreeMap::new();
    for path in paths {
        let path = path.as_ref();
        let name = run_name(path);
        if runs.insert(name.clone(), load_run(path)).is_some() {
            warn!(run = %name, path = %path.display(), "duplicate run name, keeping the later input");
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn run_names_drop_json_extension() {
        assert_eq!(run_name(Path::new("/tmp/results/run-1.json")), "run-1");
        assert_eq!(run_name(Path::new("run.txt")), "run.txt");
        assert_eq!(run_name(Path::new("dir/.json")), ".json");
    }

    #[test]
    fn unreadable_and_garbled_inputs_become_markers() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.json");
        fs::write(&good, r#"{"vars": {}, "stats": []}"#).unwrap();
        let mut f = fs::File::create(&bad).unwrap();
        writeln!(f, "{{ not json").unwrap();
        let missing = dir.path().join("missing.json");

        let runs = load_runs(&[good, bad, missing]);
        assert_eq!(runs.len(), 3);
        assert!(matches!(runs["good"], RunInput::Parsed(_)));
        assert!(matches!(runs["bad"], RunInput::Unparsable { .. }));
        assert!(matches!(runs["missing"], RunInput::Unparsable { .. }));
    }
}
