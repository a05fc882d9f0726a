//! Fails CI when a criterion benchmark median exceeds its budget.
//!
//! Usage: `bench-guard [criterion-dir]` (defaults to `target/criterion`).

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Median budgets in nanoseconds. Loose on purpose: they catch order of
/// magnitude regressions, not noise.
const BUDGETS: [(&str, u64); 4] = [
    ("machine/encode_1k", 200_000),
    ("scorer/evaluate_sentence", 100_000),
    ("search/stage_one_structure", 500_000_000),
    ("search/plugboard_step", 50_000_000),
];

fn main() -> ExitCode {
    let requested = env::args().nth(1).unwrap_or_else(|| "target/criterion".to_string());
    let Some(root) = locate(&requested) else {
        eprintln!("bench-guard: criterion dir not found: {requested}");
        return ExitCode::from(2);
    };

    let mut failures = Vec::new();
    for (bench, budget_ns) in BUDGETS {
        match median_ns(&root, bench) {
            Ok(median) if median > budget_ns => {
                failures.push(format!("{bench}: median {median}ns > budget {budget_ns}ns"));
            }
            Ok(median) => println!("{bench}: median {median}ns (budget {budget_ns}ns)"),
            Err(err) => failures.push(format!("{bench}: {err}")),
        }
    }

    if failures.is_empty() {
        return ExitCode::SUCCESS;
    }
    eprintln!("bench-guard failed:");
    for failure in failures {
        eprintln!("- {failure}");
    }
    ExitCode::FAILURE
}

/// Resolves `requested`, walking up from the working directory for relative
/// paths since the target dir may live above the crate.
fn locate(requested: &str) -> Option<PathBuf> {
    let path = Path::new(requested);
    if path.exists() {
        return Some(path.to_path_buf());
    }
    if path.is_absolute() {
        return None;
    }
    env::current_dir()
        .ok()?
        .ancestors()
        .take(6)
        .map(|dir| dir.join(path))
        .find(|candidate| candidate.exists())
}

fn median_ns(root: &Path, bench: &str) -> Result<u64, String> {
    // Criterion layout: <root>/<group>/<id>/new/estimates.json
    let estimates = root.join(bench).join("new").join("estimates.json");
    let bytes = fs::read(&estimates).map_err(|e| format!("read {}: {e}", estimates.display()))?;
    let json: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|e| format!("parse {}: {e}", estimates.display()))?;

    let median = json
        .pointer("/median/point_estimate")
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| format!("no median.point_estimate in {}", estimates.display()))?;
    if !median.is_finite() || median < 0.0 {
        return Err(format!("invalid median {median} in {}", estimates.display()));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(median.round() as u64)
}
