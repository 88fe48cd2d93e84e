// Gate: converts the summary artifact into a pipeline pass/fail verdict
// Hard failure paths, never soft warnings: missing artifact, unparsable
// artifact, null percentage, or percentage below the threshold all fail.

use std::path::Path;

use crate::summary::read_summary;

/// Minimum exact-match percentage for the gate to pass.
pub const ACCURACY_THRESHOLD: f64 = 85.0;

/// The gate verdict. `exit_code` is the process exit for CI.
#[derive(Debug, Clone, PartialEq)]
pub enum GateVerdict {
    Pass { percent: f64 },
    Fail { reason: String },
}

impl GateVerdict {
    pub fn exit_code(&self) -> i32 {
        match self {
            GateVerdict::Pass { .. } => 0,
            GateVerdict::Fail { .. } => 1,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            GateVerdict::Pass { percent } => format!(
                "gate passed: exact-match {:.1}% >= {:.1}%",
                percent, ACCURACY_THRESHOLD
            ),
            GateVerdict::Fail { reason } => format!("gate failed: {}", reason),
        }
    }
}

/// Evaluate the gate against a summary artifact. Never panics and never
/// returns an error; every fault becomes a failing verdict with a
/// diagnostic reason.
pub fn evaluate_gate(path: &Path) -> GateVerdict {
    let summary = match read_summary(path) {
        Ok(summary) => summary,
        Err(error) => {
            return GateVerdict::Fail {
                reason: format!("{:#}", error),
            };
        }
    };

    match summary.exact_match_score_percent {
        Some(percent) if percent >= ACCURACY_THRESHOLD => GateVerdict::Pass { percent },
        Some(percent) => GateVerdict::Fail {
            reason: format!(
                "exact-match {:.1}% below threshold {:.1}%",
                percent, ACCURACY_THRESHOLD
            ),
        },
        None => GateVerdict::Fail {
            reason: "summary has no exact-match percentage (no tasks scored)".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{Summary, TaskRef, write_summary};

    fn task_ref(name: &str) -> TaskRef {
        TaskRef {
            name: name.to_string(),
            model_identifier: "m1".to_string(),
        }
    }

    fn write(dir: &tempfile::TempDir, summary: &Summary) -> std::path::PathBuf {
        let path = dir.path().join("eval-summary.json");
        write_summary(summary, &path).unwrap();
        path
    }

    #[test]
    fn passes_at_ninety_percent() {
        let dir = tempfile::tempdir().unwrap();
        let summary = Summary {
            exact_match_score_percent: Some(90.0),
            total_tasks: 10,
            passed_tasks: (0..9).map(|i| task_ref(&format!("s{}", i))).collect(),
            failed_tasks: vec![task_ref("s9")],
        };
        let verdict = evaluate_gate(&write(&dir, &summary));
        assert_eq!(verdict.exit_code(), 0);
        assert_eq!(verdict, GateVerdict::Pass { percent: 90.0 });
    }

    #[test]
    fn fails_at_eighty_percent() {
        let dir = tempfile::tempdir().unwrap();
        let summary = Summary {
            exact_match_score_percent: Some(80.0),
            total_tasks: 10,
            passed_tasks: (0..8).map(|i| task_ref(&format!("s{}", i))).collect(),
            failed_tasks: vec![task_ref("s8"), task_ref("s9")],
        };
        let verdict = evaluate_gate(&write(&dir, &summary));
        assert_ne!(verdict.exit_code(), 0);
        assert!(verdict.describe().contains("below threshold"));
    }

    #[test]
    fn passes_exactly_at_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let summary = Summary {
            exact_match_score_percent: Some(ACCURACY_THRESHOLD),
            total_tasks: 0,
            passed_tasks: vec![],
            failed_tasks: vec![],
        };
        assert_eq!(evaluate_gate(&write(&dir, &summary)).exit_code(), 0);
    }

    #[test]
    fn missing_artifact_fails_with_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let verdict = evaluate_gate(&dir.path().join("no-such-file.json"));
        assert_ne!(verdict.exit_code(), 0);
        assert!(verdict.describe().contains("no-such-file.json"));
    }

    #[test]
    fn unparsable_artifact_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eval-summary.json");
        std::fs::write(&path, "not json {").unwrap();
        let verdict = evaluate_gate(&path);
        assert_ne!(verdict.exit_code(), 0);
        assert!(verdict.describe().contains("parse"));
    }

    #[test]
    fn null_percentage_fails_never_passes() {
        let dir = tempfile::tempdir().unwrap();
        let summary = Summary {
            exact_match_score_percent: None,
            total_tasks: 0,
            passed_tasks: vec![],
            failed_tasks: vec![],
        };
        let verdict = evaluate_gate(&write(&dir, &summary));
        assert_ne!(verdict.exit_code(), 0);
        assert!(verdict.describe().contains("no exact-match percentage"));
    }
}
