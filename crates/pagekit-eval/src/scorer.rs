// Scoring pipeline: pure scoring functions over (output, expected) pairs
// Two metrics, deliberately independent: exact_match measures correctness
// via the normalized success flag (or strict equality against an explicit
// expected value); error_rate measures error *presence* only. A scenario
// that succeeds while recording an error scores 1 on both.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::outcome::{Outcome, normalized_success};
use crate::scheduler::TaskReport;

pub const EXACT_MATCH: &str = "exact_match";
pub const ERROR_RATE: &str = "error_rate";

/// One named numeric score in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub name: String,
    pub value: f64,
}

impl Score {
    fn binary(name: &str, hit: bool) -> Self {
        Self {
            name: name.to_string(),
            value: if hit { 1.0 } else { 0.0 },
        }
    }
}

/// Binary correctness score. `expected` defaults to boolean `true`, in
/// which case the output's normalized success flag decides; any other
/// expected value requires strict equality.
pub fn exact_match(output: &Value, expected: Option<&Value>) -> Score {
    let hit = match expected {
        None | Some(Value::Bool(true)) => normalized_success(output),
        Some(expected) => output == expected,
    };
    Score::binary(EXACT_MATCH, hit)
}

/// Binary error-presence score: 1 iff the output carries a non-null
/// `error` field. Independent of success by design.
pub fn error_rate(output: &Value) -> Score {
    let hit = output
        .get("error")
        .map(|error| !error.is_null())
        .unwrap_or(false);
    Score::binary(ERROR_RATE, hit)
}

/// Run every scoring function over one outcome.
pub fn score_outcome(outcome: &Outcome) -> Vec<Score> {
    let output = serde_json::to_value(outcome).unwrap_or(Value::Null);
    vec![exact_match(&output, None), error_rate(&output)]
}

/// A task report with its attached score set.
#[derive(Debug, Clone)]
pub struct ScoredTask {
    pub report: TaskReport,
    pub scores: Vec<Score>,
}

impl ScoredTask {
    pub fn score(&self, name: &str) -> Option<f64> {
        self.scores
            .iter()
            .find(|score| score.name == name)
            .map(|score| score.value)
    }
}

/// Score every report; exactly one score set per work item.
pub fn score_reports(reports: Vec<TaskReport>) -> Vec<ScoredTask> {
    reports
        .into_iter()
        .map(|report| ScoredTask {
            scores: score_outcome(&report.outcome),
            report,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exact_match_success_flag() {
        assert_eq!(exact_match(&json!({"success": true}), None).value, 1.0);
        assert_eq!(exact_match(&json!({"success": false}), None).value, 0.0);
        assert_eq!(exact_match(&json!({}), None).value, 0.0);
    }

    #[test]
    fn exact_match_explicit_expected() {
        assert_eq!(exact_match(&json!(true), Some(&json!(true))).value, 1.0);
        assert_eq!(exact_match(&json!("x"), Some(&json!("y"))).value, 0.0);
        assert_eq!(exact_match(&json!("y"), Some(&json!("y"))).value, 1.0);
        assert_eq!(exact_match(&json!(3), Some(&json!(3))).value, 1.0);
    }

    #[test]
    fn error_rate_presence() {
        assert_eq!(
            error_rate(&json!({"error": {"message": "boom"}})).value,
            1.0
        );
        assert_eq!(error_rate(&json!({})).value, 0.0);
        assert_eq!(error_rate(&json!({"error": null})).value, 0.0);
    }

    #[test]
    fn successful_assertion_of_absence_scores_on_both_metrics() {
        // Negative-test scenarios record an error while succeeding; the
        // two metrics must not be conflated.
        let outcome = Outcome {
            success: true,
            error: Some(crate::outcome::OutcomeError::new(
                "promo popup capability absent",
                "asserted",
            )),
            ..Outcome::default()
        };
        let scores = score_outcome(&outcome);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].name, EXACT_MATCH);
        assert_eq!(scores[0].value, 1.0);
        assert_eq!(scores[1].name, ERROR_RATE);
        assert_eq!(scores[1].value, 1.0);
    }

    #[test]
    fn every_outcome_gets_both_scores() {
        let scores = score_outcome(&Outcome::failed());
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].value, 0.0);
        assert_eq!(scores[1].value, 0.0);
    }
}
