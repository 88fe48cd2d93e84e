// Aggregator: reduces scored reports into the persisted summary
// Recomputed fresh on every run; the JSON artifact is the single
// externally persisted output and is always overwritten, never appended.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::scorer::{EXACT_MATCH, ScoredTask};

/// A scenario with model attribution, as listed in pass/fail partitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    pub name: String,
    pub model_identifier: String,
}

/// The persisted run summary consumed by the gate step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Mean exact-match score across all outcomes, as a 0-100 percentage.
    /// `null` when no scores exist; the gate treats that as failure.
    pub exact_match_score_percent: Option<f64>,
    pub total_tasks: usize,
    pub passed_tasks: Vec<TaskRef>,
    pub failed_tasks: Vec<TaskRef>,
}

/// Reduce scored reports to a summary. Deterministic: the same input
/// sequence always yields a byte-identical artifact.
pub fn build_summary(tasks: &[ScoredTask]) -> Summary {
    let mut passed_tasks = Vec::new();
    let mut failed_tasks = Vec::new();
    let mut exact_sum = 0.0;
    let mut exact_count = 0usize;

    for task in tasks {
        let item = &task.report.item;
        let task_ref = TaskRef {
            name: item.scenario.clone(),
            model_identifier: item.model.clone(),
        };
        if task.report.outcome.success {
            passed_tasks.push(task_ref);
        } else {
            failed_tasks.push(task_ref);
        }
        if let Some(value) = task.score(EXACT_MATCH) {
            exact_sum += value;
            exact_count += 1;
        }
    }

    let exact_match_score_percent = if exact_count == 0 {
        None
    } else {
        Some(exact_sum / exact_count as f64 * 100.0)
    };

    Summary {
        exact_match_score_percent,
        total_tasks: tasks.len(),
        passed_tasks,
        failed_tasks,
    }
}

/// Write the summary artifact, overwriting any previous run's file.
pub fn write_summary(summary: &Summary, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("serialize summary")?;
    fs::write(path, json)
        .with_context(|| format!("failed to write summary: {}", path.display()))?;
    Ok(())
}

/// Read a summary artifact back. Used by the gate step.
pub fn read_summary(path: &Path) -> Result<Summary> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read summary: {}", path.display()))?;
    let summary = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse summary: {}", path.display()))?;
    Ok(summary)
}
