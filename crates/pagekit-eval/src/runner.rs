// Runner: orchestrates the full eval pipeline
// Build plan -> schedule under the concurrency bound -> score -> summary
// Any error escaping here is a run-level fault; main turns it into a
// non-zero exit.

use anyhow::Result;

use crate::config::RunConfig;
use crate::plan::{PlanFilter, build_plan};
use crate::registry::Registry;
use crate::scheduler;
use crate::scorer::{ERROR_RATE, ScoredTask, score_reports};
use crate::summary::{Summary, build_summary, write_summary};

pub async fn run_eval(
    config: &RunConfig,
    registry: &Registry,
    only: Option<String>,
) -> Result<Summary> {
    let filter = PlanFilter {
        allowlist: config.tasks.clone(),
        only,
    };
    let enabled = registry.names();
    let plan = build_plan(registry, &config.models, &enabled, config.trials, &filter);

    println!(
        "Running {} work items: {} models x {} scenarios x {} trials (concurrency={})",
        plan.len(),
        config.models.len(),
        enabled.len(),
        config.trials,
        config.concurrency,
    );
    println!();

    let reports = scheduler::run_plan(registry, plan, config.concurrency).await;
    let scored = score_reports(reports);

    print_terminal_report(&scored);

    let summary = build_summary(&scored);
    write_summary(&summary, &config.summary_path)?;
    println!("Saved summary: {}", config.summary_path.display());

    Ok(summary)
}

fn print_terminal_report(scored: &[ScoredTask]) {
    for task in scored {
        let item = &task.report.item;
        let outcome = &task.report.outcome;
        let status = if outcome.success { "PASS" } else { "FAIL" };
        let errored = task.score(ERROR_RATE).unwrap_or(0.0) > 0.0;
        print!(
            "  [{}] {} ({}) trial {}",
            status, item.scenario, item.model, item.trial
        );
        if errored {
            if let Some(error) = &outcome.error {
                print!(" - error: {}", error.message);
            }
        }
        println!();
    }

    let total = scored.len();
    let passed = scored
        .iter()
        .filter(|task| task.report.outcome.success)
        .count();
    println!();
    println!("--- Summary ({}) ---", chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"));
    println!("  Tasks: {}/{} passed", passed, total);
}
