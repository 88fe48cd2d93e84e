// Scheduler: drains the work-item list through a bounded pool
// A semaphore caps concurrently in-flight invocations; every fault is
// caught at the invocation boundary and converted into a failed outcome.
// Results are collected in completion order, one report per work item.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use pagekit::EvalLogger;

use crate::outcome::Outcome;
use crate::plan::WorkItem;
use crate::registry::{Registry, Scenario, ScenarioContext};

/// One work item paired with its captured outcome.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub item: WorkItem,
    pub outcome: Outcome,
}

/// Execute the plan with at most `concurrency` invocations in flight.
///
/// Each invocation owns a fresh [`EvalLogger`] and shares no state with
/// its siblings; trials of the same (model, scenario) pair are fully
/// independent. Scenario bodies release their own backend resources on
/// every exit path — the scheduler cannot clean up sessions it did not
/// acquire. A run-level timeout, if any, is enforced by the invoking
/// process; invocations abandoned that way get no cleanup callback, which
/// is a known resource-leak risk.
pub async fn run_plan(
    registry: &Registry,
    plan: Vec<WorkItem>,
    concurrency: usize,
) -> Vec<TaskReport> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut join_set = JoinSet::new();
    let mut in_flight: HashMap<tokio::task::Id, WorkItem> = HashMap::new();
    let mut reports = Vec::with_capacity(plan.len());

    for item in plan {
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                // Semaphore closed mid-run; still emit one report per item.
                reports.push(TaskReport {
                    outcome: Outcome::from_fault("scheduler pool closed", "semaphore closed"),
                    item,
                });
                continue;
            }
        };

        let Some(scenario) = registry.get(&item.scenario) else {
            reports.push(TaskReport {
                outcome: Outcome::from_fault(
                    format!("unknown scenario: {}", item.scenario),
                    "registry lookup failed",
                ),
                item,
            });
            continue;
        };

        let logger = EvalLogger::new();
        let ctx = ScenarioContext {
            model: item.model.clone(),
            logger: logger.clone(),
        };
        let id = join_set
            .spawn(async move {
                let _permit = permit;
                isolate(scenario, ctx, logger).await
            })
            .id();
        in_flight.insert(id, item);
    }

    while let Some(joined) = join_set.join_next_with_id().await {
        match joined {
            Ok((id, outcome)) => {
                if let Some(item) = in_flight.remove(&id) {
                    reports.push(TaskReport { item, outcome });
                }
            }
            Err(join_error) => {
                let id = join_error.id();
                if let Some(item) = in_flight.remove(&id) {
                    reports.push(TaskReport {
                        item,
                        outcome: Outcome::from_fault(
                            format!("task join error: {}", join_error),
                            "invocation task did not complete",
                        ),
                    });
                }
            }
        }
    }

    reports
}

/// Isolation combinator: run one scenario invocation and convert every
/// fault — `Err` return, panic, anything — into a failed outcome. Faults
/// never propagate to sibling invocations or the run.
async fn isolate(scenario: Arc<dyn Scenario>, ctx: ScenarioContext, logger: EvalLogger) -> Outcome {
    let mut outcome = match AssertUnwindSafe(scenario.run(ctx)).catch_unwind().await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(error)) => {
            logger.error(format!("scenario fault: {:#}", error));
            Outcome::from_fault(format!("{:#}", error), format!("{:?}", error))
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            logger.error(format!("scenario panicked: {}", message));
            Outcome::from_fault(message, "panic at the invocation boundary")
        }
    };

    // Bodies attach logs themselves; fill in whatever they did not.
    if outcome.logs.is_empty() {
        outcome.logs = logger.take_lines();
    }
    if outcome.debug_url.is_none() {
        outcome.debug_url = logger.debug_url();
    }
    if outcome.session_url.is_none() {
        outcome.session_url = logger.session_url();
    }
    outcome
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{PlanFilter, build_plan};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn plan_for(registry: &Registry, models: &[&str], trials: usize) -> Vec<WorkItem> {
        let models: Vec<String> = models.iter().map(|s| s.to_string()).collect();
        build_plan(
            registry,
            &models,
            &registry.names(),
            trials,
            &PlanFilter::default(),
        )
    }

    #[tokio::test]
    async fn one_report_per_item_under_mixed_faults() {
        let mut registry = Registry::new();
        registry.register_fn("passes", |ctx| {
            Box::pin(async move {
                ctx.logger.info("all good");
                Ok(Outcome::passed())
            })
        });
        registry.register_fn("errors", |ctx| {
            Box::pin(async move {
                ctx.logger.error("about to fail");
                anyhow::bail!("backend exploded")
            })
        });
        registry.register_fn("panics", |_ctx| {
            Box::pin(async move { panic!("scenario body panicked") })
        });

        let plan = plan_for(&registry, &["m1"], 1);
        let reports = run_plan(&registry, plan, 4).await;
        assert_eq!(reports.len(), 3);

        let by_name = |name: &str| {
            reports
                .iter()
                .find(|r| r.item.scenario == name)
                .unwrap_or_else(|| panic!("missing report for {}", name))
        };

        assert!(by_name("passes").outcome.success);
        assert!(by_name("passes").outcome.error.is_none());

        let errored = &by_name("errors").outcome;
        assert!(!errored.success);
        let error = errored.error.as_ref().unwrap();
        assert!(error.message.contains("backend exploded"));
        assert!(!errored.logs.is_empty());

        let panicked = &by_name("panics").outcome;
        assert!(!panicked.success);
        assert!(
            panicked
                .error
                .as_ref()
                .unwrap()
                .message
                .contains("scenario body panicked")
        );
    }

    #[tokio::test]
    async fn a_panicking_sibling_does_not_abort_others() {
        let mut registry = Registry::new();
        registry.register_fn("boom", |_ctx| Box::pin(async { panic!("boom") }));
        registry.register_fn("slow-ok", |_ctx| {
            Box::pin(async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(Outcome::passed())
            })
        });

        let plan = plan_for(&registry, &["m1", "m2"], 2);
        let reports = run_plan(&registry, plan, 4).await;
        assert_eq!(reports.len(), 8);
        let survivors = reports
            .iter()
            .filter(|r| r.item.scenario == "slow-ok" && r.outcome.success)
            .count();
        assert_eq!(survivors, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrency_bound_is_respected() {
        static RUNNING: AtomicUsize = AtomicUsize::new(0);
        static PEAK: AtomicUsize = AtomicUsize::new(0);
        RUNNING.store(0, Ordering::SeqCst);
        PEAK.store(0, Ordering::SeqCst);

        let mut registry = Registry::new();
        registry.register_fn("timed", |_ctx| {
            Box::pin(async {
                let now = RUNNING.fetch_add(1, Ordering::SeqCst) + 1;
                PEAK.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                RUNNING.fetch_sub(1, Ordering::SeqCst);
                Ok(Outcome::passed())
            })
        });

        let plan = plan_for(&registry, &["m1"], 5);
        assert_eq!(plan.len(), 5);
        let reports = run_plan(&registry, plan, 2).await;
        assert_eq!(reports.len(), 5);
        assert!(
            PEAK.load(Ordering::SeqCst) <= 2,
            "peak in-flight was {}",
            PEAK.load(Ordering::SeqCst)
        );
    }

    #[tokio::test]
    async fn each_invocation_gets_a_fresh_logger() {
        let mut registry = Registry::new();
        registry.register_fn("logs-once", |ctx| {
            Box::pin(async move {
                ctx.logger.info("one line");
                Ok(Outcome::passed())
            })
        });

        let plan = plan_for(&registry, &["m1"], 3);
        let reports = run_plan(&registry, plan, 3).await;
        assert_eq!(reports.len(), 3);
        for report in &reports {
            assert_eq!(report.outcome.logs.len(), 1, "loggers were shared");
        }
    }

    #[tokio::test]
    async fn unknown_scenario_in_plan_becomes_failed_outcome() {
        let registry = Registry::new();
        let plan = vec![WorkItem {
            scenario: "ghost".to_string(),
            model: "m1".to_string(),
            trial: 0,
            tags: vec![],
            metadata: crate::plan::ItemMetadata {
                model: "m1".to_string(),
                scenario: "ghost".to_string(),
            },
        }];
        let reports = run_plan(&registry, plan, 1).await;
        assert_eq!(reports.len(), 1);
        assert!(!reports[0].outcome.success);
        assert!(
            reports[0]
                .outcome
                .error
                .as_ref()
                .unwrap()
                .message
                .contains("unknown scenario")
        );
    }

    #[tokio::test]
    async fn empty_plan_yields_no_reports() {
        let registry = Registry::new();
        let reports = run_plan(&registry, Vec::new(), 8).await;
        assert!(reports.is_empty());
    }
}
