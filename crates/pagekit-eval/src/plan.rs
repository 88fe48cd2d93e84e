// Plan generator: expands {model} x {scenario} x {trial} into work items
// Filters intersect with the enabled list; unknown names drop out
// silently and a non-matching override yields an empty plan, not an error.

use serde::{Deserialize, Serialize};

use crate::registry::Registry;

/// The (model, scenario) pair mirrored into tags and metadata for
/// downstream reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    pub model: String,
    pub scenario: String,
}

/// One scheduled (scenario, model, trial) unit of execution. Immutable
/// once generated; never reused across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub scenario: String,
    pub model: String,
    pub trial: usize,
    pub tags: Vec<String>,
    pub metadata: ItemMetadata,
}

impl WorkItem {
    fn new(scenario: &str, model: &str, trial: usize) -> Self {
        Self {
            scenario: scenario.to_string(),
            model: model.to_string(),
            trial,
            tags: vec![format!("model:{}", model), format!("scenario:{}", scenario)],
            metadata: ItemMetadata {
                model: model.to_string(),
                scenario: scenario.to_string(),
            },
        }
    }
}

/// Optional plan filters. Both intersect with the enabled-scenario list.
#[derive(Debug, Clone, Default)]
pub struct PlanFilter {
    /// Explicit allow-list of scenario names.
    pub allowlist: Option<Vec<String>>,
    /// Single-name override, usually from the CLI positional argument.
    pub only: Option<String>,
}

/// Expand the execution plan. Order is deterministic: models outer,
/// scenarios next, trial indices inner. Every emitted name is present in
/// the registry; names that are not drop out silently (a configuration
/// fault surfaces as a degenerate plan by contract).
pub fn build_plan(
    registry: &Registry,
    models: &[String],
    enabled: &[String],
    trials: usize,
    filter: &PlanFilter,
) -> Vec<WorkItem> {
    let selected: Vec<&String> = enabled
        .iter()
        .filter(|name| registry.contains(name))
        .filter(|name| match &filter.allowlist {
            Some(allow) => allow.iter().any(|a| a == *name),
            None => true,
        })
        .filter(|name| match &filter.only {
            Some(only) => only == *name,
            None => true,
        })
        .collect();

    let mut items = Vec::with_capacity(models.len() * selected.len() * trials);
    for model in models {
        for scenario in &selected {
            for trial in 0..trials {
                items.push(WorkItem::new(scenario, model, trial));
            }
        }
    }
    items
}
