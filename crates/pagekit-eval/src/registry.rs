// Scenario registry: an explicit, constructed mapping from scenario name
// to body. No process-wide singleton; tests build their own registries.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use pagekit::EvalLogger;

use crate::outcome::Outcome;

/// Inputs handed to one scenario invocation. The model identifier is
/// opaque; the logger is fresh and owned by this invocation.
#[derive(Debug, Clone)]
pub struct ScenarioContext {
    pub model: String,
    pub logger: EvalLogger,
}

/// One named browser-automation scenario.
///
/// Bodies must set `success` explicitly, should attach their logger's
/// lines and session URLs, and should record faults in `error` rather
/// than returning `Err` — though the scheduler tolerates both `Err`
/// returns and panics.
#[async_trait]
pub trait Scenario: Send + Sync {
    async fn run(&self, ctx: ScenarioContext) -> anyhow::Result<Outcome>;
}

/// Adapter so plain async closures can act as scenarios in tests and
/// small registries.
pub struct FnScenario<F>(F);

#[async_trait]
impl<F> Scenario for FnScenario<F>
where
    F: Fn(ScenarioContext) -> BoxFuture<'static, anyhow::Result<Outcome>> + Send + Sync,
{
    async fn run(&self, ctx: ScenarioContext) -> anyhow::Result<Outcome> {
        (self.0)(ctx).await
    }
}

/// Fixed mapping from scenario name to body. Read-only after
/// construction.
#[derive(Clone, Default)]
pub struct Registry {
    entries: HashMap<String, Arc<dyn Scenario>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, scenario: Arc<dyn Scenario>) {
        self.entries.insert(name.into(), scenario);
    }

    pub fn register_fn<F>(&mut self, name: impl Into<String>, body: F)
    where
        F: Fn(ScenarioContext) -> BoxFuture<'static, anyhow::Result<Outcome>>
            + Send
            + Sync
            + 'static,
    {
        self.register(name, Arc::new(FnScenario(body)));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Scenario>> {
        self.entries.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in deterministic order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let mut registry = Registry::new();
        registry.register_fn("alpha", |_ctx| Box::pin(async { Ok(Outcome::passed()) }));
        registry.register_fn("beta", |_ctx| Box::pin(async { Ok(Outcome::failed()) }));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("alpha"));
        assert!(!registry.contains("gamma"));
        assert_eq!(registry.names(), ["alpha", "beta"]);
    }

    #[tokio::test]
    async fn fn_scenario_runs() {
        let mut registry = Registry::new();
        registry.register_fn("echo-model", |ctx| {
            Box::pin(async move {
                Ok(Outcome::passed().with_field("model", serde_json::json!(ctx.model)))
            })
        });

        let scenario = registry.get("echo-model").unwrap();
        let outcome = scenario
            .run(ScenarioContext {
                model: "model-x".to_string(),
                logger: EvalLogger::new(),
            })
            .await
            .unwrap();
        assert_eq!(outcome.extra["model"], "model-x");
    }
}
