//! Automation session contract
//!
//! The capability set scenario bodies drive a page through: navigate,
//! perform a semantic action, observe candidate elements, extract
//! structured data, release the session. The eval engine never calls these
//! directly; it only guarantees the logger and fault-isolation context the
//! scenario runs inside.
//!
//! Scenario bodies acquire sessions through a [`SessionFactory`] and are
//! responsible for calling [`Session::close`] on every exit path,
//! including the error path. The scheduler cannot release resources it
//! did not acquire.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Where the browser runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Locally launched browser.
    #[default]
    Local,
    /// Remote-hosted browser service.
    Remote,
}

impl Environment {
    /// Parse an environment selector. Unrecognized values fall back to
    /// `Local`; configuration faults degrade, they do not throw.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "remote" => Environment::Remote,
            _ => Environment::Local,
        }
    }
}

/// Per-session configuration passed to the [`SessionFactory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub environment: Environment,
    pub headless: bool,
    pub enable_caching: bool,
    /// Backend model identifier. Opaque to the engine; passed through.
    pub model: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Local,
            headless: true,
            enable_caching: true,
            model: String::new(),
        }
    }
}

impl SessionConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn enable_caching(mut self, enable_caching: bool) -> Self {
        self.enable_caching = enable_caching;
        self
    }
}

/// Result of one semantic action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActResult {
    pub success: bool,
    pub message: String,
    /// The action the backend resolved the instruction to.
    pub action: String,
}

impl ActResult {
    pub fn ok(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: true,
            action: message.clone(),
            message,
        }
    }
}

/// A candidate element returned by observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedElement {
    pub selector: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
}

/// One live automation session.
///
/// All operations suspend only at I/O boundaries inside the backend;
/// there is no preemption between them.
#[async_trait]
pub trait Session: Send + Sync {
    /// Navigate to a URL.
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Perform a semantic action described in natural language, with
    /// optional variable substitutions.
    async fn act(
        &mut self,
        instruction: &str,
        variables: Option<&BTreeMap<String, String>>,
    ) -> Result<ActResult>;

    /// Observe candidate elements, optionally narrowed by an instruction.
    async fn observe(&mut self, instruction: Option<&str>) -> Result<Vec<ObservedElement>>;

    /// Extract structured data matching a JSON-schema shape, optionally
    /// with a model override.
    async fn extract(
        &mut self,
        instruction: &str,
        schema: &serde_json::Value,
        model_override: Option<&str>,
    ) -> Result<serde_json::Value>;

    /// Release the session and its backend resources.
    async fn close(&mut self) -> Result<()>;

    /// Live-view URL for debugging, when the backend exposes one.
    fn debug_url(&self) -> Option<&str>;

    /// Recorded-session URL, when the backend exposes one.
    fn session_url(&self) -> Option<&str>;
}

/// Creates sessions. One factory serves many concurrent invocations; each
/// invocation owns the session it acquires.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn create(&self, config: &SessionConfig) -> Result<Box<dyn Session>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parse_is_lenient() {
        assert_eq!(Environment::parse("remote"), Environment::Remote);
        assert_eq!(Environment::parse("REMOTE"), Environment::Remote);
        assert_eq!(Environment::parse("local"), Environment::Local);
        assert_eq!(Environment::parse("garbage"), Environment::Local);
        assert_eq!(Environment::parse(""), Environment::Local);
    }

    #[test]
    fn session_config_builder() {
        let config = SessionConfig::new("model-x")
            .environment(Environment::Remote)
            .headless(false)
            .enable_caching(false);
        assert_eq!(config.environment, Environment::Remote);
        assert!(!config.headless);
        assert!(!config.enable_caching);
        assert_eq!(config.model, "model-x");
    }
}
