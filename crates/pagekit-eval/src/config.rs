// Run configuration from environment-style inputs
// Malformed values fall back to defaults: configuration faults degrade,
// they never abort a run.

use std::env;
use std::path::PathBuf;

use pagekit::{Environment, SessionConfig};

pub const DEFAULT_CONCURRENCY: usize = 20;
pub const DEFAULT_TRIALS: usize = 3;
pub const DEFAULT_SUMMARY_PATH: &str = "eval-summary.json";

const DEFAULT_MODELS: &[&str] = &["gpt-4o", "claude-3-5-sonnet-latest"];

/// Resolved run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub environment: Environment,
    pub headless: bool,
    pub enable_caching: bool,
    /// Allow-list of enabled scenario names, from EVAL_TASKS.
    pub tasks: Option<Vec<String>>,
    /// Maximum concurrently in-flight invocations.
    pub concurrency: usize,
    /// Independent repetitions per (model, scenario) pair. Sampling, not
    /// retry.
    pub trials: usize,
    pub models: Vec<String>,
    pub summary_path: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Local,
            headless: true,
            enable_caching: true,
            tasks: None,
            concurrency: DEFAULT_CONCURRENCY,
            trials: DEFAULT_TRIALS,
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            summary_path: PathBuf::from(DEFAULT_SUMMARY_PATH),
        }
    }
}

impl RunConfig {
    /// Read configuration from the environment:
    /// EVAL_ENV, HEADLESS, ENABLE_CACHING, EVAL_TASKS, EVAL_CONCURRENCY,
    /// EVAL_TRIAL_COUNT, EVAL_MODELS, EVAL_SUMMARY_PATH.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            environment: env::var("EVAL_ENV")
                .map(|value| Environment::parse(&value))
                .unwrap_or(defaults.environment),
            headless: env_bool("HEADLESS", defaults.headless),
            enable_caching: env_bool("ENABLE_CACHING", defaults.enable_caching),
            tasks: env::var("EVAL_TASKS").ok().map(|value| parse_list(&value)),
            concurrency: env_usize("EVAL_CONCURRENCY", defaults.concurrency),
            trials: env_usize("EVAL_TRIAL_COUNT", defaults.trials),
            models: env::var("EVAL_MODELS")
                .ok()
                .map(|value| parse_list(&value))
                .filter(|models| !models.is_empty())
                .unwrap_or(defaults.models),
            summary_path: env::var("EVAL_SUMMARY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.summary_path),
        }
    }

    /// Session configuration for one invocation against `model`.
    pub fn session_config(&self, model: &str) -> SessionConfig {
        SessionConfig::new(model)
            .environment(self.environment)
            .headless(self.headless)
            .enable_caching(self.enable_caching)
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_bool(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .filter(|parsed| *parsed > 0)
        .unwrap_or(default)
}
