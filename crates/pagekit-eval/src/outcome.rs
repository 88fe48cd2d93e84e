// Outcome record: the captured result of one scenario invocation
// `success` is the single boolean contract every scenario must set;
// a missing flag deserializes to false, never to success.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use pagekit::LogLine;

/// Structured error captured at the invocation boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeError {
    pub message: String,
    pub trace: String,
}

impl OutcomeError {
    pub fn new(message: impl Into<String>, trace: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: trace.into(),
        }
    }
}

/// Result of one scenario invocation. Immutable once the scheduler hands
/// it to scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub logs: Vec<LogLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OutcomeError>,
    /// Scenario-specific fields carried through to the artifact.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Outcome {
    pub fn passed() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failed() -> Self {
        Self::default()
    }

    /// Build the failed outcome for a fault caught at the invocation
    /// boundary.
    pub fn from_fault(message: impl Into<String>, trace: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(OutcomeError::new(message, trace)),
            ..Self::default()
        }
    }

    pub fn with_error(mut self, error: OutcomeError) -> Self {
        self.error = Some(error);
        self
    }

    /// Attach a scenario-specific field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Canonical success check over a raw scenario output value.
///
/// A bare `true`, or an object whose `success` field is `true`, counts as
/// success. Everything else, including a missing flag, is failure. Applied
/// once before scoring so every scorer reads the same boolean.
pub fn normalized_success(output: &Value) -> bool {
    match output {
        Value::Bool(flag) => *flag,
        Value::Object(map) => map
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        _ => false,
    }
}
