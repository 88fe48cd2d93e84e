//! Per-invocation structured log sink
//!
//! Every scenario invocation owns a fresh [`EvalLogger`]. Scenario bodies
//! and the automation backend append leveled lines to it; the harness
//! drains the buffer into the outcome record when the invocation ends.
//!
//! Design constraints:
//! - Append-only: lines are never mutated after being logged
//! - Never panics: a poisoned buffer degrades to best-effort logging
//! - Cheap to clone: the logger is handed to the scenario body and kept
//!   by the scheduler for the fault path

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Log severity. Serialized as its numeric value (0 = error, 1 = info,
/// 2 = debug) to match the summary artifact consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Info,
    Debug,
}

impl LogLevel {
    pub fn as_u8(self) -> u8 {
        match self {
            LogLevel::Error => 0,
            LogLevel::Info => 1,
            LogLevel::Debug => 2,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(LogLevel::Error),
            1 => Some(LogLevel::Info),
            2 => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Debug => write!(f, "DEBUG"),
        }
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        LogLevel::from_u8(value)
            .ok_or_else(|| de::Error::custom(format!("invalid log level: {}", value)))
    }
}

/// A typed auxiliary value attached to a log line under a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxiliaryValue {
    pub value: serde_json::Value,
    #[serde(rename = "type")]
    pub kind: String,
}

impl AuxiliaryValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            value: serde_json::Value::String(value.into()),
            kind: "string".to_string(),
        }
    }

    pub fn integer(value: i64) -> Self {
        Self {
            value: serde_json::Value::from(value),
            kind: "integer".to_string(),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self {
            value: serde_json::Value::Bool(value),
            kind: "boolean".to_string(),
        }
    }

    pub fn object(value: serde_json::Value) -> Self {
        Self {
            value,
            kind: "object".to_string(),
        }
    }
}

/// One buffered log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLine {
    pub message: String,
    pub level: LogLevel,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub auxiliary: BTreeMap<String, AuxiliaryValue>,
}

impl LogLine {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level,
            timestamp: chrono::Utc::now()
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
            auxiliary: BTreeMap::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn debug(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Debug, message)
    }

    /// Attach a labeled auxiliary value.
    pub fn aux(mut self, label: impl Into<String>, value: AuxiliaryValue) -> Self {
        self.auxiliary.insert(label.into(), value);
        self
    }
}

#[derive(Debug, Default)]
struct LoggerState {
    lines: Vec<LogLine>,
    debug_url: Option<String>,
    session_url: Option<String>,
}

/// Buffered, per-invocation log sink.
///
/// Clones share the same buffer, so the scenario body and the scheduler
/// can both hold the logger for one invocation. Loggers are never shared
/// across invocations.
#[derive(Debug, Clone, Default)]
pub struct EvalLogger {
    state: Arc<Mutex<LoggerState>>,
}

impl EvalLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a log line. Never panics.
    pub fn log(&self, line: LogLine) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.lines.push(line);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLine::error(message));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLine::info(message));
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLine::debug(message));
    }

    /// Associate the external automation session with this invocation so
    /// log output can be correlated later.
    pub fn set_session(&self, debug_url: Option<&str>, session_url: Option<&str>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.debug_url = debug_url.map(str::to_string);
        state.session_url = session_url.map(str::to_string);
    }

    pub fn debug_url(&self) -> Option<String> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.debug_url.clone()
    }

    pub fn session_url(&self) -> Option<String> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.session_url.clone()
    }

    /// Drain the buffered lines. Called once, at invocation end.
    pub fn take_lines(&self) -> Vec<LogLine> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut state.lines)
    }

    /// Snapshot of the buffered lines without draining.
    pub fn lines(&self) -> Vec<LogLine> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.lines.clone()
    }

    pub fn is_empty(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_preserve_order() {
        let logger = EvalLogger::new();
        logger.info("first");
        logger.error("second");
        logger.debug("third");

        let lines = logger.take_lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].message, "first");
        assert_eq!(lines[0].level, LogLevel::Info);
        assert_eq!(lines[1].level, LogLevel::Error);
        assert_eq!(lines[2].level, LogLevel::Debug);
    }

    #[test]
    fn take_lines_drains_once() {
        let logger = EvalLogger::new();
        logger.info("only");
        assert_eq!(logger.take_lines().len(), 1);
        assert!(logger.take_lines().is_empty());
    }

    #[test]
    fn clones_share_the_buffer() {
        let logger = EvalLogger::new();
        let clone = logger.clone();
        clone.info("via clone");
        assert_eq!(logger.lines().len(), 1);
    }

    #[test]
    fn auxiliary_values_serialize_with_type_tag() {
        let line = LogLine::info("navigated").aux("url", AuxiliaryValue::string("https://x.test"));
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["level"], 1);
        assert_eq!(json["auxiliary"]["url"]["type"], "string");
        assert_eq!(json["auxiliary"]["url"]["value"], "https://x.test");
    }

    #[test]
    fn level_roundtrip() {
        for level in [LogLevel::Error, LogLevel::Info, LogLevel::Debug] {
            let json = serde_json::to_string(&level).unwrap();
            let back: LogLevel = serde_json::from_str(&json).unwrap();
            assert_eq!(back, level);
        }
        assert!(serde_json::from_str::<LogLevel>("7").is_err());
    }

    #[test]
    fn session_association() {
        let logger = EvalLogger::new();
        logger.set_session(Some("https://debug.test/1"), Some("https://session.test/1"));
        assert_eq!(logger.debug_url().as_deref(), Some("https://debug.test/1"));
        assert_eq!(
            logger.session_url().as_deref(),
            Some("https://session.test/1")
        );
    }
}
