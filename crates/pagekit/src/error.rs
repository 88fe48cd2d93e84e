//! Error types for Pagekit
//!
//! This module provides error types for the automation capability contract
//! with the following design goals:
//! - Human-readable error messages suitable for outcome records
//! - Clear categorization for programmatic handling
//! - JSON-serializable via Display (outcome errors carry the message)

use thiserror::Error;

/// Result type alias using Pagekit's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Pagekit error types.
///
/// All variants map to one automation capability, plus `Session` for
/// lifecycle faults and `Script` for scripted-backend exhaustion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Navigation to a URL failed.
    #[error("navigation error: {0}")]
    Navigation(String),

    /// A semantic action could not be performed.
    #[error("action error: {0}")]
    Action(String),

    /// Candidate-element observation failed.
    #[error("observation error: {0}")]
    Observation(String),

    /// Structured-data extraction failed.
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Session lifecycle fault (creation, release, lost connection).
    #[error("session error: {0}")]
    Session(String),

    /// Scripted backend fault: the script ran out of replies or the next
    /// reply does not match the requested operation.
    #[error("script error: {0}")]
    Script(String),
}
