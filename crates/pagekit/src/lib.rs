//! Pagekit - browser-automation capability contract for eval harnesses
//!
//! Part of the Pagekit ecosystem.
//!
//! This crate defines the fixed interface scenario bodies drive a browser
//! through: navigate, perform a semantic action, observe candidate elements,
//! extract structured data, release the session. It also provides the
//! per-invocation [`EvalLogger`] every scenario runs with, and a
//! deterministic [`scripted`] backend used for local runs and tests.
//!
//! # Example
//!
//! ```rust
//! use pagekit::Session;
//! use pagekit::scripted::Script;
//!
//! #[tokio::main]
//! async fn main() -> pagekit::Result<()> {
//!     let mut session = Script::new()
//!         .goto_ok()
//!         .act_ok("clicked the login button")
//!         .into_session();
//!     session.goto("https://example.com").await?;
//!     let result = session.act("click the login button", None).await?;
//!     assert!(result.success);
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

mod error;
mod logger;
mod session;

pub mod scripted;

pub use error::{Error, Result};
pub use logger::{AuxiliaryValue, EvalLogger, LogLevel, LogLine};
pub use session::{
    ActResult, Environment, ObservedElement, Session, SessionConfig, SessionFactory,
};
