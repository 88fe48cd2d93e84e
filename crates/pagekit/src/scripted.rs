//! Scripted automation backend
//!
//! A deterministic, in-memory [`Session`] implementation that replays a
//! queued script of replies, one per capability call. It is both the
//! default backend for local runs and the test double for the harness.
//! Live browser backends plug in through the same [`SessionFactory`]
//! seam.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::session::{ActResult, ObservedElement, Session, SessionConfig, SessionFactory};
use crate::{Error, Result};

/// One scripted reply. Calls consume replies front to back; the reply
/// kind must match the requested operation.
#[derive(Debug, Clone)]
pub enum Reply {
    Goto,
    Act(ActResult),
    Observe(Vec<ObservedElement>),
    Extract(serde_json::Value),
    /// The next call fails with this message, regardless of operation.
    Fail(String),
}

impl Reply {
    fn kind(&self) -> &'static str {
        match self {
            Reply::Goto => "goto",
            Reply::Act(_) => "act",
            Reply::Observe(_) => "observe",
            Reply::Extract(_) => "extract",
            Reply::Fail(_) => "fail",
        }
    }
}

/// A reusable reply script. Cloned into each session a factory creates.
#[derive(Debug, Clone, Default)]
pub struct Script {
    replies: Vec<Reply>,
    debug_url: Option<String>,
    session_url: Option<String>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, reply: Reply) -> Self {
        self.replies.push(reply);
        self
    }

    pub fn goto_ok(self) -> Self {
        self.reply(Reply::Goto)
    }

    pub fn act_ok(self, message: impl Into<String>) -> Self {
        self.reply(Reply::Act(ActResult::ok(message)))
    }

    pub fn act(self, result: ActResult) -> Self {
        self.reply(Reply::Act(result))
    }

    pub fn observe(self, elements: Vec<ObservedElement>) -> Self {
        self.reply(Reply::Observe(elements))
    }

    pub fn extract(self, value: serde_json::Value) -> Self {
        self.reply(Reply::Extract(value))
    }

    /// Fail the next call with a session error.
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.reply(Reply::Fail(message.into()))
    }

    pub fn urls(mut self, debug_url: impl Into<String>, session_url: impl Into<String>) -> Self {
        self.debug_url = Some(debug_url.into());
        self.session_url = Some(session_url.into());
        self
    }

    pub fn into_session(self) -> ScriptedSession {
        ScriptedSession {
            replies: VecDeque::from(self.replies),
            debug_url: self.debug_url,
            session_url: self.session_url,
            visited: Vec::new(),
            closed: false,
        }
    }
}

/// Session that replays a [`Script`].
#[derive(Debug)]
pub struct ScriptedSession {
    replies: VecDeque<Reply>,
    debug_url: Option<String>,
    session_url: Option<String>,
    visited: Vec<String>,
    closed: bool,
}

impl ScriptedSession {
    /// URLs passed to `goto` so far, in call order.
    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn next_reply(&mut self, operation: &'static str) -> Result<Reply> {
        if self.closed {
            return Err(Error::Session(format!(
                "{} called on a released session",
                operation
            )));
        }
        match self.replies.pop_front() {
            Some(Reply::Fail(message)) => Err(Error::Session(message)),
            Some(reply) if reply.kind() == operation => Ok(reply),
            Some(reply) => Err(Error::Script(format!(
                "expected {} reply, script has {}",
                operation,
                reply.kind()
            ))),
            None => Err(Error::Script(format!(
                "script exhausted before {}",
                operation
            ))),
        }
    }
}

#[async_trait]
impl Session for ScriptedSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.next_reply("goto")?;
        #[cfg(feature = "logging")]
        tracing::debug!(url, "scripted goto");
        self.visited.push(url.to_string());
        Ok(())
    }

    async fn act(
        &mut self,
        instruction: &str,
        variables: Option<&BTreeMap<String, String>>,
    ) -> Result<ActResult> {
        let _ = (instruction, variables);
        match self.next_reply("act")? {
            Reply::Act(result) => Ok(result),
            _ => unreachable!("next_reply matched kind"),
        }
    }

    async fn observe(&mut self, instruction: Option<&str>) -> Result<Vec<ObservedElement>> {
        let _ = instruction;
        match self.next_reply("observe")? {
            Reply::Observe(elements) => Ok(elements),
            _ => unreachable!("next_reply matched kind"),
        }
    }

    async fn extract(
        &mut self,
        instruction: &str,
        schema: &serde_json::Value,
        model_override: Option<&str>,
    ) -> Result<serde_json::Value> {
        let _ = (instruction, schema, model_override);
        match self.next_reply("extract")? {
            Reply::Extract(value) => Ok(value),
            _ => unreachable!("next_reply matched kind"),
        }
    }

    async fn close(&mut self) -> Result<()> {
        #[cfg(feature = "logging")]
        tracing::debug!("scripted session released");
        self.closed = true;
        Ok(())
    }

    fn debug_url(&self) -> Option<&str> {
        self.debug_url.as_deref()
    }

    fn session_url(&self) -> Option<&str> {
        self.session_url.as_deref()
    }
}

/// Factory that stamps out one [`ScriptedSession`] per invocation from a
/// shared script, assigning each a distinct session URL.
pub struct ScriptedFactory {
    script: Script,
    counter: AtomicUsize,
}

impl ScriptedFactory {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            counter: AtomicUsize::new(0),
        })
    }

    /// Sessions created so far.
    pub fn created(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    async fn create(&self, config: &SessionConfig) -> Result<Box<dyn Session>> {
        let id = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        #[cfg(feature = "logging")]
        tracing::debug!(id, model = %config.model, "scripted session created");
        let _ = config;
        let mut session = self.script.clone().into_session();
        if session.session_url.is_none() {
            session.session_url = Some(format!("scripted://session/{}", id));
        }
        if session.debug_url.is_none() {
            session.debug_url = Some(format!("scripted://debug/{}", id));
        }
        Ok(Box::new(session))
    }
}
