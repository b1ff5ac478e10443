//! The facade a transport layer drives: one call per request.

use std::sync::Arc;

use archterm_terminal::{CommandRegistry, CommandResult, default_registry};
use indexmap::IndexMap;
use serde::Serialize;

use crate::session_store::{SessionStore, lock_session};

/// Read-only view of a session for status endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub cwd: String,
    pub env: IndexMap<String, String>,
    #[serde(rename = "historyLen")]
    pub history_len: usize,
}

/// Runs lines, completions and resets against sessions in a store.
#[derive(Clone)]
pub struct Shell {
    store: Arc<SessionStore>,
    registry: &'static CommandRegistry,
}

impl Shell {
    /// A shell dispatching through the built-in command registry.
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self::with_registry(store, default_registry())
    }

    pub fn with_registry(store: Arc<SessionStore>, registry: &'static CommandRegistry) -> Self {
        Self { store, registry }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Interpret one line in session `id`.
    pub fn execute(&self, id: &str, line: &str) -> CommandResult {
        let session = self.store.get(id);
        let mut session = lock_session(&session);
        self.registry.interpret(&mut session, line)
    }

    /// Completion candidates for `partial` in session `id`.
    pub fn complete(&self, id: &str, partial: &str) -> Vec<String> {
        let session = self.store.get(id);
        let session = lock_session(&session);
        self.registry.complete(&session, partial)
    }

    /// Discard session `id`; the next request starts from the template.
    pub fn reset(&self, id: &str) {
        if !self.store.remove(id) {
            log::debug!("reset of unknown session {id}");
        }
    }

    /// Current state of session `id`, creating it if needed.
    pub fn snapshot(&self, id: &str) -> SessionInfo {
        let session = self.store.get(id);
        let session = lock_session(&session);
        SessionInfo {
            cwd: session.cwd.clone(),
            env: session.env.clone(),
            history_len: session.history().len(),
        }
    }
}
