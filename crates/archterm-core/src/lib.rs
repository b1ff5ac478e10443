//! archterm core: the process-wide session store and the shell facade a
//! transport layer talks to.
//!
//! A transport hands each request's session id and line to [`Shell`], which
//! looks the session up (creating it from the template on first use), runs
//! the line through the command registry, and returns a serializable
//! [`CommandResult`].

// Re-exports so front ends need only this crate.
pub use archterm_terminal::{CommandResult, Session, panic_message};
pub use archterm_types::config;
pub use archterm_types::error;

pub mod session_store;
pub mod shell;

pub use session_store::{SessionStore, SweeperHandle};
pub use shell::{SessionInfo, Shell};
