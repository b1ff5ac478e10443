//! Command interpreter and terminal subsystem.
//!
//! The terminal is a registry-based dispatch system. Commands implement the
//! `Command` trait and are registered by name. The interpreter expands
//! aliases, tokenizes the line, resolves the command name, and dispatches
//! `execute()` against one [`Session`].

mod commands;
mod file_commands;
mod interpreter;
pub mod session;
mod shell_commands;
mod text_commands;

/// Register all built-in commands into a registry.
pub use commands::register_builtins;
/// A single executable command trait.
pub use interpreter::Command;
/// Output produced by a command (text, status, signals).
pub use interpreter::CommandOutput;
/// Registry of available commands with dispatch.
pub use interpreter::CommandRegistry;
/// Serializable outcome of one interpreted line.
pub use interpreter::CommandResult;
/// Per-invocation context passed to every command.
pub use interpreter::Environment;
pub use interpreter::{CLEAR_SEQUENCE, default_registry, expand_alias, panic_message, tokenize};
/// Per-client shell state.
pub use session::Session;
pub use shell_commands::{REBOOT_BANNER, SHUTDOWN_BANNER};
