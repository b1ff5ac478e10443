//! Error types for archterm.
//!
//! Every error a command can raise ends up as plain output text, so the
//! `Display` impls here produce exactly the line a user sees.

use std::io;

/// Filesystem-level failure reasons, worded like coreutils.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FsError {
    #[error("No such file or directory")]
    NotFound,

    #[error("Not a directory")]
    NotADirectory,

    #[error("Is a directory")]
    IsADirectory,

    #[error("File exists")]
    AlreadyExists,

    #[error("Directory not empty")]
    NotEmpty,
}

/// Errors produced by the archterm shell.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// A filesystem failure on one operand, e.g. `rm: cannot remove 'x'`.
    #[error("{context}: {source}")]
    Fs { context: String, source: FsError },

    #[error("{cmd}: {detail}")]
    MissingOperand {
        cmd: &'static str,
        detail: &'static str,
    },

    #[error("{cmd}: {message}")]
    InvalidArgument { cmd: &'static str, message: String },

    /// Bare usage line, e.g. `grep` with no pattern.
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("bash: {name}: command not found\nDid you mean one of: {suggestions}")]
    UnknownCommand { name: String, suggestions: String },

    #[error("bash: {0}: Permission denied")]
    PermissionDenied(String),

    #[error("bash: {cmd}: internal error: {message}")]
    Internal { cmd: String, message: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl ShellError {
    /// Attach the per-operand context (`"cat: notes.txt"`) to a filesystem error.
    pub fn fs(context: impl Into<String>, source: FsError) -> Self {
        Self::Fs {
            context: context.into(),
            source,
        }
    }

    /// Shell exit status conventionally associated with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UnknownCommand { .. } => 127,
            Self::PermissionDenied(_) => 126,
            _ => 1,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ShellError>;
