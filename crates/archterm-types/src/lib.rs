//! Foundation types for archterm.
//!
//! This crate holds the pieces shared by every other archterm crate: the
//! error taxonomy surfaced by commands and the shell configuration.

pub mod config;
pub mod error;
