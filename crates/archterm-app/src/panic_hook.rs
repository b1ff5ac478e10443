//! Panic reporting for the interactive binary.
//!
//! Command panics are caught by the interpreter and turned into an
//! internal-error result line. The default hook would still print each one
//! to stderr in the middle of the transcript, so the binary routes them to
//! the log instead.

use std::panic::{self, Location};

use archterm_core::panic_message;

/// Replace the default panic hook with one that logs a single debug line.
pub fn install() {
    panic::set_hook(Box::new(|info| {
        log::debug!("{}", report(&panic_message(info.payload()), info.location()));
    }));
}

fn report(message: &str, location: Option<&Location<'_>>) -> String {
    match location {
        Some(at) => format!("panic at {}:{}: {message}", at.file(), at.line()),
        None => format!("panic: {message}"),
    }
}
