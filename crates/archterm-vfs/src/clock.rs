//! Wall-clock source for modification-time labels.

use chrono::Local;

/// Produces the `ls -l` style timestamp stamped on created or touched nodes.
pub trait Clock: Send + Sync {
    /// Current time formatted as `"Mon DD HH:MM"` with a space-padded day.
    fn mtime_label(&self) -> String;
}

/// Format used by [`SystemClock`], e.g. `Jan  1 00:00`.
pub const MTIME_FORMAT: &str = "%b %e %H:%M";

/// Local time via `chrono`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn mtime_label(&self) -> String {
        Local::now().format(MTIME_FORMAT).to_string()
    }
}

/// A clock pinned to one label. Used by tests and deterministic replays.
#[derive(Debug, Clone)]
pub struct FixedClock(pub String);

impl Clock for FixedClock {
    fn mtime_label(&self) -> String {
        self.0.clone()
    }
}
