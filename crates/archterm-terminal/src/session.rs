//! Per-client shell state.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use archterm_vfs::path::HOME_DIR;
use archterm_vfs::{Clock, MemoryVfs};
use indexmap::IndexMap;

/// Environment every new session starts with, in display order.
pub const DEFAULT_ENV: &[(&str, &str)] = &[
    ("USER", "user"),
    ("HOME", HOME_DIR),
    ("SHELL", "/bin/bash"),
    ("TERM", "xterm-256color"),
    ("EDITOR", "vim"),
    ("PAGER", "less"),
    (
        "PATH",
        "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin",
    ),
];

/// Aliases every new session starts with, in definition order.
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("ll", "ls -la"),
    ("la", "ls -A"),
    ("l", "ls -CF"),
    ("grep", "grep --color=auto"),
    ("diff", "diff --color=auto"),
    ("ip", "ip --color=auto"),
];

/// One simulated login: working directory, variables, aliases, history and
/// a private filesystem.
pub struct Session {
    id: String,
    pub cwd: String,
    pub env: IndexMap<String, String>,
    pub aliases: IndexMap<String, String>,
    pub vfs: MemoryVfs,
    history: VecDeque<String>,
    history_limit: usize,
    clock: Arc<dyn Clock>,
    last_access: Instant,
}

impl Session {
    /// Build a session with the default environment around `vfs`.
    pub fn new(
        id: impl Into<String>,
        vfs: MemoryVfs,
        clock: Arc<dyn Clock>,
        history_limit: usize,
    ) -> Self {
        Self {
            id: id.into(),
            cwd: HOME_DIR.to_string(),
            env: to_map(DEFAULT_ENV),
            aliases: to_map(DEFAULT_ALIASES),
            vfs,
            history: VecDeque::new(),
            history_limit: history_limit.max(1),
            clock,
            last_access: Instant::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Entered lines, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    /// Record a line unless it repeats the previous entry.
    pub fn push_history(&mut self, line: &str) {
        if self.history.back().is_some_and(|last| last == line) {
            return;
        }
        self.history.push_back(line.to_string());
        while self.history.len() > self.history_limit {
            self.history.pop_front();
        }
    }

    /// Timestamp label for nodes created or touched right now.
    pub fn now_label(&self) -> String {
        self.clock.mtime_label()
    }

    pub fn last_access(&self) -> Instant {
        self.last_access
    }

    pub fn touch_access(&mut self, now: Instant) {
        self.last_access = now;
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("cwd", &self.cwd)
            .field("history_len", &self.history.len())
            .field("vfs_entries", &self.vfs.len())
            .finish_non_exhaustive()
    }
}

fn to_map(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}
