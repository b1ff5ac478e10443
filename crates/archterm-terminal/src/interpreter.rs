//! Command trait, registry, and dispatch logic.
//!
//! A line goes through alias expansion, then tokenization, then a registry
//! lookup. Handlers run behind a panic boundary so a faulty command turns
//! into one line of output instead of taking the session down.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::LazyLock;

use archterm_types::error::{Result, ShellError};
use archterm_vfs::path::{basename, resolve};
use indexmap::IndexMap;
use serde::Serialize;

use crate::session::Session;

/// ANSI sequence emitted by `clear`: erase the screen, home the cursor.
pub const CLEAR_SEQUENCE: &str = "\x1b[2J\x1b[H";

/// Output produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Plain text lines.
    Text(String),
    /// Text with an explicit non-zero status, e.g. error lines collected
    /// while the command carried on with the remaining operands.
    Status { text: String, code: i32 },
    /// Command produced no visible output.
    None,
    /// Signal to clear the terminal output buffer.
    Clear,
    /// Signal to end the session after showing the text.
    Exit(String),
    /// Signal to restart the session after showing the text.
    Reboot(String),
}

impl CommandOutput {
    /// `Text` when every operand succeeded, `Status` with code 1 otherwise.
    pub fn lines(lines: Vec<String>, failed: bool) -> Self {
        let text = lines.join("\n");
        if failed {
            Self::Status { text, code: 1 }
        } else {
            Self::Text(text)
        }
    }
}

/// What a handler gets to work with: its session and the registry that
/// dispatched it.
pub struct Environment<'a> {
    pub session: &'a mut Session,
    pub registry: &'a CommandRegistry,
}

impl Environment<'_> {
    /// Resolve a user-supplied path against the working directory.
    pub fn resolve(&self, input: &str) -> String {
        resolve(&self.session.cwd, input)
    }

    /// Current mtime label.
    pub fn now(&self) -> String {
        self.session.now_label()
    }
}

/// A single executable command.
pub trait Command: Send + Sync {
    /// The command name (what the user types).
    fn name(&self) -> &str;

    /// One-line description for `help`.
    fn description(&self) -> &str;

    /// Usage string (e.g. "ls \[-a\] \[-l\] \[path...\]").
    fn usage(&self) -> &str;

    /// Command category for grouping in `help` output.
    fn category(&self) -> &str {
        "general"
    }

    /// Execute the command with the given arguments and environment.
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput>;
}

/// The rendered outcome of one line, ready for a transport to serialize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    pub output: String,
    pub cwd: String,
    pub clear: bool,
    pub exit: bool,
    pub reboot: bool,
    /// `None` on success.
    #[serde(rename = "exitCode", skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl CommandResult {
    /// An empty result at `cwd`.
    pub fn empty(cwd: &str) -> Self {
        Self {
            cwd: cwd.to_string(),
            ..Self::default()
        }
    }

    fn from_outcome(outcome: Result<CommandOutput>, cwd: &str) -> Self {
        let mut result = Self::empty(cwd);
        match outcome {
            Ok(CommandOutput::Text(text)) => result.output = text,
            Ok(CommandOutput::Status { text, code }) => {
                result.output = text;
                result.exit_code = (code != 0).then_some(code);
            },
            Ok(CommandOutput::None) => {},
            Ok(CommandOutput::Clear) => {
                result.output = CLEAR_SEQUENCE.to_string();
                result.clear = true;
            },
            Ok(CommandOutput::Exit(text)) => {
                result.output = text;
                result.exit = true;
            },
            Ok(CommandOutput::Reboot(text)) => {
                result.output = text;
                result.reboot = true;
            },
            Err(e) => {
                result.exit_code = Some(e.exit_code());
                result.output = e.to_string();
            },
        }
        result
    }
}

/// Registry of available commands with dispatch.
///
/// Iteration, completion and suggestions all follow registration order.
pub struct CommandRegistry {
    commands: Vec<Box<dyn Command>>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    /// Create an empty command registry.
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a command. Replaces any existing command with the same name
    /// in its original slot.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        let name = cmd.name().to_string();
        match self.index.get(&name) {
            Some(&slot) => self.commands[slot] = cmd,
            None => {
                self.index.insert(name, self.commands.len());
                self.commands.push(cmd);
            },
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.index.get(name).map(|&slot| self.commands[slot].as_ref())
    }

    /// Registered commands in registration order.
    pub fn commands(&self) -> impl Iterator<Item = &dyn Command> {
        self.commands.iter().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Parse and execute one line against `session`.
    pub fn interpret(&self, session: &mut Session, raw: &str) -> CommandResult {
        let line = raw.trim();
        if line.is_empty() {
            return CommandResult::empty(&session.cwd);
        }
        session.push_history(line);

        let expanded = expand_alias(&session.aliases, line);
        let tokens = tokenize(&expanded);
        let Some((name, rest)) = tokens.split_first() else {
            return CommandResult::empty(&session.cwd);
        };
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();
        log::debug!("[{}] {name} {args:?}", session.id());

        let outcome = match self.get(name) {
            Some(cmd) => self.run_guarded(cmd, &args, session),
            None if name.starts_with("./") || name.starts_with('/') => {
                Err(ShellError::PermissionDenied(name.clone()))
            },
            None => Err(ShellError::UnknownCommand {
                name: name.clone(),
                suggestions: self.suggestions(name),
            }),
        };
        CommandResult::from_outcome(outcome, &session.cwd)
    }

    fn run_guarded(
        &self,
        cmd: &dyn Command,
        args: &[&str],
        session: &mut Session,
    ) -> Result<CommandOutput> {
        let mut env = Environment {
            session,
            registry: self,
        };
        match panic::catch_unwind(AssertUnwindSafe(|| cmd.execute(args, &mut env))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::warn!("command {} panicked: {message}", cmd.name());
                Err(ShellError::Internal {
                    cmd: cmd.name().to_string(),
                    message,
                })
            },
        }
    }

    /// Up to three registered names resembling `name`, comma separated.
    ///
    /// Score is the count of positions where both names have the same
    /// character. Ties keep registration order.
    pub fn suggestions(&self, name: &str) -> String {
        let typed: Vec<char> = name.chars().collect();
        let mut scored: Vec<(&str, usize)> = self
            .commands()
            .map(|c| {
                let score = typed
                    .iter()
                    .zip(c.name().chars())
                    .filter(|(a, b)| **a == *b)
                    .count();
                (c.name(), score)
            })
            .filter(|(_, score)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        let top: Vec<&str> = scored.iter().take(3).map(|(n, _)| *n).collect();
        if top.is_empty() {
            "help".to_string()
        } else {
            top.join(", ")
        }
    }

    /// Tab-completion candidates for a partial line.
    ///
    /// Without a space, command names; otherwise entries of the directory
    /// named by the last word, directories suffixed with `/`.
    pub fn complete(&self, session: &Session, partial: &str) -> Vec<String> {
        let Some((_, word)) = partial.rsplit_once(' ') else {
            return self
                .commands()
                .map(|c| c.name())
                .filter(|n| n.starts_with(partial))
                .map(str::to_string)
                .collect();
        };
        let (dir, prefix) = match word.rfind('/') {
            Some(i) => (resolve(&session.cwd, &word[..=i]), &word[i + 1..]),
            None => (session.cwd.clone(), word),
        };
        session
            .vfs
            .entries_named(&dir, prefix)
            .into_iter()
            .map(|(path, node)| {
                if node.is_dir() {
                    format!("{}/", basename(path))
                } else {
                    basename(path).to_string()
                }
            })
            .collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_REGISTRY: LazyLock<CommandRegistry> = LazyLock::new(|| {
    let mut reg = CommandRegistry::new();
    crate::register_builtins(&mut reg);
    log::debug!("registered {} commands", reg.len());
    reg
});

/// The process-wide registry holding every built-in command.
pub fn default_registry() -> &'static CommandRegistry {
    &DEFAULT_REGISTRY
}

/// Text of a panic payload, as shown in internal-error output.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ---------------------------------------------------------------------------
// Alias expansion and tokenizer.
// ---------------------------------------------------------------------------

/// Replace a leading alias name with its expansion.
///
/// The line must equal the alias or start with it followed by a space. The
/// first match in definition order wins and the result is not re-expanded.
pub fn expand_alias(aliases: &IndexMap<String, String>, line: &str) -> String {
    for (name, expansion) in aliases {
        let Some(rest) = line.strip_prefix(name.as_str()) else {
            continue;
        };
        if rest.is_empty() || rest.starts_with(' ') {
            return format!("{expansion}{rest}");
        }
    }
    line.to_string()
}

/// Split a line on spaces, honouring single and double quotes.
///
/// Quote characters are dropped; each kind is literal inside the other. An
/// unterminated quote runs to the end of the line. Empty tokens are never
/// produced, so `''` on its own yields nothing.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;

    for c in line.chars() {
        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            ' ' if !in_single && !in_double => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            },
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
