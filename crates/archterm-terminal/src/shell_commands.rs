//! Shell builtins: help, echo, environment, aliases, history, which, and
//! session control.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use archterm_types::error::{Result, ShellError};
use regex::{Captures, Regex};

use crate::interpreter::{Command, CommandOutput, Environment};

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

pub(crate) struct HelpCmd;
impl Command for HelpCmd {
    fn name(&self) -> &str {
        "help"
    }
    fn description(&self) -> &str {
        "List commands or describe one"
    }
    fn usage(&self) -> &str {
        "help [command]"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if let Some(&name) = args.first() {
            let Some(cmd) = env.registry.get(name) else {
                return Err(ShellError::InvalidArgument {
                    cmd: "help",
                    message: format!("no help topics match '{name}'"),
                });
            };
            let mut out = cmd.name().to_string();
            out.push_str(&format!(" ({})\n", cmd.category()));
            out.push_str(&format!("  {}\n", cmd.description()));
            out.push_str(&format!("  Usage: {}", cmd.usage()));
            return Ok(CommandOutput::Text(out));
        }

        let mut categories: BTreeMap<&str, Vec<(&str, &str)>> = BTreeMap::new();
        for cmd in env.registry.commands() {
            categories
                .entry(cmd.category())
                .or_default()
                .push((cmd.name(), cmd.description()));
        }
        let mut out = format!("Commands ({}):\n", env.registry.len());
        for (cat, cmds) in &mut categories {
            cmds.sort_by_key(|(name, _)| *name);
            out.push_str(&format!("\n  [{cat}]\n"));
            for (name, desc) in cmds.iter() {
                out.push_str(&format!("    {name:12} {desc}\n"));
            }
        }
        out.push_str("\nType 'help <command>' for details.");
        Ok(CommandOutput::Text(out))
    }
}

// ---------------------------------------------------------------------------
// echo
// ---------------------------------------------------------------------------

static VAR_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\w+)").unwrap_or_else(|e| unreachable!("static pattern: {e}")));

pub(crate) struct EchoCmd;
impl Command for EchoCmd {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Print arguments"
    }
    fn usage(&self) -> &str {
        "echo [-n] [-e] [text...]"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let mut escapes = false;
        let mut words = Vec::new();
        for &arg in args {
            match arg {
                // Output never carries a trailing newline, so -n has nothing to drop.
                "-n" => {},
                "-e" => escapes = true,
                _ => words.push(arg),
            }
        }
        let joined = words.join(" ");
        let vars = &env.session.env;
        let mut text = VAR_REF
            .replace_all(&joined, |caps: &Captures<'_>| {
                vars.get(&caps[1]).cloned().unwrap_or_default()
            })
            .into_owned();
        if escapes {
            text = text
                .replace("\\n", "\n")
                .replace("\\t", "\t")
                .replace("\\r", "\r");
        }
        Ok(CommandOutput::Text(text))
    }
}

pub(crate) struct ClearCmd;
impl Command for ClearCmd {
    fn name(&self) -> &str {
        "clear"
    }
    fn description(&self) -> &str {
        "Clear the terminal screen"
    }
    fn usage(&self) -> &str {
        "clear"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, _args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Clear)
    }
}

// ---------------------------------------------------------------------------
// env / export / unset
// ---------------------------------------------------------------------------

fn list_env(env: &Environment<'_>) -> CommandOutput {
    let lines: Vec<String> = env
        .session
        .env
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    CommandOutput::Text(lines.join("\n"))
}

pub(crate) struct EnvCmd;
impl Command for EnvCmd {
    fn name(&self) -> &str {
        "env"
    }
    fn description(&self) -> &str {
        "Print environment variables"
    }
    fn usage(&self) -> &str {
        "env"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(list_env(env))
    }
}

pub(crate) struct ExportCmd;
impl Command for ExportCmd {
    fn name(&self) -> &str {
        "export"
    }
    fn description(&self) -> &str {
        "Set environment variables"
    }
    fn usage(&self) -> &str {
        "export [NAME=value...]"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if args.is_empty() {
            return Ok(list_env(env));
        }
        for arg in args {
            if let Some((key, value)) = arg.split_once('=') {
                env.session.env.insert(key.to_string(), value.to_string());
            }
        }
        Ok(CommandOutput::None)
    }
}

pub(crate) struct UnsetCmd;
impl Command for UnsetCmd {
    fn name(&self) -> &str {
        "unset"
    }
    fn description(&self) -> &str {
        "Remove environment variables"
    }
    fn usage(&self) -> &str {
        "unset NAME..."
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        for arg in args {
            env.session.env.shift_remove(*arg);
        }
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// alias / unalias
// ---------------------------------------------------------------------------

pub(crate) struct AliasCmd;
impl Command for AliasCmd {
    fn name(&self) -> &str {
        "alias"
    }
    fn description(&self) -> &str {
        "Define or list aliases"
    }
    fn usage(&self) -> &str {
        "alias [name=value...]"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if args.is_empty() {
            let lines: Vec<String> = env
                .session
                .aliases
                .iter()
                .map(|(k, v)| format!("alias {k}='{v}'"))
                .collect();
            return Ok(CommandOutput::Text(lines.join("\n")));
        }
        for arg in args {
            let Some((name, value)) = arg.split_once('=') else {
                continue;
            };
            let value = value.strip_prefix('\'').unwrap_or(value);
            let value = value.strip_suffix('\'').unwrap_or(value);
            env.session
                .aliases
                .insert(name.to_string(), value.to_string());
        }
        Ok(CommandOutput::None)
    }
}

pub(crate) struct UnaliasCmd;
impl Command for UnaliasCmd {
    fn name(&self) -> &str {
        "unalias"
    }
    fn description(&self) -> &str {
        "Remove aliases"
    }
    fn usage(&self) -> &str {
        "unalias name..."
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        for arg in args {
            env.session.aliases.shift_remove(*arg);
        }
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// history / which
// ---------------------------------------------------------------------------

pub(crate) struct HistoryCmd;
impl Command for HistoryCmd {
    fn name(&self) -> &str {
        "history"
    }
    fn description(&self) -> &str {
        "Show command history"
    }
    fn usage(&self) -> &str {
        "history"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let lines: Vec<String> = env
            .session
            .history()
            .enumerate()
            .map(|(i, line)| format!("{:>5}  {line}", i + 1))
            .collect();
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

pub(crate) struct WhichCmd;
impl Command for WhichCmd {
    fn name(&self) -> &str {
        "which"
    }
    fn description(&self) -> &str {
        "Locate a command"
    }
    fn usage(&self) -> &str {
        "which <command...>"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if args.is_empty() {
            return Err(ShellError::MissingOperand {
                cmd: "which",
                detail: "missing argument",
            });
        }
        let search = env.session.env.get("PATH").map(String::as_str).unwrap_or_default();
        let mut failed = false;
        let lines: Vec<String> = args
            .iter()
            .map(|name| {
                if env.registry.get(name).is_some() {
                    format!("/usr/bin/{name}")
                } else {
                    failed = true;
                    format!("which: no {name} in ({search})")
                }
            })
            .collect();
        Ok(CommandOutput::lines(lines, failed))
    }
}

// ---------------------------------------------------------------------------
// true / false / :
// ---------------------------------------------------------------------------

pub(crate) struct TrueCmd;
impl Command for TrueCmd {
    fn name(&self) -> &str {
        "true"
    }
    fn description(&self) -> &str {
        "Do nothing, successfully"
    }
    fn usage(&self) -> &str {
        "true"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, _args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::None)
    }
}

pub(crate) struct FalseCmd;
impl Command for FalseCmd {
    fn name(&self) -> &str {
        "false"
    }
    fn description(&self) -> &str {
        "Do nothing, unsuccessfully"
    }
    fn usage(&self) -> &str {
        "false"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, _args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Status {
            text: "1".to_string(),
            code: 1,
        })
    }
}

pub(crate) struct ColonCmd;
impl Command for ColonCmd {
    fn name(&self) -> &str {
        ":"
    }
    fn description(&self) -> &str {
        "Null command"
    }
    fn usage(&self) -> &str {
        ":"
    }
    fn category(&self) -> &str {
        "shell"
    }
    fn execute(&self, _args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// Session control.
// ---------------------------------------------------------------------------

/// Banner shown after `reboot`.
pub const REBOOT_BANNER: &str =
    "Rebooting...\n(Simulated: Terminal will restart)\n\nConnection to archbtw closed.";

/// Banner shown after `shutdown`, `poweroff` and `halt`.
pub const SHUTDOWN_BANNER: &str = "Shutdown scheduled.\nBroadcast message from root:\nThe system will power off now!\n\nConnection to archbtw closed.";

/// `exit` and `logout`.
pub(crate) struct ExitCmd(pub &'static str);
impl Command for ExitCmd {
    fn name(&self) -> &str {
        self.0
    }
    fn description(&self) -> &str {
        "End the session"
    }
    fn usage(&self) -> &str {
        self.0
    }
    fn category(&self) -> &str {
        "session"
    }
    fn execute(&self, _args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Exit("logout".to_string()))
    }
}

pub(crate) struct RebootCmd;
impl Command for RebootCmd {
    fn name(&self) -> &str {
        "reboot"
    }
    fn description(&self) -> &str {
        "Restart the session"
    }
    fn usage(&self) -> &str {
        "reboot"
    }
    fn category(&self) -> &str {
        "session"
    }
    fn execute(&self, _args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Reboot(REBOOT_BANNER.to_string()))
    }
}

/// `shutdown`, `poweroff` and `halt`.
pub(crate) struct ShutdownCmd(pub &'static str);
impl Command for ShutdownCmd {
    fn name(&self) -> &str {
        self.0
    }
    fn description(&self) -> &str {
        "Power off the machine"
    }
    fn usage(&self) -> &str {
        self.0
    }
    fn category(&self) -> &str {
        "session"
    }
    fn execute(&self, _args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Exit(SHUTDOWN_BANNER.to_string()))
    }
}
