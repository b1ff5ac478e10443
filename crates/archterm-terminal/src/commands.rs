//! Built-in filesystem commands and the registration table.

use archterm_types::error::{FsError, Result, ShellError};
use archterm_vfs::path::{HOME_DIR, basename, is_within, join, parent};
use archterm_vfs::{MemoryVfs, Node};
use regex::Regex;

use crate::file_commands::{BasenameCmd, DirnameCmd, DuCmd, FileCmd, StatCmd};
use crate::interpreter::{Command, CommandOutput, CommandRegistry, Environment};
use crate::shell_commands::{
    AliasCmd, ClearCmd, ColonCmd, EchoCmd, EnvCmd, ExitCmd, ExportCmd, FalseCmd, HelpCmd,
    HistoryCmd, RebootCmd, ShutdownCmd, TrueCmd, UnaliasCmd, UnsetCmd, WhichCmd,
};
use crate::text_commands::{
    DiffCmd, GrepCmd, HeadCmd, NlCmd, RevCmd, SortCmd, TailCmd, UniqCmd, WcCmd,
};

/// Register all built-in commands into a registry.
///
/// Order matters: completion and "did you mean" suggestions list commands
/// in the order they were registered.
pub fn register_builtins(reg: &mut CommandRegistry) {
    reg.register(Box::new(HelpCmd));
    reg.register(Box::new(LsCmd));
    reg.register(Box::new(LsShortcut::LL));
    reg.register(Box::new(LsShortcut::LA));
    reg.register(Box::new(CdCmd));
    reg.register(Box::new(PwdCmd));
    reg.register(Box::new(CatCmd));
    reg.register(Box::new(EchoCmd));
    reg.register(Box::new(MkdirCmd));
    reg.register(Box::new(RmdirCmd));
    reg.register(Box::new(RmCmd));
    reg.register(Box::new(TouchCmd));
    reg.register(Box::new(CopyCmd::CP));
    reg.register(Box::new(CopyCmd::MV));
    reg.register(Box::new(FindCmd));
    // Text inspection.
    reg.register(Box::new(GrepCmd));
    reg.register(Box::new(HeadCmd));
    reg.register(Box::new(TailCmd));
    reg.register(Box::new(WcCmd));
    reg.register(Box::new(SortCmd));
    reg.register(Box::new(UniqCmd));
    reg.register(Box::new(PagerCmd("less")));
    reg.register(Box::new(PagerCmd("more")));
    reg.register(Box::new(ClearCmd));
    reg.register(Box::new(DuCmd));
    // Shell state.
    reg.register(Box::new(EnvCmd));
    reg.register(Box::new(ExportCmd));
    reg.register(Box::new(UnsetCmd));
    reg.register(Box::new(AliasCmd));
    reg.register(Box::new(UnaliasCmd));
    reg.register(Box::new(HistoryCmd));
    reg.register(Box::new(WhichCmd));
    // File metadata and path helpers.
    reg.register(Box::new(StatCmd));
    reg.register(Box::new(FileCmd));
    reg.register(Box::new(DiffCmd));
    reg.register(Box::new(LnCmd));
    reg.register(Box::new(BasenameCmd));
    reg.register(Box::new(DirnameCmd));
    reg.register(Box::new(RevCmd));
    reg.register(Box::new(NlCmd));
    reg.register(Box::new(TrueCmd));
    reg.register(Box::new(FalseCmd));
    reg.register(Box::new(ColonCmd));
    // Session control.
    reg.register(Box::new(ExitCmd("exit")));
    reg.register(Box::new(ExitCmd("logout")));
    reg.register(Box::new(RebootCmd));
    reg.register(Box::new(ShutdownCmd("shutdown")));
    reg.register(Box::new(ShutdownCmd("poweroff")));
    reg.register(Box::new(ShutdownCmd("halt")));
}

// ---------------------------------------------------------------------------
// Shared argument helpers.
// ---------------------------------------------------------------------------

/// Arguments split into single-letter flags and operands.
///
/// `-la` sets both `l` and `a`. Anything starting with `--` is a long option
/// and is dropped. A lone `-` is an operand.
pub(crate) struct ParsedArgs<'a> {
    flags: Vec<char>,
    pub operands: Vec<&'a str>,
}

impl ParsedArgs<'_> {
    pub fn has(&self, flag: char) -> bool {
        self.flags.contains(&flag)
    }

    pub fn any(&self, flags: &[char]) -> bool {
        flags.iter().any(|f| self.has(*f))
    }
}

pub(crate) fn parse_flags<'a>(args: &[&'a str]) -> ParsedArgs<'a> {
    let mut flags = Vec::new();
    let mut operands = Vec::new();
    for &arg in args {
        if arg.starts_with("--") {
            continue;
        }
        match arg.strip_prefix('-') {
            Some(cluster) if !cluster.is_empty() => flags.extend(cluster.chars()),
            _ => operands.push(arg),
        }
    }
    ParsedArgs { flags, operands }
}

/// True for an operand whose last segment is `.` or `..`.
fn is_dot_operand(operand: &str) -> bool {
    matches!(operand.trim_end_matches('/').rsplit('/').next(), Some("." | ".."))
}

/// Content of the file an operand names, relative to the working directory.
pub(crate) fn read_operand<'v>(
    vfs: &'v MemoryVfs,
    cwd: &str,
    operand: &str,
) -> std::result::Result<&'v str, FsError> {
    vfs.read(&archterm_vfs::path::resolve(cwd, operand))
}

// ---------------------------------------------------------------------------
// ls
// ---------------------------------------------------------------------------

struct LsCmd;
impl Command for LsCmd {
    fn name(&self) -> &str {
        "ls"
    }
    fn description(&self) -> &str {
        "List directory contents"
    }
    fn usage(&self) -> &str {
        "ls [-a] [-A] [-l] [path...]"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let parsed = parse_flags(args);
        let show_all = parsed.has('a');
        let show_hidden = show_all || parsed.has('A');
        let long = parsed.has('l');
        let operands = if parsed.operands.is_empty() {
            vec![env.session.cwd.as_str()]
        } else {
            parsed.operands.clone()
        };
        let multiple = operands.len() > 1;
        let vfs = &env.session.vfs;

        let mut lines = Vec::new();
        let mut failed = false;
        for op in &operands {
            let target = archterm_vfs::path::resolve(&env.session.cwd, op);
            let Some(node) = vfs.get(&target) else {
                lines.push(format!("ls: cannot access '{op}': No such file or directory"));
                failed = true;
                continue;
            };
            if !node.is_dir() {
                let name = basename(&target);
                lines.push(if long { long_row(node, name) } else { name.to_string() });
                continue;
            }
            if multiple {
                lines.push(format!("{target}:"));
            }

            let mut entries: Vec<(&str, &Node)> = vfs
                .children(&target)
                .into_iter()
                .map(|(path, child)| (basename(path), child))
                .filter(|(name, _)| show_hidden || !name.starts_with('.'))
                .collect();
            if show_all {
                entries.push((".", node));
                entries.push(("..", vfs.get(parent(&target)).unwrap_or(node)));
            }
            entries.sort_by(|a, b| a.0.cmp(b.0));

            if long {
                let total: u64 = entries.iter().map(|(_, n)| n.blocks()).sum();
                lines.push(format!("total {total}"));
                lines.extend(entries.iter().map(|(name, n)| long_row(n, name)));
            } else {
                let names: Vec<&str> = entries.iter().map(|(name, _)| *name).collect();
                lines.push(names.join("  "));
            }
        }
        Ok(CommandOutput::lines(lines, failed))
    }
}

/// `ll` and `la`: `ls` with a fixed leading flag cluster. Registered as
/// commands so they survive `unalias`.
struct LsShortcut {
    name: &'static str,
    flags: &'static str,
}

impl LsShortcut {
    const LL: Self = Self {
        name: "ll",
        flags: "-la",
    };
    const LA: Self = Self {
        name: "la",
        flags: "-A",
    };
}

impl Command for LsShortcut {
    fn name(&self) -> &str {
        self.name
    }
    fn description(&self) -> &str {
        if self.name == "ll" {
            "Long listing including hidden files"
        } else {
            "List almost all entries"
        }
    }
    fn usage(&self) -> &str {
        if self.name == "ll" {
            "ll [path...]"
        } else {
            "la [path...]"
        }
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(self.flags);
        full.extend_from_slice(args);
        LsCmd.execute(&full, env)
    }
}

/// One `ls -l` row.
fn long_row(node: &Node, name: &str) -> String {
    format!(
        "{} 1 {} {} {:>8} {} {name}",
        node.perms, node.owner, node.owner, node.size, node.mtime
    )
}

// ---------------------------------------------------------------------------
// cd / pwd
// ---------------------------------------------------------------------------

struct CdCmd;
impl Command for CdCmd {
    fn name(&self) -> &str {
        "cd"
    }
    fn description(&self) -> &str {
        "Change working directory"
    }
    fn usage(&self) -> &str {
        "cd [dir]"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let operand = args.first().copied().unwrap_or(HOME_DIR);
        let target = env.resolve(operand);
        match env.session.vfs.get(&target) {
            None => Err(ShellError::fs(format!("bash: cd: {operand}"), FsError::NotFound)),
            Some(node) if !node.is_dir() => Err(ShellError::fs(
                format!("bash: cd: {operand}"),
                FsError::NotADirectory,
            )),
            Some(_) => {
                env.session.cwd = target;
                Ok(CommandOutput::None)
            },
        }
    }
}

struct PwdCmd;
impl Command for PwdCmd {
    fn name(&self) -> &str {
        "pwd"
    }
    fn description(&self) -> &str {
        "Print working directory"
    }
    fn usage(&self) -> &str {
        "pwd"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(env.session.cwd.clone()))
    }
}

// ---------------------------------------------------------------------------
// cat / less / more
// ---------------------------------------------------------------------------

/// Concatenate operands, collecting one error line per unreadable operand.
fn concatenate(cmd: &str, args: &[&str], env: &Environment<'_>) -> CommandOutput {
    let parsed = parse_flags(args);
    let numbered = parsed.has('n');
    let mut lines = Vec::new();
    let mut failed = false;
    for file in &parsed.operands {
        match read_operand(&env.session.vfs, &env.session.cwd, file) {
            Ok(content) if numbered => lines.extend(
                content
                    .split('\n')
                    .enumerate()
                    .map(|(i, line)| format!("{:>6}\t{line}", i + 1)),
            ),
            Ok(content) => lines.push(content.to_string()),
            Err(e) => {
                lines.push(ShellError::fs(format!("{cmd}: {file}"), e).to_string());
                failed = true;
            },
        }
    }
    CommandOutput::lines(lines, failed)
}

struct CatCmd;
impl Command for CatCmd {
    fn name(&self) -> &str {
        "cat"
    }
    fn description(&self) -> &str {
        "Concatenate and print files"
    }
    fn usage(&self) -> &str {
        "cat [-n] <file...>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if args.is_empty() {
            return Err(ShellError::MissingOperand {
                cmd: "cat",
                detail: "missing operand",
            });
        }
        Ok(concatenate("cat", args, env))
    }
}

/// `less` and `more`: no paging here, they print like `cat`.
struct PagerCmd(&'static str);
impl Command for PagerCmd {
    fn name(&self) -> &str {
        self.0
    }
    fn description(&self) -> &str {
        "View file contents"
    }
    fn usage(&self) -> &str {
        "less <file...>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if args.is_empty() {
            return Err(ShellError::MissingOperand {
                cmd: self.0,
                detail: "missing filename",
            });
        }
        Ok(concatenate(self.0, args, env))
    }
}

// ---------------------------------------------------------------------------
// mkdir / rmdir / touch
// ---------------------------------------------------------------------------

struct MkdirCmd;
impl Command for MkdirCmd {
    fn name(&self) -> &str {
        "mkdir"
    }
    fn description(&self) -> &str {
        "Create directories"
    }
    fn usage(&self) -> &str {
        "mkdir [-p] <dir...>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let parsed = parse_flags(args);
        if parsed.operands.is_empty() {
            return Err(ShellError::MissingOperand {
                cmd: "mkdir",
                detail: "missing operand",
            });
        }
        let parents = parsed.has('p');
        let now = env.now();
        for dir in &parsed.operands {
            let path = env.resolve(dir);
            let vfs = &mut env.session.vfs;
            let context = || format!("mkdir: cannot create directory '{dir}'");
            if vfs.exists(&path) {
                if parents {
                    continue;
                }
                return Err(ShellError::fs(context(), FsError::AlreadyExists));
            }
            if parents {
                create_ancestors(vfs, &path, &now);
            } else {
                match vfs.get(parent(&path)) {
                    None => return Err(ShellError::fs(context(), FsError::NotFound)),
                    Some(p) if !p.is_dir() => {
                        return Err(ShellError::fs(context(), FsError::NotADirectory));
                    },
                    Some(_) => {},
                }
            }
            vfs.insert(path, Node::dir(now.as_str()));
        }
        Ok(CommandOutput::None)
    }
}

/// Insert a directory entry for every missing proper ancestor of `path`.
fn create_ancestors(vfs: &mut MemoryVfs, path: &str, mtime: &str) {
    let mut current = String::from("/");
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    for segment in segments.iter().take(segments.len().saturating_sub(1)) {
        current = join(&current, segment);
        if !vfs.exists(&current) {
            log::trace!("mkdir -p: creating {current}");
            vfs.insert(current.clone(), Node::dir(mtime));
        }
    }
}

struct RmdirCmd;
impl Command for RmdirCmd {
    fn name(&self) -> &str {
        "rmdir"
    }
    fn description(&self) -> &str {
        "Remove empty directories"
    }
    fn usage(&self) -> &str {
        "rmdir <dir...>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if args.is_empty() {
            return Err(ShellError::MissingOperand {
                cmd: "rmdir",
                detail: "missing operand",
            });
        }
        for dir in args {
            let path = env.resolve(dir);
            let vfs = &mut env.session.vfs;
            let context = || format!("rmdir: failed to remove '{dir}'");
            if path == "/" {
                return Err(ShellError::InvalidArgument {
                    cmd: "rmdir",
                    message: format!("failed to remove '{dir}': Device or resource busy"),
                });
            }
            if path == env.session.cwd {
                let reason = if is_dot_operand(dir) {
                    "Invalid argument"
                } else {
                    "Device or resource busy"
                };
                return Err(ShellError::InvalidArgument {
                    cmd: "rmdir",
                    message: format!("failed to remove '{dir}': {reason}"),
                });
            }
            match vfs.get(&path) {
                None => return Err(ShellError::fs(context(), FsError::NotFound)),
                Some(node) if !node.is_dir() => {
                    return Err(ShellError::fs(context(), FsError::NotADirectory));
                },
                Some(_) => {},
            }
            if vfs.has_descendants(&path) {
                return Err(ShellError::fs(context(), FsError::NotEmpty));
            }
            vfs.remove(&path);
        }
        Ok(CommandOutput::None)
    }
}

struct TouchCmd;
impl Command for TouchCmd {
    fn name(&self) -> &str {
        "touch"
    }
    fn description(&self) -> &str {
        "Create empty files or update timestamps"
    }
    fn usage(&self) -> &str {
        "touch <file...>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if args.is_empty() {
            return Err(ShellError::MissingOperand {
                cmd: "touch",
                detail: "missing file operand",
            });
        }
        let now = env.now();
        for file in args {
            let path = env.resolve(file);
            match env.session.vfs.get_mut(&path) {
                Some(node) => node.mtime = now.clone(),
                None => {
                    env.session.vfs.insert(path, Node::empty_file(now.as_str()));
                },
            }
        }
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// rm
// ---------------------------------------------------------------------------

struct RmCmd;
impl Command for RmCmd {
    fn name(&self) -> &str {
        "rm"
    }
    fn description(&self) -> &str {
        "Remove files or directories"
    }
    fn usage(&self) -> &str {
        "rm [-r] [-f] <path...>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let parsed = parse_flags(args);
        if parsed.operands.is_empty() {
            return Err(ShellError::MissingOperand {
                cmd: "rm",
                detail: "missing operand",
            });
        }
        let recursive = parsed.any(&['r', 'R']);
        let force = parsed.has('f');
        for file in &parsed.operands {
            let path = env.resolve(file);
            let vfs = &mut env.session.vfs;
            let context = || format!("rm: cannot remove '{file}'");
            let Some(node) = vfs.get(&path) else {
                if force {
                    continue;
                }
                return Err(ShellError::fs(context(), FsError::NotFound));
            };
            if node.is_dir() && !recursive {
                return Err(ShellError::fs(context(), FsError::IsADirectory));
            }
            if path == "/" {
                return Err(ShellError::InvalidArgument {
                    cmd: "rm",
                    message: "it is dangerous to operate recursively on '/'".to_string(),
                });
            }
            // The working directory must keep existing.
            if is_within(&env.session.cwd, &path) {
                let message = if is_dot_operand(file) {
                    format!("refusing to remove '.' or '..' directory: skipping '{file}'")
                } else {
                    format!("cannot remove '{file}': Device or resource busy")
                };
                return Err(ShellError::InvalidArgument { cmd: "rm", message });
            }
            vfs.remove_tree(&path);
        }
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// cp / mv
// ---------------------------------------------------------------------------

/// `cp` and `mv`. Both duplicate only the named node; descendants of a
/// directory source stay where they are.
struct CopyCmd {
    name: &'static str,
    verb: &'static str,
    remove_source: bool,
}

impl CopyCmd {
    const CP: Self = Self {
        name: "cp",
        verb: "copy",
        remove_source: false,
    };
    const MV: Self = Self {
        name: "mv",
        verb: "move",
        remove_source: true,
    };
}

impl Command for CopyCmd {
    fn name(&self) -> &str {
        self.name
    }
    fn description(&self) -> &str {
        if self.remove_source {
            "Move or rename files"
        } else {
            "Copy files"
        }
    }
    fn usage(&self) -> &str {
        if self.remove_source {
            "mv [-r] <src...> <dst>"
        } else {
            "cp [-r] <src...> <dst>"
        }
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let parsed = parse_flags(args);
        let Some((dst, sources)) = parsed.operands.split_last().filter(|(_, s)| !s.is_empty())
        else {
            return Err(ShellError::MissingOperand {
                cmd: self.name,
                detail: "missing destination file operand",
            });
        };
        let recursive = parsed.any(&['r', 'R', 'a']);
        let dst_path = env.resolve(dst);
        let now = env.now();

        for src in sources {
            let src_path = env.resolve(src);
            let vfs = &mut env.session.vfs;
            let Some(node) = vfs.get(&src_path) else {
                return Err(ShellError::fs(
                    format!("{}: cannot stat '{src}'", self.name),
                    FsError::NotFound,
                ));
            };
            if node.is_dir() && !recursive {
                return Err(ShellError::InvalidArgument {
                    cmd: self.name,
                    message: format!("-r not specified; omitting directory '{src}'"),
                });
            }
            if src_path == "/" {
                return Err(ShellError::InvalidArgument {
                    cmd: self.name,
                    message: format!("cannot {} '/': Device or resource busy", self.verb),
                });
            }
            let target = if vfs.is_dir(&dst_path) {
                join(&dst_path, basename(&src_path))
            } else {
                dst_path.clone()
            };
            if self.remove_source {
                if target == src_path {
                    continue;
                }
                if is_within(&env.session.cwd, &src_path) {
                    return Err(ShellError::InvalidArgument {
                        cmd: self.name,
                        message: format!("cannot move '{src}': Device or resource busy"),
                    });
                }
                if is_within(&target, &src_path) {
                    return Err(ShellError::InvalidArgument {
                        cmd: self.name,
                        message: format!(
                            "cannot move '{src}' to a subdirectory of itself, '{}'",
                            target.strip_prefix(&format!("{}/", env.session.cwd)).unwrap_or(&target)
                        ),
                    });
                }
            }
            let mut copy = node.clone();
            copy.mtime = now.clone();
            if self.remove_source {
                vfs.remove(&src_path);
            }
            vfs.insert(target, copy);
        }
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// find
// ---------------------------------------------------------------------------

struct FindCmd;
impl Command for FindCmd {
    fn name(&self) -> &str {
        "find"
    }
    fn description(&self) -> &str {
        "Search for files by name or type"
    }
    fn usage(&self) -> &str {
        "find [path] [-name GLOB] [-type f|d]"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let (root, rest) = match args.split_first() {
            Some((first, rest)) if !first.starts_with('-') => (env.resolve(first), rest),
            _ => (env.session.cwd.clone(), args),
        };

        let mut name_filter = None;
        let mut type_filter = None;
        let mut iter = rest.iter();
        while let Some(&arg) = iter.next() {
            match arg {
                "-name" | "-type" => {
                    let Some(&value) = iter.next() else {
                        return Err(ShellError::InvalidArgument {
                            cmd: "find",
                            message: format!("missing argument to `{arg}'"),
                        });
                    };
                    if arg == "-name" {
                        name_filter = Some(glob_to_regex(value)?);
                    } else {
                        type_filter = Some(match value {
                            "f" => false,
                            "d" => true,
                            other => {
                                return Err(ShellError::InvalidArgument {
                                    cmd: "find",
                                    message: format!("Unknown argument to -type: {other}"),
                                });
                            },
                        });
                    }
                },
                _ => {},
            }
        }

        let hits: Vec<&str> = env
            .session
            .vfs
            .iter()
            .filter(|(path, node)| {
                path.starts_with(root.as_str())
                    && type_filter.is_none_or(|want_dir| node.is_dir() == want_dir)
                    && name_filter
                        .as_ref()
                        .is_none_or(|re| re.is_match(basename(path)))
            })
            .map(|(path, _)| path)
            .collect();
        Ok(CommandOutput::Text(hits.join("\n")))
    }
}

/// Anchored regex for a shell glob: `*` any run, `?` one character,
/// everything else literal.
fn glob_to_regex(glob: &str) -> Result<Regex> {
    let mut pattern = String::from("^");
    let mut buf = [0u8; 4];
    for c in glob.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            other => pattern.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    pattern.push('$');
    Regex::new(&pattern).map_err(|e| ShellError::InvalidArgument {
        cmd: "find",
        message: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// ln
// ---------------------------------------------------------------------------

/// Links are not modelled: the source node is copied as an independent entry.
struct LnCmd;
impl Command for LnCmd {
    fn name(&self) -> &str {
        "ln"
    }
    fn description(&self) -> &str {
        "Make links between files"
    }
    fn usage(&self) -> &str {
        "ln [-s] <target> <link>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let parsed = parse_flags(args);
        let &[src, dst, ..] = parsed.operands.as_slice() else {
            return Err(ShellError::MissingOperand {
                cmd: "ln",
                detail: "missing file operand",
            });
        };
        let src_path = env.resolve(src);
        let dst_path = env.resolve(dst);
        let vfs = &mut env.session.vfs;
        let Some(node) = vfs.get(&src_path) else {
            return Err(ShellError::fs(
                format!("ln: failed to access '{src}'"),
                FsError::NotFound,
            ));
        };
        if vfs.exists(&dst_path) {
            let kind = if parsed.has('s') { "symbolic" } else { "hard" };
            return Err(ShellError::fs(
                format!("ln: failed to create {kind} link '{dst}'"),
                FsError::AlreadyExists,
            ));
        }
        let copy = node.clone();
        vfs.insert(dst_path, copy);
        Ok(CommandOutput::None)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use archterm_vfs::{FixedClock, template};

    use super::*;
    use crate::session::Session;

    const NOW: &str = "Feb 14 09:30";

    fn setup() -> (CommandRegistry, Session) {
        let mut reg = CommandRegistry::new();
        register_builtins(&mut reg);
        let vfs = template::default_template().unwrap();
        let session = Session::new("t", vfs, Arc::new(FixedClock(NOW.into())), 500);
        (reg, session)
    }

    fn exec(reg: &CommandRegistry, s: &mut Session, line: &str) -> String {
        reg.interpret(s, line).output
    }

    #[test]
    fn flag_clusters_and_long_options() {
        let parsed = parse_flags(&["-la", "--color=auto", "x", "-", "-R"]);
        assert!(parsed.has('l') && parsed.has('a') && parsed.has('R'));
        assert!(!parsed.has('-'));
        assert_eq!(parsed.operands, ["x", "-"]);
        assert!(parsed.any(&['q', 'R']));
    }

    #[test]
    fn ls_home_hides_dotfiles() {
        let (reg, mut s) = setup();
        assert_eq!(
            exec(&reg, &mut s, "ls"),
            "Desktop  Documents  Downloads  Music  Pictures  Videos"
        );
    }

    #[test]
    fn ls_all_and_almost_all() {
        let (reg, mut s) = setup();
        let out = exec(&reg, &mut s, "ls -a");
        assert!(out.starts_with(".  ..  .bash_history  .bash_profile  .bashrc  .vimrc  Desktop"));
        let out = exec(&reg, &mut s, "ls -A");
        assert!(out.starts_with(".bash_history  .bash_profile"));
    }

    #[test]
    fn ls_long_format() {
        let (reg, mut s) = setup();
        let out = exec(&reg, &mut s, "ls -l Documents");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "total 2");
        assert_eq!(
            lines[1],
            "-rw-r--r-- 1 user user       71 Jan  1 00:00 notes.txt"
        );
        assert!(lines[2].ends_with(" todo.txt"));
    }

    #[test]
    fn ls_file_operand_and_missing() {
        let (reg, mut s) = setup();
        assert_eq!(exec(&reg, &mut s, "ls /etc/hostname"), "hostname");
        let r = reg.interpret(&mut s, "ls nope /etc/hostname");
        assert_eq!(
            r.output,
            "ls: cannot access 'nope': No such file or directory\nhostname"
        );
        assert_eq!(r.exit_code, Some(1));
    }

    #[test]
    fn ls_multiple_dirs_have_headers() {
        let (reg, mut s) = setup();
        let out = exec(&reg, &mut s, "ls /usr ~/Desktop");
        assert_eq!(out, "/usr:\nbin  lib\n/home/user/Desktop:\nreadme.txt");
    }

    #[test]
    fn ll_and_la_survive_unalias() {
        let (reg, mut s) = setup();
        let long = exec(&reg, &mut s, "ls -la");
        let almost = exec(&reg, &mut s, "ls -A");
        exec(&reg, &mut s, "unalias ll la");
        assert!(!s.aliases.contains_key("ll"));
        assert_eq!(exec(&reg, &mut s, "ll"), long);
        assert_eq!(exec(&reg, &mut s, "la"), almost);
        assert_eq!(exec(&reg, &mut s, "ll /tmp"), exec(&reg, &mut s, "ls -la /tmp"));
    }

    #[test]
    fn ls_dotdot_at_root_is_root() {
        let (reg, mut s) = setup();
        let out = exec(&reg, &mut s, "ls -la /");
        assert!(out.contains("drwxr-xr-x 1 root root     4096 Jan  1 00:00 ..\n"));
    }

    #[test]
    fn cd_and_pwd() {
        let (reg, mut s) = setup();
        assert_eq!(exec(&reg, &mut s, "cd /etc"), "");
        assert_eq!(exec(&reg, &mut s, "pwd"), "/etc");
        exec(&reg, &mut s, "cd");
        assert_eq!(s.cwd, "/home/user");
        exec(&reg, &mut s, "cd ../..");
        assert_eq!(s.cwd, "/");
    }

    #[test]
    fn cd_errors_leave_cwd() {
        let (reg, mut s) = setup();
        let r = reg.interpret(&mut s, "cd /nonexistent");
        assert_eq!(r.output, "bash: cd: /nonexistent: No such file or directory");
        assert_eq!(r.cwd, "/home/user");
        assert_eq!(
            exec(&reg, &mut s, "cd /etc/hosts"),
            "bash: cd: /etc/hosts: Not a directory"
        );
        assert_eq!(s.cwd, "/home/user");
    }

    #[test]
    fn cat_files_and_errors() {
        let (reg, mut s) = setup();
        assert_eq!(exec(&reg, &mut s, "cat /etc/hostname"), "archbtw\n");
        assert_eq!(
            exec(&reg, &mut s, "cat /etc /nope /etc/locale.conf"),
            "cat: /etc: Is a directory\ncat: /nope: No such file or directory\nLANG=en_US.UTF-8\n"
        );
        assert_eq!(exec(&reg, &mut s, "cat"), "cat: missing operand");
    }

    #[test]
    fn cat_numbered() {
        let (reg, mut s) = setup();
        assert_eq!(
            exec(&reg, &mut s, "cat -n /etc/hostname"),
            "     1\tarchbtw\n     2\t"
        );
    }

    #[test]
    fn less_behaves_like_cat() {
        let (reg, mut s) = setup();
        assert_eq!(exec(&reg, &mut s, "less /etc/hostname"), "archbtw\n");
        assert_eq!(exec(&reg, &mut s, "more"), "more: missing filename");
    }

    #[test]
    fn mkdir_errors() {
        let (reg, mut s) = setup();
        assert_eq!(
            exec(&reg, &mut s, "mkdir Documents"),
            "mkdir: cannot create directory 'Documents': File exists"
        );
        assert_eq!(
            exec(&reg, &mut s, "mkdir a/b"),
            "mkdir: cannot create directory 'a/b': No such file or directory"
        );
        assert_eq!(
            exec(&reg, &mut s, "mkdir /etc/hostname/x"),
            "mkdir: cannot create directory '/etc/hostname/x': Not a directory"
        );
        assert_eq!(exec(&reg, &mut s, "mkdir"), "mkdir: missing operand");
    }

    #[test]
    fn mkdir_aborts_on_first_failure() {
        let (reg, mut s) = setup();
        exec(&reg, &mut s, "mkdir one Documents two");
        assert!(s.vfs.is_dir("/home/user/one"));
        assert!(!s.vfs.exists("/home/user/two"));
    }

    #[test]
    fn mkdir_parents_creates_chain() {
        let (reg, mut s) = setup();
        assert_eq!(exec(&reg, &mut s, "mkdir -p a/b/c Documents"), "");
        for p in ["/home/user/a", "/home/user/a/b", "/home/user/a/b/c"] {
            let node = s.vfs.get(p).unwrap();
            assert!(node.is_dir());
            assert_eq!(node.mtime, NOW);
            assert_eq!(node.owner, "user");
        }
        exec(&reg, &mut s, "cd a/b/c");
        assert_eq!(exec(&reg, &mut s, "pwd"), "/home/user/a/b/c");
    }

    #[test]
    fn rmdir_rules() {
        let (reg, mut s) = setup();
        exec(&reg, &mut s, "mkdir d");
        exec(&reg, &mut s, "touch d/f");
        assert_eq!(
            exec(&reg, &mut s, "rmdir d"),
            "rmdir: failed to remove 'd': Directory not empty"
        );
        exec(&reg, &mut s, "rm d/f");
        assert_eq!(exec(&reg, &mut s, "rmdir d"), "");
        assert!(!s.vfs.exists("/home/user/d"));
        assert_eq!(
            exec(&reg, &mut s, "rmdir .bashrc"),
            "rmdir: failed to remove '.bashrc': Not a directory"
        );
        assert_eq!(
            exec(&reg, &mut s, "rmdir gone"),
            "rmdir: failed to remove 'gone': No such file or directory"
        );
        assert!(exec(&reg, &mut s, "rmdir /").contains("Device or resource busy"));
    }

    #[test]
    fn rmdir_sees_orphaned_descendants() {
        let (reg, mut s) = setup();
        exec(&reg, &mut s, "mkdir d");
        s.vfs.insert("/home/user/d/x/y", Node::empty_file("x"));
        assert!(exec(&reg, &mut s, "rmdir d").ends_with("Directory not empty"));
    }

    #[test]
    fn touch_creates_and_refreshes() {
        let (reg, mut s) = setup();
        exec(&reg, &mut s, "touch new.txt");
        let node = s.vfs.get("/home/user/new.txt").unwrap();
        assert_eq!(node.size, 0);
        assert_eq!(node.content(), Some(""));
        assert_eq!(node.perms, "-rw-r--r--");

        exec(&reg, &mut s, "touch Documents/notes.txt");
        let notes = s.vfs.get("/home/user/Documents/notes.txt").unwrap();
        assert_eq!(notes.size, 71);
        assert!(notes.content().unwrap().starts_with("Arch Linux"));
        assert_eq!(notes.mtime, NOW);

        assert_eq!(exec(&reg, &mut s, "touch"), "touch: missing file operand");
    }

    #[test]
    fn rm_recursive_removes_subtree_only() {
        let (reg, mut s) = setup();
        exec(&reg, &mut s, "mkdir -p d/sub");
        exec(&reg, &mut s, "touch d/sub/f d/g");
        exec(&reg, &mut s, "mkdir keep");
        let before = s.vfs.len();
        assert_eq!(exec(&reg, &mut s, "rm -rf d"), "");
        assert_eq!(s.vfs.len(), before - 4);
        assert!(s.vfs.exists("/home/user/keep"));
        assert_eq!(exec(&reg, &mut s, "find /home/user/d"), "");
    }

    #[test]
    fn rm_errors() {
        let (reg, mut s) = setup();
        assert_eq!(
            exec(&reg, &mut s, "rm Documents"),
            "rm: cannot remove 'Documents': Is a directory"
        );
        assert_eq!(
            exec(&reg, &mut s, "rm nope"),
            "rm: cannot remove 'nope': No such file or directory"
        );
        assert_eq!(exec(&reg, &mut s, "rm -f nope"), "");
        assert_eq!(exec(&reg, &mut s, "rm"), "rm: missing operand");
        assert_eq!(
            exec(&reg, &mut s, "rm -rf /"),
            "rm: it is dangerous to operate recursively on '/'"
        );
        assert!(s.vfs.exists("/"));
    }

    #[test]
    fn rm_keeps_working_directory() {
        let (reg, mut s) = setup();
        exec(&reg, &mut s, "mkdir d");
        exec(&reg, &mut s, "cd d");
        let r = reg.interpret(&mut s, "rm -r .");
        assert_eq!(r.output, "rm: refusing to remove '.' or '..' directory: skipping '.'");
        assert_eq!(r.exit_code, Some(1));
        assert_eq!(
            exec(&reg, &mut s, "rm -r .."),
            "rm: refusing to remove '.' or '..' directory: skipping '..'"
        );
        assert_eq!(
            exec(&reg, &mut s, "rm -r ~"),
            "rm: cannot remove '~': Device or resource busy"
        );
        assert!(s.vfs.is_dir("/home/user/d"));
        assert_eq!(exec(&reg, &mut s, "ls"), "");
        assert_eq!(exec(&reg, &mut s, "pwd"), "/home/user/d");
    }

    #[test]
    fn rmdir_refuses_working_directory() {
        let (reg, mut s) = setup();
        exec(&reg, &mut s, "mkdir d");
        exec(&reg, &mut s, "cd d");
        assert_eq!(
            exec(&reg, &mut s, "rmdir ."),
            "rmdir: failed to remove '.': Invalid argument"
        );
        assert_eq!(
            exec(&reg, &mut s, "rmdir /home/user/d"),
            "rmdir: failed to remove '/home/user/d': Device or resource busy"
        );
        assert!(s.vfs.is_dir("/home/user/d"));
    }

    #[test]
    fn cp_into_directory_and_rename() {
        let (reg, mut s) = setup();
        exec(&reg, &mut s, "cp Documents/notes.txt Desktop");
        let copy = s.vfs.get("/home/user/Desktop/notes.txt").unwrap();
        assert_eq!(copy.mtime, NOW);
        assert_eq!(copy.content(), s.vfs.get("/home/user/Documents/notes.txt").unwrap().content());
        exec(&reg, &mut s, "cp .vimrc vimrc.bak");
        assert!(s.vfs.exists("/home/user/vimrc.bak"));
        assert!(s.vfs.exists("/home/user/.vimrc"));
    }

    #[test]
    fn cp_directory_needs_recursive_and_is_shallow() {
        let (reg, mut s) = setup();
        assert_eq!(
            exec(&reg, &mut s, "cp Documents docs"),
            "cp: -r not specified; omitting directory 'Documents'"
        );
        exec(&reg, &mut s, "cp -r Documents docs");
        assert!(s.vfs.is_dir("/home/user/docs"));
        assert_eq!(s.vfs.children("/home/user/docs").len(), 0);
    }

    #[test]
    fn cp_errors() {
        let (reg, mut s) = setup();
        assert_eq!(
            exec(&reg, &mut s, "cp ghost x"),
            "cp: cannot stat 'ghost': No such file or directory"
        );
        assert_eq!(
            exec(&reg, &mut s, "cp only"),
            "cp: missing destination file operand"
        );
    }

    #[test]
    fn mv_moves_single_node() {
        let (reg, mut s) = setup();
        exec(&reg, &mut s, "mv Documents/todo.txt todo.md");
        assert!(!s.vfs.exists("/home/user/Documents/todo.txt"));
        assert!(s.vfs.read("/home/user/todo.md").unwrap().starts_with("TODO:"));
        assert_eq!(
            exec(&reg, &mut s, "mv Music tunes"),
            "mv: -r not specified; omitting directory 'Music'"
        );
        assert_eq!(exec(&reg, &mut s, "mv"), "mv: missing destination file operand");
    }

    #[test]
    fn mv_onto_itself_is_noop() {
        let (reg, mut s) = setup();
        exec(&reg, &mut s, "mv .vimrc ~/.vimrc");
        assert!(s.vfs.exists("/home/user/.vimrc"));
        exec(&reg, &mut s, "mv .vimrc .");
        assert!(s.vfs.exists("/home/user/.vimrc"));
    }

    #[test]
    fn mv_refuses_working_directory_and_self_nesting() {
        let (reg, mut s) = setup();
        exec(&reg, &mut s, "cd Documents");
        assert_eq!(
            exec(&reg, &mut s, "mv -r . x"),
            "mv: cannot move '.': Device or resource busy"
        );
        exec(&reg, &mut s, "cd ..");
        let r = reg.interpret(&mut s, "mv -r Documents Documents");
        assert_eq!(
            r.output,
            "mv: cannot move 'Documents' to a subdirectory of itself, 'Documents/Documents'"
        );
        assert_eq!(r.exit_code, Some(1));
        assert!(s.vfs.is_dir("/home/user/Documents"));
        assert!(!s.vfs.exists("/home/user/Documents/Documents"));
    }

    #[test]
    fn mv_directory_leaves_descendants() {
        let (reg, mut s) = setup();
        exec(&reg, &mut s, "mv -r Documents Docs");
        assert!(s.vfs.is_dir("/home/user/Docs"));
        assert!(!s.vfs.exists("/home/user/Documents"));
        assert!(s.vfs.exists("/home/user/Documents/notes.txt"));
    }

    #[test]
    fn find_by_name_and_type() {
        let (reg, mut s) = setup();
        assert_eq!(
            exec(&reg, &mut s, "find / -name *.txt"),
            "/home/user/Documents/notes.txt\n/home/user/Documents/todo.txt\n/home/user/Desktop/readme.txt"
        );
        assert_eq!(
            exec(&reg, &mut s, "find /var -type d"),
            "/var\n/var/log"
        );
        assert_eq!(exec(&reg, &mut s, "find /etc -name host?"), "/etc/hosts");
        assert_eq!(exec(&reg, &mut s, "find Documents -type f -name todo.txt"), "/home/user/Documents/todo.txt");
    }

    #[test]
    fn find_glob_is_literal_otherwise() {
        let (reg, mut s) = setup();
        assert_eq!(exec(&reg, &mut s, "find /etc -name os.release"), "");
        assert_eq!(exec(&reg, &mut s, "find /etc -name os-release"), "/etc/os-release");
        assert_eq!(exec(&reg, &mut s, "find / -name a+b"), "");
    }

    #[test]
    fn find_bad_arguments() {
        let (reg, mut s) = setup();
        assert_eq!(exec(&reg, &mut s, "find -name"), "find: missing argument to `-name'");
        assert_eq!(
            exec(&reg, &mut s, "find / -type x"),
            "find: Unknown argument to -type: x"
        );
    }

    #[test]
    fn ln_copies_node() {
        let (reg, mut s) = setup();
        exec(&reg, &mut s, "ln -s /etc/hostname host");
        assert_eq!(s.vfs.read("/home/user/host"), Ok("archbtw\n"));
        exec(&reg, &mut s, "rm host");
        assert!(s.vfs.exists("/etc/hostname"));
        assert_eq!(
            exec(&reg, &mut s, "ln nope x"),
            "ln: failed to access 'nope': No such file or directory"
        );
        assert_eq!(
            exec(&reg, &mut s, "ln -s .vimrc .bashrc"),
            "ln: failed to create symbolic link '.bashrc': File exists"
        );
        assert_eq!(exec(&reg, &mut s, "ln a"), "ln: missing file operand");
    }
}
