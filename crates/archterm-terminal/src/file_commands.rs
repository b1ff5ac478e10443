//! File metadata and path helper commands: stat, file, du, basename, dirname.

use archterm_types::error::{FsError, Result, ShellError};
use archterm_vfs::path::{basename, normalize, parent};

use crate::commands::parse_flags;
use crate::interpreter::{Command, CommandOutput, Environment};

/// Timestamp printed on the access and change lines of `stat`.
const STAT_EPOCH: &str = "2024-01-01 00:00:00.000000000 +0000";

// ---------------------------------------------------------------------------
// stat
// ---------------------------------------------------------------------------

/// Stable pseudo inode for a path, in `10000..=109999`.
fn inode_for(path: &str) -> u64 {
    // FNV-1a keeps the value identical across builds and platforms.
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in path.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash % 100_000 + 10_000
}

pub(crate) struct StatCmd;
impl Command for StatCmd {
    fn name(&self) -> &str {
        "stat"
    }
    fn description(&self) -> &str {
        "Display file status"
    }
    fn usage(&self) -> &str {
        "stat <path>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let Some(&arg) = args.first() else {
            return Err(ShellError::MissingOperand {
                cmd: "stat",
                detail: "missing operand",
            });
        };
        let path = env.resolve(arg);
        let Some(node) = env.session.vfs.get(&path) else {
            return Err(ShellError::fs(
                format!("stat: cannot stat '{arg}'"),
                FsError::NotFound,
            ));
        };
        let kind = if node.is_dir() {
            "directory"
        } else {
            "regular file"
        };
        Ok(CommandOutput::Text(format!(
            "  File: {arg}\n  Size: {}\t\tBlocks: {}\t IO Block: 4096\t{kind}\n\
             Device: fd01h/64769d\tInode: {}\tLinks: 1\n\
             Access: ({}/{})\tUid: ( 1000/ user)\tGid: ( 1000/ user)\n\
             Access: {STAT_EPOCH}\nModify: {}\nChange: {STAT_EPOCH}",
            node.size,
            node.blocks(),
            inode_for(&path),
            node.octal_mode(),
            node.perms,
            node.mtime,
        )))
    }
}

// ---------------------------------------------------------------------------
// file
// ---------------------------------------------------------------------------

/// Type description keyed on the operand's extension.
fn describe_extension(name: &str) -> &'static str {
    let ext = name.rsplit('.').next().unwrap_or_default();
    match ext {
        "sh" => "Bourne-Again shell script, ASCII text executable",
        "py" => "Python script, ASCII text executable",
        "js" => "Node.js script, ASCII text executable",
        "c" => "C source, ASCII text",
        "cpp" => "C++ source, ASCII text",
        "h" => "C header, ASCII text",
        _ => "ASCII text",
    }
}

pub(crate) struct FileCmd;
impl Command for FileCmd {
    fn name(&self) -> &str {
        "file"
    }
    fn description(&self) -> &str {
        "Determine file type"
    }
    fn usage(&self) -> &str {
        "file <path>"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let Some(&arg) = args.first() else {
            return Err(ShellError::MissingOperand {
                cmd: "file",
                detail: "missing operand",
            });
        };
        let text = match env.session.vfs.get(&env.resolve(arg)) {
            None => {
                return Ok(CommandOutput::Status {
                    text: format!("{arg}: ERROR: {}", FsError::NotFound),
                    code: 1,
                });
            },
            Some(node) if node.is_dir() => format!("{arg}: directory"),
            Some(_) => format!("{arg}: {}", describe_extension(arg)),
        };
        Ok(CommandOutput::Text(text))
    }
}

// ---------------------------------------------------------------------------
// du
// ---------------------------------------------------------------------------

pub(crate) struct DuCmd;
impl Command for DuCmd {
    fn name(&self) -> &str {
        "du"
    }
    fn description(&self) -> &str {
        "Show disk usage of files/directories"
    }
    fn usage(&self) -> &str {
        "du [-h] [path]"
    }
    fn category(&self) -> &str {
        "filesystem"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let parsed = parse_flags(args);
        let label = match parsed.operands.first() {
            Some(operand) => (*operand).to_string(),
            None => env.session.cwd.clone(),
        };
        let root = env.resolve(&label);
        if !env.session.vfs.exists(&root) {
            return Err(ShellError::fs(
                format!("du: cannot access '{label}'"),
                FsError::NotFound,
            ));
        }
        let bytes: u64 = env.session.vfs.subtree(&root).map(|(_, n)| n.size).sum();
        let kib = bytes.div_ceil(1024);
        let size = if parsed.has('h') {
            format!("{kib}K")
        } else {
            kib.to_string()
        };
        Ok(CommandOutput::Text(format!("{size}\t{label}")))
    }
}

// ---------------------------------------------------------------------------
// basename / dirname
// ---------------------------------------------------------------------------

pub(crate) struct BasenameCmd;
impl Command for BasenameCmd {
    fn name(&self) -> &str {
        "basename"
    }
    fn description(&self) -> &str {
        "Strip directory from a path"
    }
    fn usage(&self) -> &str {
        "basename <path>"
    }
    fn category(&self) -> &str {
        "path"
    }
    fn execute(&self, args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        let arg = args.first().copied().unwrap_or_default();
        Ok(CommandOutput::Text(basename(arg).to_string()))
    }
}

/// Everything but the last segment, always absolute.
pub(crate) struct DirnameCmd;
impl Command for DirnameCmd {
    fn name(&self) -> &str {
        "dirname"
    }
    fn description(&self) -> &str {
        "Strip last component from a path"
    }
    fn usage(&self) -> &str {
        "dirname <path>"
    }
    fn category(&self) -> &str {
        "path"
    }
    fn execute(&self, args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        let arg = args.first().copied().unwrap_or("/");
        Ok(CommandOutput::Text(parent(&normalize(arg)).to_string()))
    }
}
