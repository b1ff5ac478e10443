//! Text inspection commands: grep, head, tail, wc, sort, uniq, nl, rev, diff.
//!
//! Lines are the `\n`-separated segments of a file, so content ending in a
//! newline has a trailing empty line.

use std::sync::LazyLock;

use archterm_types::error::{Result, ShellError};
use indexmap::IndexSet;
use regex::{Regex, RegexBuilder};

use crate::commands::{parse_flags, read_operand};
use crate::interpreter::{Command, CommandOutput, Environment};

// ---------------------------------------------------------------------------
// grep
// ---------------------------------------------------------------------------

pub(crate) struct GrepCmd;
impl Command for GrepCmd {
    fn name(&self) -> &str {
        "grep"
    }
    fn description(&self) -> &str {
        "Search files for lines matching a pattern"
    }
    fn usage(&self) -> &str {
        "grep [-i] [-n] [-v] [-c] [-r] <pattern> <file...>"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let parsed = parse_flags(args);
        let Some((pattern, files)) = parsed.operands.split_first() else {
            return Err(ShellError::Usage("grep [OPTION]... PATTERN [FILE]..."));
        };
        if files.is_empty() {
            return Err(ShellError::InvalidArgument {
                cmd: "grep",
                message: "no input files".to_string(),
            });
        }
        let invert = parsed.has('v');
        let numbered = parsed.has('n');
        let count_only = parsed.has('c');
        let re = RegexBuilder::new(pattern)
            .case_insensitive(parsed.has('i'))
            .build()
            .map_err(|e| ShellError::InvalidArgument {
                cmd: "grep",
                message: format!("invalid pattern: {e}"),
            })?;
        let labelled = files.len() > 1;

        let mut out = Vec::new();
        let mut failed = false;
        for file in files {
            let content = match read_operand(&env.session.vfs, &env.session.cwd, file) {
                Ok(c) => c,
                Err(e) => {
                    out.push(ShellError::fs(format!("grep: {file}"), e).to_string());
                    failed = true;
                    continue;
                },
            };
            let mut matched = 0usize;
            for (idx, line) in content.split('\n').enumerate() {
                if re.is_match(line) == invert {
                    continue;
                }
                matched += 1;
                if count_only {
                    continue;
                }
                let mut row = String::new();
                if labelled {
                    row.push_str(file);
                    row.push(':');
                }
                if numbered {
                    row.push_str(&format!("{}:", idx + 1));
                }
                row.push_str(line);
                out.push(row);
            }
            if count_only {
                out.push(if labelled {
                    format!("{file}:{matched}")
                } else {
                    matched.to_string()
                });
            }
        }
        Ok(CommandOutput::lines(out, failed))
    }
}

// ---------------------------------------------------------------------------
// head / tail
// ---------------------------------------------------------------------------

/// Parse `-n N` or `-N`, returning the line count and the file operands.
fn parse_n_flag<'a>(cmd: &'static str, args: &[&'a str]) -> Result<(usize, Vec<&'a str>)> {
    let invalid = |value: &str| ShellError::InvalidArgument {
        cmd,
        message: format!("invalid number of lines: '{value}'"),
    };
    let mut n = 10;
    let mut files = Vec::new();
    let mut iter = args.iter();
    while let Some(&arg) = iter.next() {
        if arg == "-n" {
            let Some(&value) = iter.next() else {
                return Err(ShellError::InvalidArgument {
                    cmd,
                    message: "option requires an argument -- 'n'".to_string(),
                });
            };
            n = value.parse().map_err(|_| invalid(value))?;
        } else if let Some(digits) = arg.strip_prefix("-n").filter(|d| !d.is_empty()) {
            n = digits.parse().map_err(|_| invalid(digits))?;
        } else if let Some(digits) = arg
            .strip_prefix('-')
            .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
        {
            n = digits.parse().map_err(|_| invalid(digits))?;
        } else if !arg.starts_with("--") {
            files.push(arg);
        }
    }
    Ok((n, files))
}

/// Shared body of head and tail: `pick` selects the lines to keep.
fn slice_files(
    cmd: &'static str,
    args: &[&str],
    env: &Environment<'_>,
    pick: fn(Vec<&str>, usize) -> Vec<&str>,
) -> Result<CommandOutput> {
    let (n, files) = parse_n_flag(cmd, args)?;
    if files.is_empty() {
        return Err(ShellError::MissingOperand {
            cmd,
            detail: "missing file operand",
        });
    }
    let headed = files.len() > 1;
    let mut out = Vec::new();
    let mut failed = false;
    for file in &files {
        match read_operand(&env.session.vfs, &env.session.cwd, file) {
            Ok(content) => {
                if headed {
                    out.push(format!("==> {file} <=="));
                }
                out.push(pick(content.split('\n').collect(), n).join("\n"));
            },
            Err(e) => {
                let context = format!("{cmd}: cannot open '{file}' for reading");
                out.push(ShellError::fs(context, e).to_string());
                failed = true;
            },
        }
    }
    Ok(CommandOutput::lines(out, failed))
}

pub(crate) struct HeadCmd;
impl Command for HeadCmd {
    fn name(&self) -> &str {
        "head"
    }
    fn description(&self) -> &str {
        "Show first N lines of files"
    }
    fn usage(&self) -> &str {
        "head [-n N] <file...>"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        slice_files("head", args, env, |lines, n| lines.into_iter().take(n).collect())
    }
}

pub(crate) struct TailCmd;
impl Command for TailCmd {
    fn name(&self) -> &str {
        "tail"
    }
    fn description(&self) -> &str {
        "Show last N lines of files"
    }
    fn usage(&self) -> &str {
        "tail [-n N] <file...>"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        slice_files("tail", args, env, |mut lines, n| {
            let start = lines.len().saturating_sub(n);
            lines.split_off(start)
        })
    }
}

// ---------------------------------------------------------------------------
// wc
// ---------------------------------------------------------------------------

pub(crate) struct WcCmd;
impl Command for WcCmd {
    fn name(&self) -> &str {
        "wc"
    }
    fn description(&self) -> &str {
        "Count lines, words, and characters"
    }
    fn usage(&self) -> &str {
        "wc [-l] [-w] [-c] <file...>"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let parsed = parse_flags(args);
        if parsed.operands.is_empty() {
            return Err(ShellError::MissingOperand {
                cmd: "wc",
                detail: "missing file operand",
            });
        }
        let mut selected = [parsed.has('l'), parsed.has('w'), parsed.any(&['c', 'm'])];
        if selected.iter().all(|s| !s) {
            selected = [true; 3];
        }
        let row = |counts: [usize; 3], label: &str| {
            let mut line = String::new();
            for (count, on) in counts.iter().zip(selected) {
                if on {
                    line.push_str(&format!("{count:>7}"));
                }
            }
            format!("{line} {label}")
        };

        let mut out = Vec::new();
        let mut totals = [0usize; 3];
        let mut failed = false;
        for file in &parsed.operands {
            match read_operand(&env.session.vfs, &env.session.cwd, file) {
                Ok(content) => {
                    let counts = [
                        content.split('\n').count(),
                        content.split_whitespace().count(),
                        content.chars().count(),
                    ];
                    for (total, c) in totals.iter_mut().zip(counts) {
                        *total += c;
                    }
                    out.push(row(counts, file));
                },
                Err(e) => {
                    out.push(ShellError::fs(format!("wc: {file}"), e).to_string());
                    failed = true;
                },
            }
        }
        if parsed.operands.len() > 1 {
            out.push(row(totals, "total"));
        }
        Ok(CommandOutput::lines(out, failed))
    }
}

// ---------------------------------------------------------------------------
// sort / uniq
// ---------------------------------------------------------------------------

static NUMERIC_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?")
        .unwrap_or_else(|e| unreachable!("static pattern: {e}"))
});

/// Leading number of a line, NaN when there is none.
fn numeric_key(line: &str) -> f64 {
    NUMERIC_PREFIX
        .find(line)
        .and_then(|m| m.as_str().trim_start().parse().ok())
        .unwrap_or(f64::NAN)
}

pub(crate) struct SortCmd;
impl Command for SortCmd {
    fn name(&self) -> &str {
        "sort"
    }
    fn description(&self) -> &str {
        "Sort lines of files"
    }
    fn usage(&self) -> &str {
        "sort [-n] [-r] [-u] <file...>"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let parsed = parse_flags(args);
        let mut errors = Vec::new();
        let mut lines: Vec<&str> = Vec::new();
        for file in &parsed.operands {
            match read_operand(&env.session.vfs, &env.session.cwd, file) {
                Ok(content) => lines.extend(content.split('\n')),
                Err(e) => errors.push(ShellError::fs(format!("sort: {file}"), e).to_string()),
            }
        }

        if parsed.has('n') {
            lines.sort_by(|a, b| numeric_key(a).total_cmp(&numeric_key(b)));
        } else {
            lines.sort();
        }
        if parsed.has('r') {
            lines.reverse();
        }
        if parsed.has('u') {
            let unique: IndexSet<&str> = lines.into_iter().collect();
            lines = unique.into_iter().collect();
        }

        let failed = !errors.is_empty();
        errors.extend(lines.into_iter().map(str::to_string));
        Ok(CommandOutput::lines(errors, failed))
    }
}

/// Read the first operand of a single-file command.
fn first_file<'v>(cmd: &'static str, args: &[&str], env: &'v Environment<'_>) -> Result<&'v str> {
    let parsed = parse_flags(args);
    let Some(file) = parsed.operands.first() else {
        return Err(ShellError::MissingOperand {
            cmd,
            detail: "missing operand",
        });
    };
    read_operand(&env.session.vfs, &env.session.cwd, file)
        .map_err(|e| ShellError::fs(format!("{cmd}: {file}"), e))
}

pub(crate) struct UniqCmd;
impl Command for UniqCmd {
    fn name(&self) -> &str {
        "uniq"
    }
    fn description(&self) -> &str {
        "Drop repeated adjacent lines"
    }
    fn usage(&self) -> &str {
        "uniq <file>"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let content = first_file("uniq", args, env)?;
        let mut lines: Vec<&str> = content.split('\n').collect();
        lines.dedup();
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// nl / rev
// ---------------------------------------------------------------------------

pub(crate) struct NlCmd;
impl Command for NlCmd {
    fn name(&self) -> &str {
        "nl"
    }
    fn description(&self) -> &str {
        "Number lines of a file"
    }
    fn usage(&self) -> &str {
        "nl <file>"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let content = first_file("nl", args, env)?;
        let numbered: Vec<String> = content
            .split('\n')
            .enumerate()
            .map(|(i, line)| format!("{:>6}\t{line}", i + 1))
            .collect();
        Ok(CommandOutput::Text(numbered.join("\n")))
    }
}

pub(crate) struct RevCmd;
impl Command for RevCmd {
    fn name(&self) -> &str {
        "rev"
    }
    fn description(&self) -> &str {
        "Reverse characters of each line"
    }
    fn usage(&self) -> &str {
        "rev <file>"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let content = first_file("rev", args, env)?;
        let reversed: Vec<String> = content
            .split('\n')
            .map(|line| line.chars().rev().collect())
            .collect();
        Ok(CommandOutput::Text(reversed.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// diff
// ---------------------------------------------------------------------------

/// Prints a fixed unified-diff skeleton; contents are never compared.
pub(crate) struct DiffCmd;
impl Command for DiffCmd {
    fn name(&self) -> &str {
        "diff"
    }
    fn description(&self) -> &str {
        "Compare files line by line"
    }
    fn usage(&self) -> &str {
        "diff <file1> <file2>"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        let parsed = parse_flags(args);
        let &[a, b, ..] = parsed.operands.as_slice() else {
            return Err(ShellError::MissingOperand {
                cmd: "diff",
                detail: "missing operand",
            });
        };
        Ok(CommandOutput::Text(format!(
            "--- {a}\t2024-01-01 00:00:00\n+++ {b}\t2024-01-01 00:00:01\n@@ -1,3 +1,3 @@\n-old content\n+new content"
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use archterm_vfs::{FixedClock, MemoryVfs, Node, NodeKind};

    use super::*;
    use crate::session::Session;
    use crate::{CommandRegistry, register_builtins};

    fn file(content: &str) -> Node {
        let mut node = Node::empty_file("Jan  1 00:00");
        node.size = content.len() as u64;
        node.kind = NodeKind::File {
            content: content.to_string(),
        };
        node
    }

    fn setup() -> (CommandRegistry, Session) {
        let mut reg = CommandRegistry::new();
        register_builtins(&mut reg);
        let mut vfs = MemoryVfs::new();
        vfs.insert("/tmp", Node::dir("Jan  1 00:00"));
        vfs.insert("/tmp/greek.txt", file("alpha\nbeta\ngamma\ndelta\nepsilon"));
        vfs.insert("/tmp/nums.txt", file("10\n9\n100\nabc\n-2.5\n9"));
        vfs.insert("/tmp/dups.txt", file("a\na\nb\na\nb\nb"));
        vfs.insert("/tmp/abc.txt", file("a\nb\nc"));
        let mut session = Session::new("t", vfs, Arc::new(FixedClock("x".into())), 500);
        session.cwd = "/tmp".to_string();
        (reg, session)
    }

    fn exec(reg: &CommandRegistry, s: &mut Session, line: &str) -> String {
        reg.interpret(s, line).output
    }

    #[test]
    fn grep_basic_and_case() {
        let (reg, mut s) = setup();
        assert_eq!(exec(&reg, &mut s, "grep ta greek.txt"), "beta\ndelta");
        assert_eq!(exec(&reg, &mut s, "grep ALPHA greek.txt"), "");
        assert_eq!(exec(&reg, &mut s, "grep -i ALPHA greek.txt"), "alpha");
    }

    #[test]
    fn grep_invert_numbered_keeps_original_numbers() {
        let (reg, mut s) = setup();
        assert_eq!(exec(&reg, &mut s, "grep -vn a greek.txt"), "5:epsilon");
        assert_eq!(
            exec(&reg, &mut s, "grep -v -n ta greek.txt"),
            "1:alpha\n3:gamma\n5:epsilon"
        );
    }

    #[test]
    fn grep_regex_and_count() {
        let (reg, mut s) = setup();
        assert_eq!(exec(&reg, &mut s, "grep ^[ab] greek.txt"), "alpha\nbeta");
        assert_eq!(exec(&reg, &mut s, "grep -c a greek.txt"), "4");
        assert_eq!(
            exec(&reg, &mut s, "grep -c a greek.txt abc.txt"),
            "greek.txt:4\nabc.txt:1"
        );
    }

    #[test]
    fn grep_multiple_files_prefix() {
        let (reg, mut s) = setup();
        assert_eq!(
            exec(&reg, &mut s, "grep -n b greek.txt abc.txt"),
            "greek.txt:2:beta\nabc.txt:2:b"
        );
    }

    #[test]
    fn grep_color_alias_is_harmless() {
        let (reg, mut s) = setup();
        s.aliases.insert("grep".into(), "grep --color=auto".into());
        assert_eq!(exec(&reg, &mut s, "grep beta greek.txt"), "beta");
    }

    #[test]
    fn grep_errors() {
        let (reg, mut s) = setup();
        assert_eq!(
            exec(&reg, &mut s, "grep"),
            "Usage: grep [OPTION]... PATTERN [FILE]..."
        );
        assert_eq!(exec(&reg, &mut s, "grep x"), "grep: no input files");
        assert!(exec(&reg, &mut s, "grep ( greek.txt").starts_with("grep: invalid pattern: "));
        let r = reg.interpret(&mut s, "grep a nope.txt /tmp abc.txt");
        assert_eq!(
            r.output,
            "grep: nope.txt: No such file or directory\ngrep: /tmp: Is a directory\nabc.txt:a"
        );
        assert_eq!(r.exit_code, Some(1));
    }

    #[test]
    fn head_and_tail_counts() {
        let (reg, mut s) = setup();
        assert_eq!(exec(&reg, &mut s, "head greek.txt"), "alpha\nbeta\ngamma\ndelta\nepsilon");
        assert_eq!(exec(&reg, &mut s, "head -n 2 greek.txt"), "alpha\nbeta");
        assert_eq!(exec(&reg, &mut s, "head -3 greek.txt"), "alpha\nbeta\ngamma");
        assert_eq!(exec(&reg, &mut s, "tail -n 2 greek.txt"), "delta\nepsilon");
        assert_eq!(exec(&reg, &mut s, "tail -1 greek.txt"), "epsilon");
        assert_eq!(exec(&reg, &mut s, "tail -n 0 greek.txt"), "");
    }

    #[test]
    fn head_multiple_files_and_missing() {
        let (reg, mut s) = setup();
        assert_eq!(
            exec(&reg, &mut s, "head -n 1 abc.txt ghost greek.txt"),
            "==> abc.txt <==\na\nhead: cannot open 'ghost' for reading: No such file or directory\n==> greek.txt <==\nalpha"
        );
    }

    #[test]
    fn head_bad_count() {
        let (reg, mut s) = setup();
        assert_eq!(
            exec(&reg, &mut s, "head -n x greek.txt"),
            "head: invalid number of lines: 'x'"
        );
        assert_eq!(exec(&reg, &mut s, "tail"), "tail: missing file operand");
    }

    #[test]
    fn wc_counts() {
        let (reg, mut s) = setup();
        assert_eq!(exec(&reg, &mut s, "wc -l abc.txt"), "      3 abc.txt");
        assert_eq!(exec(&reg, &mut s, "wc abc.txt"), "      3      3      5 abc.txt");
        assert_eq!(exec(&reg, &mut s, "wc -lw abc.txt"), "      3      3 abc.txt");
    }

    #[test]
    fn wc_counts_split_segments() {
        let (reg, mut s) = setup();
        s.vfs.insert("/tmp/nl.txt", file("a\n"));
        assert_eq!(exec(&reg, &mut s, "wc -l nl.txt"), "      2 nl.txt");
    }

    #[test]
    fn wc_total_row() {
        let (reg, mut s) = setup();
        assert_eq!(
            exec(&reg, &mut s, "wc -l abc.txt greek.txt"),
            "      3 abc.txt\n      5 greek.txt\n      8 total"
        );
        assert_eq!(
            exec(&reg, &mut s, "wc -c abc.txt gone"),
            "      5 abc.txt\nwc: gone: No such file or directory\n      5 total"
        );
    }

    #[test]
    fn sort_default_and_reverse() {
        let (reg, mut s) = setup();
        assert_eq!(
            exec(&reg, &mut s, "sort greek.txt"),
            "alpha\nbeta\ndelta\nepsilon\ngamma"
        );
        assert_eq!(exec(&reg, &mut s, "sort -r abc.txt"), "c\nb\na");
    }

    #[test]
    fn sort_numeric_puts_non_numbers_last() {
        let (reg, mut s) = setup();
        assert_eq!(
            exec(&reg, &mut s, "sort -n nums.txt"),
            "-2.5\n9\n9\n10\n100\nabc"
        );
    }

    #[test]
    fn sort_unique_across_whole_set() {
        let (reg, mut s) = setup();
        assert_eq!(exec(&reg, &mut s, "sort -u dups.txt"), "a\nb");
        assert_eq!(exec(&reg, &mut s, "sort -nu nums.txt"), "-2.5\n9\n10\n100\nabc");
    }

    #[test]
    fn sort_merges_files_and_reports_missing() {
        let (reg, mut s) = setup();
        let r = reg.interpret(&mut s, "sort abc.txt nope dups.txt");
        assert_eq!(
            r.output,
            "sort: nope: No such file or directory\na\na\na\na\nb\nb\nb\nb\nc"
        );
        assert_eq!(r.exit_code, Some(1));
    }

    #[test]
    fn numeric_key_parsing() {
        assert_eq!(numeric_key("42abc"), 42.0);
        assert_eq!(numeric_key("  -3.5 x"), -3.5);
        assert_eq!(numeric_key("1e3"), 1000.0);
        assert!(numeric_key("abc").is_nan());
        assert!(numeric_key("").is_nan());
    }

    #[test]
    fn uniq_adjacent_only() {
        let (reg, mut s) = setup();
        assert_eq!(exec(&reg, &mut s, "uniq dups.txt"), "a\nb\na\nb");
        assert_eq!(exec(&reg, &mut s, "uniq"), "uniq: missing operand");
        assert_eq!(
            exec(&reg, &mut s, "uniq nope"),
            "uniq: nope: No such file or directory"
        );
    }

    #[test]
    fn nl_and_rev() {
        let (reg, mut s) = setup();
        assert_eq!(exec(&reg, &mut s, "nl abc.txt"), "     1\ta\n     2\tb\n     3\tc");
        assert_eq!(exec(&reg, &mut s, "rev greek.txt"), "ahpla\nateb\nammag\natled\nnolispe");
    }

    #[test]
    fn diff_skeleton() {
        let (reg, mut s) = setup();
        let out = exec(&reg, &mut s, "diff abc.txt greek.txt");
        assert!(out.starts_with("--- abc.txt\t2024-01-01 00:00:00\n+++ greek.txt\t"));
        assert!(out.ends_with("-old content\n+new content"));
        assert_eq!(exec(&reg, &mut s, "diff one"), "diff: missing operand");
    }
}
