//! The read-eval-print loop.

use std::io::{BufRead, Write};

use anyhow::Result;
use archterm_core::Shell;

/// Prefix marking a completion request instead of a command line.
const COMPLETE_PREFIX: char = '\t';

/// Run lines from `input` through `session` until EOF or `exit`.
///
/// A `reboot` discards the session so the next line starts from the
/// template filesystem.
pub fn run<R: BufRead, W: Write>(
    shell: &Shell,
    session: &str,
    json: bool,
    input: R,
    mut out: W,
) -> Result<()> {
    for line in input.lines() {
        let line = line?;
        if let Some(partial) = line.strip_prefix(COMPLETE_PREFIX) {
            let candidates = shell.complete(session, partial);
            if json {
                writeln!(out, "{}", serde_json::to_string(&candidates)?)?;
            } else {
                writeln!(out, "{}", candidates.join("  "))?;
            }
            continue;
        }

        let result = shell.execute(session, &line);
        if json {
            writeln!(out, "{}", serde_json::to_string(&result)?)?;
        } else if !result.output.is_empty() {
            writeln!(out, "{}", result.output)?;
        }
        out.flush()?;

        if result.exit {
            log::info!("session {session} exited");
            break;
        }
        if result.reboot {
            shell.reset(session);
        }
    }
    Ok(())
}
