//! archterm entry point.
//!
//! Reads command lines from stdin and runs them through one emulated shell
//! session, printing each result. A line starting with a tab asks for
//! completions of the rest of the line. `exit` ends the program; `reboot`
//! starts the session over.

mod options;
mod panic_hook;
mod repl;

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use archterm_core::config::ShellConfig;
use archterm_core::{SessionStore, Shell};

use options::{CONFIG_ENV, Options};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    panic_hook::install();

    let options = Options::parse(std::env::args().skip(1), std::env::var(CONFIG_ENV).ok())?;
    let config = match &options.config {
        Some(path) => ShellConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ShellConfig::default(),
    };
    log::info!(
        "Starting archterm (session {}, timeout {}s)",
        options.session,
        config.session_timeout_secs
    );

    let store = Arc::new(SessionStore::new(config).context("failed to build session store")?);
    let _sweeper = store.spawn_sweeper()?;
    let shell = Shell::new(store);

    let stdin = io::stdin();
    repl::run(
        &shell,
        &options.session,
        options.json,
        stdin.lock(),
        io::stdout().lock(),
    )
}
