//! Command-line options.

use std::path::PathBuf;

use anyhow::{Result, bail};

/// Session id used when none is given.
pub const DEFAULT_SESSION: &str = "local";

/// Environment variable naming a shell config file.
pub const CONFIG_ENV: &str = "ARCHTERM_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub session: String,
    /// Print each result as one JSON object per line instead of raw text.
    pub json: bool,
    pub config: Option<PathBuf>,
}

impl Options {
    /// Parse arguments (without the program name). `env_config` is the value
    /// of [`CONFIG_ENV`], used when `--config` is absent.
    pub fn parse<I>(args: I, env_config: Option<String>) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut session = DEFAULT_SESSION.to_string();
        let mut json = false;
        let mut config = env_config.filter(|c| !c.is_empty()).map(PathBuf::from);

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--session" => match args.next() {
                    Some(id) if !id.is_empty() => session = id,
                    _ => bail!("--session requires an id"),
                },
                "--config" => match args.next() {
                    Some(path) => config = Some(PathBuf::from(path)),
                    None => bail!("--config requires a path"),
                },
                "--json" => json = true,
                other => bail!("unknown argument: {other}"),
            }
        }
        Ok(Self {
            session,
            json,
            config,
        })
    }
}
