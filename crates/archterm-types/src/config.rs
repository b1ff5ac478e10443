//! Shell configuration loaded from TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, ShellError};

/// Tunables for the session store and interpreter.
///
/// Every field has a default, so an empty document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellConfig {
    /// Idle time after which a session is discarded.
    pub session_timeout_secs: u64,
    /// How often the background sweeper looks for idle sessions.
    pub sweep_interval_secs: u64,
    /// Maximum retained history entries per session.
    pub history_limit: usize,
    /// Optional template filesystem description replacing the built-in one.
    pub template_path: Option<PathBuf>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            session_timeout_secs: 30 * 60,
            sweep_interval_secs: 10 * 60,
            history_limit: 500,
            template_path: None,
        }
    }
}

impl ShellConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        log::debug!("loading shell config from {}", path.display());
        Self::from_toml_str(&text)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.sweep_interval_secs == 0 {
            return Err(ShellError::Config(
                "sweep_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.history_limit == 0 {
            return Err(ShellError::Config(
                "history_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
