//! Demo configuration (`lpguard.toml` format).
//!
//! ```toml
//! iterations = 4
//! message = "This information was passed to the hook function."
//! strict = false
//!
//! [library]
//! fatal = "abort"   # or "panic"
//! terminal = true
//! ```

use crate::error::ConfigError;
use crate::guard::DEFAULT_MESSAGE;
use lpguard_solver::{terminal, FatalPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root demo configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    /// Number of iterations; odd ones force a library error.
    pub iterations: u32,

    /// Message the error hook prints.
    pub message: String,

    /// Exit with a failure status if any iteration did not succeed.
    pub strict: bool,

    /// Library settings.
    pub library: LibraryConfig,
}

/// Library settings applied before the demo runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LibraryConfig {
    /// Behaviour when a fault cannot be recovered.
    pub fatal: FatalPolicy,

    /// Whether terminal output is enabled.
    pub terminal: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            iterations: 4,
            message: DEFAULT_MESSAGE.to_string(),
            strict: false,
            library: LibraryConfig::default(),
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            fatal: FatalPolicy::Abort,
            terminal: true,
        }
    }
}

impl DemoConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: DemoConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::Validation(
                "iterations must be at least 1".to_string(),
            ));
        }
        if self.message.trim().is_empty() {
            return Err(ConfigError::Validation(
                "message must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply the library settings to the current thread.
    pub fn apply(&self) {
        lpguard_solver::set_fatal_policy(self.library.fatal);
        terminal::set_output(self.library.terminal);
    }
}
