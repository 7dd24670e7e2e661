/*============================================================
  Synavera Project: Syn-Syu
  Module: rpmq_core::config
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Load rpmq defaults from an optional TOML configuration
    file and expose resolved query, rpm, and logging settings.

  Security / Safety Notes:
    Reads operator-owned files only; unknown keys are rejected
    so typos never silently change query behaviour.

  Dependencies:
    serde + toml for parsing, dirs for XDG locations.

  Operational Scope:
    Consulted once at start-up; CLI flags override every value.

  Revision History:
    2025-11-12 COD  Authored rpmq configuration layer.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit defaults with documented override order
    - Validation at load time with actionable messages
============================================================*/

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, RpmqError};
use crate::query::MAX_NUMBER_OF_RESULTS;

const CONFIG_DIR: &str = "rpmq";
const CONFIG_FILE: &str = "config.toml";

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RpmqConfig {
    pub query: QueryConfig,
    pub rpm: RpmConfig,
    pub logging: LoggingConfig,
}

/// Defaults for the query helper.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryConfig {
    pub limit: i64,
    pub sort: bool,
    pub name: Option<String>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            limit: MAX_NUMBER_OF_RESULTS,
            sort: true,
            name: None,
        }
    }
}

/// How the rpm database is reached.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RpmConfig {
    /// Program followed by leading arguments, e.g. `["toolbox", "run", "rpm"]`.
    pub command: Vec<String>,
    pub root: Option<PathBuf>,
    pub dbpath: Option<PathBuf>,
}

impl Default for RpmConfig {
    fn default() -> Self {
        Self {
            command: vec!["rpm".to_string()],
            root: None,
            dbpath: None,
        }
    }
}

/// Session log persistence.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Write a hashed session log for every invocation.
    pub persist: bool,
    pub log_dir: Option<PathBuf>,
}

impl RpmqConfig {
    /// Load from `path` if given (must exist), otherwise from the default
    /// location if present, otherwise built-in defaults.
    pub fn load_from_optional_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::load(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            RpmqError::Config(format!("Failed to read config {}: {err}", path.display()))
        })?;
        Self::parse(&raw)
            .map_err(|err| RpmqError::Config(format!("{}: {err}", path.display())))
    }

    fn parse(raw: &str) -> std::result::Result<Self, String> {
        let config: RpmqConfig = toml::from_str(raw).map_err(|err| err.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.query.limit <= 0 {
            return Err(format!(
                "query.limit must be a positive integer, got {}",
                self.query.limit
            ));
        }
        if self.rpm.command.first().map_or(true, |program| program.is_empty()) {
            return Err("rpm.command must name a program".into());
        }
        Ok(())
    }

    /// Directory for persisted session logs.
    pub fn log_dir(&self) -> PathBuf {
        self.logging.log_dir.clone().unwrap_or_else(|| {
            dirs::state_dir()
                .or_else(dirs::data_local_dir)
                .unwrap_or_else(std::env::temp_dir)
                .join(CONFIG_DIR)
                .join("logs")
        })
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}
