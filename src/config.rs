//! Gate configuration.
//!
//! Config is stored at `~/.config/ugate/config.toml` and contains:
//! - the SQLite database path (defaults to the platform data dir)
//! - the fail-open policy switch
//! - optional overrides of the plan-entitlement table

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::plans::PlanCatalog;

const CONFIG_DIR: &str = "ugate";
const CONFIG_FILE: &str = "config.toml";
const DB_FILE: &str = "usage.sqlite";

/// Gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Path to the SQLite usage database. Defaults to
    /// `<data dir>/ugate/usage.sqlite` when unset.
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    /// Allow requests when the plan store cannot be reached (default: true).
    /// Every fail-open occurrence is logged for audit.
    #[serde(default = "default_fail_open")]
    pub fail_open: bool,

    /// Plan entitlement table; tiers left out fall back to the built-ins.
    #[serde(default)]
    pub plans: PlanCatalog,
}

fn default_fail_open() -> bool {
    true
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            fail_open: default_fail_open(),
            plans: PlanCatalog::default(),
        }
    }
}

impl GateConfig {
    /// Load config from the default location.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).context("Failed to read config file")?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save config to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&path, content).context("Failed to write config file")
    }

    /// Resolve the database path, applying the default location.
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }

        let data_dir = dirs::data_dir().context("Could not determine data directory")?;

        Ok(data_dir.join(CONFIG_DIR).join(DB_FILE))
    }

    /// Get the config file path.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }
}
