//! Graph configuration and loading.
//!
//! Configuration lives in `peepal.toml` inside the data directory. Every
//! section is optional; a missing file means defaults.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeepalConfig {
    #[serde(default)]
    pub vouch: VouchConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Vouch quorum policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VouchConfig {
    /// Distinct vouches needed to verify a legacy member (default: 3)
    #[serde(default = "default_threshold")]
    pub threshold: u32,
}

impl Default for VouchConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

/// SQLite pool settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Maximum pooled connections (default: 4)
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
        }
    }
}

fn default_threshold() -> u32 {
    3
}

fn default_max_connections() -> u32 {
    4
}

impl PeepalConfig {
    /// Load from a TOML file, or return defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.vouch.threshold == 0 {
            bail!("vouch.threshold must be at least 1");
        }
        if self.database.max_connections == 0 {
            bail!("database.max_connections must be at least 1");
        }
        Ok(())
    }
}
