//! Configuration file handling
//!
//! Configuration is read from, in order of preference:
//! 1. the `--config` flag (or `PMPREPORT_CONFIG`)
//! 2. `pmpreport.toml` in the working directory, if present
//!
//! ```toml
//! [links]
//! organization = "contoso"
//! project = "Roadmap"
//!
//! [selection]
//! fiscal_year = "FY2026"
//! quarter = "Q3"
//! project = "Payments"
//! ```

use anyhow::{Context, Result};
use pmpreport_core::{FiscalYear, LinkConfig, QuarterSelection};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "pmpreport.toml";

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Work-item link settings; links are left empty when absent
    pub links: Option<LinkConfig>,
    #[serde(default)]
    pub selection: SelectionDefaults,
}

/// Default selection for the milestones command
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectionDefaults {
    pub fiscal_year: Option<FiscalYear>,
    pub quarter: Option<QuarterSelection>,
    pub project: Option<String>,
}

impl Config {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Load an explicit config file, or the default one if it exists
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path: PathBuf = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    tracing::debug!("no configuration file, using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::parse(&text).with_context(|| format!("in {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}
