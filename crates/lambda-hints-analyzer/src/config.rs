//! Configuration management

use crate::annotator::LambdaResultAnnotator;
use crate::binding::BodyResolveMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Lambda return value hint settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HintConfig {
    /// Show lambda return value hints
    pub enabled: bool,
    /// How much of the enclosing code the oracle analyzes
    pub resolve_mode: BodyResolveMode,
}

impl Default for HintConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            resolve_mode: BodyResolveMode::PartialWithCfa,
        }
    }
}

impl HintConfig {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: HintConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: HintConfig =
            toml::from_str(content).context("Failed to parse hint configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Partial analysis never computes result facts
        if !self.resolve_mode.includes_control_flow() {
            anyhow::bail!("resolve_mode must include control flow analysis, got partial");
        }

        Ok(())
    }

    /// Annotator configured with these settings
    pub fn annotator(&self) -> LambdaResultAnnotator {
        LambdaResultAnnotator::new().with_resolve_mode(self.resolve_mode)
    }
}
