use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Tunables for an overlay run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Overlaps whose area is at most `sliver_epsilon * catchment_area` are
    /// treated as floating-point slivers and dropped before weighting.
    pub sliver_epsilon: f64,
    /// Attempt to repair invalid polygons before rejecting them.
    pub repair_invalid: bool,
    /// Worker threads for batch aggregation. `0` uses the rayon default,
    /// `1` runs sequentially on the calling thread.
    pub workers: usize,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            sliver_epsilon: 1e-9,
            repair_invalid: true,
            workers: 0,
        }
    }
}

impl OverlayConfig {
    /// Parse a config from a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .context("Failed to parse overlay config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file from `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read overlay config: {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("Invalid overlay config: {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.sliver_epsilon.is_finite() || self.sliver_epsilon < 0.0 {
            bail!("sliver_epsilon must be a finite, non-negative number (got {})", self.sliver_epsilon);
        }
        if self.sliver_epsilon >= 1.0 {
            bail!("sliver_epsilon must be below 1.0, otherwise every overlap is a sliver");
        }
        Ok(())
    }
}
