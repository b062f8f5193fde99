// THEORY:
// `VibeConfig` holds the handful of knobs that stay fixed for the whole lifetime
// of a model instance. They are plain data: the orchestrator reads them once,
// validates them, and derives the few values the hot loop needs (the squared
// radius, for instance) up front so the per-pixel code never recomputes them.
//
// The config can be built in code (`VibeConfig::default()` plus struct update
// syntax) or loaded from a TOML file where every key is optional.

use crate::error::{Result, VibeError};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SAMPLES_PER_PIXEL: usize = 20;
pub const DEFAULT_RADIUS: u32 = 20;
pub const DEFAULT_MIN_MATCHES: usize = 2;
pub const DEFAULT_SUBSAMPLING: u32 = 16;
pub const DEFAULT_MIN_BLOB_AREA: u32 = 50;

/// Tunable parameters of the sample-based background model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VibeConfig {
    /// Number of stored samples per pixel (N).
    pub samples_per_pixel: usize,
    /// Match radius in intensity units. Distances are compared against `radius²`.
    pub radius: u32,
    /// Minimum number of matching samples for a pixel to count as background.
    pub min_matches: usize,
    /// Inverse update probability. A background pixel updates its own model, and
    /// separately a neighbor's model, with probability `1 / (subsampling - 1)` each.
    pub subsampling: u32,
    /// Blobs whose bounding box area is not strictly greater than this are dropped.
    pub min_blob_area: u32,
    /// Seed for the model's random generator. `None` derives one from the clock.
    pub seed: Option<u64>,
}

impl Default for VibeConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: DEFAULT_SAMPLES_PER_PIXEL,
            radius: DEFAULT_RADIUS,
            min_matches: DEFAULT_MIN_MATCHES,
            subsampling: DEFAULT_SUBSAMPLING,
            min_blob_area: DEFAULT_MIN_BLOB_AREA,
            seed: None,
        }
    }
}

impl VibeConfig {
    /// The squared match radius (R) the classifier compares distances against.
    pub fn squared_radius(&self) -> u32 {
        self.radius.saturating_mul(self.radius)
    }

    pub fn validate(&self) -> Result<()> {
        if self.samples_per_pixel == 0 {
            return Err(VibeError::InvalidConfig(
                "samples_per_pixel must be at least 1".into(),
            ));
        }
        if self.min_matches == 0 {
            return Err(VibeError::InvalidConfig("min_matches must be at least 1".into()));
        }
        if self.min_matches > self.samples_per_pixel {
            return Err(VibeError::InvalidConfig(format!(
                "min_matches ({}) cannot exceed samples_per_pixel ({})",
                self.min_matches, self.samples_per_pixel
            )));
        }
        // The update draw is over [0, subsampling - 1), which must not be empty.
        if self.subsampling < 2 {
            return Err(VibeError::InvalidConfig("subsampling must be at least 2".into()));
        }
        if self.radius == 0 {
            return Err(VibeError::InvalidConfig("radius must be positive".into()));
        }
        Ok(())
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: VibeConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_parameters() {
        let config = VibeConfig::default();
        assert_eq!(config.samples_per_pixel, 20);
        assert_eq!(config.squared_radius(), 400);
        assert_eq!(config.min_matches, 2);
        assert_eq!(config.subsampling, 16);
        assert_eq!(config.min_blob_area, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config = VibeConfig::from_toml_str("radius = 10\nseed = 7\n").expect("valid toml");
        assert_eq!(config.squared_radius(), 100);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.samples_per_pixel, DEFAULT_SAMPLES_PER_PIXEL);
    }

    #[test]
    fn rejects_degenerate_parameters() {
        let bad = [
            VibeConfig { samples_per_pixel: 0, ..Default::default() },
            VibeConfig { min_matches: 0, ..Default::default() },
            VibeConfig { min_matches: 21, ..Default::default() },
            VibeConfig { subsampling: 1, ..Default::default() },
            VibeConfig { radius: 0, ..Default::default() },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(VibeError::InvalidConfig(_))));
        }
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = VibeConfig::from_toml_str("radius = \"wide\"").unwrap_err();
        assert!(matches!(err, VibeError::ConfigParse(_)));
    }
}
