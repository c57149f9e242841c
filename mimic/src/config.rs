//! Generator configuration.
//!
//! Every field has a default, so a YAML file only needs the values it changes:
//!
//! ```yaml
//! canvas_width: 640
//! canvas_height: 480
//! foreground_classes: [1, 2]
//! rotation_range: { min: -45.0, max: 45.0 }
//! seed: 7
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{ForegroundClasses, RotationRange};

/// Default number of attempts for the random background patch search.
pub const DEFAULT_PATCH_ATTEMPTS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Every input is resized to this canvas before processing.
    pub canvas_width: usize,
    pub canvas_height: usize,
    /// How many source images (first by name) to use as backgrounds.
    pub num_backgrounds: usize,
    pub variations_per_background: usize,
    pub rotation_range: RotationRange,
    /// Class ids that make up the object to extract. Must not contain 0.
    pub foreground_classes: Vec<u8>,
    pub max_patch_attempts: usize,
    /// Upper bound on variations held in memory at once.
    pub max_parallel_variations: usize,
    /// Seed for reproducible runs; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            canvas_width: 1428,
            canvas_height: 1068,
            num_backgrounds: 5,
            variations_per_background: 10,
            rotation_range: RotationRange::FULL,
            foreground_classes: vec![1, 2, 3],
            max_patch_attempts: DEFAULT_PATCH_ATTEMPTS,
            max_parallel_variations: 4,
            seed: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(ConfigError::ZeroCanvas {
                width: self.canvas_width,
                height: self.canvas_height,
            });
        }
        if self.foreground_classes.is_empty() {
            return Err(ConfigError::EmptyForeground);
        }
        if self.foreground_classes.contains(&0) {
            return Err(ConfigError::BackgroundInForeground);
        }
        if !self.rotation_range.is_valid() {
            return Err(ConfigError::InvalidRotationRange {
                min: self.rotation_range.min,
                max: self.rotation_range.max,
            });
        }
        if self.max_patch_attempts == 0 {
            return Err(ConfigError::ZeroPatchAttempts);
        }
        if self.max_parallel_variations == 0 {
            return Err(ConfigError::ZeroParallelism);
        }
        Ok(())
    }

    pub fn foreground(&self) -> ForegroundClasses {
        ForegroundClasses::new(&self.foreground_classes)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yml::to_string(self)?)
    }

    /// Reads and parses a YAML config file. The result is not validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }
}
