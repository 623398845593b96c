/// Engine configuration, read from a RON file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::spawn::DEFAULT_HINT_PADDING;
use crate::schema::hint::Location;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// ```ron
/// (
///     seed: Some(42),
///     custom_layer: Some("data/custom.json"),
///     hint_padding: 64.0,
///     default_location: wall,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    /// Fixed RNG seed. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// JSON file holding the custom definition layer.
    pub custom_layer: Option<PathBuf>,
    /// Distance between the anchor region and each hint token.
    pub hint_padding: f64,
    pub default_location: Location,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            seed: None,
            custom_layer: None,
            hint_padding: DEFAULT_HINT_PADDING,
            default_location: Location::Floor,
        }
    }
}

impl ForgeConfig {
    pub fn load_from_ron(path: &Path) -> Result<ForgeConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<ForgeConfig, ConfigError> {
        Ok(ron::from_str(input)?)
    }
}
