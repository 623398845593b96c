/// Persistence of the custom (override) definition layer.
///
/// The host owns storage; the engine only needs to load the layer once and
/// save it after each edit.

use log::{debug, info};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("layer store rejected the write: {0}")]
    Rejected(String),
}

/// Somewhere the custom layer lives between sessions.
pub trait LayerStore {
    /// The stored layer, or `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Value>, PersistError>;

    fn save(&mut self, layer: &Value) -> Result<(), PersistError>;
}

/// Keeps the layer in memory. Useful for tests and short-lived sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryLayerStore {
    layer: Option<Value>,
    saves: usize,
}

impl MemoryLayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(layer: Value) -> Self {
        Self {
            layer: Some(layer),
            saves: 0,
        }
    }

    pub fn layer(&self) -> Option<&Value> {
        self.layer.as_ref()
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl LayerStore for MemoryLayerStore {
    fn load(&self) -> Result<Option<Value>, PersistError> {
        Ok(self.layer.clone())
    }

    fn save(&mut self, layer: &Value) -> Result<(), PersistError> {
        self.layer = Some(layer.clone());
        self.saves += 1;
        Ok(())
    }
}

/// Stores the layer as pretty-printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileLayerStore {
    path: PathBuf,
}

impl JsonFileLayerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "custom-layer".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl LayerStore for JsonFileLayerStore {
    fn load(&self) -> Result<Option<Value>, PersistError> {
        if !self.path.exists() {
            debug!("no custom layer at {}", self.path.display());
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&mut self, layer: &Value) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(layer)?;
        // Write beside the target and rename over it, so an interrupted save
        // leaves the previous layer in place.
        let staging = self.staging_path();
        std::fs::write(&staging, contents)?;
        if let Err(e) = std::fs::rename(&staging, &self.path) {
            let _ = std::fs::remove_file(&staging);
            return Err(e.into());
        }
        info!("saved custom layer to {}", self.path.display());
        Ok(())
    }
}
