use std::collections::HashSet;
use std::fs;
use std::path::Path;

use geometry::{Geometry, TpcId};
use scene::SceneLayout;
use serde::{Deserialize, Serialize};

use crate::product::ProductKind;

/// Fatal job-start errors. Nothing here is recoverable: the display refuses
/// to come up rather than run half-configured.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("scene name {0:?} is already in use")]
    DuplicateScene(String),
    #[error("a factory for {0} is already registered")]
    DuplicateFactory(ProductKind),
    #[error("no factory registered for {0}")]
    UnregisteredKind(ProductKind),
    #[error("tpc {0} is not part of the detector")]
    UnknownTpc(TpcId),
    #[error("display frame must have nonzero pixel size")]
    EmptyFrame,
    #[error("scene builder {0:?} used before make_global")]
    NotInitialized(String),
    #[error("scene builder {0:?} initialized twice")]
    AlreadyInitialized(String),
    #[error("switching between 2D and 3D projections is not allowed")]
    ProjectionSwap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub tpc: TpcId,
    pub frame: crate::context::FrameConfig,
    #[serde(default)]
    pub scenes: Vec<SceneConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    pub name: String,
    pub layout: SceneLayout,
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductConfig {
    pub kind: ProductKind,
    pub label: String,
    #[serde(default)]
    pub settings: serde_json::Value,
}

impl DisplayConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        Ok(toml::from_str(&data)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let data = toml::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn validate(&self, geometry: &dyn Geometry) -> Result<(), ConfigError> {
        if self.frame.width == 0 || self.frame.height == 0 {
            return Err(ConfigError::EmptyFrame);
        }
        geometry
            .plane_count(self.tpc)
            .map_err(|_| ConfigError::UnknownTpc(self.tpc))?;

        let mut names = HashSet::new();
        for scene in &self.scenes {
            if !names.insert(scene.name.as_str()) {
                return Err(ConfigError::DuplicateScene(scene.name.clone()));
            }
        }
        Ok(())
    }
}
