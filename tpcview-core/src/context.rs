use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use geometry::{Geometry, PlaneId, TpcId};
use scene::Scene;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, DisplayConfig};
use crate::factory::{create_factory, FactoryConfig, FactoryRegistry};

/// Live pixel size of the display region a scene renders into. Queried at
/// projection time, never cached: the window may be resized between events.
pub trait ViewportSize {
    fn current_width(&self) -> u32;
    fn current_height(&self) -> u32;
}

/// Fixed target frame size, and the fallback viewport when no real window
/// is wired in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 700,
        }
    }
}

impl ViewportSize for FrameConfig {
    fn current_width(&self) -> u32 {
        self.width
    }

    fn current_height(&self) -> u32 {
        self.height
    }
}

/// Resizable stand-in for a real window region.
#[derive(Debug, Clone)]
pub struct SharedViewport {
    inner: Arc<Mutex<FrameConfig>>,
}

impl SharedViewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FrameConfig { width, height })),
        }
    }

    pub fn resize(&self, width: u32, height: u32) {
        let mut frame = self.inner.lock().expect("viewport lock");
        frame.width = width;
        frame.height = height;
    }
}

impl ViewportSize for SharedViewport {
    fn current_width(&self) -> u32 {
        self.inner.lock().expect("viewport lock").width
    }

    fn current_height(&self) -> u32 {
        self.inner.lock().expect("viewport lock").height
    }
}

/// Name-keyed scene registry. At most one scene per name for the lifetime
/// of the display session.
#[derive(Debug, Default)]
pub struct SceneTable {
    scenes: HashMap<String, Scene>,
}

impl SceneTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn_single(&mut self, name: &str) -> Result<&mut Scene, ConfigError> {
        if self.scenes.contains_key(name) {
            return Err(ConfigError::DuplicateScene(name.to_string()));
        }
        Ok(self
            .scenes
            .entry(name.to_string())
            .or_insert_with(|| Scene::new_single(name)))
    }

    pub fn spawn_per_plane(
        &mut self,
        name: &str,
        planes: impl IntoIterator<Item = PlaneId>,
    ) -> Result<&mut Scene, ConfigError> {
        if self.scenes.contains_key(name) {
            return Err(ConfigError::DuplicateScene(name.to_string()));
        }
        Ok(self
            .scenes
            .entry(name.to_string())
            .or_insert_with(|| Scene::new_per_plane(name, planes)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scenes.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Scene> {
        self.scenes.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Scene> {
        self.scenes.get_mut(name)
    }

    /// Temporarily removes a scene so it can be mutated alongside an
    /// immutable borrow of another scene. Pair with `put`.
    pub fn take(&mut self, name: &str) -> Option<Scene> {
        self.scenes.remove(name)
    }

    pub fn put(&mut self, scene: Scene) {
        self.scenes.insert(scene.name.clone(), scene);
    }

    pub fn names(&self) -> Vec<&str> {
        self.scenes.keys().map(String::as_str).collect()
    }
}

/// Everything the composition engine needs for one display session: the
/// geometry handle, the live viewport, the configured TPC, the factory
/// registry and the scene table. Replaces any notion of process globals;
/// two contexts are two independent displays.
pub struct DisplayContext {
    pub geometry: Arc<dyn Geometry>,
    pub viewport: Arc<dyn ViewportSize>,
    pub tpc: TpcId,
    pub registry: FactoryRegistry,
    pub scenes: SceneTable,
}

impl DisplayContext {
    pub fn new(
        geometry: Arc<dyn Geometry>,
        viewport: Arc<dyn ViewportSize>,
        tpc: TpcId,
    ) -> Result<Self, ConfigError> {
        geometry
            .plane_count(tpc)
            .map_err(|_| ConfigError::UnknownTpc(tpc))?;
        Ok(Self {
            geometry,
            viewport,
            tpc,
            registry: FactoryRegistry::new(),
            scenes: SceneTable::new(),
        })
    }

    /// Builds a context from a validated config: registers the built-in
    /// factory for every configured kind and applies its settings. A kind
    /// appearing in several scenes shares one factory; the last settings
    /// table wins.
    pub fn from_config(
        geometry: Arc<dyn Geometry>,
        viewport: Arc<dyn ViewportSize>,
        config: &DisplayConfig,
    ) -> Result<Self, ConfigError> {
        config.validate(geometry.as_ref())?;
        let mut context = Self::new(geometry, viewport, config.tpc)?;
        for scene in &config.scenes {
            for product in &scene.products {
                if !context.registry.contains(product.kind) {
                    context.registry.register(create_factory(product.kind))?;
                }
                let factory = context
                    .registry
                    .get_mut(product.kind)
                    .expect("registered above");
                factory.reconfigure(&FactoryConfig {
                    label: product.label.clone(),
                    settings: product.settings.clone(),
                });
            }
        }
        Ok(context)
    }

    /// Planes of the configured TPC, in plane order.
    pub fn plane_ids(&self) -> Result<Vec<PlaneId>, ConfigError> {
        let count = self
            .geometry
            .plane_count(self.tpc)
            .map_err(|_| ConfigError::UnknownTpc(self.tpc))?;
        Ok((0..count).map(|plane| self.tpc.plane(plane)).collect())
    }
}
