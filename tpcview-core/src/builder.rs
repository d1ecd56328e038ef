use scene::SceneLayout;

use crate::config::{ConfigError, SceneConfig};
use crate::context::DisplayContext;
use crate::event::EventStore;
use crate::factory::ConvertContext;
use crate::product::ProductKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    Uninitialized,
    Built,
    Populated,
}

/// Composes one named scene from configured product kinds, once per event.
/// `make_global` creates the persistent scene at job start; `make_event`
/// tears the previous contents down and rebuilds them. There is no
/// incremental diffing: elements never survive into the next event.
pub struct SceneBuilder {
    name: String,
    layout: SceneLayout,
    products: Vec<ProductKind>,
    state: BuilderState,
}

impl SceneBuilder {
    pub fn new(name: impl Into<String>, layout: SceneLayout, products: Vec<ProductKind>) -> Self {
        Self {
            name: name.into(),
            layout,
            products,
            state: BuilderState::Uninitialized,
        }
    }

    /// Kinds are kept in declaration order; it fixes the processing order
    /// for every event.
    pub fn from_config(config: &SceneConfig) -> Self {
        Self::new(
            config.name.clone(),
            config.layout,
            config.products.iter().map(|product| product.kind).collect(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    pub fn make_global(&mut self, ctx: &mut DisplayContext) -> Result<(), ConfigError> {
        if self.state != BuilderState::Uninitialized {
            return Err(ConfigError::AlreadyInitialized(self.name.clone()));
        }
        for kind in &self.products {
            if !ctx.registry.contains(*kind) {
                return Err(ConfigError::UnregisteredKind(*kind));
            }
        }
        match self.layout {
            SceneLayout::Single => {
                ctx.scenes.spawn_single(&self.name)?;
            }
            SceneLayout::PerPlane => {
                let planes = ctx.plane_ids()?;
                ctx.scenes.spawn_per_plane(&self.name, planes)?;
            }
        }
        self.state = BuilderState::Built;
        Ok(())
    }

    pub fn make_event(
        &mut self,
        ctx: &mut DisplayContext,
        event: &dyn EventStore,
    ) -> Result<(), ConfigError> {
        if self.state == BuilderState::Uninitialized {
            return Err(ConfigError::NotInitialized(self.name.clone()));
        }
        let mut scene = ctx
            .scenes
            .take(&self.name)
            .ok_or_else(|| ConfigError::NotInitialized(self.name.clone()))?;
        scene.clear_contents();

        let tpc = ctx.tpc;
        let convert_ctx = ConvertContext {
            geometry: ctx.geometry.as_ref(),
            viewport: ctx.viewport.as_ref(),
            tpc,
        };

        for kind in &self.products {
            let Some(factory) = ctx.registry.get(*kind) else {
                log::warn!("scene {:?}: no factory for {kind}, skipping", self.name);
                continue;
            };
            let batch = match event.fetch(factory.label(), *kind) {
                Ok(batch) => batch,
                Err(err) => {
                    log::warn!("scene {:?}: {err}; drawing nothing for {kind}", self.name);
                    continue;
                }
            };

            for product in batch.iter() {
                if !factory.select(product) {
                    continue;
                }
                let element = match factory.convert(product, &convert_ctx, &mut scene.arena) {
                    Ok(Some(id)) => id,
                    Ok(None) => continue,
                    Err(err) => {
                        log::warn!(
                            "scene {:?}: skipping a {kind} instance from {:?}: {err}",
                            self.name,
                            factory.label()
                        );
                        continue;
                    }
                };

                match self.layout {
                    SceneLayout::Single => scene.add_root(element),
                    SceneLayout::PerPlane => {
                        let routed = match product.channel() {
                            None => {
                                log::debug!(
                                    "scene {:?}: {kind} carries no channel, not drawable per plane",
                                    self.name
                                );
                                false
                            }
                            Some(channel) => {
                                match ctx.geometry.plane_for_channel(channel) {
                                    Err(err) => {
                                        log::warn!(
                                            "scene {:?}: cannot route channel {channel}: {err}",
                                            self.name
                                        );
                                        false
                                    }
                                    // other TPCs are simply not part of this view
                                    Ok(plane) if plane.tpc_id() != tpc => false,
                                    Ok(plane) => {
                                        if scene.add_plane_root(plane, element) {
                                            true
                                        } else {
                                            log::warn!(
                                                "scene {:?}: plane {plane} is not registered with this scene",
                                                self.name
                                            );
                                            false
                                        }
                                    }
                                }
                            }
                        };
                        if !routed {
                            let _ = scene.arena.destroy(element);
                        }
                    }
                }
            }
        }

        ctx.scenes.put(scene);
        self.state = BuilderState::Populated;
        Ok(())
    }
}
