use scene::{Appearance, Shape};

use crate::builder::BuilderState;
use crate::config::ConfigError;
use crate::context::DisplayContext;
use crate::proj::ProjectionContext;

/// Draws the outline of each readout plane in time-versus-wire coordinates:
/// a frame box spanning the full tick and wire ranges, with time-axis tick
/// marks. Rebuilt per event rather than once, because the extents depend on
/// the live window size.
pub struct GeoSceneMaker {
    name: String,
    color: [u8; 3],
    transparency: u8,
    state: BuilderState,
}

impl GeoSceneMaker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: [0, 0, 255],
            transparency: 70,
            state: BuilderState::Uninitialized,
        }
    }

    pub fn with_style(mut self, color: [u8; 3], transparency: u8) -> Self {
        self.color = color;
        self.transparency = transparency.min(100);
        self
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
        let planes = ctx.plane_ids()?;
        ctx.scenes.spawn_per_plane(&self.name, planes)?;
        self.state = BuilderState::Built;
        Ok(())
    }

    pub fn make_event(&mut self, ctx: &mut DisplayContext) -> Result<(), ConfigError> {
        if self.state == BuilderState::Uninitialized {
            return Err(ConfigError::NotInitialized(self.name.clone()));
        }
        let planes = ctx.plane_ids()?;
        let mut scene = ctx
            .scenes
            .take(&self.name)
            .ok_or_else(|| ConfigError::NotInitialized(self.name.clone()))?;
        scene.clear_contents();

        for plane in planes {
            let context = match ProjectionContext::for_plane(
                ctx.geometry.as_ref(),
                ctx.viewport.as_ref(),
                plane,
            ) {
                Ok(context) => context,
                Err(err) => {
                    log::warn!("scene {:?}: no outline for plane {plane}: {err}", self.name);
                    continue;
                }
            };
            let samples = f64::from(context.time_samples);
            let scale = context.wire_scale();
            let extent = f64::from(context.wires) * scale;

            let frame = scene.arena.create(
                format!("plane {plane}"),
                Shape::Box {
                    center: [0.0, samples / 2.0, (extent - scale) / 2.0],
                    half_extents: [0.5, samples / 2.0, extent / 2.0],
                },
                Appearance {
                    color: self.color,
                    transparency: self.transparency,
                    line_width: 1.0,
                },
            );

            // time-axis tick marks, one per tenth of the readout window
            for division in 0..=10u32 {
                let tick = samples * f64::from(division) / 10.0;
                let _ = scene.arena.create_child(
                    frame,
                    format!("t {}", tick as u64),
                    Shape::Polyline {
                        points: vec![[0.0, tick, -0.01 * extent], [0.0, tick, 0.01 * extent]],
                    },
                    Appearance {
                        color: [255, 0, 0],
                        transparency: 0,
                        line_width: 1.0,
                    },
                );
            }

            scene.add_plane_root(plane, frame);
        }

        ctx.scenes.put(scene);
        self.state = BuilderState::Populated;
        Ok(())
    }
}
