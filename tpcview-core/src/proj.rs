use std::collections::BTreeMap;

use geometry::{Geometry, GeometryError, PlaneId};

use crate::config::ConfigError;
use crate::context::{DisplayContext, ViewportSize};

#[derive(thiserror::Error, Debug)]
pub enum ProjectionError {
    #[error("{0}")]
    Geometry(#[from] GeometryError),
    #[error("projection is not bound to a plane")]
    Unbound,
}

/// Full projection, or only the origin-displacement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionPass {
    Full,
    PlaneOnly,
}

/// Per-plane, per-frame scaling inputs for the time-versus-wire view.
/// Assembled from the live viewport on every use; the window can change
/// size between events, so nothing here may be kept across calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionContext {
    pub time_samples: u32,
    pub wires: u32,
    pub planes: u32,
    pub width: u32,
    pub height: u32,
}

impl ProjectionContext {
    pub fn for_plane(
        geometry: &dyn Geometry,
        viewport: &dyn ViewportSize,
        plane: PlaneId,
    ) -> Result<Self, GeometryError> {
        Ok(Self {
            time_samples: geometry.time_sample_count(),
            wires: geometry.wire_count(plane)?,
            planes: geometry.plane_count(plane.tpc_id())?,
            width: viewport.current_width(),
            height: viewport.current_height(),
        })
    }

    /// Scale from wire index to the second display axis. Sized so every
    /// plane's full wire range spans a viewport-proportional share of the
    /// frame, whatever its physical wire count.
    pub fn wire_scale(&self) -> f64 {
        f64::from(self.time_samples) * f64::from(self.width) / f64::from(self.height)
            * (f64::from(self.planes) + 0.5)
            / f64::from(self.wires)
    }
}

/// Convenience wrapper for factories that place elements directly in
/// time-versus-wire coordinates.
pub fn wire_scale(
    geometry: &dyn Geometry,
    viewport: &dyn ViewportSize,
    plane: PlaneId,
) -> Result<f64, GeometryError> {
    Ok(ProjectionContext::for_plane(geometry, viewport, plane)?.wire_scale())
}

/// A point transform a projection manager can drive over whole scenes.
/// 2-D and 3-D projections are not interchangeable on a live manager.
pub trait SceneProjection {
    fn is_2d(&self) -> bool;

    /// Points at the projection to a new plane; per-plane state only, the
    /// actual scaling is recomputed from the live viewport on each point.
    fn rebind(&mut self, plane: PlaneId);

    fn project_point(
        &self,
        point: [f64; 3],
        pass: ProjectionPass,
        geometry: &dyn Geometry,
        viewport: &dyn ViewportSize,
    ) -> Result<[f64; 3], ProjectionError>;
}

/// Projects world coordinates into the time × wire × charge display space
/// of one readout plane: y becomes the drift-time tick of the point's x,
/// z becomes the nearest wire number scaled by the viewport share. The x
/// output is passed through and carries no meaning in this explicitly 2-D
/// view.
#[derive(Debug, Clone, Default)]
pub struct TimeWireProjection {
    plane: Option<PlaneId>,
    center: Option<[f64; 3]>,
}

impl TimeWireProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_plane(plane: PlaneId) -> Self {
        Self {
            plane: Some(plane),
            center: None,
        }
    }

    pub fn with_center(mut self, center: [f64; 3]) -> Self {
        self.center = Some(center);
        self
    }

    pub fn plane(&self) -> Option<PlaneId> {
        self.plane
    }
}

impl SceneProjection for TimeWireProjection {
    fn is_2d(&self) -> bool {
        true
    }

    fn rebind(&mut self, plane: PlaneId) {
        self.plane = Some(plane);
    }

    fn project_point(
        &self,
        point: [f64; 3],
        pass: ProjectionPass,
        geometry: &dyn Geometry,
        viewport: &dyn ViewportSize,
    ) -> Result<[f64; 3], ProjectionError> {
        let plane = self.plane.ok_or(ProjectionError::Unbound)?;

        let mut point = point;
        if let Some(center) = self.center {
            point[0] -= center[0];
            point[1] -= center[1];
            point[2] -= center[2];
        }
        if pass == ProjectionPass::PlaneOnly {
            return Ok(point);
        }

        let context = ProjectionContext::for_plane(geometry, viewport, plane)?;
        let tick = geometry.world_x_to_tick(point[0], plane)?;
        let lookup = geometry.nearest_wire(point, plane)?;
        if lookup.is_clamped() {
            log::debug!(
                "point ({}, {}, {}) lands off plane {plane}; using edge wire {}",
                point[0],
                point[1],
                point[2],
                lookup.wire()
            );
        }

        Ok([
            point[0],
            tick,
            f64::from(lookup.wire()) * context.wire_scale(),
        ])
    }
}

/// Axis-aligned 3-D projection: origin displacement only. Kept for the
/// orthographic viewers, and the reason projection dimensionality is part
/// of the manager contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrthoProjection {
    center: Option<[f64; 3]>,
}

impl OrthoProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_center(mut self, center: [f64; 3]) -> Self {
        self.center = Some(center);
        self
    }
}

impl SceneProjection for OrthoProjection {
    fn is_2d(&self) -> bool {
        false
    }

    fn rebind(&mut self, _plane: PlaneId) {}

    fn project_point(
        &self,
        point: [f64; 3],
        _pass: ProjectionPass,
        _geometry: &dyn Geometry,
        _viewport: &dyn ViewportSize,
    ) -> Result<[f64; 3], ProjectionError> {
        match self.center {
            Some(center) => Ok([
                point[0] - center[0],
                point[1] - center[1],
                point[2] - center[2],
            ]),
            None => Ok(point),
        }
    }
}

/// Drives one projection over a source scene, maintaining one destination
/// scene per plane of the configured TPC. Destinations are created lazily
/// on first use and fully rebuilt on every call.
pub struct ProjectionManager {
    source: String,
    projection: Box<dyn SceneProjection>,
    destinations: BTreeMap<PlaneId, String>,
}

impl ProjectionManager {
    pub fn new(source: impl Into<String>, projection: Box<dyn SceneProjection>) -> Self {
        Self {
            source: source.into(),
            projection,
            destinations: BTreeMap::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn destination_names(&self) -> Vec<&str> {
        self.destinations.values().map(String::as_str).collect()
    }

    /// Swaps the wrapped projection. Changing dimensionality mid-flight is
    /// a configuration error: viewers attached to the destinations assume
    /// a fixed 2-D or 3-D scene.
    pub fn set_projection(
        &mut self,
        projection: Box<dyn SceneProjection>,
    ) -> Result<(), ConfigError> {
        if self.projection.is_2d() != projection.is_2d() {
            return Err(ConfigError::ProjectionSwap);
        }
        self.projection = projection;
        Ok(())
    }

    /// Rebuilds every per-plane destination from the source scene's current
    /// contents. Points that fail to project are carried over untransformed
    /// and logged; the rest of the import continues.
    pub fn project(&mut self, ctx: &mut DisplayContext) -> Result<(), ConfigError> {
        let planes = ctx.plane_ids()?;
        let geometry = ctx.geometry.clone();
        let viewport = ctx.viewport.clone();

        for plane in planes {
            let dest_name = self
                .destinations
                .entry(plane)
                .or_insert_with(|| format!("{}{}", self.source, plane.plane))
                .clone();
            if !ctx.scenes.contains(&dest_name) {
                ctx.scenes.spawn_single(&dest_name)?;
            }

            let mut dest = ctx.scenes.take(&dest_name).expect("spawned above");
            dest.clear_contents();

            self.projection.rebind(plane);
            let projection = &*self.projection;
            if let Some(source) = ctx.scenes.get(&self.source) {
                let roots: Vec<_> = source.roots().to_vec();
                for root in roots {
                    let copied = source.arena.copy_subtree_with(
                        root,
                        &mut dest.arena,
                        &mut |point| match projection.project_point(
                            point,
                            ProjectionPass::Full,
                            geometry.as_ref(),
                            viewport.as_ref(),
                        ) {
                            Ok(projected) => projected,
                            Err(err) => {
                                log::warn!(
                                    "projection into plane {plane} failed for a point: {err}"
                                );
                                point
                            }
                        },
                    );
                    match copied {
                        Ok(id) => dest.add_root(id),
                        Err(err) => log::warn!(
                            "failed to import an element into {dest_name:?}: {err}"
                        ),
                    }
                }
            } else {
                log::warn!(
                    "projection source scene {:?} does not exist; destination {dest_name:?} left empty",
                    self.source
                );
            }

            ctx.scenes.put(dest);
        }
        Ok(())
    }
}
