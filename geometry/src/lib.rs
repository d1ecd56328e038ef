use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub type Channel = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TpcId {
    pub cryostat: u32,
    pub tpc: u32,
}

impl TpcId {
    pub fn new(cryostat: u32, tpc: u32) -> Self {
        Self { cryostat, tpc }
    }

    pub fn plane(&self, plane: u32) -> PlaneId {
        PlaneId {
            cryostat: self.cryostat,
            tpc: self.tpc,
            plane,
        }
    }
}

impl fmt::Display for TpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}/T{}", self.cryostat, self.tpc)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaneId {
    pub cryostat: u32,
    pub tpc: u32,
    pub plane: u32,
}

impl PlaneId {
    pub fn new(cryostat: u32, tpc: u32, plane: u32) -> Self {
        Self {
            cryostat,
            tpc,
            plane,
        }
    }

    pub fn tpc_id(&self) -> TpcId {
        TpcId {
            cryostat: self.cryostat,
            tpc: self.tpc,
        }
    }

    pub fn wire(&self, wire: u32) -> WireId {
        WireId { plane: *self, wire }
    }
}

impl fmt::Display for PlaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}/T{}/P{}", self.cryostat, self.tpc, self.plane)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WireId {
    pub plane: PlaneId,
    pub wire: u32,
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/W{}", self.plane, self.wire)
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum GeometryError {
    #[error("channel {0} is not mapped to any wire")]
    UnknownChannel(Channel),
    #[error("tpc {0} is not part of this detector")]
    UnknownTpc(TpcId),
    #[error("plane {0} is not part of this detector")]
    UnknownPlane(PlaneId),
    #[error("channel {channel} maps to {wires} wires and no disambiguation is configured")]
    AmbiguousChannel { channel: Channel, wires: usize },
}

/// Outcome of a nearest-wire lookup. `Clamped` reports the closest wire on
/// the plane edge when the point lies outside the instrumented region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireLookup {
    OnPlane(u32),
    Clamped(u32),
}

impl WireLookup {
    pub fn wire(self) -> u32 {
        match self {
            WireLookup::OnPlane(wire) | WireLookup::Clamped(wire) => wire,
        }
    }

    pub fn is_clamped(self) -> bool {
        matches!(self, WireLookup::Clamped(_))
    }
}

/// World transform of a readout plane: center position plus ZYX Euler angles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanePose {
    pub position: [f64; 3],
    pub angles: [f64; 3],
}

impl PlanePose {
    pub fn to_world(&self, local: [f64; 3]) -> [f64; 3] {
        let rotated = self.rotate(local);
        [
            rotated[0] + self.position[0],
            rotated[1] + self.position[1],
            rotated[2] + self.position[2],
        ]
    }

    /// Direction-only transform: rotation without the translation.
    pub fn to_world_vector(&self, local: [f64; 3]) -> [f64; 3] {
        self.rotate(local)
    }

    fn rotate(&self, local: [f64; 3]) -> [f64; 3] {
        let [ax, ay, az] = self.angles;
        let (sx, cx) = ax.sin_cos();
        let (sy, cy) = ay.sin_cos();
        let (sz, cz) = az.sin_cos();
        let [x, y, z] = local;

        // Rz(az) * Ry(ay) * Rx(ax) applied to the local point
        let (y1, z1) = (cx * y - sx * z, sx * y + cx * z);
        let (x2, z2) = (cy * x + sy * z1, -sy * x + cy * z1);
        let (x3, y3) = (cz * x2 - sz * y1, sz * x2 + cz * y1);

        [x3, y3, z2]
    }
}

pub trait Geometry {
    fn tpcs(&self) -> Vec<TpcId>;
    fn plane_count(&self, tpc: TpcId) -> Result<u32, GeometryError>;
    fn wire_count(&self, plane: PlaneId) -> Result<u32, GeometryError>;
    fn time_sample_count(&self) -> u32;
    fn wires_for_channel(&self, channel: Channel) -> Result<Vec<WireId>, GeometryError>;
    fn plane_pose(&self, plane: PlaneId) -> Result<PlanePose, GeometryError>;
    fn nearest_wire(&self, point: [f64; 3], plane: PlaneId) -> Result<WireLookup, GeometryError>;
    fn world_x_to_tick(&self, x: f64, plane: PlaneId) -> Result<f64, GeometryError>;

    /// Single wire for a channel, or `AmbiguousChannel` when the mapping is
    /// not one-to-one.
    fn plane_for_channel(&self, channel: Channel) -> Result<PlaneId, GeometryError> {
        let wires = self.wires_for_channel(channel)?;
        match wires.as_slice() {
            [wire] => Ok(wire.plane),
            _ => Err(GeometryError::AmbiguousChannel {
                channel,
                wires: wires.len(),
            }),
        }
    }

    fn wire_for_channel(&self, channel: Channel) -> Result<WireId, GeometryError> {
        let wires = self.wires_for_channel(channel)?;
        match wires.as_slice() {
            [wire] => Ok(*wire),
            _ => Err(GeometryError::AmbiguousChannel {
                channel,
                wires: wires.len(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaneSpec {
    pub wire_count: u32,
    /// Distance between neighboring wires, cm.
    pub wire_pitch: f64,
    /// Wire orientation about the drift axis, radians.
    pub wire_angle: f64,
    pub center: [f64; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TpcSpec {
    pub cryostat: u32,
    pub tpc: u32,
    pub planes: Vec<PlaneSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftSpec {
    pub ticks_per_cm: f64,
    pub trigger_tick: f64,
    pub time_samples: u32,
}

impl Default for DriftSpec {
    fn default() -> Self {
        Self {
            ticks_per_cm: 20.0,
            trigger_tick: 0.0,
            time_samples: 3200,
        }
    }
}

/// In-memory detector description. Channels are assigned sequentially, one
/// per wire, in (tpc, plane, wire) order; `alias_channel` attaches extra
/// wires to an existing channel for wrapped-wire readouts.
pub struct StandardGeometry {
    tpcs: Vec<TpcSpec>,
    drift: DriftSpec,
    channels: HashMap<Channel, Vec<WireId>>,
}

impl StandardGeometry {
    pub fn new(tpcs: Vec<TpcSpec>, drift: DriftSpec) -> Self {
        let mut channels: HashMap<Channel, Vec<WireId>> = HashMap::new();
        let mut next: Channel = 0;
        for tpc in &tpcs {
            let tpc_id = TpcId::new(tpc.cryostat, tpc.tpc);
            for (plane_index, plane) in tpc.planes.iter().enumerate() {
                let plane_id = tpc_id.plane(plane_index as u32);
                for wire in 0..plane.wire_count {
                    channels.insert(next, vec![plane_id.wire(wire)]);
                    next += 1;
                }
            }
        }
        Self {
            tpcs,
            drift,
            channels,
        }
    }

    pub fn alias_channel(&mut self, channel: Channel, extra: WireId) {
        self.channels.entry(channel).or_default().push(extra);
    }

    fn tpc_spec(&self, tpc: TpcId) -> Result<&TpcSpec, GeometryError> {
        self.tpcs
            .iter()
            .find(|spec| spec.cryostat == tpc.cryostat && spec.tpc == tpc.tpc)
            .ok_or(GeometryError::UnknownTpc(tpc))
    }

    fn plane_spec(&self, plane: PlaneId) -> Result<&PlaneSpec, GeometryError> {
        self.tpc_spec(plane.tpc_id())
            .map_err(|_| GeometryError::UnknownPlane(plane))?
            .planes
            .get(plane.plane as usize)
            .ok_or(GeometryError::UnknownPlane(plane))
    }
}

impl Geometry for StandardGeometry {
    fn tpcs(&self) -> Vec<TpcId> {
        self.tpcs
            .iter()
            .map(|spec| TpcId::new(spec.cryostat, spec.tpc))
            .collect()
    }

    fn plane_count(&self, tpc: TpcId) -> Result<u32, GeometryError> {
        Ok(self.tpc_spec(tpc)?.planes.len() as u32)
    }

    fn wire_count(&self, plane: PlaneId) -> Result<u32, GeometryError> {
        Ok(self.plane_spec(plane)?.wire_count)
    }

    fn time_sample_count(&self) -> u32 {
        self.drift.time_samples
    }

    fn wires_for_channel(&self, channel: Channel) -> Result<Vec<WireId>, GeometryError> {
        self.channels
            .get(&channel)
            .cloned()
            .ok_or(GeometryError::UnknownChannel(channel))
    }

    fn plane_pose(&self, plane: PlaneId) -> Result<PlanePose, GeometryError> {
        let spec = self.plane_spec(plane)?;
        Ok(PlanePose {
            position: spec.center,
            angles: [spec.wire_angle, 0.0, 0.0],
        })
    }

    fn nearest_wire(&self, point: [f64; 3], plane: PlaneId) -> Result<WireLookup, GeometryError> {
        let spec = self.plane_spec(plane)?;
        // Wires run along (0, cos a, sin a); wire number grows along the
        // in-plane normal (0, -sin a, cos a).
        let (sin_a, cos_a) = spec.wire_angle.sin_cos();
        let dy = point[1] - spec.center[1];
        let dz = point[2] - spec.center[2];
        let coord = (-sin_a * dy + cos_a * dz) / spec.wire_pitch
            + f64::from(spec.wire_count - 1) / 2.0;
        let nearest = coord.round();

        let last = f64::from(spec.wire_count - 1);
        if nearest < 0.0 {
            Ok(WireLookup::Clamped(0))
        } else if nearest > last {
            Ok(WireLookup::Clamped(spec.wire_count - 1))
        } else {
            Ok(WireLookup::OnPlane(nearest as u32))
        }
    }

    fn world_x_to_tick(&self, x: f64, plane: PlaneId) -> Result<f64, GeometryError> {
        let spec = self.plane_spec(plane)?;
        Ok((x - spec.center[0]) * self.drift.ticks_per_cm + self.drift.trigger_tick)
    }
}
