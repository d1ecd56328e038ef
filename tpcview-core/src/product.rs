use geometry::Channel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The drawable categories the display knows how to render. New categories
/// are added here and in `factory::create_factory`; nothing else changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    RawDigit,
    Hit,
    Wire,
    SimParticle,
    Track,
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProductKind::RawDigit => "raw_digit",
            ProductKind::Hit => "hit",
            ProductKind::Wire => "wire",
            ProductKind::SimParticle => "sim_particle",
            ProductKind::Track => "track",
        };
        f.write_str(name)
    }
}

/// Uncalibrated waveform read out from one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDigit {
    pub channel: Channel,
    pub pedestal: f32,
    pub adc: Vec<i16>,
}

/// Fitted pulse on one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub channel: Channel,
    pub start_tick: f64,
    pub end_tick: f64,
    pub peak_tick: f64,
    pub integral: f64,
}

/// Deconvolved signal on one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireSignal {
    pub channel: Channel,
    pub signal: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// x, y, z, t
    pub position: [f64; 4],
    /// px, py, pz, E
    pub momentum: [f64; 4],
}

/// Simulated truth particle with its step trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimParticle {
    pub track_id: i32,
    pub pdg: i32,
    pub trajectory: Vec<TrajectoryPoint>,
}

impl SimParticle {
    /// Energy at the production vertex, GeV.
    pub fn initial_energy(&self) -> f64 {
        self.trajectory
            .first()
            .map(|point| point.momentum[3])
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoTrack {
    pub id: u32,
    pub points: Vec<[f64; 3]>,
}

/// Borrowed view of every instance of one product kind in an event.
#[derive(Debug, Clone, Copy)]
pub enum ProductBatch<'a> {
    RawDigits(&'a [RawDigit]),
    Hits(&'a [Hit]),
    Wires(&'a [WireSignal]),
    SimParticles(&'a [SimParticle]),
    Tracks(&'a [RecoTrack]),
}

impl<'a> ProductBatch<'a> {
    pub fn kind(&self) -> ProductKind {
        match self {
            ProductBatch::RawDigits(_) => ProductKind::RawDigit,
            ProductBatch::Hits(_) => ProductKind::Hit,
            ProductBatch::Wires(_) => ProductKind::Wire,
            ProductBatch::SimParticles(_) => ProductKind::SimParticle,
            ProductBatch::Tracks(_) => ProductKind::Track,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ProductBatch::RawDigits(items) => items.len(),
            ProductBatch::Hits(items) => items.len(),
            ProductBatch::Wires(items) => items.len(),
            ProductBatch::SimParticles(items) => items.len(),
            ProductBatch::Tracks(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = ProductRef<'a>> + 'a> {
        match self {
            ProductBatch::RawDigits(items) => {
                Box::new(items.iter().map(ProductRef::RawDigit))
            }
            ProductBatch::Hits(items) => Box::new(items.iter().map(ProductRef::Hit)),
            ProductBatch::Wires(items) => Box::new(items.iter().map(ProductRef::Wire)),
            ProductBatch::SimParticles(items) => {
                Box::new(items.iter().map(ProductRef::SimParticle))
            }
            ProductBatch::Tracks(items) => Box::new(items.iter().map(ProductRef::Track)),
        }
    }
}

/// Borrowed view of a single instance, handed to factories.
#[derive(Debug, Clone, Copy)]
pub enum ProductRef<'a> {
    RawDigit(&'a RawDigit),
    Hit(&'a Hit),
    Wire(&'a WireSignal),
    SimParticle(&'a SimParticle),
    Track(&'a RecoTrack),
}

impl ProductRef<'_> {
    pub fn kind(&self) -> ProductKind {
        match self {
            ProductRef::RawDigit(_) => ProductKind::RawDigit,
            ProductRef::Hit(_) => ProductKind::Hit,
            ProductRef::Wire(_) => ProductKind::Wire,
            ProductRef::SimParticle(_) => ProductKind::SimParticle,
            ProductRef::Track(_) => ProductKind::Track,
        }
    }

    /// Readout channel that ties the instance to one wire plane; None for
    /// products that live in world coordinates.
    pub fn channel(&self) -> Option<Channel> {
        match self {
            ProductRef::RawDigit(digit) => Some(digit.channel),
            ProductRef::Hit(hit) => Some(hit.channel),
            ProductRef::Wire(wire) => Some(wire.channel),
            ProductRef::SimParticle(_) | ProductRef::Track(_) => None,
        }
    }
}
