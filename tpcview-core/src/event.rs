use std::collections::HashMap;

use crate::product::{
    Hit, ProductBatch, ProductKind, RawDigit, RecoTrack, SimParticle, WireSignal,
};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum FetchError {
    #[error("no {kind} products labeled {label:?} in this event")]
    MissingProducer { label: String, kind: ProductKind },
}

/// Read-only access to one event's data products. A missing producer is an
/// error here; the scene builder downgrades it to "zero instances".
pub trait EventStore {
    fn fetch(&self, label: &str, kind: ProductKind) -> Result<ProductBatch<'_>, FetchError>;
}

/// Simple label-keyed product store, used by the driver loop and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEvent {
    raw_digits: HashMap<String, Vec<RawDigit>>,
    hits: HashMap<String, Vec<Hit>>,
    wires: HashMap<String, Vec<WireSignal>>,
    sim_particles: HashMap<String, Vec<SimParticle>>,
    tracks: HashMap<String, Vec<RecoTrack>>,
}

impl InMemoryEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_raw_digits(&mut self, label: impl Into<String>, digits: Vec<RawDigit>) {
        self.raw_digits.entry(label.into()).or_default().extend(digits);
    }

    pub fn add_hits(&mut self, label: impl Into<String>, hits: Vec<Hit>) {
        self.hits.entry(label.into()).or_default().extend(hits);
    }

    pub fn add_wires(&mut self, label: impl Into<String>, wires: Vec<WireSignal>) {
        self.wires.entry(label.into()).or_default().extend(wires);
    }

    pub fn add_sim_particles(&mut self, label: impl Into<String>, particles: Vec<SimParticle>) {
        self.sim_particles
            .entry(label.into())
            .or_default()
            .extend(particles);
    }

    pub fn add_tracks(&mut self, label: impl Into<String>, tracks: Vec<RecoTrack>) {
        self.tracks.entry(label.into()).or_default().extend(tracks);
    }
}

impl EventStore for InMemoryEvent {
    fn fetch(&self, label: &str, kind: ProductKind) -> Result<ProductBatch<'_>, FetchError> {
        let missing = || FetchError::MissingProducer {
            label: label.to_string(),
            kind,
        };
        match kind {
            ProductKind::RawDigit => self
                .raw_digits
                .get(label)
                .map(|items| ProductBatch::RawDigits(items))
                .ok_or_else(missing),
            ProductKind::Hit => self
                .hits
                .get(label)
                .map(|items| ProductBatch::Hits(items))
                .ok_or_else(missing),
            ProductKind::Wire => self
                .wires
                .get(label)
                .map(|items| ProductBatch::Wires(items))
                .ok_or_else(missing),
            ProductKind::SimParticle => self
                .sim_particles
                .get(label)
                .map(|items| ProductBatch::SimParticles(items))
                .ok_or_else(missing),
            ProductKind::Track => self
                .tracks
                .get(label)
                .map(|items| ProductBatch::Tracks(items))
                .ok_or_else(missing),
        }
    }
}
