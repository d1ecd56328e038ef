use std::collections::HashMap;

use geometry::{Geometry, GeometryError, TpcId};
use scene::{ElementArena, ElementId, SceneError};
use serde_json::Value;

use crate::config::ConfigError;
use crate::context::ViewportSize;
use crate::product::{ProductKind, ProductRef};

pub mod digit;
pub mod hit;
pub mod simpart;
pub mod track;
pub mod wire;

pub use digit::RawDigitFactory;
pub use hit::HitFactory;
pub use simpart::SimParticleFactory;
pub use track::TrackFactory;
pub use wire::WireFactory;

/// Recoverable per-instance failure. The scene builder logs it and drops
/// the instance; the rest of the event is still drawn.
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("{0}")]
    Geometry(#[from] GeometryError),
    #[error("{0}")]
    Scene(#[from] SceneError),
    #[error("factory for {expected} was handed a {got} instance")]
    KindMismatch {
        expected: ProductKind,
        got: ProductKind,
    },
}

/// Producer label plus a free-form settings table; recognized keys are up
/// to each factory, unknown keys are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct FactoryConfig {
    pub label: String,
    pub settings: Value,
}

impl FactoryConfig {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            settings: Value::Null,
        }
    }

    pub fn with_settings(label: impl Into<String>, settings: Value) -> Self {
        Self {
            label: label.into(),
            settings,
        }
    }
}

pub fn setting_f64(settings: &Value, key: &str, default: f64) -> f64 {
    settings.get(key).and_then(Value::as_f64).unwrap_or(default)
}

pub fn setting_u64(settings: &Value, key: &str, default: u64) -> u64 {
    settings.get(key).and_then(Value::as_u64).unwrap_or(default)
}

pub fn setting_i64_list(settings: &Value, key: &str) -> Vec<i64> {
    settings
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default()
}

pub fn setting_color(settings: &Value, key: &str, default: [u8; 3]) -> [u8; 3] {
    let Some(items) = settings.get(key).and_then(Value::as_array) else {
        return default;
    };
    let mut color = default;
    for (slot, item) in color.iter_mut().zip(items) {
        if let Some(value) = item.as_u64() {
            *slot = value.min(255) as u8;
        }
    }
    color
}

/// Linear signal-to-color map, dark blue at `min` through to red at `max`.
pub fn palette_color(value: f64, min: f64, max: f64) -> [u8; 3] {
    let span = max - min;
    let t = if span > 0.0 {
        ((value - min) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    [
        (255.0 * t) as u8,
        (80.0 * (1.0 - (2.0 * t - 1.0).abs())) as u8,
        (255.0 * (1.0 - t)) as u8,
    ]
}

/// What a factory sees of the display session while converting.
pub struct ConvertContext<'a> {
    pub geometry: &'a dyn Geometry,
    pub viewport: &'a dyn ViewportSize,
    pub tpc: TpcId,
}

/// One drawing algorithm per product kind. Exactly one live factory per
/// kind is held by the registry; `reconfigure` runs before the first
/// convert of a run and again whenever the configuration changes.
pub trait VisFactory {
    fn kind(&self) -> ProductKind;

    /// Producer label the instances of this kind are fetched by.
    fn label(&self) -> &str;

    fn reconfigure(&mut self, config: &FactoryConfig);

    /// Pure predicate deciding whether an instance is worth drawing.
    fn select(&self, _product: ProductRef<'_>) -> bool {
        true
    }

    /// Builds the element subtree for one instance, or None when there is
    /// nothing to show for it.
    fn convert(
        &self,
        product: ProductRef<'_>,
        ctx: &ConvertContext<'_>,
        arena: &mut ElementArena,
    ) -> Result<Option<ElementId>, ConvertError>;
}

/// Kind-keyed table of the live factories.
#[derive(Default)]
pub struct FactoryRegistry {
    factories: HashMap<ProductKind, Box<dyn VisFactory>>,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, factory: Box<dyn VisFactory>) -> Result<(), ConfigError> {
        let kind = factory.kind();
        if self.factories.contains_key(&kind) {
            return Err(ConfigError::DuplicateFactory(kind));
        }
        self.factories.insert(kind, factory);
        Ok(())
    }

    pub fn contains(&self, kind: ProductKind) -> bool {
        self.factories.contains_key(&kind)
    }

    pub fn get(&self, kind: ProductKind) -> Option<&dyn VisFactory> {
        self.factories.get(&kind).map(Box::as_ref)
    }

    pub fn get_mut(&mut self, kind: ProductKind) -> Option<&mut (dyn VisFactory + 'static)> {
        self.factories.get_mut(&kind).map(Box::as_mut)
    }

    pub fn kinds(&self) -> Vec<ProductKind> {
        let mut kinds: Vec<ProductKind> = self.factories.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

/// Built-in factory for a kind.
pub fn create_factory(kind: ProductKind) -> Box<dyn VisFactory> {
    match kind {
        ProductKind::RawDigit => Box::new(RawDigitFactory::default()),
        ProductKind::Hit => Box::new(HitFactory::default()),
        ProductKind::Wire => Box::new(WireFactory::default()),
        ProductKind::SimParticle => Box::new(SimParticleFactory::default()),
        ProductKind::Track => Box::new(TrackFactory::default()),
    }
}

pub(crate) fn kind_mismatch(expected: ProductKind, got: ProductKind) -> ConvertError {
    ConvertError::KindMismatch { expected, got }
}
