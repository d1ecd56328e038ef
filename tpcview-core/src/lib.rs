pub mod builder;
pub mod config;
pub mod context;
pub mod event;
pub mod factory;
pub mod geo;
pub mod product;
pub mod proj;

pub use builder::{BuilderState, SceneBuilder};
pub use config::{ConfigError, DisplayConfig, ProductConfig, SceneConfig};
pub use context::{DisplayContext, FrameConfig, SceneTable, SharedViewport, ViewportSize};
pub use event::{EventStore, FetchError, InMemoryEvent};
pub use factory::{
    create_factory, ConvertContext, ConvertError, FactoryConfig, FactoryRegistry, VisFactory,
};
pub use geo::GeoSceneMaker;
pub use product::{
    Hit, ProductBatch, ProductKind, ProductRef, RawDigit, RecoTrack, SimParticle, TrajectoryPoint,
    WireSignal,
};
pub use proj::{
    OrthoProjection, ProjectionContext, ProjectionError, ProjectionManager, ProjectionPass,
    SceneProjection, TimeWireProjection,
};
