use tpcview_core::builder::SceneBuilder;
use tpcview_core::config::{ConfigError, DisplayConfig};
use tpcview_core::context::DisplayContext;
use tpcview_core::event::EventStore;
use tpcview_core::geo::GeoSceneMaker;
use tpcview_core::proj::ProjectionManager;

use crate::navigation::{EventAddress, NavChannel, NavCommand};

/// Where the navigation cursor goes after a command. None means the source
/// is exhausted and the loop should finish.
pub fn advance(
    cursor: usize,
    command: NavCommand,
    addresses: &[EventAddress],
) -> Option<usize> {
    match command {
        NavCommand::NextEvent | NavCommand::SequentialOnly => {
            (cursor + 1 < addresses.len()).then_some(cursor + 1)
        }
        NavCommand::PrevEvent => Some(cursor.saturating_sub(1)),
        NavCommand::ReloadEvent => Some(cursor),
        NavCommand::GotoEvent { target } => {
            match addresses.iter().position(|address| *address == target) {
                Some(index) => Some(index),
                None => {
                    log::warn!(
                        "no event {}/{}/{} in this source; staying put",
                        target.run,
                        target.subrun,
                        target.event
                    );
                    Some(cursor)
                }
            }
        }
    }
}

/// Owns every per-scene maker and drives them through the per-event
/// protocol: initialize once at job start, then rebuild-and-project for
/// each event, blocking on the navigation channel in between. A rebuild
/// always runs to completion before the loop blocks again.
#[derive(Default)]
pub struct DisplayDriver {
    builders: Vec<SceneBuilder>,
    geo_makers: Vec<GeoSceneMaker>,
    projectors: Vec<ProjectionManager>,
}

impl DisplayDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// One scene builder per configured scene, in file order.
    pub fn from_config(config: &DisplayConfig) -> Self {
        let mut driver = Self::new();
        for scene in &config.scenes {
            driver.add_builder(SceneBuilder::from_config(scene));
        }
        driver
    }

    pub fn add_builder(&mut self, builder: SceneBuilder) {
        self.builders.push(builder);
    }

    pub fn add_geo_maker(&mut self, maker: GeoSceneMaker) {
        self.geo_makers.push(maker);
    }

    pub fn add_projector(&mut self, projector: ProjectionManager) {
        self.projectors.push(projector);
    }

    pub fn initialize(&mut self, ctx: &mut DisplayContext) -> Result<(), ConfigError> {
        for maker in &mut self.geo_makers {
            maker.make_global(ctx)?;
        }
        for builder in &mut self.builders {
            builder.make_global(ctx)?;
        }
        Ok(())
    }

    pub fn draw_event(
        &mut self,
        ctx: &mut DisplayContext,
        event: &dyn EventStore,
    ) -> Result<(), ConfigError> {
        for maker in &mut self.geo_makers {
            maker.make_event(ctx)?;
        }
        for builder in &mut self.builders {
            builder.make_event(ctx, event)?;
        }
        for projector in &mut self.projectors {
            projector.project(ctx)?;
        }
        Ok(())
    }

    /// Blocking navigation loop over an indexed event sequence. Returns the
    /// number of draws performed; the loop ends when the channel
    /// disconnects or a forward step runs off the end of the source.
    pub fn run<E: EventStore>(
        &mut self,
        ctx: &mut DisplayContext,
        events: &[(EventAddress, E)],
        nav: &NavChannel,
    ) -> Result<usize, ConfigError> {
        let addresses: Vec<EventAddress> = events.iter().map(|(address, _)| *address).collect();
        let mut cursor = 0usize;
        let mut draws = 0usize;
        while cursor < events.len() {
            self.draw_event(ctx, &events[cursor].1)?;
            draws += 1;
            let Some(command) = nav.await_command() else {
                break;
            };
            let Some(next) = advance(cursor, command, &addresses) else {
                break;
            };
            cursor = next;
        }
        Ok(draws)
    }
}
