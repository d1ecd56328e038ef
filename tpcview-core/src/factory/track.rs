use scene::{Appearance, ElementArena, ElementId, Shape};

use crate::factory::{
    kind_mismatch, setting_color, setting_u64, ConvertContext, ConvertError, FactoryConfig,
    VisFactory,
};
use crate::product::{ProductKind, ProductRef};

/// Draws a reconstructed track as a world-space polyline. Settings:
/// `min_points` (shorter tracks are not drawn), `color`, `transparency`.
pub struct TrackFactory {
    label: String,
    min_points: usize,
    color: [u8; 3],
    transparency: u8,
}

impl Default for TrackFactory {
    fn default() -> Self {
        Self {
            label: "tracks".to_string(),
            min_points: 2,
            color: [255, 64, 0],
            transparency: 0,
        }
    }
}

impl VisFactory for TrackFactory {
    fn kind(&self) -> ProductKind {
        ProductKind::Track
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn reconfigure(&mut self, config: &FactoryConfig) {
        self.label = config.label.clone();
        self.min_points = setting_u64(&config.settings, "min_points", 2) as usize;
        self.color = setting_color(&config.settings, "color", [255, 64, 0]);
        self.transparency = setting_u64(&config.settings, "transparency", 0).min(100) as u8;
    }

    fn select(&self, product: ProductRef<'_>) -> bool {
        let ProductRef::Track(track) = product else {
            return true;
        };
        track.points.len() >= self.min_points
    }

    fn convert(
        &self,
        product: ProductRef<'_>,
        _ctx: &ConvertContext<'_>,
        arena: &mut ElementArena,
    ) -> Result<Option<ElementId>, ConvertError> {
        let ProductRef::Track(track) = product else {
            return Err(kind_mismatch(self.kind(), product.kind()));
        };
        if track.points.len() < 2 {
            return Ok(None);
        }

        let id = arena.create(
            format!("{} track {}", self.label, track.id),
            Shape::Polyline {
                points: track.points.clone(),
            },
            Appearance {
                color: self.color,
                transparency: self.transparency,
                line_width: 2.0,
            },
        );
        Ok(Some(id))
    }
}
