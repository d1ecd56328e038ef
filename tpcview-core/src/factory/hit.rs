use scene::{Appearance, ElementArena, ElementId, Shape};

use crate::factory::{
    kind_mismatch, palette_color, setting_f64, setting_u64, ConvertContext, ConvertError,
    FactoryConfig, VisFactory,
};
use crate::product::{ProductKind, ProductRef};
use crate::proj;

/// Draws a fitted pulse as one charge-colored box spanning its tick range
/// at its wire coordinate. Settings: `min_signal`, `max_signal`, `adc_cut`
/// (hits with a smaller integral are not drawn), `transparency`.
pub struct HitFactory {
    label: String,
    min_signal: f64,
    max_signal: f64,
    adc_cut: f64,
    transparency: u8,
}

impl Default for HitFactory {
    fn default() -> Self {
        Self {
            label: "hits".to_string(),
            min_signal: 0.0,
            max_signal: 400.0,
            adc_cut: 0.0,
            transparency: 60,
        }
    }
}

impl VisFactory for HitFactory {
    fn kind(&self) -> ProductKind {
        ProductKind::Hit
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn reconfigure(&mut self, config: &FactoryConfig) {
        self.label = config.label.clone();
        self.min_signal = setting_f64(&config.settings, "min_signal", 0.0);
        self.max_signal = setting_f64(&config.settings, "max_signal", 400.0);
        self.adc_cut = setting_f64(&config.settings, "adc_cut", 0.0);
        self.transparency = setting_u64(&config.settings, "transparency", 60).min(100) as u8;
    }

    fn select(&self, product: ProductRef<'_>) -> bool {
        let ProductRef::Hit(hit) = product else {
            return true;
        };
        hit.integral >= self.adc_cut
    }

    fn convert(
        &self,
        product: ProductRef<'_>,
        ctx: &ConvertContext<'_>,
        arena: &mut ElementArena,
    ) -> Result<Option<ElementId>, ConvertError> {
        let ProductRef::Hit(hit) = product else {
            return Err(kind_mismatch(self.kind(), product.kind()));
        };

        let wire = ctx.geometry.wire_for_channel(hit.channel)?;
        let scale = proj::wire_scale(ctx.geometry, ctx.viewport, wire.plane)?;

        let appearance = Appearance {
            color: palette_color(hit.integral, self.min_signal, self.max_signal),
            transparency: self.transparency,
            line_width: 1.0,
        };
        let id = arena.create(
            format!("{} ch {}", self.label, hit.channel),
            Shape::Box {
                center: [1.0, hit.peak_tick, f64::from(wire.wire) * scale],
                half_extents: [
                    0.5,
                    (hit.end_tick - hit.start_tick) / 2.0,
                    scale / 2.0,
                ],
            },
            appearance,
        );
        Ok(Some(id))
    }
}
