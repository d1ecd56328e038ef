use scene::{Appearance, ElementArena, ElementId, Shape};

use crate::factory::{
    kind_mismatch, setting_color, setting_f64, setting_u64, ConvertContext, ConvertError,
    FactoryConfig, VisFactory,
};
use crate::product::{ProductKind, ProductRef};
use crate::proj;

/// Traces a deconvolved waveform as a polyline riding on its wire
/// coordinate, amplitude folded into the wire axis. Settings: `threshold`
/// (channels that never clear it are not drawn), `max_signal`
/// (normalization), `color`, `transparency`.
pub struct WireFactory {
    label: String,
    threshold: f64,
    max_signal: f64,
    color: [u8; 3],
    transparency: u8,
}

impl Default for WireFactory {
    fn default() -> Self {
        Self {
            label: "calwire".to_string(),
            threshold: 0.0,
            max_signal: 100.0,
            color: [0, 160, 255],
            transparency: 0,
        }
    }
}

impl VisFactory for WireFactory {
    fn kind(&self) -> ProductKind {
        ProductKind::Wire
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn reconfigure(&mut self, config: &FactoryConfig) {
        self.label = config.label.clone();
        self.threshold = setting_f64(&config.settings, "threshold", 0.0);
        self.max_signal = setting_f64(&config.settings, "max_signal", 100.0);
        self.color = setting_color(&config.settings, "color", [0, 160, 255]);
        self.transparency = setting_u64(&config.settings, "transparency", 0).min(100) as u8;
    }

    fn convert(
        &self,
        product: ProductRef<'_>,
        ctx: &ConvertContext<'_>,
        arena: &mut ElementArena,
    ) -> Result<Option<ElementId>, ConvertError> {
        let ProductRef::Wire(wire_signal) = product else {
            return Err(kind_mismatch(self.kind(), product.kind()));
        };
        if wire_signal.signal.is_empty() {
            return Ok(None);
        }
        let peak = wire_signal
            .signal
            .iter()
            .fold(0.0_f32, |acc, s| acc.max(s.abs()));
        if f64::from(peak) < self.threshold {
            return Ok(None);
        }

        let wire = ctx.geometry.wire_for_channel(wire_signal.channel)?;
        let scale = proj::wire_scale(ctx.geometry, ctx.viewport, wire.plane)?;

        // amplitude stays inside the wire's own pitch slot
        let points = wire_signal
            .signal
            .iter()
            .enumerate()
            .map(|(tick, sample)| {
                let fraction = (f64::from(*sample) / self.max_signal).clamp(-1.0, 1.0);
                [
                    0.0,
                    tick as f64,
                    (f64::from(wire.wire) + 0.45 * fraction) * scale,
                ]
            })
            .collect();

        let id = arena.create(
            format!("{} ch {}", self.label, wire_signal.channel),
            Shape::Polyline { points },
            Appearance {
                color: self.color,
                transparency: self.transparency,
                line_width: 1.0,
            },
        );
        Ok(Some(id))
    }
}
