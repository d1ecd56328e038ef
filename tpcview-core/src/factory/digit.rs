use scene::{Appearance, ElementArena, ElementId, Shape};

use crate::factory::{
    kind_mismatch, palette_color, setting_f64, setting_u64, ConvertContext, ConvertError,
    FactoryConfig, VisFactory,
};
use crate::product::{ProductKind, ProductRef, RawDigit};
use crate::proj;

/// Draws one box per above-cut pulse of a raw waveform, in time-versus-wire
/// coordinates. Settings: `min_signal`, `max_signal`, `adc_cut`,
/// `transparency`.
pub struct RawDigitFactory {
    label: String,
    min_signal: f64,
    max_signal: f64,
    adc_cut: f64,
    transparency: u8,
}

impl Default for RawDigitFactory {
    fn default() -> Self {
        Self {
            label: "daq".to_string(),
            min_signal: 0.0,
            max_signal: 400.0,
            adc_cut: 5.0,
            transparency: 60,
        }
    }
}

/// Contiguous run of samples whose pedestal-subtracted value clears the cut.
struct Pulse {
    start: usize,
    end: usize,
    peak: f64,
}

fn pulses(digit: &RawDigit, cut: f64) -> Vec<Pulse> {
    let mut out = Vec::new();
    let mut open: Option<Pulse> = None;
    for (tick, adc) in digit.adc.iter().enumerate() {
        let signal = f64::from(*adc) - f64::from(digit.pedestal);
        if signal.abs() >= cut {
            match open.as_mut() {
                Some(pulse) => {
                    pulse.end = tick;
                    if signal.abs() > pulse.peak.abs() {
                        pulse.peak = signal;
                    }
                }
                None => {
                    open = Some(Pulse {
                        start: tick,
                        end: tick,
                        peak: signal,
                    });
                }
            }
        } else if let Some(pulse) = open.take() {
            out.push(pulse);
        }
    }
    if let Some(pulse) = open.take() {
        out.push(pulse);
    }
    out
}

impl VisFactory for RawDigitFactory {
    fn kind(&self) -> ProductKind {
        ProductKind::RawDigit
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn reconfigure(&mut self, config: &FactoryConfig) {
        self.label = config.label.clone();
        self.min_signal = setting_f64(&config.settings, "min_signal", 0.0);
        self.max_signal = setting_f64(&config.settings, "max_signal", 400.0);
        self.adc_cut = setting_f64(&config.settings, "adc_cut", 5.0);
        self.transparency = setting_u64(&config.settings, "transparency", 60).min(100) as u8;
    }

    fn convert(
        &self,
        product: ProductRef<'_>,
        ctx: &ConvertContext<'_>,
        arena: &mut ElementArena,
    ) -> Result<Option<ElementId>, ConvertError> {
        let ProductRef::RawDigit(digit) = product else {
            return Err(kind_mismatch(self.kind(), product.kind()));
        };

        let wire = ctx.geometry.wire_for_channel(digit.channel)?;
        let scale = proj::wire_scale(ctx.geometry, ctx.viewport, wire.plane)?;

        let found = pulses(digit, self.adc_cut);
        if found.is_empty() {
            return Ok(None);
        }

        let root = arena.create(
            format!("{} ch {}", self.label, digit.channel),
            Shape::Group,
            Appearance::default(),
        );
        for pulse in found {
            let start = pulse.start as f64;
            let end = pulse.end as f64;
            let appearance = Appearance {
                color: palette_color(pulse.peak, self.min_signal, self.max_signal),
                transparency: self.transparency,
                line_width: 1.0,
            };
            arena.create_child(
                root,
                format!("ticks {}..{}", pulse.start, pulse.end),
                Shape::Box {
                    center: [
                        0.0,
                        (start + end) / 2.0,
                        f64::from(wire.wire) * scale,
                    ],
                    half_extents: [0.5, (end - start + 1.0) / 2.0, scale / 2.0],
                },
                appearance,
            )?;
        }
        Ok(Some(root))
    }
}
