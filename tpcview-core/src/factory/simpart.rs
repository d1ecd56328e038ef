use scene::{Appearance, ElementArena, ElementId, Shape};

use crate::factory::{
    kind_mismatch, setting_f64, setting_i64_list, setting_u64, ConvertContext, ConvertError,
    FactoryConfig, VisFactory,
};
use crate::product::{ProductKind, ProductRef};

/// Color by particle species, loosely following the usual event-display
/// conventions.
pub fn pdg_color(pdg: i32) -> [u8; 3] {
    match pdg.abs() {
        11 => [0, 255, 255],
        13 => [0, 255, 0],
        22 => [0, 0, 255],
        211 => [255, 0, 255],
        2112 => [128, 128, 128],
        2212 => [255, 0, 0],
        _ => [255, 255, 255],
    }
}

/// Draws a truth particle's step trajectory as a world-space polyline with
/// its points rendered on top. Settings: `min_energy` (GeV), `max_radius`
/// and `max_z` (cm, trajectory is cut where it leaves the cylinder),
/// `skip_pdg` (species codes never drawn), `transparency`.
pub struct SimParticleFactory {
    label: String,
    min_energy: f64,
    max_radius: f64,
    max_z: f64,
    skip_pdg: Vec<i64>,
    transparency: u8,
}

impl Default for SimParticleFactory {
    fn default() -> Self {
        Self {
            label: "largeant".to_string(),
            min_energy: 1e-2,
            max_radius: f64::MAX,
            max_z: f64::MAX,
            skip_pdg: Vec::new(),
            transparency: 0,
        }
    }
}

impl VisFactory for SimParticleFactory {
    fn kind(&self) -> ProductKind {
        ProductKind::SimParticle
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn reconfigure(&mut self, config: &FactoryConfig) {
        self.label = config.label.clone();
        self.min_energy = setting_f64(&config.settings, "min_energy", 1e-2);
        self.max_radius = setting_f64(&config.settings, "max_radius", f64::MAX);
        self.max_z = setting_f64(&config.settings, "max_z", f64::MAX);
        self.skip_pdg = setting_i64_list(&config.settings, "skip_pdg");
        self.transparency = setting_u64(&config.settings, "transparency", 0).min(100) as u8;
    }

    /// Nuclear fragments (pdg codes of 10^4 and up) are never drawn.
    fn select(&self, product: ProductRef<'_>) -> bool {
        let ProductRef::SimParticle(particle) = product else {
            return true;
        };
        particle.initial_energy() > self.min_energy
            && particle.pdg < 10_000
            && !self.skip_pdg.contains(&i64::from(particle.pdg))
    }

    fn convert(
        &self,
        product: ProductRef<'_>,
        _ctx: &ConvertContext<'_>,
        arena: &mut ElementArena,
    ) -> Result<Option<ElementId>, ConvertError> {
        let ProductRef::SimParticle(particle) = product else {
            return Err(kind_mismatch(self.kind(), product.kind()));
        };

        let points: Vec<[f64; 3]> = particle
            .trajectory
            .iter()
            .map(|step| [step.position[0], step.position[1], step.position[2]])
            .take_while(|p| {
                (p[0] * p[0] + p[1] * p[1]).sqrt() <= self.max_radius
                    && p[2].abs() <= self.max_z
            })
            .collect();
        if points.len() < 2 {
            return Ok(None);
        }

        let appearance = Appearance {
            color: pdg_color(particle.pdg),
            transparency: self.transparency,
            line_width: 1.0,
        };
        let root = arena.create(
            format!("{} pdg {} track {}", self.label, particle.pdg, particle.track_id),
            Shape::Polyline {
                points: points.clone(),
            },
            appearance,
        );
        arena.create_child(
            root,
            "path marks",
            Shape::Points { points },
            appearance,
        )?;
        Ok(Some(root))
    }
}
