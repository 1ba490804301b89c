//! Pathogen life cycle: germination, growth, colonization resistance,
//! sporulation and toxin.

use crate::config::{Config, PathogenConfig};
use crate::model::{PathogenState, SimulationState, Strain};
use crate::rng::RandomSource;

/// Linear interpolation from `a` (at `t = 0`) to `b` (at `t = 1`).
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

impl Strain {
    /// Derive growth and toxin rates from a virulence in `1..=10`.
    pub fn from_virulence(virulence: u8, cfg: &PathogenConfig) -> Self {
        let virulence = virulence.clamp(1, 10);
        let t = f64::from(virulence - 1) / 9.0;
        Self {
            virulence,
            growth_rate: lerp(cfg.growth_rate_min, cfg.growth_rate_max, t),
            toxin_rate: lerp(cfg.toxin_rate_min, cfg.toxin_rate_max, t),
        }
    }
}

/// Advance the pathogen by one day.
///
/// Reads the commensal total recorded on `state`, so it must run after the
/// totals have been recomputed for the tick.
pub fn update_pathogen(
    state: &SimulationState,
    cfg: &Config,
    rng: &mut RandomSource,
) -> PathogenState {
    let par = &cfg.pathogen;
    let capacity = cfg.ecosystem.carrying_capacity;
    let commensal_total = state.total_commensal_abundance;
    let strain = &state.strain;

    let PathogenState {
        mut spores,
        mut vegetative,
        toxin_level,
        ..
    } = state.pathogen;

    // 1 = no exclusion, 0 = fully suppressed.
    let exclusion_ratio = (commensal_total / par.exclusion_threshold).clamp(0.0, 1.0);
    let exclusion_factor = (1.0 - exclusion_ratio * par.exclusion_strength).clamp(0.0, 1.0);

    // Germination. Spores stay dormant while the gut is under antibiotics.
    let suppression = if state.antibiotic.active {
        par.antibiotic_germination_factor
    } else {
        1.0
    };
    let germination_rate = (lerp(par.germination_base, par.germination_empty, exclusion_factor)
        * suppression
        * (1.0 + rng.gaussian(0.0, par.germination_jitter)))
    .max(0.0);
    let germinating = spores * germination_rate;
    spores -= germinating;
    vegetative += germinating;

    // Logistic growth into the capacity shared with the commensals.
    let available = capacity - commensal_total - spores - vegetative;
    if available > 0.0 {
        let growth = strain.growth_rate
            * vegetative
            * (available / capacity)
            * (1.0 + rng.gaussian(0.0, par.growth_jitter));
        vegetative += growth.max(0.0);
    }

    // Colonization resistance from a commensal surplus.
    if commensal_total > par.exclusion_threshold {
        let excess = commensal_total - par.exclusion_threshold;
        vegetative *= (1.0 - par.displacement_rate * excess).max(0.0);
        spores *= (1.0 - par.spore_clearance_rate * excess).max(0.0);
    }

    let sporulating = vegetative * par.sporulation_rate;
    vegetative -= sporulating;
    spores += sporulating;

    // Toxin trails the bloom: decay plus production.
    let toxin_level = (toxin_level * (1.0 - par.toxin_decay_rate)
        + vegetative * strain.toxin_rate)
        .clamp(0.0, 1.0);

    PathogenState {
        spores: spores.max(0.0),
        vegetative: vegetative.max(0.0),
        toxin_level,
        germination_rate,
    }
}
