//! Commensal recovery: natural regrowth and the microbiome therapeutic.

use crate::config::Config;
use crate::model::{Severity, SimulationState, Species};
use crate::rng::RandomSource;

const THERAPEUTIC_PREFIX: &str = "Therapeutic_";

/// Apply one day of natural commensal regrowth.
///
/// Only meaningful while no antibiotic course is active. Dormant species
/// recolonize stochastically; the others grow logistically into whatever
/// capacity the commensals and the pathogen leave free at the start of the day.
pub fn apply_natural_regrowth_tick(
    state: &SimulationState,
    cfg: &Config,
    rng: &mut RandomSource,
) -> SimulationState {
    let eco = &cfg.ecosystem;
    let capacity = eco.carrying_capacity;
    let available = capacity - state.commensal_total() - state.pathogen.total();

    let mut next = state.clone();
    for sp in &mut next.species {
        if sp.abundance < eco.extinction_threshold {
            if rng.chance(eco.wake_probability) {
                sp.abundance = eco.wake_abundance;
            }
            continue;
        }

        if available > 0.0 {
            let growth = sp.growth_rate
                * sp.abundance
                * (available / capacity)
                * (1.0 + rng.gaussian(0.0, eco.growth_jitter));
            sp.abundance += growth.max(0.0);
        }
        sp.abundance = sp.abundance.max(0.0);
    }

    // Wake-ups are not bounded by the logistic term.
    fit_to_capacity(&mut next, capacity);

    next
}

/// Administer one dose of the microbiome therapeutic.
///
/// The dose is split evenly across `therapeutic_slots`. Depleted species
/// already in the gut are revived first and gain the engraftment bonus;
/// remaining slots are filled with newly delivered species. If the
/// community would then overflow the capacity left by the pathogen, every
/// commensal is scaled down proportionally.
pub fn apply_therapeutic_intervention(
    state: &SimulationState,
    cfg: &Config,
    rng: &mut RandomSource,
) -> SimulationState {
    let treat = &cfg.treatment;
    let slots = treat.therapeutic_slots;
    let boost_per_slot = treat.therapeutic_boost / slots as f64;

    let mut next = state.clone();

    let mut filled = 0;
    for sp in &mut next.species {
        if filled == slots {
            break;
        }
        if sp.abundance < treat.depleted_threshold {
            let boost = boost_per_slot * (1.0 + rng.gaussian(0.0, treat.therapeutic_jitter));
            sp.abundance += boost.max(0.0);
            sp.growth_rate += treat.engraftment_bonus;
            filled += 1;
        }
    }

    let mut therapeutic_num = next
        .species
        .iter()
        .filter(|sp| sp.name.starts_with(THERAPEUTIC_PREFIX))
        .count();
    for _ in filled..slots {
        therapeutic_num += 1;
        let abundance = boost_per_slot * (1.0 + rng.gaussian(0.0, treat.therapeutic_jitter));
        next.species.push(Species {
            name: format!("{THERAPEUTIC_PREFIX}{therapeutic_num}"),
            abundance: abundance.max(0.0),
            growth_rate: cfg.ecosystem.base_growth_rate + treat.engraftment_bonus,
            antibiotic_sensitivity: rng
                .range(treat.therapeutic_trait_min, treat.therapeutic_trait_max),
            competitive_strength: rng
                .range(treat.therapeutic_trait_min, treat.therapeutic_trait_max),
        });
    }

    fit_to_capacity(&mut next, cfg.ecosystem.carrying_capacity);

    next.therapeutic_applied = true;
    next.push_event(
        Severity::Success,
        "Microbiome therapeutic administered. Commensal spores delivered to the gut.",
    );

    next
}

/// Scale every commensal down proportionally so the community fits in the
/// capacity the pathogen leaves free. The pathogen itself is never scaled.
fn fit_to_capacity(state: &mut SimulationState, capacity: f64) {
    let limit = (capacity - state.pathogen.total()).max(0.0);
    let total = state.commensal_total();
    if total > limit {
        let scale = limit / total;
        for sp in &mut state.species {
            sp.abundance *= scale;
        }
    }
}
