//! One day of antibiotic exposure.

use crate::config::TreatmentConfig;
use crate::model::SimulationState;
use crate::rng::RandomSource;

/// Apply one day of antibiotics to the commensals and the pathogen.
///
/// Each species loses a fraction proportional to its sensitivity. Vegetative
/// pathogen cells lose a fixed fraction. Spores are never touched.
pub fn apply_antibiotic_tick(
    state: &SimulationState,
    cfg: &TreatmentConfig,
    rng: &mut RandomSource,
) -> SimulationState {
    let mut next = state.clone();

    for sp in &mut next.species {
        let kill = sp.antibiotic_sensitivity
            * cfg.commensal_kill_rate
            * (1.0 + rng.gaussian(0.0, cfg.kill_jitter));
        sp.abundance = (sp.abundance * (1.0 - kill)).max(0.0);
    }

    next.pathogen.vegetative =
        (state.pathogen.vegetative * (1.0 - cfg.vegetative_kill_rate)).max(0.0);

    next
}
