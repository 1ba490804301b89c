//! Patient health and community diversity.

use crate::config::PatientConfig;
use crate::model::Species;

/// Update the patient health score from the current toxin level.
///
/// Health falls proportionally to toxin above the threshold and otherwise
/// recovers by a fixed step; the result is clamped to `[0, 100]`.
pub fn update_health_score(current: f64, toxin_level: f64, cfg: &PatientConfig) -> f64 {
    let health = if toxin_level > cfg.toxin_threshold {
        current - cfg.toxin_damage_rate * toxin_level
    } else {
        current + cfg.recovery_rate
    };
    health.clamp(0.0, 100.0)
}

/// Shannon entropy (base 2) of the abundance proportions; 0 for an empty community.
pub fn shannon_diversity(species: &[Species]) -> f64 {
    let total: f64 = species.iter().map(|sp| sp.abundance).sum();
    if total <= 0.0 {
        return 0.0;
    }
    species
        .iter()
        .filter(|sp| sp.abundance > 0.0)
        .map(|sp| {
            let p = sp.abundance / total;
            -p * p.log2()
        })
        .sum()
}
