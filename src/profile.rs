//! Initial community and pathogen generation.

use crate::config::{EcosystemConfig, PathogenConfig};
use crate::model::{PathogenState, Species};
use crate::rng::RandomSource;

/// Genera the initial commensal community is drawn from.
pub const COMMENSAL_POOL: [&str; 15] = [
    "Bacteroides",
    "Faecalibacterium",
    "Roseburia",
    "Bifidobacterium",
    "Lactobacillus",
    "Eubacterium",
    "Ruminococcus",
    "Prevotella",
    "Akkermansia",
    "Clostridium_commensal",
    "Blautia",
    "Coprococcus",
    "Dorea",
    "Streptococcus",
    "Enterococcus",
];

/// Generate the initial commensal community.
///
/// Picks `species_count` distinct names from [`COMMENSAL_POOL`], draws raw
/// abundances and normalizes them so the community fills `initial_fill` of the
/// carrying capacity, then draws each species' traits.
pub fn generate_initial_profile(cfg: &EcosystemConfig, rng: &mut RandomSource) -> Vec<Species> {
    let names = rng.shuffle(&COMMENSAL_POOL);
    let names = &names[..cfg.species_count];

    let raw_abundances: Vec<f64> = names
        .iter()
        .map(|_| rng.range(cfg.raw_abundance_min, cfg.raw_abundance_max))
        .collect();
    let raw_total: f64 = raw_abundances.iter().sum();
    let scale = cfg.initial_fill * cfg.carrying_capacity / raw_total;

    names
        .iter()
        .zip(raw_abundances)
        .map(|(&name, raw_abundance)| Species {
            name: name.to_owned(),
            abundance: raw_abundance * scale,
            growth_rate: rng
                .gaussian(cfg.base_growth_rate, cfg.growth_rate_std_dev)
                .max(cfg.min_growth_rate),
            antibiotic_sensitivity: rng
                .gaussian(cfg.sensitivity_mean, cfg.sensitivity_std_dev)
                .clamp(0.1, 1.0),
            competitive_strength: rng.range(cfg.strength_min, cfg.strength_max),
        })
        .collect()
}

/// Generate the initial pathogen state: a small spore reservoir, no vegetative cells.
pub fn generate_initial_pathogen(cfg: &PathogenConfig, rng: &mut RandomSource) -> PathogenState {
    let jitter = rng.gaussian(0.0, cfg.spore_jitter);
    PathogenState {
        spores: (cfg.initial_spores * (1.0 + jitter)).max(0.0),
        vegetative: 0.0,
        toxin_level: 0.0,
        germination_rate: cfg.germination_base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn profile_has_configured_number_of_distinct_species() {
        let cfg = EcosystemConfig::default();
        let profile = generate_initial_profile(&cfg, &mut RandomSource::new(42));
        assert_eq!(profile.len(), cfg.species_count);

        let names: HashSet<_> = profile.iter().map(|sp| sp.name.as_str()).collect();
        assert_eq!(names.len(), cfg.species_count);
        assert!(names.iter().all(|name| COMMENSAL_POOL.contains(name)));
    }

    #[test]
    fn profile_fills_target_fraction_of_capacity() {
        let cfg = EcosystemConfig::default();
        let profile = generate_initial_profile(&cfg, &mut RandomSource::new(7));
        let total: f64 = profile.iter().map(|sp| sp.abundance).sum();
        assert!((total - 0.85).abs() < 1e-9, "total {total}");
        assert!(profile.iter().all(|sp| sp.abundance > 0.0));
    }

    #[test]
    fn traits_respect_bounds() {
        let cfg = EcosystemConfig::default();
        for seed in 0..20 {
            for sp in generate_initial_profile(&cfg, &mut RandomSource::new(seed)) {
                assert!((0.1..=1.0).contains(&sp.antibiotic_sensitivity));
                assert!(sp.growth_rate >= cfg.min_growth_rate);
                assert!((cfg.strength_min..cfg.strength_max).contains(&sp.competitive_strength));
            }
        }
    }

    #[test]
    fn profile_is_deterministic() {
        let cfg = EcosystemConfig::default();
        let profile_a = generate_initial_profile(&cfg, &mut RandomSource::new(42));
        let profile_b = generate_initial_profile(&cfg, &mut RandomSource::new(42));
        let profile_c = generate_initial_profile(&cfg, &mut RandomSource::new(43));
        assert_eq!(profile_a, profile_b);
        assert_ne!(profile_a, profile_c);
    }

    #[test]
    fn pathogen_starts_as_spores_only() {
        let cfg = PathogenConfig::default();
        let pathogen = generate_initial_pathogen(&cfg, &mut RandomSource::new(42));
        assert!(pathogen.spores > 0.0);
        assert!((pathogen.spores - cfg.initial_spores).abs() < 0.5 * cfg.initial_spores);
        assert_eq!(pathogen.vegetative, 0.0);
        assert_eq!(pathogen.toxin_level, 0.0);
        assert_eq!(pathogen.germination_rate, cfg.germination_base);
    }
}
