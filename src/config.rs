use crate::profile::COMMENSAL_POOL;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// Every section and field is optional and falls back to the calibrated default.
/// See [`Config::from_file`] for loading.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ecosystem: EcosystemConfig,
    pub pathogen: PathogenConfig,
    pub treatment: TreatmentConfig,
    pub patient: PatientConfig,
    pub outcome: OutcomeConfig,
}

/// Commensal community parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EcosystemConfig {
    /// Capacity shared by commensals and pathogen.
    pub carrying_capacity: f64,
    /// Number of species drawn from the commensal pool.
    pub species_count: usize,
    /// Fraction of capacity filled at the start.
    pub initial_fill: f64,
    /// Range of the raw abundances drawn before normalization.
    pub raw_abundance_min: f64,
    pub raw_abundance_max: f64,

    pub base_growth_rate: f64,
    pub growth_rate_std_dev: f64,
    pub min_growth_rate: f64,

    pub sensitivity_mean: f64,
    pub sensitivity_std_dev: f64,

    pub strength_min: f64,
    pub strength_max: f64,

    /// Abundance below which a species is dormant and may recolonize.
    pub extinction_threshold: f64,
    /// Per-tick probability that a dormant species recolonizes.
    pub wake_probability: f64,
    /// Abundance of a freshly recolonized species.
    pub wake_abundance: f64,
    /// Relative noise on logistic regrowth.
    pub growth_jitter: f64,
}

impl Default for EcosystemConfig {
    fn default() -> Self {
        Self {
            carrying_capacity: 1.0,
            species_count: 12,
            initial_fill: 0.85,
            raw_abundance_min: 0.1,
            raw_abundance_max: 1.0,
            base_growth_rate: 0.15,
            growth_rate_std_dev: 0.02,
            min_growth_rate: 0.01,
            sensitivity_mean: 0.7,
            sensitivity_std_dev: 0.15,
            strength_min: 0.3,
            strength_max: 0.9,
            extinction_threshold: 0.001,
            wake_probability: 0.2,
            wake_abundance: 0.02,
            growth_jitter: 0.02,
        }
    }
}

/// Pathogen life-cycle parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathogenConfig {
    /// Strain aggressiveness, 1 (mild) to 10 (severe).
    pub virulence: u8,

    pub initial_spores: f64,
    pub spore_jitter: f64,

    /// Vegetative growth rate at virulence 1 and 10.
    pub growth_rate_min: f64,
    pub growth_rate_max: f64,
    /// Toxin production rate at virulence 1 and 10.
    pub toxin_rate_min: f64,
    pub toxin_rate_max: f64,

    /// Germination rate under full competitive exclusion.
    pub germination_base: f64,
    /// Germination rate in an empty niche.
    pub germination_empty: f64,
    /// Germination multiplier while an antibiotic course is active.
    pub antibiotic_germination_factor: f64,
    pub germination_jitter: f64,
    pub growth_jitter: f64,

    /// Commensal abundance at which exclusion saturates.
    pub exclusion_threshold: f64,
    pub exclusion_strength: f64,
    /// Vegetative displacement per unit of commensal excess over the threshold.
    pub displacement_rate: f64,
    /// Spore clearance per unit of commensal excess over the threshold.
    pub spore_clearance_rate: f64,

    pub sporulation_rate: f64,
    pub toxin_decay_rate: f64,

    /// Vegetative level that counts as a bloom.
    pub bloom_threshold: f64,
}

impl Default for PathogenConfig {
    fn default() -> Self {
        Self {
            virulence: 5,
            initial_spores: 0.02,
            spore_jitter: 0.1,
            growth_rate_min: 0.3,
            growth_rate_max: 0.8,
            toxin_rate_min: 0.1,
            toxin_rate_max: 0.5,
            germination_base: 0.01,
            germination_empty: 0.3,
            antibiotic_germination_factor: 0.05,
            germination_jitter: 0.05,
            growth_jitter: 0.03,
            exclusion_threshold: 0.6,
            exclusion_strength: 0.95,
            displacement_rate: 0.25,
            spore_clearance_rate: 0.06,
            sporulation_rate: 0.05,
            toxin_decay_rate: 0.2,
            bloom_threshold: 0.1,
        }
    }
}

/// Antibiotic and therapeutic parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreatmentConfig {
    pub commensal_kill_rate: f64,
    pub kill_jitter: f64,
    pub vegetative_kill_rate: f64,
    /// Length of an antibiotic course in ticks.
    pub course_duration: u32,

    /// Total abundance delivered by one therapeutic dose.
    pub therapeutic_boost: f64,
    /// Number of species the dose is split across.
    pub therapeutic_slots: usize,
    pub therapeutic_jitter: f64,
    /// Permanent growth-rate bonus of engrafted species.
    pub engraftment_bonus: f64,
    /// Abundance below which an existing species is revived by the dose.
    pub depleted_threshold: f64,
    /// Range of the traits of newly delivered species.
    pub therapeutic_trait_min: f64,
    pub therapeutic_trait_max: f64,
}

impl Default for TreatmentConfig {
    fn default() -> Self {
        Self {
            commensal_kill_rate: 0.6,
            kill_jitter: 0.02,
            vegetative_kill_rate: 0.6,
            course_duration: 10,
            therapeutic_boost: 0.4,
            therapeutic_slots: 6,
            therapeutic_jitter: 0.05,
            engraftment_bonus: 0.05,
            depleted_threshold: 0.05,
            therapeutic_trait_min: 0.4,
            therapeutic_trait_max: 0.8,
        }
    }
}

/// Patient health parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientConfig {
    pub baseline_health: f64,
    /// Toxin level above which health declines.
    pub toxin_threshold: f64,
    pub toxin_damage_rate: f64,
    pub recovery_rate: f64,
}

impl Default for PatientConfig {
    fn default() -> Self {
        Self {
            baseline_health: 100.0,
            toxin_threshold: 0.05,
            toxin_damage_rate: 10.0,
            recovery_rate: 1.0,
        }
    }
}

/// Phase and outcome thresholds.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomeConfig {
    /// Consecutive history entries required for a durable cure.
    pub durable_cure_ticks: usize,
    pub cure_pathogen_threshold: f64,
    pub cure_commensal_threshold: f64,
    /// Commensal abundance at which a therapeutic counts as taking hold.
    pub therapeutic_recovery_threshold: f64,
    /// Tick at which an uncured run becomes chronic.
    pub max_ticks: u64,
}

impl Default for OutcomeConfig {
    fn default() -> Self {
        Self {
            durable_cure_ticks: 14,
            cure_pathogen_threshold: 0.08,
            cure_commensal_threshold: 0.5,
            therapeutic_recovery_threshold: 0.5,
            max_ticks: 180,
        }
    }
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded; missing sections and fields take their defaults.
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.ecosystem
            .validate()
            .context("invalid ecosystem section")?;
        self.pathogen.validate().context("invalid pathogen section")?;
        self.treatment
            .validate()
            .context("invalid treatment section")?;
        self.patient.validate().context("invalid patient section")?;
        self.outcome.validate().context("invalid outcome section")?;
        Ok(())
    }
}

impl EcosystemConfig {
    fn validate(&self) -> Result<()> {
        check_num(self.carrying_capacity, 0.01..=100.0).context("invalid carrying capacity")?;
        check_num(self.species_count, 1..=COMMENSAL_POOL.len())
            .context("invalid number of species")?;
        check_num(self.initial_fill, 0.0..=1.0).context("invalid initial fill")?;
        check_pair(self.raw_abundance_min, self.raw_abundance_max, 1e-6..=1e3)
            .context("invalid raw abundance range")?;
        check_num(self.base_growth_rate, 0.0..=5.0).context("invalid base growth rate")?;
        check_num(self.growth_rate_std_dev, 0.0..=1.0)
            .context("invalid growth rate standard deviation")?;
        check_num(self.min_growth_rate, 1e-6..=1.0).context("invalid minimum growth rate")?;
        check_num(self.sensitivity_mean, 0.1..=1.0).context("invalid sensitivity mean")?;
        check_num(self.sensitivity_std_dev, 0.0..=1.0)
            .context("invalid sensitivity standard deviation")?;
        check_pair(self.strength_min, self.strength_max, 0.0..=1.0)
            .context("invalid competitive strength range")?;
        check_num(self.extinction_threshold, 0.0..=1.0).context("invalid extinction threshold")?;
        check_num(self.wake_probability, 0.0..=1.0).context("invalid wake probability")?;
        check_num(self.wake_abundance, 0.0..=1.0).context("invalid wake abundance")?;
        check_num(self.growth_jitter, 0.0..=1.0).context("invalid growth jitter")?;
        Ok(())
    }
}

impl PathogenConfig {
    fn validate(&self) -> Result<()> {
        check_num(self.virulence, 1..=10).context("invalid virulence")?;
        check_num(self.initial_spores, 0.0..=1.0).context("invalid initial spores")?;
        check_num(self.spore_jitter, 0.0..=1.0).context("invalid spore jitter")?;
        check_pair(self.growth_rate_min, self.growth_rate_max, 0.0..=5.0)
            .context("invalid growth rate range")?;
        check_pair(self.toxin_rate_min, self.toxin_rate_max, 0.0..=5.0)
            .context("invalid toxin rate range")?;
        check_num(self.germination_base, 0.0..=1.0).context("invalid baseline germination")?;
        check_num(self.germination_empty, 0.0..=1.0).context("invalid empty-niche germination")?;
        check_num(self.antibiotic_germination_factor, 0.0..=1.0)
            .context("invalid antibiotic germination factor")?;
        check_num(self.germination_jitter, 0.0..=1.0).context("invalid germination jitter")?;
        check_num(self.growth_jitter, 0.0..=1.0).context("invalid growth jitter")?;
        check_num(self.exclusion_threshold, 1e-6..=100.0).context("invalid exclusion threshold")?;
        check_num(self.exclusion_strength, 0.0..=1.0).context("invalid exclusion strength")?;
        check_num(self.displacement_rate, 0.0..=1.0).context("invalid displacement rate")?;
        check_num(self.spore_clearance_rate, 0.0..=1.0).context("invalid spore clearance rate")?;
        check_num(self.sporulation_rate, 0.0..=1.0).context("invalid sporulation rate")?;
        check_num(self.toxin_decay_rate, 0.0..=1.0).context("invalid toxin decay rate")?;
        check_num(self.bloom_threshold, 0.0..=1.0).context("invalid bloom threshold")?;
        Ok(())
    }
}

impl TreatmentConfig {
    fn validate(&self) -> Result<()> {
        check_num(self.commensal_kill_rate, 0.0..=1.0).context("invalid commensal kill rate")?;
        check_num(self.kill_jitter, 0.0..=1.0).context("invalid kill jitter")?;
        check_num(self.vegetative_kill_rate, 0.0..=1.0).context("invalid vegetative kill rate")?;
        check_num(self.course_duration, 1..=365).context("invalid course duration")?;
        check_num(self.therapeutic_boost, 0.0..=1.0).context("invalid therapeutic boost")?;
        check_num(self.therapeutic_slots, 1..=100).context("invalid therapeutic slots")?;
        check_num(self.therapeutic_jitter, 0.0..=1.0).context("invalid therapeutic jitter")?;
        check_num(self.engraftment_bonus, 0.0..=1.0).context("invalid engraftment bonus")?;
        check_num(self.depleted_threshold, 0.0..=1.0).context("invalid depleted threshold")?;
        check_pair(self.therapeutic_trait_min, self.therapeutic_trait_max, 0.1..=1.0)
            .context("invalid therapeutic trait range")?;
        Ok(())
    }
}

impl PatientConfig {
    fn validate(&self) -> Result<()> {
        check_num(self.baseline_health, 0.0..=100.0).context("invalid baseline health")?;
        check_num(self.toxin_threshold, 0.0..=1.0).context("invalid toxin threshold")?;
        check_num(self.toxin_damage_rate, 0.0..=100.0).context("invalid toxin damage rate")?;
        check_num(self.recovery_rate, 0.0..=100.0).context("invalid recovery rate")?;
        Ok(())
    }
}

impl OutcomeConfig {
    fn validate(&self) -> Result<()> {
        check_num(self.durable_cure_ticks, 1..=1000).context("invalid durable cure ticks")?;
        check_num(self.cure_pathogen_threshold, 0.0..=1.0)
            .context("invalid cure pathogen threshold")?;
        check_num(self.cure_commensal_threshold, 0.0..=1.0)
            .context("invalid cure commensal threshold")?;
        check_num(self.therapeutic_recovery_threshold, 0.0..=1.0)
            .context("invalid therapeutic recovery threshold")?;
        check_num(self.max_ticks, 1..=100_000).context("invalid maximum number of ticks")?;
        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_pair<R>(min: f64, max: f64, range: R) -> Result<()>
where
    R: RangeBounds<f64> + Debug + Clone,
{
    check_num(min, range.clone()).context("invalid lower bound")?;
    check_num(max, range).context("invalid upper bound")?;
    if min > max {
        bail!("lower bound {min} must not exceed upper bound {max}");
    }
    Ok(())
}
