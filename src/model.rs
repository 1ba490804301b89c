//! Simulation data types.
//!
//! Every update in the simulation produces a new [`SimulationState`] value;
//! nothing here is shared between snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Commensal bacterial population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    /// Name, unique within a run.
    pub name: String,
    /// Fraction of the shared carrying capacity.
    pub abundance: f64,
    /// Antibiotic sensitivity in `[0.1, 1.0]`.
    pub antibiotic_sensitivity: f64,
    /// Intrinsic growth rate.
    pub growth_rate: f64,
    /// Competitive strength in `[0, 1]`.
    pub competitive_strength: f64,
}

/// Pathogen life-cycle state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathogenState {
    /// Dormant, antibiotic-immune reservoir.
    pub spores: f64,
    /// Toxin-producing, growth-competing form.
    pub vegetative: f64,
    /// Accumulated toxin in `[0, 1]`.
    pub toxin_level: f64,
    /// Germination rate applied on the last update.
    pub germination_rate: f64,
}

impl PathogenState {
    /// Total pathogen biomass (spores plus vegetative cells).
    pub fn total(&self) -> f64 {
        self.spores + self.vegetative
    }
}

/// Pathogen strain parameters derived from virulence at simulation start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Strain {
    pub virulence: u8,
    pub growth_rate: f64,
    pub toxin_rate: f64,
}

/// Antibiotic treatment status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntibioticCourse {
    pub active: bool,
    pub ticks_remaining: u32,
    pub courses_given: u32,
}

/// Narrative phase of the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    HealthyBaseline,
    AntibioticDisruption,
    CdiffBloom,
    AntibioticTrap,
    MicrobiomeTherapeutic,
    Resolved,
    ChronicInfection,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::HealthyBaseline => "healthy_baseline",
            Self::AntibioticDisruption => "antibiotic_disruption",
            Self::CdiffBloom => "cdiff_bloom",
            Self::AntibioticTrap => "antibiotic_trap",
            Self::MicrobiomeTherapeutic => "microbiome_therapeutic",
            Self::Resolved => "resolved",
            Self::ChronicInfection => "chronic_infection",
        };
        f.write_str(name)
    }
}

/// Terminal result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    DurableCure,
    ChronicInfection,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DurableCure => f.write_str("durable_cure"),
            Self::ChronicInfection => f.write_str("chronic_infection"),
        }
    }
}

/// Player intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    AdministerAntibiotics,
    AdministerTherapeutic,
    WaitAndMonitor,
}

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
    Success,
}

/// Entry of the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub tick: u64,
    pub severity: Severity,
    pub message: String,
}

/// Headline metrics recorded once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub tick: u64,
    pub total_commensal_abundance: f64,
    pub pathogen_abundance: f64,
    pub toxin_level: f64,
    pub diversity_index: f64,
    pub health_score: f64,
}

/// State of the simulation at a given tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    /// Days elapsed.
    pub tick: u64,

    /// Phase as of the last update.
    pub phase: Phase,

    /// Commensal species.
    pub species: Vec<Species>,
    /// Pathogen populations and toxin.
    pub pathogen: PathogenState,
    /// Pathogen strain of this run.
    pub strain: Strain,

    /// Sum of commensal abundances as of the last update.
    pub total_commensal_abundance: f64,
    /// Shannon diversity of the commensals as of the last update.
    pub diversity_index: f64,
    /// Patient health in `[0, 100]`.
    pub health_score: f64,

    pub antibiotic: AntibioticCourse,
    pub therapeutic_applied: bool,
    pub recurrence_count: u32,

    /// Append-only, one entry per tick plus the initial entry.
    pub history: Vec<HistoryEntry>,
    /// Append-only event log.
    pub events: Vec<Event>,

    /// Base seed of the run.
    pub seed: u64,
    /// Terminal result; once set it never changes.
    pub outcome: Option<Outcome>,
}

impl SimulationState {
    /// Sum of the current commensal abundances.
    pub fn commensal_total(&self) -> f64 {
        self.species.iter().map(|sp| sp.abundance).sum()
    }

    /// Whether the run has reached an outcome.
    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    /// Snapshot of the headline metrics.
    pub fn history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            tick: self.tick,
            total_commensal_abundance: self.total_commensal_abundance,
            pathogen_abundance: self.pathogen.total(),
            toxin_level: self.pathogen.toxin_level,
            diversity_index: self.diversity_index,
            health_score: self.health_score,
        }
    }

    /// Append an event stamped with the current tick.
    pub fn push_event<S: Into<String>>(&mut self, severity: Severity, message: S) {
        self.events.push(Event {
            tick: self.tick,
            severity,
            message: message.into(),
        });
    }
}
