use crate::antibiotic::apply_antibiotic_tick;
use crate::config::Config;
use crate::health::{shannon_diversity, update_health_score};
use crate::model::{Action, AntibioticCourse, Outcome, Phase, Severity, SimulationState, Strain};
use crate::pathogen::update_pathogen;
use crate::profile::{generate_initial_pathogen, generate_initial_profile};
use crate::regrowth::{apply_natural_regrowth_tick, apply_therapeutic_intervention};
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};

/// Simulation engine.
///
/// Holds the configuration and turns one state snapshot into the next.
/// Never keeps a state of its own: every method takes a snapshot and, where
/// it changes anything, returns a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Engine {
    cfg: Config,
}

impl Engine {
    /// Create a new `Engine` with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    /// Configuration in use.
    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    /// Create the state of a fresh run.
    ///
    /// `seed` is recorded on the state as the base seed of every later tick.
    pub fn create_initial_state(&self, rng: &mut RandomSource, seed: u64) -> SimulationState {
        let species = generate_initial_profile(&self.cfg.ecosystem, rng);
        let pathogen = generate_initial_pathogen(&self.cfg.pathogen, rng);
        let strain = Strain::from_virulence(self.cfg.pathogen.virulence, &self.cfg.pathogen);

        let mut state = SimulationState {
            tick: 0,
            phase: Phase::HealthyBaseline,
            total_commensal_abundance: 0.0,
            diversity_index: shannon_diversity(&species),
            species,
            pathogen,
            strain,
            health_score: self.cfg.patient.baseline_health,
            antibiotic: AntibioticCourse::default(),
            therapeutic_applied: false,
            recurrence_count: 0,
            history: Vec::new(),
            events: Vec::new(),
            seed,
            outcome: None,
        };
        state.total_commensal_abundance = state.commensal_total();
        state.phase = self.determine_phase(&state);
        state.history.push(state.history_entry());
        state.push_event(
            Severity::Info,
            format!(
                "Simulation started: {} commensal species, C. difficile virulence {}.",
                state.species.len(),
                state.strain.virulence
            ),
        );

        log::debug!("created initial state (seed {seed})");

        state
    }

    /// Advance the simulation by exactly one day.
    pub fn tick(&self, state: &SimulationState, rng: &mut RandomSource) -> SimulationState {
        let prev_vegetative = state.pathogen.vegetative;

        // Antibiotics and natural regrowth are mutually exclusive.
        let mut next = if state.antibiotic.active {
            apply_antibiotic_tick(state, &self.cfg.treatment, rng)
        } else {
            apply_natural_regrowth_tick(state, &self.cfg, rng)
        };
        next.tick += 1;

        if next.antibiotic.active {
            next.antibiotic.ticks_remaining = next.antibiotic.ticks_remaining.saturating_sub(1);
            if next.antibiotic.ticks_remaining == 0 {
                next.antibiotic.active = false;
                next.push_event(Severity::Info, "Antibiotic course completed.");
            }
        }

        next.total_commensal_abundance = next.commensal_total();
        next.diversity_index = shannon_diversity(&next.species);

        next.pathogen = update_pathogen(&next, &self.cfg, rng);
        next.health_score =
            update_health_score(next.health_score, next.pathogen.toxin_level, &self.cfg.patient);

        let bloom = self.cfg.pathogen.bloom_threshold;
        if prev_vegetative < bloom && next.pathogen.vegetative >= bloom {
            if next.antibiotic.courses_given > 0 {
                next.recurrence_count += 1;
                let message = format!(
                    "C. difficile recurrence #{}: vegetative cells are blooming again.",
                    next.recurrence_count
                );
                next.push_event(Severity::Critical, message);
            } else {
                next.push_event(Severity::Warning, "C. difficile bloom detected.");
            }
        }

        next.phase = self.determine_phase(&next);
        next.history.push(next.history_entry());

        if next.outcome.is_none() {
            next.outcome = self.check_outcome(&next);
            match next.outcome {
                Some(Outcome::DurableCure) => {
                    next.push_event(
                        Severity::Success,
                        "Durable cure: the restored microbiome keeps C. difficile in check.",
                    );
                    log::info!("durable cure reached at tick {}", next.tick);
                }
                Some(Outcome::ChronicInfection) => {
                    next.push_event(
                        Severity::Critical,
                        "Chronic infection: C. difficile was never brought under control.",
                    );
                    log::info!("chronic infection declared at tick {}", next.tick);
                }
                None => {}
            }
            next.phase = self.determine_phase(&next);
        }

        log::debug!(
            "tick {:03}: phase {}, commensal {:.4}, vegetative {:.4}, spores {:.4}, health {:.1}",
            next.tick,
            next.phase,
            next.total_commensal_abundance,
            next.pathogen.vegetative,
            next.pathogen.spores,
            next.health_score
        );

        next
    }

    /// Apply one player action.
    ///
    /// Does not advance time; the caller decides whether a tick follows.
    pub fn apply_action(
        &self,
        state: &SimulationState,
        action: Action,
        rng: &mut RandomSource,
    ) -> SimulationState {
        let mut next = match action {
            Action::AdministerAntibiotics => {
                let mut next = state.clone();
                if next.antibiotic.active {
                    log::warn!("antibiotic course already in progress");
                    next.push_event(
                        Severity::Info,
                        "Antibiotic course already in progress; no new course started.",
                    );
                } else {
                    next.antibiotic.active = true;
                    next.antibiotic.ticks_remaining = self.cfg.treatment.course_duration;
                    next.antibiotic.courses_given += 1;
                    let message = format!(
                        "Antibiotic course #{} started ({} days).",
                        next.antibiotic.courses_given, self.cfg.treatment.course_duration
                    );
                    log::info!("{message}");
                    next.push_event(Severity::Warning, message);
                }
                next
            }
            Action::AdministerTherapeutic => {
                log::info!("microbiome therapeutic administered");
                apply_therapeutic_intervention(state, &self.cfg, rng)
            }
            Action::WaitAndMonitor => {
                let mut next = state.clone();
                next.push_event(Severity::Info, "Monitoring the patient.");
                next
            }
        };

        next.total_commensal_abundance = next.commensal_total();
        next.diversity_index = shannon_diversity(&next.species);
        next.phase = self.determine_phase(&next);

        next
    }

    /// Phase implied by the current state.
    pub fn determine_phase(&self, state: &SimulationState) -> Phase {
        match state.outcome {
            Some(Outcome::DurableCure) => return Phase::Resolved,
            Some(Outcome::ChronicInfection) => return Phase::ChronicInfection,
            None => {}
        }

        let course = &state.antibiotic;
        if state.therapeutic_applied
            && state.total_commensal_abundance > self.cfg.outcome.therapeutic_recovery_threshold
        {
            Phase::MicrobiomeTherapeutic
        } else if course.active && course.courses_given > 1 {
            Phase::AntibioticTrap
        } else if state.pathogen.vegetative > self.cfg.pathogen.bloom_threshold {
            Phase::CdiffBloom
        } else if course.active {
            Phase::AntibioticDisruption
        } else {
            Phase::HealthyBaseline
        }
    }

    /// Outcome implied by the current state.
    ///
    /// An outcome already recorded on the state is returned unchanged.
    pub fn check_outcome(&self, state: &SimulationState) -> Option<Outcome> {
        if state.outcome.is_some() {
            return state.outcome;
        }

        let par = &self.cfg.outcome;
        let window = par.durable_cure_ticks;
        let pathogen_cleared = state.history.len() >= window
            && state.history[state.history.len() - window..]
                .iter()
                .all(|entry| entry.pathogen_abundance < par.cure_pathogen_threshold);
        if pathogen_cleared
            && state.total_commensal_abundance > par.cure_commensal_threshold
            && state.antibiotic.courses_given > 0
        {
            return Some(Outcome::DurableCure);
        }

        if state.tick >= par.max_ticks {
            return Some(Outcome::ChronicInfection);
        }

        None
    }
}
