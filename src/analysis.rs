use crate::model::{HistoryEntry, Outcome, Phase, SimulationState};
use crate::stats::Accumulator;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufWriter, path::Path};

/// Score of a finished run.
///
/// Only a durable cure scores. Recurrences, antibiotic courses and elapsed
/// days each cost points.
pub fn score(state: &SimulationState) -> u32 {
    if state.outcome != Some(Outcome::DurableCure) {
        return 0;
    }
    let penalty = 20 * u64::from(state.recurrence_count)
        + 10 * u64::from(state.antibiotic.courses_given)
        + state.tick / 10;
    100u64.saturating_sub(penalty) as u32
}

pub trait Obs {
    fn update(&mut self, entry: &HistoryEntry) -> Result<()>;
    fn report(&self) -> serde_json::Value;
}

/// Mean and standard deviation of one headline metric.
pub struct Average {
    name: &'static str,
    metric: fn(&HistoryEntry) -> f64,
    acc: Accumulator,
}

impl Average {
    pub fn new(name: &'static str, metric: fn(&HistoryEntry) -> f64) -> Self {
        Self {
            name,
            metric,
            acc: Accumulator::new(),
        }
    }
}

impl Obs for Average {
    fn update(&mut self, entry: &HistoryEntry) -> Result<()> {
        self.acc.add((self.metric)(entry));
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ self.name: self.acc.report() })
    }
}

/// Largest value of one headline metric and the tick it occurred at.
pub struct Peak {
    name: &'static str,
    metric: fn(&HistoryEntry) -> f64,
    peak: Option<(f64, u64)>,
}

impl Peak {
    pub fn new(name: &'static str, metric: fn(&HistoryEntry) -> f64) -> Self {
        Self {
            name,
            metric,
            peak: None,
        }
    }
}

impl Obs for Peak {
    fn update(&mut self, entry: &HistoryEntry) -> Result<()> {
        let val = (self.metric)(entry);
        if self.peak.is_none_or(|(max, _)| val > max) {
            self.peak = Some((val, entry.tick));
        }
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        let (value, tick) = match self.peak {
            Some((value, tick)) => (Some(value), Some(tick)),
            None => (None, None),
        };
        serde_json::json!({ self.name: { "value": value, "tick": tick } })
    }
}

/// Final status of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: u64,
    pub virulence: u8,
    pub tick: u64,
    pub phase: Phase,
    pub outcome: Option<Outcome>,
    pub courses_given: u32,
    pub recurrence_count: u32,
    pub therapeutic_applied: bool,
    pub score: u32,
}

impl RunSummary {
    pub fn new(state: &SimulationState) -> Self {
        Self {
            seed: state.seed,
            virulence: state.strain.virulence,
            tick: state.tick,
            phase: state.phase,
            outcome: state.outcome,
            courses_given: state.antibiotic.courses_given,
            recurrence_count: state.recurrence_count,
            therapeutic_applied: state.therapeutic_applied,
            score: score(state),
        }
    }
}

pub struct Analyzer {
    summary: Option<RunSummary>,
    obs_ptr_vec: Vec<Box<dyn Obs>>,
}

impl Analyzer {
    pub fn new() -> Self {
        let obs_ptr_vec: Vec<Box<dyn Obs>> = vec![
            Box::new(Average::new("health_score", |entry| entry.health_score)),
            Box::new(Average::new("commensal_abundance", |entry| {
                entry.total_commensal_abundance
            })),
            Box::new(Average::new("diversity_index", |entry| entry.diversity_index)),
            Box::new(Peak::new("pathogen_peak", |entry| entry.pathogen_abundance)),
            Box::new(Peak::new("toxin_peak", |entry| entry.toxin_level)),
        ];
        Self {
            summary: None,
            obs_ptr_vec,
        }
    }

    /// Feed the whole history of a run to every observable.
    pub fn add_state(&mut self, state: &SimulationState) -> Result<()> {
        for entry in &state.history {
            for obs in &mut self.obs_ptr_vec {
                obs.update(entry).context("failed to update observable")?;
            }
        }
        self.summary = Some(RunSummary::new(state));
        Ok(())
    }

    pub fn results(&self) -> serde_json::Value {
        let reports: Vec<_> = self.obs_ptr_vec.iter().map(|obs| obs.report()).collect();
        serde_json::json!({ "summary": self.summary, "observables": reports })
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self.results())
            .context("failed to serialize results")?;
        Ok(())
    }
}
