use crate::config::Config;
use crate::engine::Engine;
use crate::model::{Action, Event, SimulationState};
use crate::rng::RandomSource;
use anyhow::{Context, Result, bail};
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Result of a call that moves a session forward.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// Days actually simulated.
    pub days: u64,
    /// Events appended during the call, oldest first.
    pub new_events: Vec<Event>,
}

/// A single run of the simulation.
///
/// Owns the engine and the current snapshot, and refuses to move a run that
/// has already reached its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    engine: Engine,
    state: SimulationState,
}

impl Session {
    /// Start a fresh run.
    pub fn new(cfg: Config, seed: u64) -> Self {
        let engine = Engine::new(cfg);
        let state = engine.create_initial_state(&mut RandomSource::new(seed), seed);
        Self { engine, state }
    }

    /// Current snapshot.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Configuration of the run.
    pub fn cfg(&self) -> &Config {
        self.engine.cfg()
    }

    /// Replace the run with a fresh one using another seed and virulence.
    pub fn restart(&mut self, seed: u64, virulence: u8) -> Result<()> {
        if !(1..=10).contains(&virulence) {
            bail!("virulence must be in 1..=10 but is {virulence}");
        }
        let mut cfg = self.cfg().clone();
        cfg.pathogen.virulence = virulence;
        *self = Self::new(cfg, seed);
        log::info!("restarted run (seed {seed}, virulence {virulence})");
        Ok(())
    }

    /// Advance up to `days` days, stopping early once an outcome is reached.
    pub fn advance(&mut self, days: u64) -> Result<Progress> {
        self.ensure_active()?;
        let n_events = self.state.events.len();

        let mut advanced = 0;
        while advanced < days && !self.state.is_terminal() {
            self.step();
            advanced += 1;
        }

        Ok(self.progress(advanced, n_events))
    }

    /// Apply an action and then simulate one day.
    pub fn act(&mut self, action: Action) -> Result<Progress> {
        self.ensure_active()?;
        let n_events = self.state.events.len();

        let mut rng = RandomSource::for_action(self.state.seed, self.state.tick);
        self.state = self.engine.apply_action(&self.state, action, &mut rng);
        self.step();

        Ok(self.progress(1, n_events))
    }

    /// Save a checkpoint of the entire session.
    ///
    /// Can be used to resume the run later.
    pub fn save_checkpoint<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, &self).context("failed to serialize session")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    /// Load a previously saved session checkpoint.
    pub fn load_checkpoint<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);
        let session = decode::from_read(&mut reader).context("failed to deserialize session")?;
        Ok(session)
    }

    fn ensure_active(&self) -> Result<()> {
        if let Some(outcome) = self.state.outcome {
            bail!(
                "run already ended at tick {} with outcome {outcome}",
                self.state.tick
            );
        }
        Ok(())
    }

    fn step(&mut self) {
        let mut rng = RandomSource::for_tick(self.state.seed, self.state.tick);
        self.state = self.engine.tick(&self.state, &mut rng);
    }

    fn progress(&self, days: u64, n_events: usize) -> Progress {
        Progress {
            days,
            new_events: self.state.events[n_events..].to_vec(),
        }
    }
}
