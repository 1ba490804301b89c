use crate::analysis::Analyzer;
use crate::config::Config;
use crate::model::{Action, Event, Severity};
use crate::session::{Progress, Session};
use anyhow::{Context, Result, bail};
use glob::glob;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Simulation directory.
///
/// Holds `config.toml` and one `run-NNNN` directory per run, each with the
/// checkpoint of its session and, once analyzed, its results.
pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    /// Create a new run and return its index.
    pub fn create_run(&self, seed: Option<u64>) -> Result<usize> {
        let seed = seed.unwrap_or_else(draw_seed);

        let run_idx = self.count_run_dirs().context("failed to count run dirs")?;
        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        let session = Session::new(self.cfg.clone(), seed);
        log_events(&session.state().events);
        self.save_session(run_idx, &session)?;

        Ok(run_idx)
    }

    /// Apply an action to a run and simulate the following day.
    pub fn act(&self, run_idx: usize, action: Action) -> Result<()> {
        let mut session = self.load_session(run_idx)?;
        let progress = session
            .act(action)
            .with_context(|| format!("failed to apply {action:?}"))?;
        report(&session, &progress);
        self.save_session(run_idx, &session)
    }

    /// Advance a run by up to `days` days.
    pub fn advance(&self, run_idx: usize, days: u64) -> Result<()> {
        let mut session = self.load_session(run_idx)?;
        let progress = session
            .advance(days)
            .with_context(|| format!("failed to advance {days} days"))?;
        report(&session, &progress);
        self.save_session(run_idx, &session)
    }

    /// Replace a run with a fresh one, keeping its virulence unless a new one is given.
    pub fn restart(
        &self,
        run_idx: usize,
        seed: Option<u64>,
        virulence: Option<u8>,
    ) -> Result<()> {
        let mut session = self.load_session(run_idx)?;
        let seed = seed.unwrap_or_else(draw_seed);
        let virulence = virulence.unwrap_or(session.cfg().pathogen.virulence);
        session
            .restart(seed, virulence)
            .context("failed to restart run")?;
        log_events(&session.state().events);
        self.save_session(run_idx, &session)
    }

    pub fn analyze_sim(&self) -> Result<()> {
        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;
        for run_idx in 0..n_runs {
            let session = self.load_session(run_idx)?;

            let mut analyzer = Analyzer::new();
            analyzer
                .add_state(session.state())
                .context("failed to add state")?;

            let results_file = self.results_file(run_idx);
            analyzer
                .save_results(&results_file)
                .context("failed to save results")?;
            log::info!("saved {results_file:?}");
        }

        Ok(())
    }

    pub fn clean_sim(&self) -> Result<()> {
        for run_dir in self.run_dirs().context("failed to list run dirs")? {
            fs::remove_dir_all(&run_dir)
                .with_context(|| format!("failed to remove {run_dir:?}"))?;
            log::info!("removed {run_dir:?}");
        }
        Ok(())
    }

    fn load_session(&self, run_idx: usize) -> Result<Session> {
        let checkpoint_file = self.checkpoint_file(run_idx);
        let session = Session::load_checkpoint(&checkpoint_file)
            .with_context(|| format!("failed to load {checkpoint_file:?}"))?;
        // Virulence is chosen per run.
        let mut cfg = self.cfg.clone();
        cfg.pathogen.virulence = session.cfg().pathogen.virulence;
        if session.cfg() != &cfg {
            bail!("checkpoint config differs from the current config");
        }
        log::info!("loaded {checkpoint_file:?}");
        Ok(session)
    }

    fn save_session(&self, run_idx: usize, session: &Session) -> Result<()> {
        let checkpoint_file = self.checkpoint_file(run_idx);
        session
            .save_checkpoint(&checkpoint_file)
            .context("failed to save checkpoint")?;
        log::info!("saved {checkpoint_file:?}");
        Ok(())
    }

    fn run_dirs(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let run_dirs = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .collect();
        Ok(run_dirs)
    }

    fn count_run_dirs(&self) -> Result<usize> {
        Ok(self.run_dirs()?.len())
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }

    fn checkpoint_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("checkpoint.msgpack")
    }

    fn results_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("results.json")
    }
}

fn draw_seed() -> u64 {
    let seed = rand::random();
    log::info!("drew seed {seed}");
    seed
}

fn report(session: &Session, progress: &Progress) {
    log_events(&progress.new_events);
    let state = session.state();
    log::info!(
        "advanced {} days to tick {}: phase {}, health {:.1}",
        progress.days,
        state.tick,
        state.phase,
        state.health_score
    );
    if let Some(outcome) = state.outcome {
        log::info!("run ended with outcome {outcome}");
    }
}

fn log_events(events: &[Event]) {
    for event in events {
        match event.severity {
            Severity::Info | Severity::Success => {
                log::info!("day {}: {}", event.tick, event.message)
            }
            Severity::Warning => log::warn!("day {}: {}", event.tick, event.message),
            Severity::Critical => log::error!("day {}: {}", event.tick, event.message),
        }
    }
}
