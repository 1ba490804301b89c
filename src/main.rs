use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gutflora::manager::Manager;
use gutflora::model::Action;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[arg(long)]
    sim_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Create {
        #[arg(long)]
        seed: Option<u64>,
    },

    Act {
        #[arg(long)]
        run_idx: usize,

        #[arg(value_enum)]
        action: Action,
    },

    Advance {
        #[arg(long)]
        run_idx: usize,

        #[arg(long, default_value_t = 1)]
        days: u64,
    },

    Restart {
        #[arg(long)]
        run_idx: usize,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(long)]
        virulence: Option<u8>,
    },

    Analyze,

    Clean,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(args.sim_dir).context("failed to construct mgr")?;

    match args.command {
        Command::Create { seed } => {
            let run_idx = mgr.create_run(seed)?;
            log::info!("created run {run_idx}");
        }
        Command::Act { run_idx, action } => mgr.act(run_idx, action)?,
        Command::Advance { run_idx, days } => mgr.advance(run_idx, days)?,
        Command::Restart {
            run_idx,
            seed,
            virulence,
        } => mgr.restart(run_idx, seed, virulence)?,
        Command::Analyze => mgr.analyze_sim()?,
        Command::Clean => mgr.clean_sim()?,
    }

    Ok(())
}
