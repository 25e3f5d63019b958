use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use protobiont_core::{init_logging, SimConfig};
use protobiont_lib::experiment::{self, RunOptions};

/// Artificial chemistry of self-replicating particle molecules.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Number of simulation cycles to run
    #[arg(long)]
    cycles: u64,

    /// Replicator molecules to seed
    #[arg(long, default_value_t = 1)]
    replicators: usize,

    /// Free catalyst particles to seed
    #[arg(long, default_value_t = 1)]
    catalysts: usize,

    /// Free component particles to seed
    #[arg(long, default_value_t = 32)]
    components: usize,

    /// Resume a saved run instead of seeding a new one
    #[arg(long)]
    input: Option<PathBuf>,

    /// Save the finished run here
    #[arg(long)]
    output: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Random seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Ticks between molecule census log lines (0 disables)
    #[arg(long, default_value_t = 100)]
    log_every: u64,
}

fn load_config(path: &Path) -> Result<SimConfig> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        SimConfig::from_toml(&content)
            .with_context(|| format!("parsing config file {}", path.display()))
    } else {
        Ok(SimConfig::default())
    }
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    if args.input.is_some() {
        // The saved file carries the whole population; fresh quantities
        // would be silently ignored, so reject the combination.
        let defaults = (1, 1, 32);
        if (args.replicators, args.catalysts, args.components) != defaults {
            bail!("population options cannot be combined with --input");
        }
    }

    let options = RunOptions {
        cycles: args.cycles,
        replicators: args.replicators,
        catalysts: args.catalysts,
        components: args.components,
        input: args.input,
        output: args.output,
        log_every: args.log_every,
    };
    let summary = experiment::run(config, &options)?;

    println!(
        "{} cycles: {} replicators, {} strands, {} particles",
        summary.ticks,
        summary.molecules.replicators,
        summary.molecules.strands,
        summary.census.total
    );
    Ok(())
}
