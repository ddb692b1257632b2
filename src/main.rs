//! cropcraft - headless crop simulation
//!
//! Plants a field, runs the tick loop under a weather and day cycle, streams
//! chunks through on-disk saves and prints a JSON summary of the harvest.

mod config;
mod headless;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use config::SimConfig;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless crop simulation for cropcraft", long_about = None)]
struct Args {
    /// TOML config file (default: config/cropcraft.toml, missing file uses defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Species preset to simulate (ignored when the config has a [crop] table)
    #[arg(long)]
    species: Option<String>,

    /// Number of ticks to run
    #[arg(long)]
    ticks: Option<u64>,

    /// Simulated seconds per tick
    #[arg(long)]
    tick_seconds: Option<f64>,

    /// World seed for weather, crop ids and harvest rolls
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for chunk saves
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Delete existing saves before starting
    #[arg(long)]
    reset: bool,

    /// Enchantment level used for the final harvest
    #[arg(long)]
    fortune: Option<i32>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    fn apply(&self, cfg: &mut SimConfig) {
        if let Some(species) = &self.species {
            cfg.species = species.clone();
        }
        if let Some(ticks) = self.ticks {
            cfg.ticks = ticks;
        }
        if let Some(seconds) = self.tick_seconds {
            cfg.tick_seconds = seconds.max(0.0);
        }
        if let Some(seed) = self.seed {
            cfg.world_seed = seed;
        }
        if let Some(dir) = &self.save_dir {
            cfg.save_dir = dir.clone();
        }
        if let Some(level) = self.fortune {
            cfg.fortune_level = level;
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut cfg = match &args.config {
        Some(path) => SimConfig::load_from_path(path)?,
        None => SimConfig::load(),
    };
    args.apply(&mut cfg);

    if args.print_config {
        print!("{}", cfg.to_toml()?);
        return Ok(());
    }
    if args.reset {
        headless::reset_save_dir(&cfg.save_dir)?;
    }

    info!("Starting cropcraft v{}", env!("CARGO_PKG_VERSION"));
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let summary = runtime.block_on(headless::run(&cfg))?;

    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("Failed to format summary")?
    );
    Ok(())
}
