use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "mixscape", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a mix headlessly and print per-layer statistics as JSON.
    Simulate(SimulateArgs),
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Input mix JSON. Asset paths resolve relative to its directory.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Simulated wall time in seconds.
    #[arg(long, default_value_t = 10.0)]
    seconds: f64,

    /// Frame callbacks per second.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Override the mix seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Write a PNG snapshot of the final frame.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mixscape=warn")))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Simulate(args) => cmd_simulate(args),
    }
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let mut mix = mixscape::MixConfig::from_path(&args.in_path)
        .with_context(|| format!("load mix '{}'", args.in_path.display()))?;
    if let Some(seed) = args.seed {
        mix.seed = seed;
    }

    let assets_root = args.in_path.parent().unwrap_or_else(|| Path::new("."));
    let mut session = mixscape::MixSession::open(&mix, assets_root)?;
    let frames = session.run_for(args.seconds, args.fps)?;
    tracing::info!(frames, "simulation finished");

    if let Some(out) = &args.out {
        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        session.snapshot()?.save_png(out)?;
        eprintln!("wrote {}", out.display());
    }

    let report = session.report();
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serialize session report")?
    );
    Ok(())
}
