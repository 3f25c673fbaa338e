//! fleetcharge: run an EV fleet charging scenario and export its time series.
//!
//! ```text
//! fleetcharge --scenario scenarios/demo/scenario.toml --out output
//! fleetcharge --scenario scenarios/demo/scenario.toml --repeats 8 --threads 4 --seed 42
//! ```
//!
//! With `--repeats N > 1` every repeat gets its own seed, derived from the
//! base seed, and writes to `<out>/run_<i>/`.  Log verbosity follows
//! `RUST_LOG` (default `info`, `warn` with `--quiet`).

mod scenario;


use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use fc_core::SimRng;
use fc_infra::GridSeries;
use fc_output::{CsvWriter, OutputWriter, export_run};
use fc_sim::{NoopObserver, Sim, SimError, run_batch};

use scenario::Scenario;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "fleetcharge", about = "EV fleet charging simulation")]
struct Cli {
    /// Scenario TOML file
    #[arg(long)]
    scenario: PathBuf,

    /// Output directory
    #[arg(long, default_value = "output")]
    out: PathBuf,

    /// Output backend
    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Independent repeats of the scenario
    #[arg(long, default_value_t = 1)]
    repeats: usize,

    /// Worker threads for repeats (default: all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Base seed; overrides `rng_seed` from the scenario
    #[arg(long)]
    seed: Option<u64>,

    /// Let drives start below minimum SOC and report them as warnings
    #[arg(long)]
    ignore_warnings: bool,

    /// Only log warnings and errors
    #[arg(long)]
    quiet: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Csv,
    Sqlite,
    Parquet,
}

// ── Logging ───────────────────────────────────────────────────────────────────

fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_target(false)
        .init();
}

// ── Runs ──────────────────────────────────────────────────────────────────────

struct Outcome {
    index:  usize,
    seed:   Option<u64>,
    sim:    Option<Sim<GridSeries>>,
    result: Result<(), SimError>,
}

fn repeat_seeds(base: Option<u64>, repeats: usize) -> Vec<Option<u64>> {
    if repeats <= 1 {
        return vec![base];
    }
    SimRng::repeat_seeds(base.unwrap_or_default(), repeats)
        .into_iter()
        .map(Some)
        .collect()
}

fn run_one(scenario: &Scenario, index: usize, seed: Option<u64>) -> Outcome {
    let mut sim = match scenario.build_sim(seed) {
        Ok(sim) => sim,
        Err(e) => return Outcome { index, seed, sim: None, result: Err(e) },
    };
    let result = sim.run(&mut NoopObserver);
    Outcome { index, seed, sim: Some(sim), result }
}

fn open_writer(format: Format, dir: &Path) -> Result<Box<dyn OutputWriter>> {
    Ok(match format {
        Format::Csv => Box::new(CsvWriter::new(dir)?),
        #[cfg(feature = "sqlite")]
        Format::Sqlite => Box::new(fc_output::SqliteWriter::new(dir)?),
        #[cfg(feature = "parquet")]
        Format::Parquet => Box::new(fc_output::ParquetWriter::new(dir)?),
        #[allow(unreachable_patterns)]
        other => bail!("output format {other:?} needs the matching cargo feature"),
    })
}

fn run_dir(out: &Path, index: usize, repeats: usize) -> PathBuf {
    if repeats <= 1 { out.to_path_buf() } else { out.join(format!("run_{index:03}")) }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    if cli.repeats == 0 {
        bail!("--repeats must be at least 1");
    }

    let mut scenario = Scenario::load(&cli.scenario)?;
    if cli.seed.is_some() {
        scenario.config.seed = cli.seed;
    }
    if cli.ignore_warnings {
        scenario.config.ignore_warnings = true;
    }
    let threads = cli.threads.or(scenario.config.num_threads);
    let seeds = repeat_seeds(scenario.config.seed, cli.repeats);

    let t0 = Instant::now();
    let outcomes = run_batch(seeds, threads, |i, seed| run_one(&scenario, i, seed))?;
    tracing::info!(runs = outcomes.len(), elapsed = ?t0.elapsed(), "simulation finished");

    let mut failed = 0usize;
    for outcome in outcomes {
        let dir = run_dir(&cli.out, outcome.index, cli.repeats);
        if let Err(e) = &outcome.result {
            failed += 1;
            tracing::error!(run = outcome.index, phase = %e.phase(), "{e}");
        }
        let Some(sim) = outcome.sim else {
            continue;
        };

        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        let mut writer = open_writer(cli.format, &dir)?;
        export_run(writer.as_mut(), &sim.fleet, &sim.infra, &sim.aggregator)
            .with_context(|| format!("writing output to {}", dir.display()))?;

        match outcome.seed {
            Some(seed) => println!("── run {} (seed {seed}) ──", outcome.index),
            None => println!("── run {} ──", outcome.index),
        }
        print!("{}", sim.report());
    }

    if failed > 0 {
        bail!("{failed} of {} runs failed", cli.repeats);
    }
    Ok(())
}
