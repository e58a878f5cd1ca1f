//! bank: shift-staffed bank with impatient customers.
//!
//! ```text
//! bank [CONFIG.json] [--agendas SHIFTS.csv] [--output DIR] [--replicate N]
//! ```
//!
//! Without a config file the default scenario runs: two tellers on split
//! shifts from 09:00, a customer every 6 minutes on average, 15 minutes of
//! patience and 10 minutes of service.  `--agendas` replaces the tellers'
//! shifts with a `staff_id,start,end` CSV.  `--output` writes
//! `events.csv`, `customers.csv` and `servers.csv`.  `--replicate N` adds N
//! silent runs with consecutive seeds and prints their averages.
//!
//! Milestones are logged through `tracing`; set `RUST_LOG=warn` to keep only
//! the report.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use qs_agenda::load_agendas_csv;
use qs_kernel::Simulation;
use qs_model::{BankBuilder, BankConfig, ReplicationSummary, replicate};
use qs_output::{CsvWriter, OutputObserver};

#[derive(Debug, Parser)]
#[command(name = "bank", about = "Shift-staffed bank with impatient customers.")]
struct Opts {
    /// JSON scenario file.  The default scenario runs without one.
    config: Option<PathBuf>,

    /// `staff_id,start,end` CSV replacing the tellers' shifts.
    #[clap(long)]
    agendas: Option<PathBuf>,

    /// Directory for events.csv, customers.csv and servers.csv.
    #[clap(long)]
    output: Option<PathBuf>,

    /// Extra silent runs with consecutive seeds.
    #[clap(long, default_value = "0")]
    replicate: usize,
}

fn init_log() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init() {
        eprintln!("failed to init logger: {e}");
    }
}

fn load_config(opts: &Opts) -> Result<BankConfig> {
    let mut config = match &opts.config {
        Some(path) => BankConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => BankConfig::default(),
    };
    if let Some(path) = &opts.agendas {
        config.agendas = load_agendas_csv(path, config.agendas.len())
            .with_context(|| format!("loading {}", path.display()))?;
        config.validate()?;
    }
    Ok(config)
}

fn main() -> Result<()> {
    init_log();
    let opts = Opts::parse();
    let config = load_config(&opts)?;

    println!("=== bank ===");
    println!(
        "Staff: {}  |  Start: {:.2} h  |  Duration: {:.2} h  |  Seed: {}",
        config.agendas.len(),
        config.sim.start_time,
        config.sim.duration,
        config.sim.seed
    );
    println!("{}", serde_json::to_string(&config.agendas)?);
    println!();

    let mut simulation = Simulation::from_config(&config.sim);
    let end = config.sim.end_time();
    let builder = BankBuilder::new(config.clone());

    let output = match &opts.output {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            Some(Rc::new(RefCell::new(OutputObserver::new(CsvWriter::new(dir)?))))
        }
        None => None,
    };
    let builder = match &output {
        Some(output) => builder.observer(Rc::clone(output)),
        None => builder,
    };

    let t0 = Instant::now();
    let bank = builder.build(&simulation.handle())?;
    bank.open();
    simulation.run_until(end)?;
    let elapsed = t0.elapsed();

    let report = bank.report();
    println!();
    println!("{report}");
    println!();
    println!("Wall time: {:.3} ms  |  {:?}", elapsed.as_secs_f64() * 1e3, simulation.stats());

    if let Some(output) = &output {
        output.borrow_mut().write_bank(&bank.customers(), &report)?;
        if let Some(dir) = &opts.output {
            println!("Output written to {}", dir.display());
        }
    }

    if opts.replicate > 0 {
        let seeds: Vec<u64> = (0..opts.replicate as u64).map(|i| config.sim.seed + 1 + i).collect();
        let t0 = Instant::now();
        let reports = replicate(&config, &seeds)?;
        let summary = ReplicationSummary::new(&reports);
        println!();
        println!("Replications: {}  ({:.3} ms)", summary.runs, t0.elapsed().as_secs_f64() * 1e3);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}
