//! post: post office whose windows open and close on an agenda.
//!
//! ```text
//! post [CONFIG.json] [--output DIR]
//! ```
//!
//! The default scenario opens three windows between 08:30 and 13:00 with a
//! client every 30 minutes on average and 1 to 10 minutes of service.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use qs_kernel::Simulation;
use qs_model::{PostBuilder, PostConfig};
use qs_output::{CsvWriter, OutputObserver};

#[derive(Debug, Parser)]
#[command(name = "post", about = "Post office whose windows open and close on an agenda.")]
struct Opts {
    /// JSON scenario file.  The default scenario runs without one.
    config: Option<PathBuf>,

    /// Directory for events.csv, customers.csv and servers.csv.
    #[clap(long)]
    output: Option<PathBuf>,
}

fn init_log() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init() {
        eprintln!("failed to init logger: {e}");
    }
}

fn main() -> Result<()> {
    init_log();
    let opts = Opts::parse();

    let config = match &opts.config {
        Some(path) => PostConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => PostConfig::default(),
    };
    println!("=== post office ===");
    println!(
        "Windows: {}  |  Start: {:.2} h  |  Duration: {:.2} h  |  Seed: {}",
        config.agendas.len(),
        config.sim.start_time,
        config.sim.duration,
        config.sim.seed
    );
    println!();

    let mut simulation = Simulation::from_config(&config.sim);
    let end = config.sim.end_time();

    let output = match &opts.output {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            Some(Rc::new(RefCell::new(OutputObserver::new(CsvWriter::new(dir)?))))
        }
        None => None,
    };
    let builder = PostBuilder::new(config);
    let builder = match &output {
        Some(output) => builder.observer(Rc::clone(output)),
        None => builder,
    };

    let office = builder.build(&simulation.handle())?;
    office.open();
    let outcome = simulation.run_until(end)?;
    tracing::debug!(?outcome, "run finished");

    let report = office.report();
    println!();
    println!("{report}");

    if let Some(output) = &output {
        output.borrow_mut().write_post(&report)?;
    }
    Ok(())
}
