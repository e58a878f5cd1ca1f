//! charging: an electric car whose charging stop gets interrupted.
//!
//! ```text
//! charging [CONFIG.json]
//! ```
//!
//! By default the car charges for 5 time units and drives for 2; the driver
//! interrupts the first charge at t = 3.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use qs_model::{ChargingConfig, run_charging};

#[derive(Debug, Parser)]
#[command(name = "charging", about = "An electric car whose charging stop gets interrupted.")]
struct Opts {
    /// JSON `ChargingConfig`.  The default scenario runs without one.
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init() {
        eprintln!("failed to init logger: {e}");
    }

    let config = match &opts.config {
        Some(path) => ChargingConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ChargingConfig::default(),
    };
    tracing::info!(?config, "starting");

    let log = run_charging(&config)?;
    println!();
    for (time, action) in &log {
        println!("{:>6.2}  {action}", time.as_f64());
    }
    Ok(())
}
