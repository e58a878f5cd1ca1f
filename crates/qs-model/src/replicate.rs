//! Single runs and independent replications.
//!
//! Each run owns its own kernel, so replications share nothing.  With the
//! `parallel` feature they are spread across Rayon's thread pool; results
//! come back in seed order either way.

use serde::Serialize;

use qs_kernel::Simulation;

use crate::{BankBuilder, BankConfig, BankReport, ModelResult, NoopObserver, PostBuilder, PostReport};

/// Build, open and run a bank for its configured duration.
pub fn run_bank(builder: BankBuilder) -> ModelResult<BankReport> {
    let mut simulation = Simulation::from_config(&builder.config().sim);
    let end = builder.config().sim.end_time();
    let bank = builder.build(&simulation.handle())?;
    bank.open();
    let outcome = simulation.run_until(end)?;
    tracing::debug!(?outcome, stats = ?simulation.stats(), "bank run finished");
    Ok(bank.report())
}

/// Build, open and run a post office for its configured duration.
pub fn run_post(builder: PostBuilder) -> ModelResult<PostReport> {
    let mut simulation = Simulation::from_config(&builder.config().sim);
    let end = builder.config().sim.end_time();
    let office = builder.build(&simulation.handle())?;
    office.open();
    let outcome = simulation.run_until(end)?;
    tracing::debug!(?outcome, stats = ?simulation.stats(), "post office run finished");
    Ok(office.report())
}

/// One bank run per seed, silent, each with a fresh `SimRng`.
pub fn replicate(config: &BankConfig, seeds: &[u64]) -> ModelResult<Vec<BankReport>> {
    let run = |seed: u64| {
        let mut config = config.clone();
        config.sim.seed = seed;
        run_bank(BankBuilder::new(config).observer(NoopObserver))
    };

    #[cfg(not(feature = "parallel"))]
    {
        seeds.iter().map(|&seed| run(seed)).collect()
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        seeds.par_iter().map(|&seed| run(seed)).collect()
    }
}

/// Averages across replications.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReplicationSummary {
    pub runs:                   usize,
    pub mean_customers:         f64,
    pub mean_satisfied_percent: f64,
    pub mean_waiting_time:      f64,
    pub mean_total_time:        f64,
}

impl ReplicationSummary {
    pub fn new(reports: &[BankReport]) -> Self {
        let runs = reports.len();
        let avg = |f: fn(&BankReport) -> f64| {
            if runs == 0 { 0.0 } else { reports.iter().map(f).sum::<f64>() / runs as f64 }
        };
        Self {
            runs,
            mean_customers: avg(|r| r.total as f64),
            mean_satisfied_percent: avg(|r| r.satisfied_percent),
            mean_waiting_time: avg(|r| r.average_waiting_time),
            mean_total_time: avg(|r| r.average_total_time),
        }
    }
}
