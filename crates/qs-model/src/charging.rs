//! Electric car with an interruptible charging stop.
//!
//! The car alternates between charging and driving.  Charging runs as its
//! own sub-process that the car waits on; a driver process may interrupt the
//! car while it waits, in which case the car gives up on the charge and
//! drives off at once.  The abandoned charger still runs to completion in
//! the background.
//!
//! The car only handles interruption while charging.  An interrupt that
//! lands during a trip fails the car process.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use qs_core::SimTime;
use qs_kernel::{Fault, Outcome, Process, ProcessState, Sim, Simulation};

use crate::{ChargingConfig, ModelResult};

#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub enum CarAction {
    Charging,
    Interrupted,
    Driving,
}

impl fmt::Display for CarAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CarAction::Charging => "start parking and charging",
            CarAction::Interrupted => "was interrupted, hope the battery is full enough",
            CarAction::Driving => "start driving",
        };
        f.write_str(s)
    }
}

/// Timestamped car actions, in order.
pub type CarLog = Rc<RefCell<Vec<(SimTime, CarAction)>>>;

/// Spawn the car process.  Every action it takes is appended to `log`.
pub fn spawn_car(sim: &Sim, config: &ChargingConfig, log: CarLog) -> Process<()> {
    sim.process(car(sim.clone(), config.charge_duration, config.trip_duration, log))
}

/// Spawn a driver that interrupts `car` after `delay`.
pub fn spawn_driver(sim: &Sim, car: Process<()>, delay: f64) -> Process<()> {
    let clock = sim.clone();
    sim.process(async move {
        clock.timeout(delay)?.wait().await?;
        car.interrupt("driver wants to leave")?;
        Ok(())
    })
}

/// Run the charging scenario for `config.sim.duration` and return the car's
/// action log.
pub fn run_charging(config: &ChargingConfig) -> ModelResult<Vec<(SimTime, CarAction)>> {
    config.validate()?;
    let mut simulation = Simulation::from_config(&config.sim);
    let sim = simulation.handle();

    let log = CarLog::default();
    let car = spawn_car(&sim, config, Rc::clone(&log));
    if let Some(delay) = config.interrupt_after {
        spawn_driver(&sim, car.clone(), delay);
    }
    simulation.run_until(config.sim.end_time())?;

    if car.state() == ProcessState::Failed {
        tracing::warn!(time = %simulation.now(), "car process failed");
    }
    let actions = log.borrow().clone();
    Ok(actions)
}

async fn car(sim: Sim, charge_duration: f64, trip_duration: f64, log: CarLog) -> Outcome<()> {
    let record = |action: CarAction| {
        tracing::info!(time = %sim.now(), "{action}");
        log.borrow_mut().push((sim.now(), action));
    };
    loop {
        record(CarAction::Charging);
        let charger = sim.process(charge(sim.clone(), charge_duration));
        match charger.wait().await {
            Ok(()) => {}
            Err(Fault::Interrupt(_)) => record(CarAction::Interrupted),
            Err(fault) => return Err(fault),
        }

        record(CarAction::Driving);
        sim.timeout(trip_duration)?.wait().await?;
    }
}

async fn charge(sim: Sim, duration: f64) -> Outcome<()> {
    sim.timeout(duration)?.wait().await
}
