//! `qs-kernel`: cooperative discrete-event kernel for the `qs` simulator.
//!
//! # Model
//!
//! ```text
//! Simulation::run_until(deadline):
//!   loop:
//!     pop the earliest pending entry (ties in insertion order)
//!     if it lies after the deadline -> stop, clock := deadline
//!     clock := entry time
//!     Process(event)  -> run the event's waiters in registration order
//!     Resume(process) -> poll the process body until its next await
//! ```
//!
//! Everything runs on one thread.  Processes are `async` blocks; the only
//! things they can await are kernel futures ([`Wait`], [`StoreGet::wait`]),
//! so a process yields exactly where it waits on an event and nowhere else.
//!
//! # What lives here
//!
//! | Module        | Contents                                               |
//! |---------------|--------------------------------------------------------|
//! | [`scheduler`] | `Simulation`, `Sim`, `RunOutcome`, `KernelStats`       |
//! | [`event`]     | `Event`, `Wait`                                        |
//! | [`process`]   | `Process`, `ProcessState`, interruption                |
//! | [`condition`] | `Sim::race`, `Sim::any_of`, `Sim::all_of`              |
//! | [`store`]     | `Store`, `StoreGet`                                    |
//! | [`error`]     | `KernelError`, `Fault`, `Interrupt`, `Outcome`         |
//!
//! # Cargo features
//!
//! | Feature   | Effect                                                   |
//! |-----------|----------------------------------------------------------|
//! | `fx-hash` | Uses `rustc-hash`'s FxHashMap for the process table.     |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use qs_kernel::Simulation;
//!
//! let mut simulation = Simulation::new(0.0);
//! let sim = simulation.handle();
//! let ctx = sim.clone();
//! sim.process(async move {
//!     let timer = ctx.timeout(5.0)?;
//!     timer.wait().await?;
//!     Ok(())
//! });
//! simulation.run_until(10.0)?;
//! ```

pub mod condition;
pub mod error;
pub mod event;
pub mod process;
pub mod scheduler;
pub mod store;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use condition::{AnyOf, Race};
pub use error::{Fault, Interrupt, KernelError, KernelResult, Outcome};
pub use event::{Event, Wait};
pub use process::{Process, ProcessState};
pub use scheduler::{KernelStats, RunOutcome, Sim, Simulation};
pub use store::{Store, StoreGet};
