//! `qs-core`: foundational types for the `qs` queueing simulator.
//!
//! This crate is a dependency of every other `qs-*` crate.  It intentionally
//! has no `qs-*` dependencies and minimal external ones (`rand`,
//! `rand_distr` and `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                   |
//! |------------|------------------------------------------------------------|
//! | [`ids`]    | `ProcessId`, `EventId`, `StaffId`, `CustomerId`, `WindowId` |
//! | [`time`]   | `SimTime`, `SimClock`, `SimConfig`                         |
//! | [`rng`]    | `VariateSource`, `SimRng`, `FixedVariates`, `ScriptedVariates` |
//! | [`error`]  | `CoreError`, `CoreResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public data types.   |

pub mod error;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use ids::{CustomerId, EventId, ProcessId, StaffId, WindowId};
pub use rng::{FixedVariates, ScriptedVariates, SimRng, VariateSource};
pub use time::{SimClock, SimConfig, SimTime};
