//! `qs-model`: queueing models built on the `qs-kernel` process kernel.
//!
//! # Models
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`bank`]       | Shift-staffed tellers, impatient customers (`Bank`)       |
//! | [`post`]       | Windows opening on an agenda, patient clients (`PostOffice`) |
//! | [`charging`]   | A car whose charging stop can be interrupted              |
//! | [`customer`]   | `Customer`, `CustomerState`                               |
//! | [`config`]     | `BankConfig`, `PostConfig`, `ChargingConfig` (JSON)       |
//! | [`stats`]      | `BankReport`, `PostReport`                                |
//! | [`observer`]   | `ModelObserver`, `NoopObserver`, `TraceObserver`          |
//! | [`replicate`]  | `run_bank`, `run_post`, `replicate`                       |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `parallel` | `replicate` runs seeds on Rayon's thread pool.            |
//! | `fx-hash`  | Forwarded to `qs-kernel`.                                 |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use qs_model::{run_bank, BankBuilder, BankConfig};
//!
//! let report = run_bank(BankBuilder::new(BankConfig::default()))?;
//! println!("{report}");
//! ```

pub mod bank;
pub mod charging;
pub mod config;
pub mod customer;
pub mod error;
pub mod observer;
pub mod post;
pub mod replicate;
pub mod stats;

#[cfg(test)]
mod tests;

pub use bank::{Bank, BankBuilder, Staff, StaffStatus, StaffToken};
pub use charging::{run_charging, spawn_car, spawn_driver, CarAction, CarLog};
pub use config::{BankConfig, ChargingConfig, PostConfig};
pub use customer::{Customer, CustomerState};
pub use error::{ModelError, ModelResult};
pub use observer::{ModelObserver, NoopObserver, TraceObserver};
pub use post::{Client, PostBuilder, PostOffice, Window};
pub use replicate::{replicate, run_bank, run_post, ReplicationSummary};
pub use stats::{BankReport, PostReport, StaffServed, WindowServed};
