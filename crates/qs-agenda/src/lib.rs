//! `qs-agenda`: on-duty shift agendas for staff and service windows.
//!
//! # Crate layout
//!
//! | Module      | Contents                                         |
//! |-------------|--------------------------------------------------|
//! | [`shift`]   | `Shift`, `Agenda`                                |
//! | [`loader`]  | `load_agendas_csv`, `load_agendas_reader`        |
//! | [`error`]   | `AgendaError`, `AgendaResult<T>`                 |
//!
//! # Agenda model
//!
//! An agenda is an ordered list of half-open on-duty intervals:
//!
//! ```text
//! [start₀, end₀) [start₁, end₁) ...    startᵢ < endᵢ ≤ startᵢ₊₁
//! ```
//!
//! Agendas are not cyclic.  Once the last shift has ended the staff member
//! stays off duty for the rest of the run.

pub mod error;
pub mod loader;
pub mod shift;


pub use error::{AgendaError, AgendaResult};
pub use loader::{load_agendas_csv, load_agendas_reader};
pub use shift::{Agenda, Shift};
