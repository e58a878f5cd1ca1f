//! `qs-output`: run output writers for the `qs` queueing simulator.
//!
//! | Backend | Files created                                   |
//! |---------|-------------------------------------------------|
//! | CSV     | `events.csv`, `customers.csv`, `servers.csv`    |
//!
//! Backends implement [`OutputWriter`] and are driven by [`OutputObserver`],
//! which implements `qs_model::ModelObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use qs_output::{CsvWriter, OutputObserver};
//!
//! let output = Rc::new(RefCell::new(OutputObserver::new(CsvWriter::new(Path::new("./out"))?)));
//! let bank = BankBuilder::new(config).observer(Rc::clone(&output)).build(&sim)?;
//! bank.open();
//! simulation.run_until(end)?;
//! output.borrow_mut().write_bank(&bank.customers(), &bank.report())?;
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::OutputObserver;
pub use row::{CustomerRow, EventKind, EventRow, ServerRow};
pub use writer::OutputWriter;
