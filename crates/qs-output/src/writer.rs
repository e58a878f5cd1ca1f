//! The `OutputWriter` trait implemented by backend writers.

use crate::{CustomerRow, EventRow, OutputResult, ServerRow};

/// A sink for run records.
///
/// Writes are fallible, but the model observer hooks are not: when driven by
/// [`OutputObserver`][crate::OutputObserver] the first error is stored and
/// retrieved with [`take_error`][crate::OutputObserver::take_error].
pub trait OutputWriter {
    /// Write one milestone.
    fn write_event(&mut self, row: &EventRow) -> OutputResult<()>;

    /// Write the final state of a batch of customers.
    fn write_customers(&mut self, rows: &[CustomerRow]) -> OutputResult<()>;

    /// Write per-server totals (staff members or windows).
    fn write_servers(&mut self, rows: &[ServerRow]) -> OutputResult<()>;

    /// Flush all underlying handles.  Safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
