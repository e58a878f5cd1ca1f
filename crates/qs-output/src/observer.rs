//! `OutputObserver<W>`: bridges `ModelObserver` to an `OutputWriter`.

use qs_core::{CustomerId, SimTime, StaffId, WindowId};
use qs_model::{BankReport, Customer, ModelObserver, PostReport};

use crate::row::{CustomerRow, EventKind, EventRow, ServerRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`ModelObserver`] that writes one event row per milestone to any
/// [`OutputWriter`] backend.
///
/// Errors from the writer are stored internally because observer hooks have
/// no return value.  After the run, check for errors with
/// [`take_error`][Self::take_error].  Share it with the model through an
/// `Rc<RefCell<_>>` to keep access to it after the run:
///
/// ```rust,ignore
/// let output = Rc::new(RefCell::new(OutputObserver::new(CsvWriter::new(dir)?)));
/// let bank = BankBuilder::new(config).observer(Rc::clone(&output)).build(&sim)?;
/// // ... run ...
/// output.borrow_mut().write_bank(&bank.customers(), &bank.report())?;
/// ```
pub struct OutputObserver<W: OutputWriter> {
    writer:     W,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> OutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, last_error: None }
    }

    /// Take the stored write error (if any).
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Write final customer and per-staff records, then flush.
    ///
    /// Returns the first error stored during the run, if any, before
    /// writing anything.
    pub fn write_bank(&mut self, customers: &[Customer], report: &BankReport) -> OutputResult<()> {
        if let Some(e) = self.last_error.take() {
            return Err(e);
        }
        let rows: Vec<CustomerRow> = customers.iter().map(CustomerRow::from).collect();
        self.writer.write_customers(&rows)?;
        let servers: Vec<ServerRow> = report.served_by.iter().map(ServerRow::from).collect();
        self.writer.write_servers(&servers)?;
        self.writer.finish()
    }

    /// Write per-window records, then flush.
    pub fn write_post(&mut self, report: &PostReport) -> OutputResult<()> {
        if let Some(e) = self.last_error.take() {
            return Err(e);
        }
        let servers: Vec<ServerRow> = report.per_window.iter().map(ServerRow::from).collect();
        self.writer.write_servers(&servers)?;
        self.writer.finish()
    }

    fn record(&mut self, row: EventRow) {
        if let Err(e) = self.writer.write_event(&row) {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> ModelObserver for OutputObserver<W> {
    fn on_arrival(&mut self, time: SimTime, customer: CustomerId) {
        self.record(EventRow::new(time, EventKind::Arrival).customer(customer));
    }

    fn on_service_start(&mut self, time: SimTime, customer: CustomerId, staff: StaffId) {
        self.record(EventRow::new(time, EventKind::ServiceStart).customer(customer).server(staff.0));
    }

    fn on_service_end(&mut self, time: SimTime, customer: CustomerId, staff: StaffId) {
        self.record(EventRow::new(time, EventKind::ServiceEnd).customer(customer).server(staff.0));
    }

    fn on_balk(&mut self, time: SimTime, customer: CustomerId) {
        self.record(EventRow::new(time, EventKind::Balk).customer(customer));
    }

    fn on_staff_on_duty(&mut self, time: SimTime, staff: StaffId) {
        self.record(EventRow::new(time, EventKind::OnDuty).server(staff.0));
    }

    fn on_staff_off_duty(&mut self, time: SimTime, staff: StaffId) {
        self.record(EventRow::new(time, EventKind::OffDuty).server(staff.0));
    }

    fn on_window_open(&mut self, time: SimTime, window: WindowId) {
        self.record(EventRow::new(time, EventKind::WindowOpen).server(window.0));
    }

    fn on_window_busy(&mut self, time: SimTime, window: WindowId, client: CustomerId) {
        self.record(EventRow::new(time, EventKind::WindowBusy).customer(client).server(window.0));
    }

    fn on_window_free(&mut self, time: SimTime, window: WindowId) {
        self.record(EventRow::new(time, EventKind::WindowFree).server(window.0));
    }

    fn on_window_closed(&mut self, time: SimTime, window: WindowId) {
        self.record(EventRow::new(time, EventKind::WindowClosed).server(window.0));
    }
}
