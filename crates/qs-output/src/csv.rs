//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `events.csv`
//! - `customers.csv`
//! - `servers.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{CustomerRow, EventRow, OutputResult, ServerRow};

/// Writes run output to three CSV files.
pub struct CsvWriter {
    events:    Writer<File>,
    customers: Writer<File>,
    servers:   Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Open (or create) the CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut events = Writer::from_path(dir.join("events.csv"))?;
        events.write_record(["time", "event", "customer_id", "server_id"])?;

        let mut customers = Writer::from_path(dir.join("customers.csv"))?;
        customers.write_record([
            "customer_id",
            "arrival",
            "patience",
            "state",
            "waiting_time",
            "total_time",
            "served_by",
        ])?;

        let mut servers = Writer::from_path(dir.join("servers.csv"))?;
        servers.write_record(["server_id", "served", "customers"])?;

        Ok(Self { events, customers, servers, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_event(&mut self, row: &EventRow) -> OutputResult<()> {
        self.events.write_record(&[
            row.time.to_string(),
            row.kind.as_str().to_owned(),
            optional(row.customer_id),
            optional(row.server_id),
        ])?;
        Ok(())
    }

    fn write_customers(&mut self, rows: &[CustomerRow]) -> OutputResult<()> {
        for row in rows {
            self.customers.write_record(&[
                row.customer_id.to_string(),
                row.arrival.to_string(),
                optional(row.patience),
                row.state.to_owned(),
                row.waiting_time.to_string(),
                row.total_time.to_string(),
                optional(row.served_by),
            ])?;
        }
        Ok(())
    }

    fn write_servers(&mut self, rows: &[ServerRow]) -> OutputResult<()> {
        for row in rows {
            self.servers.write_record(&[
                row.server_id.to_string(),
                row.served.to_string(),
                row.customers.clone(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.events.flush()?;
        self.customers.flush()?;
        self.servers.flush()?;
        Ok(())
    }
}

/// Empty field for `None`.
fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
