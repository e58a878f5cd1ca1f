//! CSV agenda loader.
//!
//! # CSV format
//!
//! One row per shift.  Staff ids are 1-based; rows may come in any order.
//!
//! ```csv
//! staff_id,start,end
//! 1,9.0,11.5
//! 1,12.5,14.0
//! 2,10.0,12.5
//! 2,13.0,15.0
//! ```
//!
//! Staff absent from the CSV receive an empty agenda (never on duty).

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use qs_core::SimTime;

use crate::shift::{Agenda, Shift};
use crate::AgendaError;

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct AgendaRecord {
    staff_id: u32,
    start:    f64,
    end:      f64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load `staff_count` agendas from a CSV file.
///
/// Returns a `Vec` of length `staff_count`; entry `i` belongs to staff id
/// `i + 1`.
pub fn load_agendas_csv(path: &Path, staff_count: usize) -> Result<Vec<Agenda>, AgendaError> {
    let file = std::fs::File::open(path).map_err(AgendaError::Io)?;
    load_agendas_reader(file, staff_count)
}

/// Like [`load_agendas_csv`] but accepts any `Read` source.
pub fn load_agendas_reader<R: Read>(
    reader: R,
    staff_count: usize,
) -> Result<Vec<Agenda>, AgendaError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut by_staff: HashMap<u32, Vec<Shift>> = HashMap::with_capacity(staff_count);

    for result in csv_reader.deserialize::<AgendaRecord>() {
        let row = result.map_err(|e| AgendaError::Parse(e.to_string()))?;
        if row.staff_id == 0 || row.staff_id as usize > staff_count {
            return Err(AgendaError::Parse(format!(
                "staff_id {} out of range 1..={staff_count}",
                row.staff_id
            )));
        }
        by_staff
            .entry(row.staff_id)
            .or_default()
            .push(Shift { start: SimTime(row.start), end: SimTime(row.end) });
    }

    (1..=staff_count as u32)
        .map(|id| match by_staff.remove(&id) {
            None => Ok(Agenda::empty()),
            Some(shifts) => Agenda::new(shifts),
        })
        .collect()
}
