//! End-of-run statistics.
//!
//! Reports are plain data (`Serialize`) so the demos can print them or dump
//! them as JSON, and so replications can be sent back across threads.

use std::fmt;

use serde::Serialize;

use qs_core::{CustomerId, SimTime, StaffId, WindowId};

use crate::{Customer, CustomerState};

// ── BankReport ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StaffServed {
    pub staff:     StaffId,
    pub customers: Vec<CustomerId>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BankReport {
    pub total:                usize,
    pub satisfied:            usize,
    /// Everyone not satisfied: balked, still waiting, or still in service.
    pub unsatisfied:          usize,
    pub balked:               usize,
    pub still_waiting:        usize,
    pub in_service:           usize,
    /// Satisfied customers as a percentage of all customers.
    pub satisfied_percent:    f64,
    /// Mean waiting time over all customers.  Customers still queued count
    /// their wait up to `final_time`.
    pub average_waiting_time: f64,
    /// Mean time in the bank over satisfied customers only.
    pub average_total_time:   f64,
    pub served_by:            Vec<StaffServed>,
    pub final_time:           SimTime,
}

impl BankReport {
    pub fn new(customers: &[Customer], served: &[(StaffId, Vec<CustomerId>)], now: SimTime) -> Self {
        let total = customers.len();
        let count = |state: CustomerState| customers.iter().filter(|c| c.state == state).count();
        let satisfied = count(CustomerState::Satisfied);

        let waits: Vec<f64> = customers.iter().map(|c| c.waited_until(now)).collect();
        let totals: Vec<f64> = customers
            .iter()
            .filter(|c| c.is_satisfied())
            .map(|c| c.total_time)
            .collect();

        Self {
            total,
            satisfied,
            unsatisfied: total - satisfied,
            balked: count(CustomerState::Balked),
            still_waiting: count(CustomerState::Waiting) + count(CustomerState::Arrived),
            in_service: count(CustomerState::InService),
            satisfied_percent: percent(satisfied, total),
            average_waiting_time: mean(&waits),
            average_total_time: mean(&totals),
            served_by: served
                .iter()
                .map(|(staff, customers)| StaffServed { staff: *staff, customers: customers.clone() })
                .collect(),
            final_time: now,
        }
    }
}

impl fmt::Display for BankReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.served_by {
            let ids: Vec<u32> = entry.customers.iter().map(|c| c.0).collect();
            writeln!(f, "{} served customers {ids:?}", entry.staff)?;
        }
        writeln!(f, "Customers in total:\t{}", self.total)?;
        writeln!(f, "Satisfied customers:\t{}", self.satisfied)?;
        writeln!(f, "Unsatisfied customers:\t{}", self.unsatisfied)?;
        writeln!(f, "Satisfied share, %:\t{:.2}", self.satisfied_percent)?;
        writeln!(f, "Average wait, min:\t{:.2}", 60.0 * self.average_waiting_time)?;
        writeln!(f, "Average time in bank (satisfied), min:\t{:.2}", 60.0 * self.average_total_time)?;
        write!(f, "Current time, h:\t{:.2}", self.final_time.as_f64())
    }
}

// ── PostReport ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WindowServed {
    pub window:  WindowId,
    pub clients: Vec<CustomerId>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PostReport {
    pub arrived:    usize,
    pub served:     usize,
    pub in_service: usize,
    /// Clients still queued at `final_time`.
    pub waiting:    usize,
    pub per_window: Vec<WindowServed>,
    pub final_time: SimTime,
}

impl fmt::Display for PostReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.per_window {
            let ids: Vec<u32> = entry.clients.iter().map(|c| c.0).collect();
            writeln!(f, "{} served clients {ids:?}", entry.window)?;
        }
        writeln!(f, "Clients arrived:\t{}", self.arrived)?;
        writeln!(f, "Clients served:\t{}", self.served)?;
        writeln!(f, "Clients in service:\t{}", self.in_service)?;
        writeln!(f, "Clients waiting:\t{}", self.waiting)?;
        write!(f, "Current time, h:\t{:.2}", self.final_time.as_f64())
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}
