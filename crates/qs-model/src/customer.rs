//! Customers and their life cycle.
//!
//! ```text
//! Arrived ──▶ Waiting ──get wins──▶ InService ──▶ Satisfied
//!                └─────patience wins──▶ Balked
//! ```
//!
//! A customer still queued when the run stops stays `Waiting`.

use qs_core::{CustomerId, SimTime, StaffId};

#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CustomerState {
    Arrived,
    Waiting,
    InService,
    Satisfied,
    Balked,
}

impl CustomerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CustomerState::Satisfied | CustomerState::Balked)
    }
}

/// One bank customer.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Customer {
    pub id:           CustomerId,
    pub arrival:      SimTime,
    /// How long the customer is willing to queue; `f64::INFINITY` never balks.
    pub patience:     f64,
    pub state:        CustomerState,
    /// Time from arrival until service started or the customer balked.
    pub waiting_time: f64,
    /// Time from arrival until service ended.  Zero unless satisfied.
    pub total_time:   f64,
    pub served_by:    Option<StaffId>,
}

impl Customer {
    pub fn new(id: CustomerId, arrival: SimTime, patience: f64) -> Self {
        Self {
            id,
            arrival,
            patience,
            state: CustomerState::Arrived,
            waiting_time: 0.0,
            total_time: 0.0,
            served_by: None,
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.state == CustomerState::Satisfied
    }

    /// Waiting time as of `now`: the recorded value once service started or
    /// the customer balked, otherwise the time queued so far.
    pub fn waited_until(&self, now: SimTime) -> f64 {
        match self.state {
            CustomerState::Arrived | CustomerState::Waiting => now.since(self.arrival),
            _ => self.waiting_time,
        }
    }
}
