//! Plain data row types written by output backends.

use qs_core::{CustomerId, SimTime};
use qs_model::{Customer, CustomerState, StaffServed, WindowServed};

/// What happened at a milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Arrival,
    ServiceStart,
    ServiceEnd,
    Balk,
    OnDuty,
    OffDuty,
    WindowOpen,
    WindowBusy,
    WindowFree,
    WindowClosed,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Arrival => "arrival",
            EventKind::ServiceStart => "service_start",
            EventKind::ServiceEnd => "service_end",
            EventKind::Balk => "balk",
            EventKind::OnDuty => "on_duty",
            EventKind::OffDuty => "off_duty",
            EventKind::WindowOpen => "window_open",
            EventKind::WindowBusy => "window_busy",
            EventKind::WindowFree => "window_free",
            EventKind::WindowClosed => "window_closed",
        }
    }
}

/// One model milestone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventRow {
    pub time:        f64,
    pub kind:        EventKind,
    pub customer_id: Option<u32>,
    /// Staff or window id.
    pub server_id:   Option<u32>,
}

impl EventRow {
    pub fn new(time: SimTime, kind: EventKind) -> Self {
        Self { time: time.as_f64(), kind, customer_id: None, server_id: None }
    }

    pub fn customer(mut self, id: CustomerId) -> Self {
        self.customer_id = Some(id.0);
        self
    }

    pub fn server(mut self, id: u32) -> Self {
        self.server_id = Some(id);
        self
    }
}

/// Final state of one customer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CustomerRow {
    pub customer_id:  u32,
    pub arrival:      f64,
    /// `None` for infinite patience.
    pub patience:     Option<f64>,
    pub state:        &'static str,
    pub waiting_time: f64,
    pub total_time:   f64,
    pub served_by:    Option<u32>,
}

impl From<&Customer> for CustomerRow {
    fn from(c: &Customer) -> Self {
        Self {
            customer_id:  c.id.0,
            arrival:      c.arrival.as_f64(),
            patience:     c.patience.is_finite().then_some(c.patience),
            state:        state_name(c.state),
            waiting_time: c.waiting_time,
            total_time:   c.total_time,
            served_by:    c.served_by.map(|s| s.0),
        }
    }
}

/// Totals for one staff member or window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerRow {
    pub server_id: u32,
    pub served:    usize,
    /// Served customer ids, space-separated, in service order.
    pub customers: String,
}

impl ServerRow {
    fn new(server_id: u32, customers: &[CustomerId]) -> Self {
        let ids: Vec<String> = customers.iter().map(|c| c.0.to_string()).collect();
        Self { server_id, served: customers.len(), customers: ids.join(" ") }
    }
}

impl From<&StaffServed> for ServerRow {
    fn from(s: &StaffServed) -> Self {
        Self::new(s.staff.0, &s.customers)
    }
}

impl From<&WindowServed> for ServerRow {
    fn from(w: &WindowServed) -> Self {
        Self::new(w.window.0, &w.clients)
    }
}

fn state_name(state: CustomerState) -> &'static str {
    match state {
        CustomerState::Arrived => "arrived",
        CustomerState::Waiting => "waiting",
        CustomerState::InService => "in_service",
        CustomerState::Satisfied => "satisfied",
        CustomerState::Balked => "balked",
    }
}
