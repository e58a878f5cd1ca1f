//! The bank: shift-staffed tellers serving impatient customers.
//!
//! # Processes
//!
//! ```text
//! work(staff)       for each shift: wait for start → on duty, announce start
//!                                   wait for end   → idle? withdraw, off duty
//! dispatch(Start)   any_of(every staff's start announcement) → put tokens
//! dispatch(Freed)   any_of(every staff's freed announcement) → put tokens
//! arrivals          sleep inter-arrival → new customer → spawn visit
//! visit(customer)   race(get staff, patience) → serve or balk
//! ```
//!
//! Available staff sit in a [`Store`] of [`StaffToken`]s whose capacity is
//! the number of staff.  A staff member never puts itself in the store: it
//! *announces* that it became available, and the two dispatcher processes
//! turn announcements into puts.
//!
//! # Announcements
//!
//! Each staff member owns two single-slot announcement events (start of
//! shift, freed after a service).  Announcing fires the event in the slot
//! and replaces it with a fresh one; the fired notice carries a link to its
//! replacement, so a dispatcher that falls behind follows the chain instead
//! of missing a firing.
//!
//! # Stale tokens
//!
//! A token is stamped with the staff member's *epoch*, which increments
//! every time the staff member goes off duty.  A token that was in flight
//! (announced but not yet in the store, or granted but not yet claimed) when
//! its shift ended is stale: whoever draws it drops it and asks again at the
//! front of the queue, keeping its place ahead of later customers.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use qs_agenda::Agenda;
use qs_core::{CustomerId, SimRng, SimTime, StaffId, VariateSource};
use qs_kernel::{Event, Fault, KernelResult, Outcome, Race, Sim, Store};

use crate::{BankConfig, BankReport, Customer, CustomerState, ModelObserver, ModelResult, TraceObserver};

// ── Staff ─────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub enum StaffStatus {
    OffDuty,
    /// On duty and idle: a token for this staff member is (or is about to
    /// be) in the store.
    Available,
    /// On duty and serving a customer.
    Busy,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Announcement {
    Start,
    Freed,
}

/// A bank teller.
pub struct Staff {
    id:        StaffId,
    agenda:    Agenda,
    status:    Cell<StaffStatus>,
    shift_end: Cell<Option<SimTime>>,
    epoch:     Cell<u64>,
    served:    RefCell<Vec<CustomerId>>,
    started:   RefCell<Event<StaffNotice>>,
    freed:     RefCell<Event<StaffNotice>>,
}

impl Staff {
    fn new(sim: &Sim, id: StaffId, agenda: Agenda) -> Self {
        Self {
            id,
            agenda,
            status: Cell::new(StaffStatus::OffDuty),
            shift_end: Cell::new(None),
            epoch: Cell::new(0),
            served: RefCell::new(Vec::new()),
            started: RefCell::new(sim.event()),
            freed: RefCell::new(sim.event()),
        }
    }

    pub fn id(&self) -> StaffId {
        self.id
    }

    pub fn agenda(&self) -> &Agenda {
        &self.agenda
    }

    pub fn status(&self) -> StaffStatus {
        self.status.get()
    }

    /// End of the current (or next) shift, once the staff member has started
    /// walking its agenda.
    pub fn shift_end(&self) -> Option<SimTime> {
        self.shift_end.get()
    }

    /// Customers served so far, in order.
    pub fn served(&self) -> Vec<CustomerId> {
        self.served.borrow().clone()
    }

    fn slot(&self, kind: Announcement) -> &RefCell<Event<StaffNotice>> {
        match kind {
            Announcement::Start => &self.started,
            Announcement::Freed => &self.freed,
        }
    }

    /// Become available and announce it through `kind`'s slot.
    fn announce(self: &Rc<Self>, sim: &Sim, kind: Announcement) -> KernelResult<()> {
        self.status.set(StaffStatus::Available);
        let token = StaffToken { staff: Rc::clone(self), epoch: self.epoch.get() };
        let next = sim.event();
        let current = self.slot(kind).replace(next.clone());
        current.succeed(StaffNotice { token, next })
    }

    fn go_off_duty(&self) {
        self.status.set(StaffStatus::OffDuty);
        self.epoch.set(self.epoch.get() + 1);
    }
}

impl fmt::Debug for Staff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Staff")
            .field("id", &self.id)
            .field("status", &self.status.get())
            .field("shift_end", &self.shift_end.get())
            .finish()
    }
}

/// An available staff member, as held by the store.
#[derive(Clone)]
pub struct StaffToken {
    staff: Rc<Staff>,
    epoch: u64,
}

impl StaffToken {
    pub fn staff(&self) -> &Rc<Staff> {
        &self.staff
    }

    /// The staff member is still available under the shift that issued
    /// this token.
    pub fn is_current(&self) -> bool {
        self.staff.epoch.get() == self.epoch && self.staff.status() == StaffStatus::Available
    }
}

impl fmt::Debug for StaffToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StaffToken({}, epoch {})", self.staff.id, self.epoch)
    }
}

/// Value of a fired announcement.
#[derive(Clone)]
struct StaffNotice {
    token: StaffToken,
    /// The event that replaced the fired one in the staff member's slot.
    next:  Event<StaffNotice>,
}

// ── BankBuilder ───────────────────────────────────────────────────────────────

/// Fluent builder for a [`Bank`].
///
/// | Method          | Default                          |
/// |-----------------|----------------------------------|
/// | `.variates(v)`  | `SimRng::new(config.sim.seed)`   |
/// | `.observer(o)`  | `TraceObserver`                  |
pub struct BankBuilder {
    config:   BankConfig,
    variates: Option<Box<dyn VariateSource>>,
    observer: Option<Box<dyn ModelObserver>>,
}

impl BankBuilder {
    pub fn new(config: BankConfig) -> Self {
        Self { config, variates: None, observer: None }
    }

    pub fn config(&self) -> &BankConfig {
        &self.config
    }

    pub fn variates(mut self, variates: impl VariateSource + 'static) -> Self {
        self.variates = Some(Box::new(variates));
        self
    }

    pub fn observer(mut self, observer: impl ModelObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Validate the config and build a closed bank bound to `sim`.
    pub fn build(self, sim: &Sim) -> ModelResult<Rc<Bank>> {
        self.config.validate()?;
        let config = self.config;

        let staff: Vec<Rc<Staff>> = config
            .agendas
            .iter()
            .zip(1..)
            .map(|(agenda, id)| Rc::new(Staff::new(sim, StaffId(id), agenda.clone())))
            .collect();

        Ok(Rc::new(Bank {
            sim:               sim.clone(),
            available:         Store::new(sim, staff.len()),
            staff,
            customers:         RefCell::new(Vec::new()),
            mean_interarrival: config.mean_interarrival,
            mean_patience:     config.mean_patience,
            mean_service:      config.mean_service,
            arrival_times:     config.arrival_times,
            variates:          RefCell::new(
                self.variates.unwrap_or_else(|| Box::new(SimRng::new(config.sim.seed))),
            ),
            observer:          RefCell::new(self.observer.unwrap_or_else(|| Box::new(TraceObserver))),
        }))
    }
}

// ── Bank ──────────────────────────────────────────────────────────────────────

pub struct Bank {
    sim:               Sim,
    staff:             Vec<Rc<Staff>>,
    available:         Store<StaffToken>,
    customers:         RefCell<Vec<Rc<RefCell<Customer>>>>,
    mean_interarrival: f64,
    mean_patience:     f64,
    mean_service:      f64,
    arrival_times:     Option<Vec<f64>>,
    variates:          RefCell<Box<dyn VariateSource>>,
    observer:          RefCell<Box<dyn ModelObserver>>,
}

impl Bank {
    /// Start every process: one per staff member, the two dispatchers, and
    /// the arrival stream.  Nothing runs until the simulation is driven.
    pub fn open(self: &Rc<Self>) {
        for staff in &self.staff {
            self.sim.process(Rc::clone(self).work(Rc::clone(staff)));
        }
        self.sim.process(Rc::clone(self).dispatch(Announcement::Start));
        self.sim.process(Rc::clone(self).dispatch(Announcement::Freed));
        self.sim.process(Rc::clone(self).arrivals());
        tracing::debug!(time = %self.sim.now(), staff = self.staff.len(), "bank open");
    }

    pub fn staff(&self) -> &[Rc<Staff>] {
        &self.staff
    }

    /// The pool of available staff.
    pub fn available(&self) -> &Store<StaffToken> {
        &self.available
    }

    /// Snapshot of every customer so far, in arrival order.
    pub fn customers(&self) -> Vec<Customer> {
        self.customers.borrow().iter().map(|c| c.borrow().clone()).collect()
    }

    /// Statistics as of the current simulation time.
    pub fn report(&self) -> BankReport {
        let served: Vec<(StaffId, Vec<CustomerId>)> =
            self.staff.iter().map(|s| (s.id(), s.served())).collect();
        BankReport::new(&self.customers(), &served, self.sim.now())
    }

    // ── Processes ─────────────────────────────────────────────────────────

    async fn work(self: Rc<Self>, staff: Rc<Staff>) -> Outcome<()> {
        let sim = self.sim.clone();
        let shifts = staff.agenda.remaining(sim.now()).to_vec();
        for shift in shifts {
            staff.shift_end.set(Some(shift.end));
            sim.timeout(shift.start.since(sim.now()).max(0.0))?.wait().await?;

            // Still busy from an adjacent shift: the service completion
            // announces the staff member instead.
            if staff.status() == StaffStatus::OffDuty {
                self.available.withdraw(|token| Rc::ptr_eq(&token.staff, &staff));
                staff.announce(&sim, Announcement::Start)?;
                self.observer.borrow_mut().on_staff_on_duty(sim.now(), staff.id);
            }

            sim.timeout(shift.end.since(sim.now()).max(0.0))?.wait().await?;

            if staff.status() == StaffStatus::Available && !staff.agenda.is_on_duty(sim.now()) {
                self.available.withdraw(|token| Rc::ptr_eq(&token.staff, &staff));
                staff.go_off_duty();
                self.observer.borrow_mut().on_staff_off_duty(sim.now(), staff.id);
            }
        }
        Ok(())
    }

    async fn dispatch(self: Rc<Self>, kind: Announcement) -> Outcome<()> {
        let mut watching: Vec<Event<StaffNotice>> =
            self.staff.iter().map(|s| s.slot(kind).borrow().clone()).collect();
        if watching.is_empty() {
            return Ok(());
        }
        loop {
            let fired = self.sim.any_of(&watching).wait().await?;
            for (index, notice) in fired.iter() {
                watching[*index] = notice.next.clone();
                // Capacity is the staff count, so the put is accepted at once
                // unless stale tokens are still draining.
                self.available.put(notice.token.clone()).wait().await?;
            }
        }
    }

    async fn arrivals(self: Rc<Self>) -> Outcome<()> {
        let sim = self.sim.clone();
        let mut scripted = self.arrival_times.clone().map(Vec::into_iter);
        let mut next_id = CustomerId(1);
        loop {
            let delay = match scripted.as_mut() {
                Some(times) => match times.next() {
                    Some(at) => (at - sim.now().as_f64()).max(0.0),
                    None => return Ok(()),
                },
                None => self.variates.borrow_mut().exponential(self.mean_interarrival),
            };
            if !delay.is_finite() {
                return Ok(());
            }
            sim.timeout(delay)?.wait().await?;

            let patience = self.variates.borrow_mut().exponential(self.mean_patience);
            let customer = Rc::new(RefCell::new(Customer::new(next_id, sim.now(), patience)));
            self.customers.borrow_mut().push(Rc::clone(&customer));
            self.observer.borrow_mut().on_arrival(sim.now(), next_id);
            sim.process(Rc::clone(&self).visit(customer));
            next_id = next_id.next();
        }
    }

    async fn visit(self: Rc<Self>, customer: Rc<RefCell<Customer>>) -> Outcome<()> {
        let sim = self.sim.clone();
        let (id, arrival, patience) = {
            let mut c = customer.borrow_mut();
            c.state = CustomerState::Waiting;
            (c.id, c.arrival, c.patience)
        };
        let deadline = if patience.is_finite() { Some(sim.timeout(patience)?) } else { None };

        let mut requeue = false;
        let staff = loop {
            let request = if requeue { self.available.get_first() } else { self.available.get() };
            let token = match &deadline {
                None => request.wait().await?,
                Some(deadline) => {
                    let outcome = if deadline.is_processed() {
                        Race::Second(())
                    } else {
                        sim.race(request.event(), deadline).wait().await?
                    };
                    match outcome {
                        Race::Second(()) => {
                            // No yield between resolution and cancellation:
                            // a grant made in the meantime goes straight back.
                            request.cancel();
                            {
                                let mut c = customer.borrow_mut();
                                c.state = CustomerState::Balked;
                                c.waiting_time = sim.now().since(arrival);
                            }
                            self.observer.borrow_mut().on_balk(sim.now(), id);
                            return Ok(());
                        }
                        Race::First(_) | Race::Both(..) => request
                            .claim()
                            .ok_or_else(|| Fault::failed("store grant vanished before claim"))?,
                    }
                }
            };
            if token.is_current() {
                break Rc::clone(&token.staff);
            }
            tracing::debug!(time = %sim.now(), staff = %token.staff.id, customer = %id, "dropped stale staff token");
            requeue = true;
        };

        staff.status.set(StaffStatus::Busy);
        {
            let mut c = customer.borrow_mut();
            c.state = CustomerState::InService;
            c.waiting_time = sim.now().since(arrival);
            c.served_by = Some(staff.id);
        }
        self.observer.borrow_mut().on_service_start(sim.now(), id, staff.id);

        let duration = self.variates.borrow_mut().exponential(self.mean_service);
        sim.timeout(duration)?.wait().await?;

        staff.served.borrow_mut().push(id);
        {
            let mut c = customer.borrow_mut();
            c.state = CustomerState::Satisfied;
            c.total_time = sim.now().since(arrival);
        }
        self.observer.borrow_mut().on_service_end(sim.now(), id, staff.id);
        self.release(&staff)?;
        Ok(())
    }

    /// After a service: back to the pool while on duty, otherwise off duty.
    fn release(&self, staff: &Rc<Staff>) -> KernelResult<()> {
        if staff.agenda.is_on_duty(self.sim.now()) {
            staff.announce(&self.sim, Announcement::Freed)
        } else {
            staff.go_off_duty();
            self.observer.borrow_mut().on_staff_off_duty(self.sim.now(), staff.id);
            Ok(())
        }
    }
}
