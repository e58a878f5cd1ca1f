//! The post office: clients queue in a store, windows open on an agenda.
//!
//! ```text
//! arrivals          sleep inter-arrival → put client into the queue
//! window(w)         for each shift: wait for opening
//!                     loop: race(take next client, closing time)
//!                       client  → serve for the client's duration
//!                       closing → window closed until the next shift
//! ```
//!
//! A client taken before closing time is always served to completion, even
//! if that runs past the close.  No client is taken once the window has
//! closed.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use qs_agenda::Agenda;
use qs_core::{CustomerId, SimRng, SimTime, VariateSource, WindowId};
use qs_kernel::{Fault, Outcome, Race, Sim, Store};

use crate::{ModelObserver, ModelResult, PostConfig, PostReport, TraceObserver, WindowServed};

/// One post-office client.
#[derive(Clone, Debug, PartialEq)]
pub struct Client {
    pub id:       CustomerId,
    pub arrival:  SimTime,
    /// Service duration, drawn on arrival.
    pub duration: f64,
}

/// A service window.
pub struct Window {
    id:     WindowId,
    agenda: Agenda,
    open:   Cell<bool>,
    served: RefCell<Vec<CustomerId>>,
}

impl Window {
    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn agenda(&self) -> &Agenda {
        &self.agenda
    }

    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    pub fn served(&self) -> Vec<CustomerId> {
        self.served.borrow().clone()
    }
}

// ── PostBuilder ───────────────────────────────────────────────────────────────

/// Fluent builder for a [`PostOffice`]; defaults as for
/// [`BankBuilder`][crate::BankBuilder].
pub struct PostBuilder {
    config:   PostConfig,
    variates: Option<Box<dyn VariateSource>>,
    observer: Option<Box<dyn ModelObserver>>,
}

impl PostBuilder {
    pub fn new(config: PostConfig) -> Self {
        Self { config, variates: None, observer: None }
    }

    pub fn config(&self) -> &PostConfig {
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

    pub fn build(self, sim: &Sim) -> ModelResult<Rc<PostOffice>> {
        self.config.validate()?;
        let config = self.config;
        let windows = config
            .agendas
            .iter()
            .zip(1..)
            .map(|(agenda, id)| {
                Rc::new(Window {
                    id:     WindowId(id),
                    agenda: agenda.clone(),
                    open:   Cell::new(false),
                    served: RefCell::new(Vec::new()),
                })
            })
            .collect();

        Ok(Rc::new(PostOffice {
            sim: sim.clone(),
            queue: Store::unbounded(sim),
            windows,
            arrived: Cell::new(0),
            in_service: Cell::new(0),
            mean_interarrival: config.mean_interarrival,
            service_range: config.service_range,
            variates: RefCell::new(
                self.variates.unwrap_or_else(|| Box::new(SimRng::new(config.sim.seed))),
            ),
            observer: RefCell::new(self.observer.unwrap_or_else(|| Box::new(TraceObserver))),
        }))
    }
}

// ── PostOffice ────────────────────────────────────────────────────────────────

pub struct PostOffice {
    sim:               Sim,
    queue:             Store<Client>,
    windows:           Vec<Rc<Window>>,
    arrived:           Cell<usize>,
    in_service:        Cell<usize>,
    mean_interarrival: f64,
    service_range:     (f64, f64),
    variates:          RefCell<Box<dyn VariateSource>>,
    observer:          RefCell<Box<dyn ModelObserver>>,
}

impl PostOffice {
    /// Start the arrival stream and one process per window.
    pub fn open(self: &Rc<Self>) {
        self.sim.process(Rc::clone(self).arrivals());
        for window in &self.windows {
            self.sim.process(Rc::clone(self).serve(Rc::clone(window)));
        }
    }

    pub fn windows(&self) -> &[Rc<Window>] {
        &self.windows
    }

    /// Clients waiting for a window.
    pub fn queue(&self) -> &Store<Client> {
        &self.queue
    }

    pub fn report(&self) -> PostReport {
        let per_window: Vec<WindowServed> = self
            .windows
            .iter()
            .map(|w| WindowServed { window: w.id, clients: w.served() })
            .collect();
        PostReport {
            arrived:    self.arrived.get(),
            served:     per_window.iter().map(|w| w.clients.len()).sum(),
            in_service: self.in_service.get(),
            waiting:    self.queue.len(),
            per_window,
            final_time: self.sim.now(),
        }
    }

    async fn arrivals(self: Rc<Self>) -> Outcome<()> {
        let sim = self.sim.clone();
        let mut next_id = CustomerId(1);
        loop {
            let delay = self.variates.borrow_mut().exponential(self.mean_interarrival);
            if !delay.is_finite() {
                return Ok(());
            }
            sim.timeout(delay)?.wait().await?;

            let (low, high) = self.service_range;
            let duration = self.variates.borrow_mut().uniform(low, high);
            self.arrived.set(self.arrived.get() + 1);
            self.observer.borrow_mut().on_arrival(sim.now(), next_id);
            self.queue.put(Client { id: next_id, arrival: sim.now(), duration }).wait().await?;
            next_id = next_id.next();
        }
    }

    async fn serve(self: Rc<Self>, window: Rc<Window>) -> Outcome<()> {
        let sim = self.sim.clone();
        let shifts = window.agenda.remaining(sim.now()).to_vec();
        for shift in shifts {
            sim.timeout(shift.start.since(sim.now()).max(0.0))?.wait().await?;
            window.open.set(true);
            self.observer.borrow_mut().on_window_open(sim.now(), window.id);

            let closing = sim.timeout(shift.end.since(sim.now()).max(0.0))?;
            loop {
                if closing.is_processed() {
                    break;
                }
                let request = self.queue.get();
                match sim.race(request.event(), &closing).wait().await? {
                    Race::Second(()) => {
                        request.cancel();
                        break;
                    }
                    Race::First(_) | Race::Both(..) => {
                        let client = request
                            .claim()
                            .ok_or_else(|| Fault::failed("client grant vanished before claim"))?;
                        self.in_service.set(self.in_service.get() + 1);
                        self.observer.borrow_mut().on_window_busy(sim.now(), window.id, client.id);

                        sim.timeout(client.duration)?.wait().await?;

                        window.served.borrow_mut().push(client.id);
                        self.in_service.set(self.in_service.get() - 1);
                        self.observer.borrow_mut().on_window_free(sim.now(), window.id);
                    }
                }
            }
            window.open.set(false);
            self.observer.borrow_mut().on_window_closed(sim.now(), window.id);
        }
        Ok(())
    }
}
