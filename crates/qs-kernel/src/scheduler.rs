//! Clock, pending queue, and the run loop.
//!
//! # Pending queue
//!
//! Every future wake-up is a [`Scheduled`] entry keyed by
//! `(fire_time, insertion_sequence)`.  The queue is a `BTreeMap` over that
//! key, so the earliest entry is always `first_key_value()` and entries due
//! at the same time come out in the order they were inserted.  That stable
//! tie-break is what makes a run reproducible for a fixed seed.
//!
//! # Re-entrancy
//!
//! Executing an entry runs user code (event callbacks, process bodies) which
//! schedules further entries.  The queue is only ever borrowed for the
//! duration of a single push or pop, never while user code runs.
//!
//! # Ownership
//!
//! [`Simulation`] owns the kernel and is the only thing that can drive it.
//! [`Sim`] is the cheap, cloneable context handed to every component and
//! process body.  Process futures and queued events hold `Sim` clones, so
//! the kernel is reference-cycled while a run is in progress; dropping the
//! `Simulation` tears down every process and pending entry to break those
//! cycles.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use qs_core::{EventId, ProcessId, SimClock, SimConfig, SimTime};

use crate::event::Fire;
use crate::process::ProcessMap;
use crate::{Event, KernelError, KernelResult};

// ── Scheduled entries ─────────────────────────────────────────────────────────

/// What a scheduled entry does when it comes due.
pub(crate) enum Action {
    /// Process a triggered event: run its waiters in registration order.
    Process(Rc<dyn Fire>),
    /// Poll a process body until its next yield.
    Resume(ProcessId),
}

/// Ordering key of a pending entry.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub(crate) struct Scheduled {
    pub(crate) at:  SimTime,
    pub(crate) seq: u64,
}

/// Time-ordered queue of pending entries.
#[derive(Default)]
pub(crate) struct PendingQueue {
    inner:    BTreeMap<Scheduled, Action>,
    next_seq: u64,
}

impl PendingQueue {
    /// Insert `action` at absolute time `at`.  Returns its insertion sequence.
    pub(crate) fn push(&mut self, at: SimTime, action: Action) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.inner.insert(Scheduled { at, seq }, action);
        seq
    }

    /// Pop the earliest entry if it is due at or before `deadline`.
    pub(crate) fn pop_due(&mut self, deadline: SimTime) -> Option<(SimTime, Action)> {
        let (key, _) = self.inner.first_key_value()?;
        if key.at > deadline {
            return None;
        }
        self.inner.pop_first().map(|(key, action)| (key.at, action))
    }

    /// Fire time of the earliest entry, or `None` if empty.
    pub(crate) fn next_time(&self) -> Option<SimTime> {
        self.inner.keys().next().map(|key| key.at)
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }

    pub(crate) fn take_all(&mut self) -> BTreeMap<Scheduled, Action> {
        std::mem::take(&mut self.inner)
    }
}

// ── Kernel ────────────────────────────────────────────────────────────────────

/// Counters maintained by the kernel for diagnostics.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct KernelStats {
    /// Scheduled entries popped and executed.
    pub entries_executed:   u64,
    /// Events whose waiters were run.
    pub events_processed:   u64,
    pub processes_spawned:  u64,
    pub processes_finished: u64,
}

/// Why [`Simulation::run_until`] returned.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The next pending entry lies after the deadline; the clock now reads
    /// the deadline.
    DeadlineReached,
    /// Nothing left to do before the deadline.  Normal quiescence, not an
    /// error; the clock stays at the last executed entry.
    Exhausted,
}

pub(crate) struct Kernel {
    pub(crate) clock:     RefCell<SimClock>,
    pub(crate) queue:     RefCell<PendingQueue>,
    pub(crate) processes: RefCell<ProcessMap>,
    pub(crate) active:    Cell<Option<ProcessId>>,
    next_pid:             Cell<ProcessId>,
    next_event:           Cell<EventId>,
    stats:                Cell<KernelStats>,
    shutting_down:        Cell<bool>,
}

// ── Sim (context handle) ──────────────────────────────────────────────────────

/// Cloneable handle to a running kernel.
///
/// Passed to every component constructor and captured by process bodies.
/// The kernel is single-threaded (`!Send`): everything that touches it runs
/// inside the one active turn.
#[derive(Clone)]
pub struct Sim {
    pub(crate) kernel: Rc<Kernel>,
}

impl Sim {
    /// Current virtual time.
    #[inline]
    pub fn now(&self) -> SimTime {
        self.kernel.clock.borrow().now()
    }

    /// A fresh pending event bound to this kernel.
    pub fn event<T: Clone + 'static>(&self) -> Event<T> {
        Event::new(self)
    }

    /// Trigger `event` with `value` at `now + delay`.
    ///
    /// Fails with [`KernelError::DoubleFire`] if the event was already
    /// triggered, or [`KernelError::InvalidDelay`] if `delay` is negative or
    /// not finite.
    pub fn schedule<T: Clone + 'static>(
        &self,
        delay: f64,
        event: &Event<T>,
        value: T,
    ) -> KernelResult<()> {
        event.trigger_after(delay, Ok(value))
    }

    /// An event that fires `delay` time units from now.
    pub fn timeout(&self, delay: f64) -> KernelResult<Event<()>> {
        self.timeout_with(delay, ())
    }

    /// Like [`timeout`][Self::timeout] but delivers `value` when it fires.
    pub fn timeout_with<T: Clone + 'static>(&self, delay: f64, value: T) -> KernelResult<Event<T>> {
        let event = Event::new(self);
        self.schedule(delay, &event, value)?;
        Ok(event)
    }

    /// The process whose body is currently running, if any.
    #[inline]
    pub fn active_process(&self) -> Option<ProcessId> {
        self.kernel.active.get()
    }

    /// Number of entries waiting in the pending queue.
    pub fn pending_entries(&self) -> usize {
        self.kernel.queue.borrow().len()
    }

    pub fn stats(&self) -> KernelStats {
        self.kernel.stats.get()
    }

    // ── Crate-internal plumbing ───────────────────────────────────────────

    pub(crate) fn check_delay(delay: f64) -> KernelResult<()> {
        if delay.is_finite() && delay >= 0.0 {
            Ok(())
        } else {
            Err(KernelError::InvalidDelay { delay })
        }
    }

    /// Insert an entry at `now + delay`.  `delay` must already be validated.
    pub(crate) fn enqueue(&self, delay: f64, action: Action) {
        if self.kernel.shutting_down.get() {
            return;
        }
        let at = self.now().after(delay);
        self.kernel.queue.borrow_mut().push(at, action);
    }

    pub(crate) fn alloc_event_id(&self) -> EventId {
        let id = self.kernel.next_event.get();
        self.kernel.next_event.set(id.next());
        id
    }

    pub(crate) fn alloc_process_id(&self) -> ProcessId {
        let id = self.kernel.next_pid.get();
        self.kernel.next_pid.set(id.next());
        id
    }

    pub(crate) fn update_stats(&self, f: impl FnOnce(&mut KernelStats)) {
        let mut stats = self.kernel.stats.get();
        f(&mut stats);
        self.kernel.stats.set(stats);
    }
}

// ── Simulation (owner / driver) ───────────────────────────────────────────────

/// Owns a kernel and drives it.
///
/// # Example
///
/// ```rust,ignore
/// let mut simulation = Simulation::new(0.0);
/// let sim = simulation.handle();
/// sim.process(async move {
///     sim.timeout(5.0)?.wait().await?;
///     Ok(())
/// });
/// simulation.run_until(10.0)?;
/// ```
pub struct Simulation {
    sim: Sim,
}

impl Simulation {
    /// A kernel whose clock starts at `start`.
    pub fn new(start: impl Into<SimTime>) -> Self {
        Self::with_clock(SimClock::new(start.into()))
    }

    /// A kernel whose clock starts at `config.start_time`.
    pub fn from_config(config: &SimConfig) -> Self {
        Self::with_clock(config.make_clock())
    }

    fn with_clock(clock: SimClock) -> Self {
        let kernel = Kernel {
            clock:         RefCell::new(clock),
            queue:         RefCell::new(PendingQueue::default()),
            processes:     RefCell::new(ProcessMap::default()),
            active:        Cell::new(None),
            next_pid:      Cell::new(ProcessId(0)),
            next_event:    Cell::new(EventId(0)),
            stats:         Cell::new(KernelStats::default()),
            shutting_down: Cell::new(false),
        };
        Self { sim: Sim { kernel: Rc::new(kernel) } }
    }

    /// The context handle to pass to components and processes.
    pub fn handle(&self) -> Sim {
        self.sim.clone()
    }

    #[inline]
    pub fn now(&self) -> SimTime {
        self.sim.now()
    }

    /// Fire time of the next pending entry.
    pub fn peek(&self) -> Option<SimTime> {
        self.sim.kernel.queue.borrow().next_time()
    }

    pub fn stats(&self) -> KernelStats {
        self.sim.stats()
    }

    /// Execute exactly one entry.  Returns its fire time, or `None` if the
    /// queue is empty.
    pub fn step(&mut self) -> Option<SimTime> {
        let (at, action) = self
            .sim
            .kernel
            .queue
            .borrow_mut()
            .pop_due(SimTime::INFINITY)?;
        self.execute(at, action);
        Some(at)
    }

    /// Run until the next entry lies after `deadline` or nothing is left.
    ///
    /// Entries due exactly at `deadline` are executed.  When the deadline
    /// stops the run the clock is moved to `deadline`.
    pub fn run_until(&mut self, deadline: impl Into<SimTime>) -> KernelResult<RunOutcome> {
        let deadline = deadline.into();
        let now = self.now();
        if deadline < now {
            return Err(KernelError::DeadlineInPast { deadline, now });
        }

        loop {
            let next = self.sim.kernel.queue.borrow_mut().pop_due(deadline);
            match next {
                Some((at, action)) => self.execute(at, action),
                None => break,
            }
        }

        if self.peek().is_some() {
            self.sim.kernel.clock.borrow_mut().advance_to(deadline);
            tracing::debug!(time = %deadline, "deadline reached");
            Ok(RunOutcome::DeadlineReached)
        } else {
            tracing::debug!(time = %self.now(), "pending queue exhausted");
            Ok(RunOutcome::Exhausted)
        }
    }

    /// Run until the pending queue is empty.
    ///
    /// Never returns if the model keeps scheduling work forever (an arrival
    /// generator, for instance); use [`run_until`][Self::run_until] for those.
    pub fn run(&mut self) {
        while self.step().is_some() {}
    }

    fn execute(&mut self, at: SimTime, action: Action) {
        self.sim.kernel.clock.borrow_mut().advance_to(at);
        self.sim.update_stats(|s| s.entries_executed += 1);
        match action {
            Action::Process(event) => {
                tracing::trace!(time = %at, "processing event");
                event.fire();
            }
            Action::Resume(pid) => {
                tracing::trace!(time = %at, process = %pid, "resuming process");
                self.sim.resume(pid);
            }
        }
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        let kernel = &self.sim.kernel;
        kernel.shutting_down.set(true);
        // Take everything out first so that destructors running below (store
        // requests cancelling themselves, waits detaching) never observe a
        // borrowed table.
        let processes = std::mem::take(&mut *kernel.processes.borrow_mut());
        let entries = kernel.queue.borrow_mut().take_all();
        drop(processes);
        drop(entries);
    }
}
