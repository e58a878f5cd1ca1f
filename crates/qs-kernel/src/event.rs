//! One-shot events and the `Wait` future.
//!
//! # Life cycle
//!
//! ```text
//! Pending ──succeed/fail/schedule──▶ Triggered ──popped by the loop──▶ Processed
//!    └────────(conditions only)────▶ Deferred  ──popped by the loop──▶ Processed
//! ```
//!
//! Triggering only *schedules* processing; it never runs waiters inline.
//! Waiters (suspended processes and condition callbacks) run when the
//! scheduler pops the event, in the order they registered, at the event's
//! fire time.  A processed event is immutable and its waiter list is empty.
//!
//! `Deferred` events compute their outcome at processing time.  Conditions
//! use this so that every constituent processed at the same instant, before
//! the condition itself, is reported together.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll};

use qs_core::{EventId, ProcessId};

use crate::scheduler::Action;
use crate::{Fault, KernelError, KernelResult, Outcome, Sim};

// ── Internal traits ───────────────────────────────────────────────────────────

/// Entry point used by the scheduler to process a due event.
pub(crate) trait Fire {
    fn fire(&self);
}

/// Type-erased view of an event, used by conditions and by interruption.
pub(crate) trait Waitable {
    fn is_processed(&self) -> bool;
    fn is_failed(&self) -> bool;
    /// Run `f` when the event is processed.  Returns a handle for
    /// [`detach_callback`][Self::detach_callback].
    fn add_callback(&self, f: Box<dyn FnOnce()>) -> u64;
    fn detach_callback(&self, id: u64);
    fn detach_process(&self, pid: ProcessId);
}

// ── Event state ───────────────────────────────────────────────────────────────

enum State<T> {
    Pending,
    Triggered(Outcome<T>),
    Deferred(Box<dyn FnOnce() -> Outcome<T>>),
    Processed(Outcome<T>),
}

enum Waiter<T> {
    Process(ProcessId),
    Callback {
        id: u64,
        f:  Box<dyn FnOnce(&Outcome<T>)>,
    },
}

pub(crate) struct EventCore<T> {
    id:            EventId,
    sim:           Sim,
    state:         RefCell<State<T>>,
    waiters:       RefCell<Vec<Waiter<T>>>,
    next_callback: Cell<u64>,
}

// ── Event ─────────────────────────────────────────────────────────────────────

/// A one-shot, value-carrying synchronization point.
///
/// Cloning an `Event` clones the handle, not the event.
pub struct Event<T> {
    core: Rc<EventCore<T>>,
}

impl<T> Clone for Event<T> {
    fn clone(&self) -> Self {
        Self { core: Rc::clone(&self.core) }
    }
}

impl<T> std::fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Event").field(&self.core.id).finish()
    }
}

impl<T: Clone + 'static> Event<T> {
    /// A fresh pending event bound to `sim`.
    pub fn new(sim: &Sim) -> Self {
        let core = EventCore {
            id:            sim.alloc_event_id(),
            sim:           sim.clone(),
            state:         RefCell::new(State::Pending),
            waiters:       RefCell::new(Vec::new()),
            next_callback: Cell::new(0),
        };
        Self { core: Rc::new(core) }
    }

    pub fn id(&self) -> EventId {
        self.core.id
    }

    pub fn sim(&self) -> &Sim {
        &self.core.sim
    }

    /// Not yet triggered.
    pub fn is_pending(&self) -> bool {
        matches!(*self.core.state.borrow(), State::Pending)
    }

    /// Triggered or processed: `succeed`/`fail` would now fail.
    pub fn is_triggered(&self) -> bool {
        !self.is_pending()
    }

    /// Fired: its waiters have run.
    pub fn is_processed(&self) -> bool {
        matches!(*self.core.state.borrow(), State::Processed(_))
    }

    /// The outcome delivered to waiters, once processed.
    pub fn value(&self) -> Option<Outcome<T>> {
        match &*self.core.state.borrow() {
            State::Processed(outcome) => Some(outcome.clone()),
            _ => None,
        }
    }

    /// Fire the event with `value` at the current time.
    pub fn succeed(&self, value: T) -> KernelResult<()> {
        self.trigger(Ok(value))
    }

    /// Fire the event with a failure at the current time.
    pub fn fail(&self, fault: Fault) -> KernelResult<()> {
        self.trigger(Err(fault))
    }

    /// Suspend the running process until this event is processed.
    pub fn wait(&self) -> Wait<T> {
        Wait { event: self.clone(), state: WaitState::Idle }
    }

    // ── Crate-internal ────────────────────────────────────────────────────

    pub(crate) fn trigger(&self, outcome: Outcome<T>) -> KernelResult<()> {
        self.trigger_after(0.0, outcome)
    }

    pub(crate) fn trigger_after(&self, delay: f64, outcome: Outcome<T>) -> KernelResult<()> {
        Sim::check_delay(delay)?;
        self.set_state(State::Triggered(outcome))?;
        let fire: Rc<dyn Fire> = self.core.clone();
        self.core.sim.enqueue(delay, Action::Process(fire));
        Ok(())
    }

    /// Schedule processing now, computing the outcome when processed.
    pub(crate) fn trigger_deferred(
        &self,
        build: impl FnOnce() -> Outcome<T> + 'static,
    ) -> KernelResult<()> {
        self.set_state(State::Deferred(Box::new(build)))?;
        let fire: Rc<dyn Fire> = self.core.clone();
        self.core.sim.enqueue(0.0, Action::Process(fire));
        Ok(())
    }

    /// The outcome of a triggered or processed event, without waiting.
    pub(crate) fn settled(&self) -> Option<Outcome<T>> {
        match &*self.core.state.borrow() {
            State::Triggered(outcome) | State::Processed(outcome) => Some(outcome.clone()),
            State::Pending | State::Deferred(_) => None,
        }
    }

    pub(crate) fn downgrade(&self) -> WeakEvent<T> {
        WeakEvent { core: Rc::downgrade(&self.core) }
    }

    pub(crate) fn as_waitable(&self) -> Rc<dyn Waitable> {
        self.core.clone()
    }

    fn set_state(&self, next: State<T>) -> KernelResult<()> {
        let mut state = self.core.state.borrow_mut();
        if !matches!(*state, State::Pending) {
            return Err(KernelError::DoubleFire { event: self.core.id });
        }
        *state = next;
        Ok(())
    }
}

/// Non-owning event handle held by conditions.
pub(crate) struct WeakEvent<T> {
    core: Weak<EventCore<T>>,
}

impl<T: Clone + 'static> WeakEvent<T> {
    pub(crate) fn upgrade(&self) -> Option<Event<T>> {
        self.core.upgrade().map(|core| Event { core })
    }
}

// ── Processing ────────────────────────────────────────────────────────────────

impl<T: Clone + 'static> Fire for EventCore<T> {
    fn fire(&self) {
        // Move the state out before building a deferred outcome so that the
        // builder never runs under this event's borrow.
        let taken = std::mem::replace(&mut *self.state.borrow_mut(), State::Pending);
        let outcome = match taken {
            State::Triggered(outcome) => outcome,
            State::Deferred(build) => build(),
            other => {
                debug_assert!(false, "{} processed without being triggered", self.id);
                *self.state.borrow_mut() = other;
                return;
            }
        };
        *self.state.borrow_mut() = State::Processed(outcome.clone());
        self.sim.update_stats(|s| s.events_processed += 1);

        let waiters = std::mem::take(&mut *self.waiters.borrow_mut());
        if waiters.is_empty() {
            if let Err(fault) = &outcome {
                tracing::warn!(event = %self.id, %fault, "failure with no waiters");
            }
            return;
        }
        for waiter in waiters {
            match waiter {
                Waiter::Process(pid) => self.sim.resume(pid),
                Waiter::Callback { f, .. } => f(&outcome),
            }
        }
    }
}

impl<T: Clone + 'static> Waitable for EventCore<T> {
    fn is_processed(&self) -> bool {
        matches!(*self.state.borrow(), State::Processed(_))
    }

    fn is_failed(&self) -> bool {
        matches!(*self.state.borrow(), State::Processed(Err(_)))
    }

    fn add_callback(&self, f: Box<dyn FnOnce()>) -> u64 {
        let id = self.next_callback.get();
        self.next_callback.set(id + 1);
        self.waiters.borrow_mut().push(Waiter::Callback { id, f: Box::new(move |_| f()) });
        id
    }

    fn detach_callback(&self, id: u64) {
        self.waiters
            .borrow_mut()
            .retain(|w| !matches!(w, Waiter::Callback { id: other, .. } if *other == id));
    }

    fn detach_process(&self, pid: ProcessId) {
        self.waiters
            .borrow_mut()
            .retain(|w| !matches!(w, Waiter::Process(other) if *other == pid));
    }
}

// ── Wait future ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum WaitState {
    /// Not yet polled.
    Idle,
    /// Registered as a waiter on a pending event.
    Registered(ProcessId),
    /// The event was already processed; a resumption was scheduled for now.
    Yielded(ProcessId),
    Done,
}

/// Future returned by [`Event::wait`].
///
/// Resolves to the event's outcome, or to [`Fault::Interrupt`] if the
/// waiting process is interrupted first.
///
/// # Panics
///
/// Polling a `Wait` outside a process started with
/// [`Sim::process`][crate::Sim::process] panics.
#[must_use = "a Wait does nothing unless awaited"]
pub struct Wait<T: Clone + 'static> {
    event: Event<T>,
    state: WaitState,
}

impl<T: Clone + 'static> Future for Wait<T> {
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Outcome<T>> {
        let this = self.get_mut();
        let sim = this.event.core.sim.clone();
        let Some(pid) = sim.active_process() else {
            panic!("{} awaited outside a simulation process", this.event.id());
        };

        if let Some(interrupt) = sim.take_interrupt(pid) {
            if let WaitState::Registered(_) = this.state {
                this.event.core.detach_process(pid);
            }
            this.state = WaitState::Done;
            sim.set_awaiting(pid, None);
            return Poll::Ready(Err(Fault::Interrupt(interrupt)));
        }

        match this.state {
            WaitState::Idle => {
                let id = this.event.id();
                if this.event.is_processed() {
                    // Never continue inline: yield and come back at `now`.
                    this.state = WaitState::Yielded(pid);
                    sim.set_awaiting(pid, Some((id, None)));
                    sim.enqueue(0.0, Action::Resume(pid));
                } else {
                    this.event.core.waiters.borrow_mut().push(Waiter::Process(pid));
                    this.state = WaitState::Registered(pid);
                    sim.set_awaiting(pid, Some((id, Some(this.event.as_waitable()))));
                }
                Poll::Pending
            }
            WaitState::Registered(_) | WaitState::Yielded(_) | WaitState::Done => {
                match this.event.value() {
                    Some(outcome) => {
                        this.state = WaitState::Done;
                        sim.set_awaiting(pid, None);
                        Poll::Ready(outcome)
                    }
                    None => Poll::Pending,
                }
            }
        }
    }
}

impl<T: Clone + 'static> Drop for Wait<T> {
    fn drop(&mut self) {
        if let WaitState::Registered(pid) = self.state {
            if !self.event.is_processed() {
                self.event.core.detach_process(pid);
            }
        }
    }
}
