//! Processes: suspendable units of logic driven by the kernel.
//!
//! A process body is an `async` block returning [`Outcome<T>`].  The kernel
//! polls it with a no-op waker; the only suspension points are the kernel's
//! own futures ([`Wait`][crate::Wait] and the store request futures), which
//! register the running process as a waiter on some event.  When that event
//! is processed the scheduler polls the body again.  Nothing else ever wakes
//! a process, so there is exactly one driver and no re-entrant polling.
//!
//! Every process is also an event: its completion event succeeds with the
//! body's return value or fails with its fault, so processes can wait on
//! each other.
//!
//! # Interruption
//!
//! [`Sim::interrupt`] queues an [`Interrupt`] on the target, removes the
//! target from the waiter list of whatever it is awaiting (the awaited event
//! itself is untouched and still fires for everyone else) and schedules a
//! resumption at the current time.  The target's pending wait then resolves
//! to `Err(Fault::Interrupt(..))`, which the body may handle or propagate.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use qs_core::{EventId, ProcessId};

use crate::event::Waitable;
use crate::scheduler::Action;
use crate::{Event, Fault, Interrupt, KernelError, KernelResult, Outcome, Sim, Wait};

#[cfg(not(feature = "fx-hash"))]
pub(crate) type ProcessMap = std::collections::HashMap<ProcessId, ProcessSlot>;

#[cfg(feature = "fx-hash")]
pub(crate) type ProcessMap = rustc_hash::FxHashMap<ProcessId, ProcessSlot>;

type Body = Pin<Box<dyn Future<Output = Result<(), Fault>>>>;

// ── ProcessState ──────────────────────────────────────────────────────────────

/// Where a process is in its life cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProcessState {
    /// Spawned; its first resumption is scheduled but has not run.
    Pending,
    /// Suspended on an event.
    Suspended { awaiting: EventId },
    /// Its body is being polled right now.
    Running,
    /// An interrupt is queued and will be delivered at the next resumption.
    Interrupted,
    /// The body returned `Ok`.
    Done,
    /// The body returned `Err`.
    Failed,
}

impl ProcessState {
    pub fn is_alive(self) -> bool {
        !matches!(self, ProcessState::Done | ProcessState::Failed)
    }
}

// ── ProcessSlot ───────────────────────────────────────────────────────────────

/// What a suspended process is waiting on.  The `Waitable` is absent when
/// the event had already been processed and a plain resumption was
/// scheduled instead of a waiter registration.
type Awaiting = (EventId, Option<Rc<dyn Waitable>>);

pub(crate) struct ProcessSlot {
    body:       Option<Body>,
    state:      ProcessState,
    awaiting:   Option<Awaiting>,
    interrupts: VecDeque<Interrupt>,
}

// ── Process handle ────────────────────────────────────────────────────────────

/// Handle to a spawned process.
pub struct Process<T> {
    id:   ProcessId,
    done: Event<T>,
}

impl<T> Clone for Process<T> {
    fn clone(&self) -> Self {
        Self { id: self.id, done: self.done.clone() }
    }
}

impl<T: Clone + 'static> Process<T> {
    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// The completion event.
    pub fn event(&self) -> &Event<T> {
        &self.done
    }

    /// Suspend the running process until this one finishes.
    pub fn wait(&self) -> Wait<T> {
        self.done.wait()
    }

    pub fn state(&self) -> ProcessState {
        self.done.sim().process_state(self.id).unwrap_or(ProcessState::Done)
    }

    pub fn is_alive(&self) -> bool {
        self.state().is_alive()
    }

    /// Shorthand for [`Sim::interrupt`].
    pub fn interrupt(&self, cause: impl Into<String>) -> KernelResult<()> {
        self.done.sim().interrupt(self.id, cause)
    }
}

// ── Sim: process management ───────────────────────────────────────────────────

impl Sim {
    /// Start a process.  Its body first runs at the current time, after
    /// every entry already scheduled for now.
    pub fn process<T, F>(&self, body: F) -> Process<T>
    where
        T: Clone + 'static,
        F: Future<Output = Outcome<T>> + 'static,
    {
        let id = self.alloc_process_id();
        let done: Event<T> = Event::new(self);
        let finish = done.clone();
        let wrapped: Body = Box::pin(async move {
            let outcome = body.await;
            let fault = outcome.as_ref().err().cloned();
            finish.trigger(outcome)?;
            match fault {
                Some(fault) => Err(fault),
                None => Ok(()),
            }
        });

        self.kernel.processes.borrow_mut().insert(
            id,
            ProcessSlot {
                body:       Some(wrapped),
                state:      ProcessState::Pending,
                awaiting:   None,
                interrupts: VecDeque::new(),
            },
        );
        self.enqueue(0.0, Action::Resume(id));
        self.update_stats(|s| s.processes_spawned += 1);
        tracing::debug!(time = %self.now(), process = %id, "process spawned");

        Process { id, done }
    }

    /// Interrupt process `id` with `cause`.
    ///
    /// The interruption is delivered at the target's next resumption, which
    /// is scheduled for the current time.
    pub fn interrupt(&self, id: ProcessId, cause: impl Into<String>) -> KernelResult<()> {
        if self.active_process() == Some(id) {
            return Err(KernelError::SelfInterrupt(id));
        }

        let awaiting = {
            let mut processes = self.kernel.processes.borrow_mut();
            let slot = processes.get_mut(&id).ok_or(KernelError::UnknownProcess(id))?;
            if !slot.state.is_alive() {
                return Err(KernelError::ProcessFinished(id));
            }
            slot.interrupts.push_back(Interrupt { cause: cause.into() });
            slot.state = ProcessState::Interrupted;
            slot.awaiting.take()
        };

        if let Some((_, Some(event))) = awaiting {
            event.detach_process(id);
        }
        self.enqueue(0.0, Action::Resume(id));
        tracing::debug!(time = %self.now(), process = %id, "process interrupted");
        Ok(())
    }

    /// Life-cycle state of process `id`, or `None` if it never existed.
    pub fn process_state(&self, id: ProcessId) -> Option<ProcessState> {
        self.kernel.processes.borrow().get(&id).map(|slot| slot.state)
    }

    // ── Crate-internal ────────────────────────────────────────────────────

    /// Poll process `id` until its next yield.
    pub(crate) fn resume(&self, id: ProcessId) {
        let mut body = {
            let mut processes = self.kernel.processes.borrow_mut();
            let Some(slot) = processes.get_mut(&id) else {
                return;
            };
            // Finished, or already on the stack.
            let Some(body) = slot.body.take() else {
                return;
            };
            slot.state = ProcessState::Running;
            body
        };

        let previous = self.kernel.active.replace(Some(id));
        let mut cx = Context::from_waker(Waker::noop());
        let poll = body.as_mut().poll(&mut cx);
        self.kernel.active.set(previous);

        let mut processes = self.kernel.processes.borrow_mut();
        let Some(slot) = processes.get_mut(&id) else {
            return;
        };
        match poll {
            Poll::Pending => {
                slot.body = Some(body);
                slot.state = if !slot.interrupts.is_empty() {
                    ProcessState::Interrupted
                } else {
                    match &slot.awaiting {
                        Some((event, _)) => ProcessState::Suspended { awaiting: *event },
                        None => ProcessState::Pending,
                    }
                };
            }
            Poll::Ready(result) => {
                slot.awaiting = None;
                slot.interrupts.clear();
                slot.state = match &result {
                    Ok(()) => ProcessState::Done,
                    Err(_) => ProcessState::Failed,
                };
                drop(processes);
                self.update_stats(|s| s.processes_finished += 1);
                match result {
                    Ok(()) => tracing::debug!(time = %self.now(), process = %id, "process done"),
                    Err(fault) => {
                        tracing::debug!(time = %self.now(), process = %id, %fault, "process failed")
                    }
                }
            }
        }
    }

    pub(crate) fn take_interrupt(&self, id: ProcessId) -> Option<Interrupt> {
        self.kernel
            .processes
            .borrow_mut()
            .get_mut(&id)
            .and_then(|slot| slot.interrupts.pop_front())
    }

    pub(crate) fn set_awaiting(&self, id: ProcessId, awaiting: Option<Awaiting>) {
        if let Some(slot) = self.kernel.processes.borrow_mut().get_mut(&id) {
            slot.awaiting = awaiting;
        }
    }
}
