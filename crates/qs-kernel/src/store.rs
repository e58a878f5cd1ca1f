//! FIFO resource store with cancellable requests.
//!
//! A [`Store`] holds interchangeable or distinguishable items (staff
//! tokens, chargers, ...).  Producers [`put`][Store::put] items in,
//! consumers [`get`][Store::get] them out.  Both sides queue in arrival
//! order:
//!
//! - a put is accepted as soon as the inventory is below capacity;
//! - a get is granted the oldest available item as soon as there is one.
//!
//! Granting happens at request time (or when an item arrives), but the
//! grant is delivered through an event, so the requester only observes it
//! when that event is processed.
//!
//! # Cancellation
//!
//! A get that loses a race must not swallow an item.  [`StoreGet`] owns its
//! request: dropping it (or calling [`StoreGet::cancel`]) removes a pending
//! request from the queue, and returns an item that was granted but never
//! claimed to the *front* of the inventory, where the next getter receives
//! it.  A restored item may push the inventory above capacity for a moment;
//! puts stay blocked until it drains.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::{Event, KernelError, Outcome, Sim};

struct StoreState<T> {
    items:        VecDeque<T>,
    gets:         VecDeque<(u64, Event<T>)>,
    puts:         VecDeque<(Event<()>, T)>,
    next_request: u64,
}

struct StoreInner<T> {
    sim:      Sim,
    capacity: usize,
    state:    RefCell<StoreState<T>>,
}

/// A bounded FIFO store of items of type `T`.
///
/// Cloning a `Store` clones the handle.
pub struct Store<T> {
    inner: Rc<StoreInner<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<T: Clone + 'static> Store<T> {
    /// A store holding at most `capacity` items.
    pub fn new(sim: &Sim, capacity: usize) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                sim: sim.clone(),
                capacity,
                state: RefCell::new(StoreState {
                    items:        VecDeque::new(),
                    gets:         VecDeque::new(),
                    puts:         VecDeque::new(),
                    next_request: 0,
                }),
            }),
        }
    }

    pub fn unbounded(sim: &Sim) -> Self {
        Self::new(sim, usize::MAX)
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Items currently available.
    pub fn len(&self) -> usize {
        self.inner.state.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gets still waiting for an item.
    pub fn pending_gets(&self) -> usize {
        self.inner.state.borrow().gets.len()
    }

    /// Puts still waiting for room.
    pub fn pending_puts(&self) -> usize {
        self.inner.state.borrow().puts.len()
    }

    /// Snapshot of the available items, oldest first.
    pub fn items(&self) -> Vec<T> {
        self.inner.state.borrow().items.iter().cloned().collect()
    }

    /// Offer `item`.  The returned event fires once the store has accepted it.
    pub fn put(&self, item: T) -> Event<()> {
        let accepted = Event::new(&self.inner.sim);
        self.inner.state.borrow_mut().puts.push_back((accepted.clone(), item));
        self.dispatch();
        accepted
    }

    /// Request the oldest available item.
    ///
    /// The request joins the back of the getter queue immediately; await
    /// [`StoreGet::wait`] or race [`StoreGet::event`] against something else.
    pub fn get(&self) -> StoreGet<T> {
        self.request(false)
    }

    /// Like [`get`][Store::get], but the request joins the *front* of the
    /// getter queue.  For a getter that discarded the item it drew and asks
    /// again without losing its place.
    pub fn get_first(&self) -> StoreGet<T> {
        self.request(true)
    }

    fn request(&self, front: bool) -> StoreGet<T> {
        let event = Event::new(&self.inner.sim);
        let id = {
            let mut state = self.inner.state.borrow_mut();
            let id = state.next_request;
            state.next_request += 1;
            if front {
                state.gets.push_front((id, event.clone()));
            } else {
                state.gets.push_back((id, event.clone()));
            }
            id
        };
        self.dispatch();
        StoreGet { store: self.clone(), id, event, claimed: false }
    }

    /// Remove and return the first available item matching `pred`.
    ///
    /// Items already granted to a getter are no longer available and are
    /// never matched.
    pub fn withdraw(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        let item = {
            let mut state = self.inner.state.borrow_mut();
            let index = state.items.iter().position(|item| pred(item))?;
            state.items.remove(index)
        };
        self.dispatch();
        item
    }

    /// Accept waiting puts and grant waiting gets until neither can proceed.
    fn dispatch(&self) {
        let mut accepted = Vec::new();
        let mut granted = Vec::new();
        {
            let mut state = self.inner.state.borrow_mut();
            loop {
                let mut progress = false;
                while state.items.len() < self.inner.capacity {
                    let Some((event, item)) = state.puts.pop_front() else {
                        break;
                    };
                    state.items.push_back(item);
                    accepted.push(event);
                    progress = true;
                }
                while !state.items.is_empty() {
                    let Some((id, event)) = state.gets.pop_front() else {
                        break;
                    };
                    if let Some(item) = state.items.pop_front() {
                        granted.push((id, event, item));
                        progress = true;
                    }
                }
                if !progress {
                    break;
                }
            }
            debug_assert!(
                state.gets.is_empty() || state.items.is_empty(),
                "store has both waiting getters and available items"
            );
        }

        for event in accepted {
            if let Err(err) = event.succeed(()) {
                tracing::warn!(%err, "store put acknowledged twice");
            }
        }
        for (id, event, item) in granted {
            tracing::debug!(time = %self.inner.sim.now(), request = id, "store get granted");
            if event.succeed(item).is_err() {
                let err = KernelError::StaleWaiter { request: id, event: event.id() };
                tracing::warn!(%err, "store grant dropped");
                debug_assert!(false, "{err}");
            }
        }
    }

    /// Put a granted-but-unclaimed item back at the front of the inventory.
    fn restore(&self, item: T) {
        self.inner.state.borrow_mut().items.push_front(item);
        self.dispatch();
    }

    /// Drop a request that was never granted.
    fn withdraw_request(&self, id: u64) -> bool {
        let mut state = self.inner.state.borrow_mut();
        match state.gets.iter().position(|(request, _)| *request == id) {
            Some(index) => {
                state.gets.remove(index);
                true
            }
            None => false,
        }
    }
}

// ── StoreGet ──────────────────────────────────────────────────────────────────

/// An outstanding [`Store::get`] request.
///
/// Dropping the request without claiming its item cancels it.
#[must_use = "dropping a StoreGet cancels the request"]
pub struct StoreGet<T: Clone + 'static> {
    store:   Store<T>,
    id:      u64,
    event:   Event<T>,
    claimed: bool,
}

impl<T: Clone + 'static> StoreGet<T> {
    /// The grant event, for use with [`Sim::race`] and friends.
    pub fn event(&self) -> &Event<T> {
        &self.event
    }

    /// An item has been reserved for this request.
    pub fn is_granted(&self) -> bool {
        self.event.is_triggered()
    }

    /// Suspend the running process until the item is granted, and take it.
    ///
    /// If the wait is interrupted the request is cancelled.
    pub async fn wait(mut self) -> Outcome<T> {
        let outcome = self.event.wait().await;
        if outcome.is_ok() {
            self.claimed = true;
        }
        outcome
    }

    /// Take the granted item, or `None` if none was granted yet (the request
    /// is then cancelled).
    pub fn claim(mut self) -> Option<T> {
        match self.event.settled() {
            Some(Ok(item)) => {
                self.claimed = true;
                Some(item)
            }
            _ => None,
        }
    }

    /// Give up the request.  An item already granted goes back to the store.
    pub fn cancel(self) {}
}

impl<T: Clone + 'static> Drop for StoreGet<T> {
    fn drop(&mut self) {
        if self.claimed {
            return;
        }
        match self.event.settled() {
            Some(Ok(item)) => {
                tracing::debug!(
                    time = %self.store.inner.sim.now(),
                    request = self.id,
                    "unclaimed store grant restored"
                );
                self.store.restore(item);
            }
            Some(Err(_)) => {}
            None => {
                if !self.store.withdraw_request(self.id) {
                    let err = KernelError::StaleWaiter { request: self.id, event: self.event.id() };
                    tracing::warn!(%err, "cancelled store request was not queued");
                }
            }
        }
    }
}
