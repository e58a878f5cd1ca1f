//! Condition combinators: race two events, or wait for any/all of N.
//!
//! A condition is an ordinary [`Event`] plus bookkeeping.  It registers a
//! callback on each constituent; the first callback that finds the
//! condition satisfied triggers it *deferred*, so its value is assembled
//! when the condition itself is processed.  Everything processed by then
//! (including constituents firing at the same instant) is reported.
//!
//! Once resolved, the condition detaches its callbacks from the losers.  The
//! losers themselves are untouched and still fire for any other waiter.
//!
//! A constituent that fails makes the condition fail with the same fault.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::event::{WeakEvent, Waitable};
use crate::{Event, Fault, Outcome, Sim};

// ── Result types ──────────────────────────────────────────────────────────────

/// Which side(s) of a [`Sim::race`] had fired when it resolved.
#[derive(Clone, Debug, PartialEq)]
pub enum Race<A, B> {
    First(A),
    Second(B),
    /// Both fired at the same instant.
    Both(A, B),
}

impl<A, B> Race<A, B> {
    /// The first event's value, if it fired.
    pub fn first(&self) -> Option<&A> {
        match self {
            Race::First(a) | Race::Both(a, _) => Some(a),
            Race::Second(_) => None,
        }
    }

    /// The second event's value, if it fired.
    pub fn second(&self) -> Option<&B> {
        match self {
            Race::Second(b) | Race::Both(_, b) => Some(b),
            Race::First(_) => None,
        }
    }
}

/// The constituents of an [`Sim::any_of`] / [`Sim::all_of`] that had fired,
/// as `(index, value)` pairs in input order.
#[derive(Clone, Debug, PartialEq)]
pub struct AnyOf<T> {
    fired: Vec<(usize, T)>,
}

impl<T> AnyOf<T> {
    pub fn len(&self) -> usize {
        self.fired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }

    /// `true` if the constituent at `index` had fired.
    pub fn contains(&self, index: usize) -> bool {
        self.fired.iter().any(|(i, _)| *i == index)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.fired.iter().find(|(i, _)| *i == index).map(|(_, v)| v)
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.fired.iter().map(|(i, _)| *i)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(usize, T)> {
        self.fired.iter()
    }

    pub fn into_values(self) -> impl Iterator<Item = T> {
        self.fired.into_iter().map(|(_, v)| v)
    }
}

// ── Condition bookkeeping ─────────────────────────────────────────────────────

struct Condition<R> {
    result:        Event<R>,
    watched:       Vec<Weak<dyn Waitable>>,
    satisfied:     Box<dyn Fn(&[Weak<dyn Waitable>]) -> bool>,
    build:         RefCell<Option<Box<dyn FnOnce() -> Outcome<R>>>>,
    registrations: RefCell<Vec<(usize, u64)>>,
}

impl<R: Clone + 'static> Condition<R> {
    fn arm(self: Rc<Self>) {
        self.check();
        if !self.result.is_pending() {
            return;
        }
        for (index, watched) in self.watched.iter().enumerate() {
            let Some(watched) = watched.upgrade() else {
                continue;
            };
            if watched.is_processed() {
                continue;
            }
            let condition = Rc::clone(&self);
            let id = watched.add_callback(Box::new(move || condition.check()));
            self.registrations.borrow_mut().push((index, id));
        }
    }

    fn check(&self) {
        if !self.result.is_pending() {
            return;
        }
        let failed = self
            .watched
            .iter()
            .any(|w| w.upgrade().is_some_and(|w| w.is_failed()));
        if !failed && !(self.satisfied)(&self.watched) {
            return;
        }
        let Some(build) = self.build.borrow_mut().take() else {
            return;
        };
        let triggered = self.result.trigger_deferred(build);
        debug_assert!(triggered.is_ok(), "condition result triggered twice");

        let registrations = std::mem::take(&mut *self.registrations.borrow_mut());
        for (index, id) in registrations {
            if let Some(watched) = self.watched[index].upgrade() {
                watched.detach_callback(id);
            }
        }
    }
}

fn processed(watched: &Weak<dyn Waitable>) -> bool {
    watched.upgrade().is_some_and(|w| w.is_processed())
}

/// Processed outcome of a constituent, `None` if it has not fired (or is gone).
fn fired<T: Clone + 'static>(event: &WeakEvent<T>) -> Option<Outcome<T>> {
    event.upgrade().and_then(|e| e.value())
}

fn erase<T: Clone + 'static>(event: &Event<T>) -> Weak<dyn Waitable> {
    Rc::downgrade(&event.as_waitable())
}

// ── Public combinators ────────────────────────────────────────────────────────

impl Sim {
    /// An event that fires as soon as `a` or `b` fires.
    ///
    /// If both have fired by the time the race is processed (same instant),
    /// the value is [`Race::Both`].
    pub fn race<A, B>(&self, a: &Event<A>, b: &Event<B>) -> Event<Race<A, B>>
    where
        A: Clone + 'static,
        B: Clone + 'static,
    {
        let (wa, wb) = (a.downgrade(), b.downgrade());
        let build = move || -> Outcome<Race<A, B>> {
            match (fired(&wa), fired(&wb)) {
                (Some(Err(fault)), _) | (_, Some(Err(fault))) => Err(fault),
                (Some(Ok(a)), Some(Ok(b))) => Ok(Race::Both(a, b)),
                (Some(Ok(a)), None) => Ok(Race::First(a)),
                (None, Some(Ok(b))) => Ok(Race::Second(b)),
                (None, None) => Err(Fault::failed("race resolved with no constituent fired")),
            }
        };
        self.condition(
            vec![erase(a), erase(b)],
            |watched| watched.iter().any(processed),
            build,
        )
    }

    /// An event that fires once at least one of `events` fires.
    ///
    /// An empty slice fires immediately with an empty [`AnyOf`].
    pub fn any_of<T: Clone + 'static>(&self, events: &[Event<T>]) -> Event<AnyOf<T>> {
        self.collect(events, |watched| {
            watched.is_empty() || watched.iter().any(processed)
        })
    }

    /// An event that fires once every one of `events` has fired.
    pub fn all_of<T: Clone + 'static>(&self, events: &[Event<T>]) -> Event<AnyOf<T>> {
        self.collect(events, |watched| watched.iter().all(processed))
    }

    fn collect<T: Clone + 'static>(
        &self,
        events: &[Event<T>],
        satisfied: impl Fn(&[Weak<dyn Waitable>]) -> bool + 'static,
    ) -> Event<AnyOf<T>> {
        let weak: Vec<WeakEvent<T>> = events.iter().map(Event::downgrade).collect();
        let build = move || -> Outcome<AnyOf<T>> {
            let mut fired_values = Vec::new();
            for (index, event) in weak.iter().enumerate() {
                match fired(event) {
                    Some(Ok(value)) => fired_values.push((index, value)),
                    Some(Err(fault)) => return Err(fault),
                    None => {}
                }
            }
            Ok(AnyOf { fired: fired_values })
        };
        self.condition(events.iter().map(erase).collect(), satisfied, build)
    }

    fn condition<R: Clone + 'static>(
        &self,
        watched: Vec<Weak<dyn Waitable>>,
        satisfied: impl Fn(&[Weak<dyn Waitable>]) -> bool + 'static,
        build: impl FnOnce() -> Outcome<R> + 'static,
    ) -> Event<R> {
        let result = Event::new(self);
        let condition = Rc::new(Condition {
            result:        result.clone(),
            watched,
            satisfied:     Box::new(satisfied),
            build:         RefCell::new(Some(Box::new(build))),
            registrations: RefCell::new(Vec::new()),
        });
        condition.arm();
        result
    }
}
