//! Model observer trait for logging and data collection.

use std::cell::RefCell;
use std::rc::Rc;

use qs_core::{CustomerId, SimTime, StaffId, WindowId};

/// Callbacks invoked by the models at each domain milestone.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: counting balks
///
/// ```rust,ignore
/// struct BalkCounter(usize);
///
/// impl ModelObserver for BalkCounter {
///     fn on_balk(&mut self, _time: SimTime, _customer: CustomerId) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait ModelObserver {
    /// A customer (bank) or client (post office) walked in.
    fn on_arrival(&mut self, _time: SimTime, _customer: CustomerId) {}

    /// A staff member started serving a customer.
    fn on_service_start(&mut self, _time: SimTime, _customer: CustomerId, _staff: StaffId) {}

    /// A staff member finished serving a customer.
    fn on_service_end(&mut self, _time: SimTime, _customer: CustomerId, _staff: StaffId) {}

    /// A customer ran out of patience and left unserved.
    fn on_balk(&mut self, _time: SimTime, _customer: CustomerId) {}

    /// A staff member started a shift.
    fn on_staff_on_duty(&mut self, _time: SimTime, _staff: StaffId) {}

    /// A staff member went off duty (shift over, no customer in hand).
    fn on_staff_off_duty(&mut self, _time: SimTime, _staff: StaffId) {}

    /// A post-office window opened for a shift.
    fn on_window_open(&mut self, _time: SimTime, _window: WindowId) {}

    /// A post-office window started serving a client.
    fn on_window_busy(&mut self, _time: SimTime, _window: WindowId, _client: CustomerId) {}

    /// A post-office window finished with a client.
    fn on_window_free(&mut self, _time: SimTime, _window: WindowId) {}

    /// A post-office window closed at the end of its shift.
    fn on_window_closed(&mut self, _time: SimTime, _window: WindowId) {}
}

/// A [`ModelObserver`] that does nothing.
pub struct NoopObserver;

impl ModelObserver for NoopObserver {}

/// A [`ModelObserver`] that emits one `tracing` event per milestone at
/// `info` level.  This is the default observer of the model builders.
pub struct TraceObserver;

impl ModelObserver for TraceObserver {
    fn on_arrival(&mut self, time: SimTime, customer: CustomerId) {
        tracing::info!(%time, %customer, "arrives");
    }

    fn on_service_start(&mut self, time: SimTime, customer: CustomerId, staff: StaffId) {
        tracing::info!(%time, %staff, %customer, "starts service");
    }

    fn on_service_end(&mut self, time: SimTime, customer: CustomerId, staff: StaffId) {
        tracing::info!(%time, %staff, %customer, "ends service");
    }

    fn on_balk(&mut self, time: SimTime, customer: CustomerId) {
        tracing::info!(%time, %customer, "is gone");
    }

    fn on_staff_on_duty(&mut self, time: SimTime, staff: StaffId) {
        tracing::info!(%time, %staff, "works");
    }

    fn on_staff_off_duty(&mut self, time: SimTime, staff: StaffId) {
        tracing::info!(%time, %staff, "relaxes");
    }

    fn on_window_open(&mut self, time: SimTime, window: WindowId) {
        tracing::info!(%time, %window, "open");
    }

    fn on_window_busy(&mut self, time: SimTime, window: WindowId, client: CustomerId) {
        tracing::info!(%time, %window, %client, "busy");
    }

    fn on_window_free(&mut self, time: SimTime, window: WindowId) {
        tracing::info!(%time, %window, "free");
    }

    fn on_window_closed(&mut self, time: SimTime, window: WindowId) {
        tracing::info!(%time, %window, "closed");
    }
}

/// Share an observer with the caller, who keeps a clone of the `Rc` to read
/// it back after the run.
impl<O: ModelObserver + ?Sized> ModelObserver for Rc<RefCell<O>> {
    fn on_arrival(&mut self, time: SimTime, customer: CustomerId) {
        self.borrow_mut().on_arrival(time, customer);
    }

    fn on_service_start(&mut self, time: SimTime, customer: CustomerId, staff: StaffId) {
        self.borrow_mut().on_service_start(time, customer, staff);
    }

    fn on_service_end(&mut self, time: SimTime, customer: CustomerId, staff: StaffId) {
        self.borrow_mut().on_service_end(time, customer, staff);
    }

    fn on_balk(&mut self, time: SimTime, customer: CustomerId) {
        self.borrow_mut().on_balk(time, customer);
    }

    fn on_staff_on_duty(&mut self, time: SimTime, staff: StaffId) {
        self.borrow_mut().on_staff_on_duty(time, staff);
    }

    fn on_staff_off_duty(&mut self, time: SimTime, staff: StaffId) {
        self.borrow_mut().on_staff_off_duty(time, staff);
    }

    fn on_window_open(&mut self, time: SimTime, window: WindowId) {
        self.borrow_mut().on_window_open(time, window);
    }

    fn on_window_busy(&mut self, time: SimTime, window: WindowId, client: CustomerId) {
        self.borrow_mut().on_window_busy(time, window, client);
    }

    fn on_window_free(&mut self, time: SimTime, window: WindowId) {
        self.borrow_mut().on_window_free(time, window);
    }

    fn on_window_closed(&mut self, time: SimTime, window: WindowId) {
        self.borrow_mut().on_window_closed(time, window);
    }
}
