//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  Kernel IDs (`ProcessId`,
//! `EventId`) are allocated sequentially by the kernel; domain IDs
//! (`StaffId`, `CustomerId`, `WindowId`) are allocated by the models and start
//! at 1 to match how staff and customers are numbered in reports.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// The ID that follows `self` in allocation order.
            #[inline(always)]
            pub fn next(self) -> $name {
                $name(self.0 + 1)
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

typed_id! {
    /// A kernel process (suspendable unit of logic).
    pub struct ProcessId(u32);
}

typed_id! {
    /// A kernel event.  `u64` because every timeout allocates one.
    pub struct EventId(u64);
}

typed_id! {
    /// A staff member (bank worker).
    pub struct StaffId(u32);
}

typed_id! {
    /// A customer (bank client or post-office client).
    pub struct CustomerId(u32);
}

typed_id! {
    /// A post-office service window.
    pub struct WindowId(u32);
}
