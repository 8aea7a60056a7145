//! Sticky event flags for the cluster logic to turn into events.

use bitflags::bitflags;

bitflags! {
    /// Transitions that occurred since the consumer last cleared them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EventFlags: u8 {
        /// The DST list became empty.
        const DST_TABLE_EMPTY = 0b0000_0001;
        /// The DST offset in effect changed.
        const DST_STATUS = 0b0000_0010;
        /// The time zone offset in effect changed.
        const TIME_ZONE_STATUS = 0b0000_0100;
        /// A UTC reading could not be established.
        const TIME_FAILURE = 0b0000_1000;
        /// Local time was requested with neither a trusted source nor a UTC reading.
        const MISSING_TRUSTED_TIME_SOURCE = 0b0001_0000;
    }
}

/// Accumulates [`EventFlags`] until explicitly cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFlagRegister {
    flags: EventFlags,
}

impl EventFlagRegister {
    /// Creates a register with no flags raised.
    pub const fn new() -> Self {
        Self {
            flags: EventFlags::empty(),
        }
    }

    /// Raises `flags`. Raising an already raised flag has no further effect.
    pub fn raise(&mut self, flags: EventFlags) {
        self.flags.insert(flags);
    }

    /// Clears exactly `flags`, leaving every other flag as it was.
    pub fn clear(&mut self, flags: EventFlags) {
        self.flags.remove(flags);
    }

    /// Returns true if all of `flags` are raised.
    pub fn is_raised(&self, flags: EventFlags) -> bool {
        self.flags.contains(flags)
    }

    /// Returns the raised flags without clearing them.
    pub fn snapshot(&self) -> EventFlags {
        self.flags
    }
}
