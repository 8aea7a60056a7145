//! Core types for offset lists and their evaluation.

use crate::time::EpochSeconds;
use heapless::String;

/// Maximum length in bytes of a time zone name.
pub const TIME_ZONE_NAME_MAX_LEN: usize = 64;

/// Activation value meaning "eligible as soon as the list is loaded".
pub const ALWAYS_VALID: EpochSeconds = 0;

/// Common view over time zone and DST entries used by list validation and evaluation.
pub trait ValidityEntry: Clone {
    /// Whether entries of this kind can carry an expiry.
    const HAS_EXPIRY: bool;

    /// Offset in seconds applied while this entry is current.
    fn offset(&self) -> i32;

    /// Time at and after which this entry is eligible.
    fn activation(&self) -> EpochSeconds;

    /// Time at which this entry stops applying, `None` if open-ended.
    fn expiry(&self) -> Option<EpochSeconds>;
}

/// A time zone offset with the time it takes effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeZoneEntry {
    /// Offset from UTC in seconds.
    pub offset: i32,

    /// When this offset takes effect.
    pub valid_at: EpochSeconds,

    /// Human-readable label, e.g. "Europe/Copenhagen".
    pub name: Option<String<TIME_ZONE_NAME_MAX_LEN>>,
}

impl TimeZoneEntry {
    /// Creates an unnamed time zone entry.
    #[inline]
    pub fn new(offset: i32, valid_at: EpochSeconds) -> Self {
        Self {
            offset,
            valid_at,
            name: None,
        }
    }

    /// Creates a named time zone entry.
    ///
    /// # Errors
    /// `InvalidArgument(NameTooLong)` if `name` exceeds [`TIME_ZONE_NAME_MAX_LEN`] bytes.
    pub fn named(offset: i32, valid_at: EpochSeconds, name: &str) -> Result<Self, TimeSyncError> {
        let name = String::try_from(name)
            .map_err(|_| TimeSyncError::InvalidArgument(ListViolation::NameTooLong))?;

        Ok(Self {
            offset,
            valid_at,
            name: Some(name),
        })
    }

    /// Returns the name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl ValidityEntry for TimeZoneEntry {
    const HAS_EXPIRY: bool = false;

    fn offset(&self) -> i32 {
        self.offset
    }

    fn activation(&self) -> EpochSeconds {
        self.valid_at
    }

    fn expiry(&self) -> Option<EpochSeconds> {
        None
    }
}

/// A daylight saving offset with its validity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DstOffsetEntry {
    /// Offset added on top of the time zone offset, in seconds.
    pub offset: i32,

    /// When this offset starts applying.
    pub valid_starting: EpochSeconds,

    /// When this offset stops applying. `None` means it never does.
    pub valid_until: Option<EpochSeconds>,
}

impl DstOffsetEntry {
    /// Creates a new DST entry.
    #[inline]
    pub fn new(offset: i32, valid_starting: EpochSeconds, valid_until: Option<EpochSeconds>) -> Self {
        Self {
            offset,
            valid_starting,
            valid_until,
        }
    }
}

impl ValidityEntry for DstOffsetEntry {
    const HAS_EXPIRY: bool = true;

    fn offset(&self) -> i32 {
        self.offset
    }

    fn activation(&self) -> EpochSeconds {
        self.valid_starting
    }

    fn expiry(&self) -> Option<EpochSeconds> {
        self.valid_until
    }
}

/// Lifecycle state of an offset list at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeState {
    /// No entry applies.
    Invalid,
    /// An entry applies and a later transition is still pending.
    Active,
    /// The applicable entry just changed, or the previous one lapsed.
    Changed,
    /// A permanent entry applies. Nothing further will change without a new list.
    Stopped,
}

/// Result of evaluating a list at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Evaluation {
    /// Index of the entry currently in effect.
    pub active: Option<usize>,

    /// Overall state of the list.
    pub state: TimeState,
}

impl Evaluation {
    /// Evaluation of a list with nothing in effect.
    pub const INVALID: Self = Self {
        active: None,
        state: TimeState::Invalid,
    };
}

/// Reasons an argument was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ListViolation {
    /// More entries than the list can hold.
    CapacityExceeded,

    /// More than one entry uses the always-valid activation.
    DuplicateSentinel,

    /// More than one DST entry has no end.
    MultipleOpenEnded,

    /// The DST entry with no end is not the last one.
    OpenEndedNotLast,

    /// A DST entry ends at or before it starts.
    InvertedWindow,

    /// A DST entry starts before the previous one ends.
    OverlappingWindows,

    /// A name or service string is too long.
    NameTooLong,

    /// A UTC reading was not accepted.
    UtcRejected,
}

/// Errors returned by time synchronization operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeSyncError {
    /// Input failed validation. Nothing was changed.
    InvalidArgument(ListViolation),

    /// Local time cannot be derived: no time zone entry is in effect.
    Unavailable,

    /// Persisted data is absent.
    NotFound,

    /// The data provider failed.
    StorageFailure,
}

impl core::fmt::Display for ListViolation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ListViolation::CapacityExceeded => write!(f, "list capacity exceeded"),
            ListViolation::DuplicateSentinel => {
                write!(f, "only one entry may be valid from list load")
            }
            ListViolation::MultipleOpenEnded => {
                write!(f, "only one DST entry may be open-ended")
            }
            ListViolation::OpenEndedNotLast => {
                write!(f, "open-ended DST entry must be the last entry")
            }
            ListViolation::InvertedWindow => {
                write!(f, "DST entry must end after it starts")
            }
            ListViolation::OverlappingWindows => {
                write!(f, "DST entry starts before the previous entry ends")
            }
            ListViolation::NameTooLong => write!(f, "name too long"),
            ListViolation::UtcRejected => write!(f, "UTC time not accepted"),
        }
    }
}

impl core::fmt::Display for TimeSyncError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TimeSyncError::InvalidArgument(violation) => {
                write!(f, "invalid argument: {}", violation)
            }
            TimeSyncError::Unavailable => write!(f, "no time zone offset in effect"),
            TimeSyncError::NotFound => write!(f, "persisted data not found"),
            TimeSyncError::StorageFailure => write!(f, "data provider failure"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TimeSyncError {}
