//! Time abstractions: wall clock trait, UTC quality and provenance.

/// Seconds since the Unix epoch.
pub type EpochSeconds = u64;

/// Trait for abstracting the device's wall clock.
pub trait Clock {
    /// Returns the current UTC time, or `None` if the device does not know it.
    fn now(&self) -> Option<EpochSeconds>;
}

/// How precisely the device's UTC time is known.
///
/// Variants are ordered from coarsest to finest, so `a < b` means `b` is
/// the better reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Granularity {
    /// UTC time is not known.
    #[default]
    NoTime,
    /// Accurate to the minute.
    Minutes,
    /// Accurate to the second.
    Seconds,
    /// Accurate to the millisecond.
    Milliseconds,
    /// Accurate to the microsecond.
    Microseconds,
}

/// Where the last accepted UTC reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UtcSource {
    /// No reading has been accepted.
    #[default]
    None,
    Unknown,
    /// Entered by an administrator.
    Admin,
    /// Read from a peer's time synchronization cluster.
    NodeTimeCluster,
    NonMatterSntp,
    NonMatterNtp,
    MatterSntp,
    MatterNtp,
    MixedNtp,
    CloudSource,
    /// Precision Time Protocol.
    Ptp,
    /// Satellite navigation receiver.
    Gnss,
}
