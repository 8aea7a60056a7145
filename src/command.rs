//! Command-based control of the time synchronization core.

use crate::time::{EpochSeconds, Granularity, UtcSource};
use crate::tracker::TrustedTimeSource;
use crate::types::{DstOffsetEntry, TimeZoneEntry};

/// Commands a cluster dispatcher can forward to `TimeSynchronization::handle_command`.
#[derive(Debug, Clone, Copy)]
pub enum TimeSyncCommand<'a> {
    /// Record a UTC reading.
    SetUtcTime {
        utc: EpochSeconds,
        granularity: Granularity,
        source: UtcSource,
    },
    /// Set or clear the trusted time source.
    SetTrustedTimeSource(Option<TrustedTimeSource>),
    /// Replace the time zone list.
    SetTimeZone(&'a [TimeZoneEntry]),
    /// Replace the DST offset list.
    SetDstOffset(&'a [DstOffsetEntry]),
    /// Set or clear the default NTP service.
    SetDefaultNtp(Option<&'a str>),
}

/// Responses to commands that return data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandResponse {
    /// The command has no response payload.
    None,
    /// Response to `SetTimeZone`.
    SetTimeZone {
        /// The DST list was cleared and must be supplied again.
        dst_offset_required: bool,
    },
}
