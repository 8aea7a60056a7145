//! UTC time quality, trusted time source and default NTP bookkeeping.

use crate::time::{EpochSeconds, Granularity, UtcSource};
use crate::types::{ListViolation, TimeSyncError};
use heapless::String;

/// Maximum length in bytes of the default NTP service name.
pub const DEFAULT_NTP_MAX_LEN: usize = 128;

/// Default NTP service name, e.g. a hostname or address literal.
pub type DefaultNtp = String<DEFAULT_NTP_MAX_LEN>;

/// A peer node trusted to supply UTC time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrustedTimeSource {
    /// Fabric the node belongs to.
    pub fabric_index: u8,
    /// Operational node identifier.
    pub node_id: u64,
    /// Endpoint hosting the node's time cluster.
    pub endpoint: u16,
}

/// The last UTC reading that was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UtcReading {
    /// UTC time as reported, in seconds since the epoch.
    pub utc: EpochSeconds,
    /// Precision the source claimed for the reading.
    pub granularity: Granularity,
    /// Where the reading came from.
    pub source: UtcSource,
}

/// Holds what is known about the device's UTC time and where it may get it from.
///
/// No clock is modeled here. Readings are stored verbatim and reported back.
#[derive(Debug, Clone, Default)]
pub struct TimeSourceTracker {
    reading: Option<UtcReading>,
    trusted_time_source: Option<TrustedTimeSource>,
    default_ntp: Option<DefaultNtp>,
}

impl TimeSourceTracker {
    /// Creates a tracker with no UTC reading and no configured sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets or clears the trusted time source.
    pub fn set_trusted_time_source(&mut self, source: Option<TrustedTimeSource>) {
        self.trusted_time_source = source;
    }

    /// Returns the trusted time source, if any.
    pub fn trusted_time_source(&self) -> Option<&TrustedTimeSource> {
        self.trusted_time_source.as_ref()
    }

    /// Sets or clears the default NTP service.
    ///
    /// # Errors
    /// `InvalidArgument(NameTooLong)` if `name` exceeds [`DEFAULT_NTP_MAX_LEN`] bytes.
    pub fn set_default_ntp(&mut self, name: Option<&str>) -> Result<(), TimeSyncError> {
        self.default_ntp = match name {
            Some(name) => Some(
                DefaultNtp::try_from(name)
                    .map_err(|_| TimeSyncError::InvalidArgument(ListViolation::NameTooLong))?,
            ),
            None => None,
        };
        Ok(())
    }

    /// Returns the default NTP service, if any.
    pub fn default_ntp(&self) -> Option<&str> {
        self.default_ntp.as_deref()
    }

    /// Records a UTC reading.
    ///
    /// A reading is rejected if it claims no granularity at all, or if it
    /// moves time backwards without being strictly more precise than the
    /// reading it would replace.
    ///
    /// # Errors
    /// `InvalidArgument(UtcRejected)` if the reading is rejected. The previous
    /// reading is kept.
    pub fn set_utc_time(
        &mut self,
        utc: EpochSeconds,
        granularity: Granularity,
        source: UtcSource,
    ) -> Result<(), TimeSyncError> {
        if granularity == Granularity::NoTime {
            return Err(TimeSyncError::InvalidArgument(ListViolation::UtcRejected));
        }

        if let Some(previous) = &self.reading {
            if utc < previous.utc && granularity <= previous.granularity {
                return Err(TimeSyncError::InvalidArgument(ListViolation::UtcRejected));
            }
        }

        self.reading = Some(UtcReading {
            utc,
            granularity,
            source,
        });
        Ok(())
    }

    /// Returns the last accepted reading.
    pub fn utc_reading(&self) -> Option<&UtcReading> {
        self.reading.as_ref()
    }

    /// Returns the granularity of the last accepted reading.
    pub fn granularity(&self) -> Granularity {
        self.reading
            .map(|reading| reading.granularity)
            .unwrap_or_default()
    }

    /// Returns where the last accepted reading came from.
    pub fn utc_source(&self) -> UtcSource {
        self.reading.map(|reading| reading.source).unwrap_or_default()
    }

    /// Returns true once any UTC reading has been accepted.
    pub fn has_valid_utc(&self) -> bool {
        self.reading.is_some()
    }

    /// Derives local time from `utc` and the offsets currently in effect.
    ///
    /// # Errors
    /// * `Unavailable` - No time zone offset is in effect, or the result does
    ///   not fit in an epoch value
    pub fn local_time(
        &self,
        utc: EpochSeconds,
        time_zone_offset: Option<i32>,
        dst_offset: Option<i32>,
    ) -> Result<EpochSeconds, TimeSyncError> {
        let time_zone_offset = time_zone_offset.ok_or(TimeSyncError::Unavailable)?;
        let total = i64::from(time_zone_offset) + i64::from(dst_offset.unwrap_or(0));

        utc.checked_add_signed(total)
            .ok_or(TimeSyncError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_time_zone_and_dst_offsets() {
        let tracker = TimeSourceTracker::new();
        assert_eq!(
            tracker.local_time(1_700_000_000, Some(3600), Some(3600)),
            Ok(1_700_007_200)
        );
        assert_eq!(tracker.local_time(1_700_000_000, Some(-3600), None), Ok(1_699_996_400));
    }

    #[test]
    fn local_time_requires_time_zone_offset() {
        let tracker = TimeSourceTracker::new();
        assert_eq!(
            tracker.local_time(1_700_000_000, None, Some(3600)),
            Err(TimeSyncError::Unavailable)
        );
        assert_eq!(tracker.local_time(0, Some(-1), None), Err(TimeSyncError::Unavailable));
    }

    #[test]
    fn utc_reading_is_stored_verbatim() {
        let mut tracker = TimeSourceTracker::new();
        assert_eq!(tracker.granularity(), Granularity::NoTime);
        assert!(!tracker.has_valid_utc());

        tracker
            .set_utc_time(1_700_000_000, Granularity::Seconds, UtcSource::Admin)
            .unwrap();

        assert_eq!(tracker.granularity(), Granularity::Seconds);
        assert_eq!(tracker.utc_source(), UtcSource::Admin);
        assert_eq!(tracker.utc_reading().unwrap().utc, 1_700_000_000);
    }

    #[test]
    fn rejects_readings_without_granularity_or_going_backwards() {
        let mut tracker = TimeSourceTracker::new();
        assert!(
            tracker
                .set_utc_time(1_700_000_000, Granularity::NoTime, UtcSource::Admin)
                .is_err()
        );

        tracker
            .set_utc_time(1_700_000_000, Granularity::Seconds, UtcSource::Admin)
            .unwrap();
        assert_eq!(
            tracker.set_utc_time(1_600_000_000, Granularity::Seconds, UtcSource::Admin),
            Err(TimeSyncError::InvalidArgument(ListViolation::UtcRejected))
        );
        assert_eq!(tracker.utc_reading().unwrap().utc, 1_700_000_000);

        // A finer reading may correct time backwards.
        tracker
            .set_utc_time(1_699_999_999, Granularity::Milliseconds, UtcSource::MatterNtp)
            .unwrap();
        assert_eq!(tracker.utc_source(), UtcSource::MatterNtp);
    }

    #[test]
    fn default_ntp_is_bounded() {
        let mut tracker = TimeSourceTracker::new();
        tracker.set_default_ntp(Some("pool.ntp.org")).unwrap();
        assert_eq!(tracker.default_ntp(), Some("pool.ntp.org"));

        let long = [b'a'; DEFAULT_NTP_MAX_LEN + 1];
        let long = core::str::from_utf8(&long).unwrap();
        assert!(tracker.set_default_ntp(Some(long)).is_err());
        assert_eq!(tracker.default_ntp(), Some("pool.ntp.org"));

        tracker.set_default_ntp(None).unwrap();
        assert_eq!(tracker.default_ntp(), None);
    }
}
