//! Persistence abstraction for offset lists and time source configuration.

use crate::tracker::{DefaultNtp, TrustedTimeSource};
use crate::types::{DstOffsetEntry, TimeSyncError, TimeZoneEntry};
use heapless::Vec;

/// Errors reported by a [`DataProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProviderError {
    /// Nothing has been stored under the requested key.
    NotFound,
    /// The storage backend failed.
    Failure,
}

impl core::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ProviderError::NotFound => write!(f, "no data stored"),
            ProviderError::Failure => write!(f, "storage failure"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProviderError {}

impl From<ProviderError> for TimeSyncError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound => TimeSyncError::NotFound,
            ProviderError::Failure => TimeSyncError::StorageFailure,
        }
    }
}

/// Trait for abstracting non-volatile storage.
///
/// Implement this for your key-value store or flash layout. Stored entries must
/// load back field-by-field identical. Loading something that was never stored
/// reports [`ProviderError::NotFound`].
pub trait DataProvider {
    /// Persists the time zone list.
    fn store_time_zone(&mut self, entries: &[TimeZoneEntry]) -> Result<(), ProviderError>;

    /// Reads back the time zone list.
    fn load_time_zone<const N: usize>(&mut self) -> Result<Vec<TimeZoneEntry, N>, ProviderError>;

    /// Persists the DST offset list.
    fn store_dst_offset(&mut self, entries: &[DstOffsetEntry]) -> Result<(), ProviderError>;

    /// Reads back the DST offset list.
    fn load_dst_offset<const N: usize>(&mut self) -> Result<Vec<DstOffsetEntry, N>, ProviderError>;

    /// Persists the trusted time source. `None` erases it.
    fn store_trusted_time_source(
        &mut self,
        source: Option<&TrustedTimeSource>,
    ) -> Result<(), ProviderError>;

    /// Reads back the trusted time source.
    fn load_trusted_time_source(&mut self) -> Result<TrustedTimeSource, ProviderError>;

    /// Persists the default NTP service. `None` erases it.
    fn store_default_ntp(&mut self, name: Option<&str>) -> Result<(), ProviderError>;

    /// Reads back the default NTP service.
    fn load_default_ntp(&mut self) -> Result<DefaultNtp, ProviderError>;
}

/// A [`DataProvider`] that keeps everything in RAM.
///
/// Useful on hosts without persistent storage and in tests.
///
/// # Type Parameters
/// * `TZ` - Maximum number of time zone entries stored
/// * `DST` - Maximum number of DST entries stored
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider<const TZ: usize, const DST: usize> {
    time_zone: Option<Vec<TimeZoneEntry, TZ>>,
    dst_offset: Option<Vec<DstOffsetEntry, DST>>,
    trusted_time_source: Option<TrustedTimeSource>,
    default_ntp: Option<DefaultNtp>,
}

impl<const TZ: usize, const DST: usize> MemoryProvider<TZ, DST> {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self {
            time_zone: None,
            dst_offset: None,
            trusted_time_source: None,
            default_ntp: None,
        }
    }
}

/// Copies `items` into a vector of a possibly different capacity.
fn copy_into<T: Clone, const N: usize>(items: &[T]) -> Result<Vec<T, N>, ProviderError> {
    Vec::from_slice(items).map_err(|_| ProviderError::Failure)
}

impl<const TZ: usize, const DST: usize> DataProvider for MemoryProvider<TZ, DST> {
    fn store_time_zone(&mut self, entries: &[TimeZoneEntry]) -> Result<(), ProviderError> {
        self.time_zone = Some(copy_into(entries)?);
        Ok(())
    }

    fn load_time_zone<const N: usize>(&mut self) -> Result<Vec<TimeZoneEntry, N>, ProviderError> {
        let stored = self.time_zone.as_ref().ok_or(ProviderError::NotFound)?;
        copy_into(stored)
    }

    fn store_dst_offset(&mut self, entries: &[DstOffsetEntry]) -> Result<(), ProviderError> {
        self.dst_offset = Some(copy_into(entries)?);
        Ok(())
    }

    fn load_dst_offset<const N: usize>(&mut self) -> Result<Vec<DstOffsetEntry, N>, ProviderError> {
        let stored = self.dst_offset.as_ref().ok_or(ProviderError::NotFound)?;
        copy_into(stored)
    }

    fn store_trusted_time_source(
        &mut self,
        source: Option<&TrustedTimeSource>,
    ) -> Result<(), ProviderError> {
        self.trusted_time_source = source.copied();
        Ok(())
    }

    fn load_trusted_time_source(&mut self) -> Result<TrustedTimeSource, ProviderError> {
        self.trusted_time_source.ok_or(ProviderError::NotFound)
    }

    fn store_default_ntp(&mut self, name: Option<&str>) -> Result<(), ProviderError> {
        self.default_ntp = match name {
            Some(name) => Some(DefaultNtp::try_from(name).map_err(|_| ProviderError::Failure)?),
            None => None,
        };
        Ok(())
    }

    fn load_default_ntp(&mut self) -> Result<DefaultNtp, ProviderError> {
        self.default_ntp.clone().ok_or(ProviderError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_lists_load_back_identically() {
        let mut provider = MemoryProvider::<2, 4>::new();
        let time_zone = [
            TimeZoneEntry::named(3600, 0, "Europe/Copenhagen").unwrap(),
            TimeZoneEntry::new(7200, 1_700_000_000),
        ];
        let dst = [
            DstOffsetEntry::new(3600, 100, Some(200)),
            DstOffsetEntry::new(3600, 300, None),
        ];

        provider.store_time_zone(&time_zone).unwrap();
        provider.store_dst_offset(&dst).unwrap();

        let loaded_tz = provider.load_time_zone::<2>().unwrap();
        let loaded_dst = provider.load_dst_offset::<4>().unwrap();
        assert_eq!(loaded_tz.as_slice(), &time_zone);
        assert_eq!(loaded_dst.as_slice(), &dst);
    }

    #[test]
    fn missing_data_is_not_found() {
        let mut provider = MemoryProvider::<2, 4>::new();
        assert_eq!(provider.load_time_zone::<2>(), Err(ProviderError::NotFound));
        assert_eq!(provider.load_dst_offset::<4>(), Err(ProviderError::NotFound));
        assert_eq!(provider.load_trusted_time_source(), Err(ProviderError::NotFound));
        assert_eq!(provider.load_default_ntp(), Err(ProviderError::NotFound));
    }

    #[test]
    fn storing_more_than_capacity_fails() {
        let mut provider = MemoryProvider::<1, 1>::new();
        let result = provider.store_time_zone(&[TimeZoneEntry::new(0, 0), TimeZoneEntry::new(0, 1)]);
        assert_eq!(result, Err(ProviderError::Failure));
        assert_eq!(TimeSyncError::from(ProviderError::Failure), TimeSyncError::StorageFailure);
    }
}
