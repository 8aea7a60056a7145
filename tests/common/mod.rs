//! Shared test infrastructure for time-sync-core integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use time_sync_core::{
    Clock, DataProvider, DefaultNtp, DstOffsetEntry, EpochSeconds, MemoryProvider, OffsetList,
    ProviderError, Scheduler, TimeZoneEntry, TrustedTimeSource,
};

// ============================================================================
// Mock Clock
// ============================================================================

/// Mock wall clock with controllable time
pub struct MockClock {
    current_time: core::cell::Cell<Option<EpochSeconds>>,
}

impl MockClock {
    pub fn new(now: EpochSeconds) -> Self {
        Self {
            current_time: core::cell::Cell::new(Some(now)),
        }
    }

    /// A clock that does not know the time
    pub fn unset() -> Self {
        Self {
            current_time: core::cell::Cell::new(None),
        }
    }

    /// Advance time by the given number of seconds
    pub fn advance(&self, seconds: u64) {
        let current = self.current_time.get().unwrap_or(0);
        self.current_time.set(Some(current + seconds));
    }

    pub fn set_time(&self, time: EpochSeconds) {
        self.current_time.set(Some(time));
    }
}

impl Clock for MockClock {
    fn now(&self) -> Option<EpochSeconds> {
        self.current_time.get()
    }
}

// ============================================================================
// Mock Scheduler
// ============================================================================

/// Scheduler that records every request it receives
#[derive(Default)]
pub struct RecordingScheduler {
    pub time_zone: Option<EpochSeconds>,
    pub dst_offset: Option<EpochSeconds>,
    pub schedule_calls: usize,
    pub cancel_calls: usize,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self, list: OffsetList) -> Option<EpochSeconds> {
        match list {
            OffsetList::TimeZone => self.time_zone,
            OffsetList::DstOffset => self.dst_offset,
        }
    }
}

impl Scheduler for RecordingScheduler {
    fn schedule(&mut self, list: OffsetList, deadline: EpochSeconds) {
        self.schedule_calls += 1;
        match list {
            OffsetList::TimeZone => self.time_zone = Some(deadline),
            OffsetList::DstOffset => self.dst_offset = Some(deadline),
        }
    }

    fn cancel(&mut self, list: OffsetList) {
        self.cancel_calls += 1;
        match list {
            OffsetList::TimeZone => self.time_zone = None,
            OffsetList::DstOffset => self.dst_offset = None,
        }
    }
}

// ============================================================================
// Faulty Provider
// ============================================================================

/// In-memory provider whose DST store or loads can be made to fail
#[derive(Default)]
pub struct FaultyProvider {
    pub inner: MemoryProvider<2, 4>,
    pub fail_dst_store: bool,
    pub fail_loads: bool,
}

impl FaultyProvider {
    fn check_load(&self) -> Result<(), ProviderError> {
        if self.fail_loads {
            Err(ProviderError::Failure)
        } else {
            Ok(())
        }
    }
}

impl DataProvider for FaultyProvider {
    fn store_time_zone(&mut self, entries: &[TimeZoneEntry]) -> Result<(), ProviderError> {
        self.inner.store_time_zone(entries)
    }

    fn load_time_zone<const N: usize>(
        &mut self,
    ) -> Result<heapless::Vec<TimeZoneEntry, N>, ProviderError> {
        self.check_load()?;
        self.inner.load_time_zone()
    }

    fn store_dst_offset(&mut self, entries: &[DstOffsetEntry]) -> Result<(), ProviderError> {
        if self.fail_dst_store {
            return Err(ProviderError::Failure);
        }
        self.inner.store_dst_offset(entries)
    }

    fn load_dst_offset<const N: usize>(
        &mut self,
    ) -> Result<heapless::Vec<DstOffsetEntry, N>, ProviderError> {
        self.check_load()?;
        self.inner.load_dst_offset()
    }

    fn store_trusted_time_source(
        &mut self,
        source: Option<&TrustedTimeSource>,
    ) -> Result<(), ProviderError> {
        self.inner.store_trusted_time_source(source)
    }

    fn load_trusted_time_source(&mut self) -> Result<TrustedTimeSource, ProviderError> {
        self.check_load()?;
        self.inner.load_trusted_time_source()
    }

    fn store_default_ntp(&mut self, name: Option<&str>) -> Result<(), ProviderError> {
        self.inner.store_default_ntp(name)
    }

    fn load_default_ntp(&mut self) -> Result<DefaultNtp, ProviderError> {
        self.check_load()?;
        self.inner.load_default_ntp()
    }
}

// ============================================================================
// Test Constants
// ============================================================================

/// 2023-11-14T22:13:20Z
pub const NOW: EpochSeconds = 1_700_000_000;

pub const HOUR: i32 = 3600;
