//! Time synchronization core with offset tracking and transition reporting.
//!
//! Provides [`TimeSynchronization`], which owns the time zone and DST lists,
//! keeps their evaluated state current, and derives local time. Storage,
//! timers and the wall clock are supplied by the caller.

use crate::command::{CommandResponse, TimeSyncCommand};
use crate::entry_list::BoundedEntryList;
use crate::evaluator::{evaluate, next_transition};
use crate::events::{EventFlagRegister, EventFlags};
use crate::provider::{DataProvider, ProviderError};
use crate::scheduler::{OffsetList, Scheduler};
use crate::time::{Clock, EpochSeconds, Granularity, UtcSource};
use crate::tracker::{DEFAULT_NTP_MAX_LEN, TimeSourceTracker, TrustedTimeSource};
use crate::types::{
    DstOffsetEntry, Evaluation, ListViolation, TimeState, TimeSyncError, TimeZoneEntry,
};
use log::{debug, info, warn};

/// Default capacity of the time zone list.
pub const DEFAULT_TIME_ZONE_LIST_MAX_SIZE: usize = 2;

/// Default capacity of the DST offset list.
pub const DEFAULT_DST_OFFSET_LIST_MAX_SIZE: usize = 10;

/// Tracks time zone and DST offsets for one device and derives local time.
///
/// Construct one instance at start-up, call [`init`](Self::init) once, and pass
/// it by reference to whatever dispatches cluster reads and commands. All
/// operations expect a single caller at a time.
///
/// # Type Parameters
/// * `'t` - Lifetime of the clock reference
/// * `C` - Wall clock implementation
/// * `P` - Persistent storage implementation
/// * `S` - Timer implementation
/// * `TZ` - Maximum number of time zone entries
/// * `DST` - Maximum number of DST entries
pub struct TimeSynchronization<
    't,
    C: Clock,
    P: DataProvider,
    S: Scheduler,
    const TZ: usize = DEFAULT_TIME_ZONE_LIST_MAX_SIZE,
    const DST: usize = DEFAULT_DST_OFFSET_LIST_MAX_SIZE,
> {
    clock: &'t C,
    provider: P,
    scheduler: S,
    time_zone: BoundedEntryList<TimeZoneEntry, TZ>,
    dst_offset: BoundedEntryList<DstOffsetEntry, DST>,
    time_zone_status: Evaluation,
    dst_offset_status: Evaluation,
    tracker: TimeSourceTracker,
    events: EventFlagRegister,
}

impl<'t, C, P, S, const TZ: usize, const DST: usize> TimeSynchronization<'t, C, P, S, TZ, DST>
where
    C: Clock,
    P: DataProvider,
    S: Scheduler,
{
    /// Creates an instance with empty lists and no time sources.
    pub fn new(clock: &'t C, provider: P, scheduler: S) -> Self {
        Self {
            clock,
            provider,
            scheduler,
            time_zone: BoundedEntryList::new(),
            dst_offset: BoundedEntryList::new(),
            time_zone_status: Evaluation::INVALID,
            dst_offset_status: Evaluation::INVALID,
            tracker: TimeSourceTracker::new(),
            events: EventFlagRegister::new(),
        }
    }

    /// Restores persisted state and evaluates both lists.
    ///
    /// Missing or unreadable lists start out empty. Missing time sources start
    /// out unset.
    ///
    /// # Errors
    /// `StorageFailure` if the provider fails outright.
    pub fn init(&mut self) -> Result<(), TimeSyncError> {
        match self.load_time_zone() {
            Ok(_) => {}
            Err(TimeSyncError::NotFound) => self.clear_time_zone_local(),
            Err(TimeSyncError::InvalidArgument(violation)) => {
                warn!("discarding persisted time zone list: {}", violation);
                self.clear_time_zone_local();
            }
            Err(err) => return Err(err),
        }

        match self.load_dst_offset() {
            Ok(_) => {}
            Err(TimeSyncError::NotFound) => self.clear_dst_offset_local(),
            Err(TimeSyncError::InvalidArgument(violation)) => {
                warn!("discarding persisted DST offset list: {}", violation);
                self.clear_dst_offset_local();
            }
            Err(err) => return Err(err),
        }

        match self.provider.load_trusted_time_source() {
            Ok(source) => self.tracker.set_trusted_time_source(Some(source)),
            Err(ProviderError::NotFound) => self.tracker.set_trusted_time_source(None),
            Err(err) => return Err(err.into()),
        }

        match self.provider.load_default_ntp() {
            Ok(name) => self.tracker.set_default_ntp(Some(name.as_str()))?,
            Err(ProviderError::NotFound) => self.tracker.set_default_ntp(None)?,
            Err(err) => return Err(err.into()),
        }

        info!(
            "time synchronization initialized: {} time zone, {} DST entries",
            self.time_zone.len(),
            self.dst_offset.len()
        );
        Ok(())
    }

    /// Handles a command by dispatching to the appropriate method.
    ///
    /// Setting the time zone also clears the DST list, since DST rules are
    /// tied to the zone and no zone database is available to derive them.
    ///
    /// # Returns
    /// * `Ok(CommandResponse)` - Payload for commands that have one
    /// * `Err` - Validation or storage failure
    pub fn handle_command(
        &mut self,
        command: TimeSyncCommand<'_>,
    ) -> Result<CommandResponse, TimeSyncError> {
        match command {
            TimeSyncCommand::SetUtcTime {
                utc,
                granularity,
                source,
            } => {
                self.set_utc_time(utc, granularity, source)?;
                Ok(CommandResponse::None)
            }
            TimeSyncCommand::SetTrustedTimeSource(source) => {
                self.set_trusted_time_source(source)?;
                Ok(CommandResponse::None)
            }
            TimeSyncCommand::SetTimeZone(entries) => {
                self.set_time_zone_clearing_dst(entries)?;
                Ok(CommandResponse::SetTimeZone {
                    dst_offset_required: true,
                })
            }
            TimeSyncCommand::SetDstOffset(entries) => {
                self.set_dst_offset(entries)?;
                Ok(CommandResponse::None)
            }
            TimeSyncCommand::SetDefaultNtp(name) => {
                self.set_default_ntp(name)?;
                Ok(CommandResponse::None)
            }
        }
    }

    /// Replaces and persists the time zone list, then re-evaluates it.
    ///
    /// # Errors
    /// * `InvalidArgument` - The list violates an invariant
    /// * `StorageFailure` - The list could not be persisted
    ///
    /// On error the previous list stays in effect.
    pub fn set_time_zone(&mut self, entries: &[TimeZoneEntry]) -> Result<TimeState, TimeSyncError> {
        let list = BoundedEntryList::<TimeZoneEntry, TZ>::try_from_entries(entries)
            .inspect_err(|err| warn!("time zone list rejected: {}", err))?;
        self.provider.store_time_zone(list.entries())?;
        Ok(self.commit_time_zone(list))
    }

    /// Replaces the time zone list and empties the DST list as one change.
    ///
    /// Both lists are persisted before either is committed. If the DST list
    /// cannot be cleared, the previous time zone list is written back.
    fn set_time_zone_clearing_dst(&mut self, entries: &[TimeZoneEntry]) -> Result<(), TimeSyncError> {
        let list = BoundedEntryList::<TimeZoneEntry, TZ>::try_from_entries(entries)
            .inspect_err(|err| warn!("time zone list rejected: {}", err))?;
        self.provider.store_time_zone(list.entries())?;

        if let Err(err) = self.provider.store_dst_offset(&[]) {
            warn!("DST offset list could not be cleared: {}", err);
            if let Err(restore) = self.provider.store_time_zone(self.time_zone.entries()) {
                warn!("previous time zone list could not be restored: {}", restore);
            }
            return Err(err.into());
        }

        self.commit_time_zone(list);
        self.clear_dst_offset_local();
        info!("DST offset list cleared");
        Ok(())
    }

    fn commit_time_zone(&mut self, list: BoundedEntryList<TimeZoneEntry, TZ>) -> TimeState {
        self.time_zone = list;
        self.time_zone_status = Evaluation::INVALID;
        info!("time zone list set: {} entries", self.time_zone.len());
        self.update_time_zone_state()
    }

    /// Replaces the time zone list with the persisted one.
    ///
    /// # Errors
    /// * `NotFound` - Nothing persisted
    /// * `InvalidArgument` - Persisted list violates an invariant
    /// * `StorageFailure` - The provider failed
    pub fn load_time_zone(&mut self) -> Result<TimeState, TimeSyncError> {
        let persisted = self.provider.load_time_zone::<TZ>()?;
        self.time_zone.load(&persisted)?;
        self.time_zone_status = Evaluation::INVALID;
        debug!("time zone list loaded: {} entries", self.time_zone.len());
        Ok(self.update_time_zone_state())
    }

    /// Empties and persists the time zone list.
    ///
    /// # Errors
    /// `StorageFailure` if the empty list could not be persisted.
    pub fn clear_time_zone(&mut self) -> Result<(), TimeSyncError> {
        self.provider.store_time_zone(&[])?;
        self.clear_time_zone_local();
        info!("time zone list cleared");
        Ok(())
    }

    fn clear_time_zone_local(&mut self) {
        self.time_zone.clear();
        self.time_zone_status = Evaluation::INVALID;
        self.update_time_zone_state();
    }

    /// Returns the time zone list in activation order.
    pub fn time_zone(&self) -> &[TimeZoneEntry] {
        self.time_zone.entries()
    }

    /// Replaces and persists the DST list, then re-evaluates it.
    ///
    /// # Errors
    /// * `InvalidArgument` - The list violates an invariant
    /// * `StorageFailure` - The list could not be persisted
    ///
    /// On error the previous list stays in effect.
    pub fn set_dst_offset(&mut self, entries: &[DstOffsetEntry]) -> Result<TimeState, TimeSyncError> {
        let list = BoundedEntryList::<DstOffsetEntry, DST>::try_from_entries(entries)
            .inspect_err(|err| warn!("DST offset list rejected: {}", err))?;
        self.provider.store_dst_offset(list.entries())?;

        self.dst_offset = list;
        self.dst_offset_status = Evaluation::INVALID;
        self.flag_if_dst_empty();
        info!("DST offset list set: {} entries", self.dst_offset.len());
        Ok(self.update_dst_offset_state())
    }

    /// Replaces the DST list with the persisted one.
    ///
    /// # Errors
    /// * `NotFound` - Nothing persisted
    /// * `InvalidArgument` - Persisted list violates an invariant
    /// * `StorageFailure` - The provider failed
    pub fn load_dst_offset(&mut self) -> Result<TimeState, TimeSyncError> {
        let persisted = self.provider.load_dst_offset::<DST>()?;
        self.dst_offset.load(&persisted)?;
        self.dst_offset_status = Evaluation::INVALID;
        self.flag_if_dst_empty();
        debug!("DST offset list loaded: {} entries", self.dst_offset.len());
        Ok(self.update_dst_offset_state())
    }

    /// Empties and persists the DST list.
    ///
    /// # Errors
    /// `StorageFailure` if the empty list could not be persisted.
    pub fn clear_dst_offset(&mut self) -> Result<(), TimeSyncError> {
        self.provider.store_dst_offset(&[])?;
        self.clear_dst_offset_local();
        info!("DST offset list cleared");
        Ok(())
    }

    fn clear_dst_offset_local(&mut self) {
        self.dst_offset.clear();
        self.dst_offset_status = Evaluation::INVALID;
        self.flag_if_dst_empty();
        self.update_dst_offset_state();
    }

    fn flag_if_dst_empty(&mut self) {
        if self.dst_offset.is_empty() {
            self.events.raise(EventFlags::DST_TABLE_EMPTY);
        }
    }

    /// Returns the DST list in activation order.
    pub fn dst_offset(&self) -> &[DstOffsetEntry] {
        self.dst_offset.entries()
    }

    /// Sets or clears the trusted time source and persists it.
    ///
    /// # Errors
    /// `StorageFailure` if it could not be persisted.
    pub fn set_trusted_time_source(
        &mut self,
        source: Option<TrustedTimeSource>,
    ) -> Result<(), TimeSyncError> {
        self.provider.store_trusted_time_source(source.as_ref())?;
        self.tracker.set_trusted_time_source(source);
        Ok(())
    }

    /// Returns the trusted time source, if any.
    pub fn trusted_time_source(&self) -> Option<&TrustedTimeSource> {
        self.tracker.trusted_time_source()
    }

    /// Sets or clears the default NTP service and persists it.
    ///
    /// # Errors
    /// * `InvalidArgument(NameTooLong)` - Name longer than the supported maximum
    /// * `StorageFailure` - It could not be persisted
    pub fn set_default_ntp(&mut self, name: Option<&str>) -> Result<(), TimeSyncError> {
        if name.is_some_and(|name| name.len() > DEFAULT_NTP_MAX_LEN) {
            return Err(TimeSyncError::InvalidArgument(ListViolation::NameTooLong));
        }

        self.provider.store_default_ntp(name)?;
        self.tracker.set_default_ntp(name)
    }

    /// Returns the default NTP service, if any.
    pub fn default_ntp(&self) -> Option<&str> {
        self.tracker.default_ntp()
    }

    /// Records a UTC reading and re-evaluates both lists against the clock.
    ///
    /// # Errors
    /// `InvalidArgument(UtcRejected)` if the reading is not accepted, in which
    /// case [`EventFlags::TIME_FAILURE`] is raised.
    pub fn set_utc_time(
        &mut self,
        utc: EpochSeconds,
        granularity: Granularity,
        source: UtcSource,
    ) -> Result<(), TimeSyncError> {
        if let Err(err) = self.tracker.set_utc_time(utc, granularity, source) {
            warn!("UTC time {} ({:?} from {:?}) rejected", utc, granularity, source);
            self.events.raise(EventFlags::TIME_FAILURE);
            return Err(err);
        }

        info!("UTC time set to {} ({:?} from {:?})", utc, granularity, source);
        self.refresh(OffsetList::TimeZone);
        self.refresh(OffsetList::DstOffset);
        Ok(())
    }

    /// Returns the granularity of the last accepted UTC reading.
    pub fn granularity(&self) -> Granularity {
        self.tracker.granularity()
    }

    /// Returns where the last accepted UTC reading came from.
    pub fn utc_source(&self) -> UtcSource {
        self.tracker.utc_source()
    }

    /// Derives local time for `utc` from the offsets in effect at that time.
    ///
    /// Raises [`EventFlags::MISSING_TRUSTED_TIME_SOURCE`] if the device has
    /// neither a trusted time source nor an accepted UTC reading; the local
    /// time is still derived from the given `utc`.
    ///
    /// The lists are looked up at `utc` without touching their stored status,
    /// event flags or timers.
    ///
    /// # Errors
    /// `Unavailable` if no time zone entry is in effect at `utc`.
    pub fn get_local_time(&mut self, utc: EpochSeconds) -> Result<EpochSeconds, TimeSyncError> {
        if self.tracker.trusted_time_source().is_none() && !self.tracker.has_valid_utc() {
            warn!("local time requested without a trusted time source");
            self.events.raise(EventFlags::MISSING_TRUSTED_TIME_SOURCE);
        }

        let time_zone_offset = evaluate(self.time_zone.entries(), utc)
            .active
            .and_then(|index| self.time_zone.get(index))
            .map(|entry| entry.offset);
        let dst_offset = evaluate(self.dst_offset.entries(), utc)
            .active
            .and_then(|index| self.dst_offset.get(index))
            .map(|entry| entry.offset);

        self.tracker.local_time(utc, time_zone_offset, dst_offset)
    }

    /// Re-evaluates the time zone list against the clock.
    pub fn update_time_zone_state(&mut self) -> TimeState {
        self.refresh(OffsetList::TimeZone).0
    }

    /// Re-evaluates the DST list against the clock.
    pub fn update_dst_offset_state(&mut self) -> TimeState {
        self.refresh(OffsetList::DstOffset).0
    }

    /// Handles an expired timer previously requested from the scheduler.
    pub fn on_transition_timer(&mut self, list: OffsetList) -> TimeState {
        debug!("transition timer fired for {:?}", list);
        self.refresh(list).0
    }

    /// Re-evaluates both lists against the clock.
    ///
    /// # Returns
    /// * `Some(deadline)` - Earliest time either list can change next
    /// * `None` - Neither list can change without new input
    pub fn service(&mut self) -> Option<EpochSeconds> {
        let (_, time_zone_next) = self.refresh(OffsetList::TimeZone);
        let (_, dst_next) = self.refresh(OffsetList::DstOffset);

        match (time_zone_next, dst_next) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Returns the last evaluation of the time zone list.
    pub fn time_zone_status(&self) -> Evaluation {
        self.time_zone_status
    }

    /// Returns the last evaluation of the DST list.
    pub fn dst_offset_status(&self) -> Evaluation {
        self.dst_offset_status
    }

    /// Returns the raised event flags without clearing them.
    pub fn event_flags(&self) -> EventFlags {
        self.events.snapshot()
    }

    /// Clears `flags` once the corresponding events have been emitted.
    pub fn clear_event_flags(&mut self, flags: EventFlags) {
        self.events.clear(flags);
    }

    /// Returns the data provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Returns the scheduler.
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    fn refresh(&mut self, list: OffsetList) -> (TimeState, Option<EpochSeconds>) {
        let now = self.clock.now();
        self.refresh_at(list, now)
    }

    /// Evaluates `list` at `now`, raises its status flag on a transition into
    /// `Changed`, and points the list's timer at its next boundary.
    fn refresh_at(
        &mut self,
        list: OffsetList,
        now: Option<EpochSeconds>,
    ) -> (TimeState, Option<EpochSeconds>) {
        let (mut evaluation, next) = match (list, now) {
            (_, None) => (Evaluation::INVALID, None),
            (OffsetList::TimeZone, Some(now)) => (
                evaluate(self.time_zone.entries(), now),
                next_transition(self.time_zone.entries(), now),
            ),
            (OffsetList::DstOffset, Some(now)) => (
                evaluate(self.dst_offset.entries(), now),
                next_transition(self.dst_offset.entries(), now),
            ),
        };

        let (previous, flag) = match list {
            OffsetList::TimeZone => (&mut self.time_zone_status, EventFlags::TIME_ZONE_STATUS),
            OffsetList::DstOffset => (&mut self.dst_offset_status, EventFlags::DST_STATUS),
        };

        // A handover that happened between two evaluations is still a change.
        if evaluation.active.is_some()
            && previous.active.is_some()
            && evaluation.active != previous.active
        {
            evaluation.state = TimeState::Changed;
        }

        let transitioned = evaluation.state == TimeState::Changed
            && (previous.state != TimeState::Changed || previous.active != evaluation.active);
        *previous = evaluation;

        if transitioned {
            info!("{:?} offset changed, active entry {:?}", list, evaluation.active);
            self.events.raise(flag);
        }

        match next {
            Some(deadline) => {
                debug!("{:?} state {:?}, next transition at {}", list, evaluation.state, deadline);
                self.scheduler.schedule(list, deadline);
            }
            None => {
                debug!("{:?} state {:?}, no further transitions", list, evaluation.state);
                self.scheduler.cancel(list);
            }
        }

        (evaluation.state, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MemoryProvider;
    use crate::scheduler::DeadlineQueue;
    use core::cell::Cell;

    struct FixedClock(Cell<Option<EpochSeconds>>);

    impl Clock for FixedClock {
        fn now(&self) -> Option<EpochSeconds> {
            self.0.get()
        }
    }

    type Core<'t> = TimeSynchronization<'t, FixedClock, MemoryProvider<2, 4>, DeadlineQueue, 2, 4>;

    #[test]
    fn unknown_clock_evaluates_invalid() {
        let clock = FixedClock(Cell::new(None));
        let mut core = Core::new(&clock, MemoryProvider::new(), DeadlineQueue::new());

        let state = core.set_time_zone(&[TimeZoneEntry::new(3600, 0)]).unwrap();
        assert_eq!(state, TimeState::Invalid);
        assert!(core.scheduler().is_idle());

        clock.0.set(Some(10));
        assert_eq!(core.update_time_zone_state(), TimeState::Stopped);
    }

    #[test]
    fn late_handover_reports_changed_once() {
        let clock = FixedClock(Cell::new(Some(50)));
        let mut core = Core::new(&clock, MemoryProvider::new(), DeadlineQueue::new());

        core.set_time_zone(&[TimeZoneEntry::new(0, 0), TimeZoneEntry::new(3600, 100)])
            .unwrap();
        assert_eq!(core.time_zone_status().active, Some(0));

        // The timer fired late: the handover instant itself was never evaluated.
        clock.0.set(Some(150));
        assert_eq!(core.on_transition_timer(OffsetList::TimeZone), TimeState::Changed);
        assert!(core.event_flags().contains(EventFlags::TIME_ZONE_STATUS));

        clock.0.set(Some(151));
        assert_eq!(core.update_time_zone_state(), TimeState::Stopped);
    }

    #[test]
    fn failed_store_keeps_previous_list() {
        struct FailingStore(MemoryProvider<2, 4>);

        impl DataProvider for FailingStore {
            fn store_time_zone(&mut self, _: &[TimeZoneEntry]) -> Result<(), ProviderError> {
                Err(ProviderError::Failure)
            }
            fn load_time_zone<const N: usize>(
                &mut self,
            ) -> Result<heapless::Vec<TimeZoneEntry, N>, ProviderError> {
                self.0.load_time_zone()
            }
            fn store_dst_offset(&mut self, entries: &[DstOffsetEntry]) -> Result<(), ProviderError> {
                self.0.store_dst_offset(entries)
            }
            fn load_dst_offset<const N: usize>(
                &mut self,
            ) -> Result<heapless::Vec<DstOffsetEntry, N>, ProviderError> {
                self.0.load_dst_offset()
            }
            fn store_trusted_time_source(
                &mut self,
                source: Option<&TrustedTimeSource>,
            ) -> Result<(), ProviderError> {
                self.0.store_trusted_time_source(source)
            }
            fn load_trusted_time_source(&mut self) -> Result<TrustedTimeSource, ProviderError> {
                self.0.load_trusted_time_source()
            }
            fn store_default_ntp(&mut self, name: Option<&str>) -> Result<(), ProviderError> {
                self.0.store_default_ntp(name)
            }
            fn load_default_ntp(&mut self) -> Result<crate::tracker::DefaultNtp, ProviderError> {
                self.0.load_default_ntp()
            }
        }

        let clock = FixedClock(Cell::new(Some(50)));
        let mut core = TimeSynchronization::<_, _, _, 2, 4>::new(
            &clock,
            FailingStore(MemoryProvider::new()),
            DeadlineQueue::new(),
        );

        let result = core.set_time_zone(&[TimeZoneEntry::new(3600, 0)]);
        assert_eq!(result, Err(TimeSyncError::StorageFailure));
        assert!(core.time_zone().is_empty());
        assert_eq!(core.get_local_time(50), Err(TimeSyncError::Unavailable));
    }
}
