//! Deferred re-evaluation of offset lists at their next transition.

use crate::time::EpochSeconds;

/// Identifies one of the two offset lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OffsetList {
    TimeZone,
    DstOffset,
}

impl OffsetList {
    const fn slot(self) -> usize {
        match self {
            OffsetList::TimeZone => 0,
            OffsetList::DstOffset => 1,
        }
    }
}

/// Trait for abstracting one-shot timers.
///
/// Implement this on top of your platform's timer or executor. When a
/// deadline passes, call `TimeSynchronization::on_transition_timer` with the
/// list it was scheduled for.
pub trait Scheduler {
    /// Requests re-evaluation of `list` at `deadline`, replacing any request
    /// still pending for that list.
    fn schedule(&mut self, list: OffsetList, deadline: EpochSeconds);

    /// Drops the pending request for `list`, if any.
    fn cancel(&mut self, list: OffsetList);
}

/// A [`Scheduler`] that records at most one deadline per list for polling.
///
/// Suited to a main loop that sleeps until [`next_deadline`](Self::next_deadline)
/// and then drains [`take_due`](Self::take_due).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeadlineQueue {
    deadlines: [Option<EpochSeconds>; 2],
}

impl DeadlineQueue {
    /// Creates a queue with nothing pending.
    pub const fn new() -> Self {
        Self {
            deadlines: [None; 2],
        }
    }

    /// Returns the pending deadline for `list`.
    pub fn deadline(&self, list: OffsetList) -> Option<EpochSeconds> {
        self.deadlines[list.slot()]
    }

    /// Returns the earliest pending deadline across both lists.
    pub fn next_deadline(&self) -> Option<EpochSeconds> {
        self.deadlines.iter().flatten().copied().min()
    }

    /// Removes and returns the list with the earliest deadline at or before `now`.
    pub fn take_due(&mut self, now: EpochSeconds) -> Option<OffsetList> {
        let list = [OffsetList::TimeZone, OffsetList::DstOffset]
            .into_iter()
            .filter(|list| self.deadline(*list).is_some_and(|deadline| deadline <= now))
            .min_by_key(|list| self.deadline(*list))?;

        self.deadlines[list.slot()] = None;
        Some(list)
    }

    /// Returns true if no deadline is pending.
    pub fn is_idle(&self) -> bool {
        self.deadlines.iter().all(Option::is_none)
    }
}

impl Scheduler for DeadlineQueue {
    fn schedule(&mut self, list: OffsetList, deadline: EpochSeconds) {
        self.deadlines[list.slot()] = Some(deadline);
    }

    fn cancel(&mut self, list: OffsetList) {
        self.deadlines[list.slot()] = None;
    }
}
