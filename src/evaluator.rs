//! Validity-window evaluation of offset lists.
//!
//! Both functions here are pure: they read a sorted entry slice and a
//! current time, and never touch the list itself.

use crate::time::EpochSeconds;
use crate::types::{Evaluation, TimeState, ValidityEntry};

/// Determines which entry is in effect at `now` and classifies the list.
///
/// `entries` must be sorted by activation, as kept by `BoundedEntryList`.
///
/// # Returns
/// * `Invalid` - Empty list, or no entry has activated yet
/// * `Changed` - The latest activated entry has lapsed, or `now` is exactly
///   the instant it took over from an earlier entry
/// * `Active` - An entry applies and a later transition is pending
/// * `Stopped` - An open-ended entry applies and nothing follows it
pub fn evaluate<E: ValidityEntry>(entries: &[E], now: EpochSeconds) -> Evaluation {
    let Some(index) = candidate(entries, now) else {
        return Evaluation::INVALID;
    };
    let entry = &entries[index];

    if entry.expiry().is_some_and(|expiry| expiry <= now) {
        return Evaluation {
            active: None,
            state: TimeState::Changed,
        };
    }

    // Entries sharing the first activation never hand over from anything.
    let took_over = entries[0].activation() < entry.activation();
    let state = if took_over && entry.activation() == now {
        TimeState::Changed
    } else if entry.expiry().is_some() || index + 1 < entries.len() {
        TimeState::Active
    } else {
        TimeState::Stopped
    };

    Evaluation {
        active: Some(index),
        state,
    }
}

/// Returns the earliest time after `now` at which [`evaluate`] can give a
/// different answer, or `None` if the list is settled for good.
pub fn next_transition<E: ValidityEntry>(entries: &[E], now: EpochSeconds) -> Option<EpochSeconds> {
    let next_activation = entries
        .iter()
        .map(ValidityEntry::activation)
        .find(|&activation| activation > now);

    let expiry = candidate(entries, now)
        .and_then(|index| entries[index].expiry())
        .filter(|&expiry| expiry > now);

    match (next_activation, expiry) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Index of the last entry whose activation is at or before `now`.
fn candidate<E: ValidityEntry>(entries: &[E], now: EpochSeconds) -> Option<usize> {
    entries
        .iter()
        .rposition(|entry| entry.activation() <= now)
}
