//! Fixed-capacity, activation-ordered offset lists.

use crate::types::{ALWAYS_VALID, ListViolation, TimeSyncError, ValidityEntry};
use heapless::Vec;

/// A fixed-capacity list of offset entries kept sorted by activation time.
///
/// Contents are only ever replaced wholesale through [`set`](Self::set) or
/// [`load`](Self::load), both of which validate the complete new list before
/// committing it. A rejected list leaves the previous contents untouched.
///
/// # Type Parameters
/// * `E` - Entry type (`TimeZoneEntry` or `DstOffsetEntry`)
/// * `N` - Maximum number of entries this list can hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedEntryList<E: ValidityEntry, const N: usize> {
    entries: Vec<E, N>,
}

impl<E: ValidityEntry, const N: usize> BoundedEntryList<E, N> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Validates and sorts `entries` without touching any existing list.
    ///
    /// # Errors
    /// * `CapacityExceeded` - More than `N` entries
    /// * `DuplicateSentinel` - More than one entry valid from list load
    /// * `MultipleOpenEnded` - More than one entry without an expiry
    /// * `OpenEndedNotLast` - The entry without an expiry is not last
    /// * `InvertedWindow` - An entry expires at or before its activation
    /// * `OverlappingWindows` - An entry activates before the previous one expires
    pub fn try_from_entries(entries: &[E]) -> Result<Self, TimeSyncError> {
        if entries.len() > N {
            return Err(TimeSyncError::InvalidArgument(ListViolation::CapacityExceeded));
        }

        let mut sorted: Vec<E, N> = Vec::new();
        for entry in entries {
            // Insert after every entry with an equal or earlier activation to keep ties stable.
            let position = sorted
                .iter()
                .position(|existing| existing.activation() > entry.activation())
                .unwrap_or(sorted.len());
            sorted
                .insert(position, entry.clone())
                .map_err(|_| TimeSyncError::InvalidArgument(ListViolation::CapacityExceeded))?;
        }

        validate(&sorted).map_err(TimeSyncError::InvalidArgument)?;

        Ok(Self { entries: sorted })
    }

    /// Replaces the contents with `entries`.
    ///
    /// # Errors
    /// See [`try_from_entries`](Self::try_from_entries). On error the list is unchanged.
    pub fn set(&mut self, entries: &[E]) -> Result<(), TimeSyncError> {
        *self = Self::try_from_entries(entries)?;
        Ok(())
    }

    /// Replaces the contents with entries read back from storage.
    ///
    /// Runs the same validation as [`set`](Self::set), so corrupted storage
    /// cannot produce a list that violates the ordering invariants.
    pub fn load(&mut self, persisted: &[E]) -> Result<(), TimeSyncError> {
        self.set(persisted)
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the entries in activation order.
    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    /// Returns the entry at `index`.
    pub fn get(&self, index: usize) -> Option<&E> {
        self.entries.get(index)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the list holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the maximum number of entries.
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<E: ValidityEntry, const N: usize> Default for BoundedEntryList<E, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks the invariants of an already sorted list.
fn validate<E: ValidityEntry>(sorted: &[E]) -> Result<(), ListViolation> {
    let sentinels = sorted
        .iter()
        .filter(|entry| entry.activation() == ALWAYS_VALID)
        .count();
    if sentinels > 1 {
        return Err(ListViolation::DuplicateSentinel);
    }

    if E::HAS_EXPIRY {
        let open_ended = sorted.iter().filter(|entry| entry.expiry().is_none()).count();
        if open_ended > 1 {
            return Err(ListViolation::MultipleOpenEnded);
        }
        if open_ended == 1 && sorted.last().is_some_and(|last| last.expiry().is_some()) {
            return Err(ListViolation::OpenEndedNotLast);
        }
    }

    let mut previous_expiry = None;
    for entry in sorted {
        if let Some(expiry) = entry.expiry() {
            if expiry <= entry.activation() {
                return Err(ListViolation::InvertedWindow);
            }
        }

        if let Some(previous) = previous_expiry {
            if entry.activation() < previous {
                return Err(ListViolation::OverlappingWindows);
            }
        }
        previous_expiry = entry.expiry();
    }

    Ok(())
}
