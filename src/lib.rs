#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`TimeZoneEntry`** / **`DstOffsetEntry`**: An offset with the time it takes effect (and, for DST, ends)
//! - **`BoundedEntryList`**: Fixed-capacity list of entries kept in activation order, validated on every replace
//! - **`evaluate`**: Determines which entry is in effect at a given time and classifies the list as a `TimeState`
//! - **`TimeSourceTracker`**: UTC reading quality, trusted time source, default NTP and local time derivation
//! - **`EventFlags`**: Sticky transition flags for the cluster logic to emit as events
//! - **`TimeSynchronization`**: Owns both lists and keeps their state current
//! - **`Clock`**, **`DataProvider`**, **`Scheduler`**: Traits to implement for your platform
//! - **`TimeSyncCommand`**: Commands that can be dispatched to the core
//!
//! All times are whole seconds since the Unix epoch; all offsets are seconds.
//! Storage is fixed-capacity, so the crate never allocates.

pub mod command;
pub mod entry_list;
pub mod evaluator;
pub mod events;
pub mod provider;
pub mod scheduler;
pub mod server;
pub mod time;
pub mod tracker;
pub mod types;

pub use command::{CommandResponse, TimeSyncCommand};
pub use entry_list::BoundedEntryList;
pub use evaluator::{evaluate, next_transition};
pub use events::{EventFlagRegister, EventFlags};
pub use provider::{DataProvider, MemoryProvider, ProviderError};
pub use scheduler::{DeadlineQueue, OffsetList, Scheduler};
pub use server::{
    DEFAULT_DST_OFFSET_LIST_MAX_SIZE, DEFAULT_TIME_ZONE_LIST_MAX_SIZE, TimeSynchronization,
};
pub use time::{Clock, EpochSeconds, Granularity, UtcSource};
pub use tracker::{DEFAULT_NTP_MAX_LEN, DefaultNtp, TimeSourceTracker, TrustedTimeSource, UtcReading};
pub use types::{
    ALWAYS_VALID, DstOffsetEntry, Evaluation, ListViolation, TIME_ZONE_NAME_MAX_LEN, TimeState,
    TimeSyncError, TimeZoneEntry, ValidityEntry,
};
