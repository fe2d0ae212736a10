//! Core functionality for the tollgate project
//!
//! This crate contains the in-memory brute force tracker used by the tollgate login flow.
//!
//! See [`LockoutTracker`] for the tracker itself, [`LockoutConfig`] for its thresholds, and
//! [`events`] for the security events the login flow fans out.
//!
//! Tracker state lives only in memory. Restarting the process clears every failure
//! counter and every lock.
//!
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod record;
pub mod status;
pub mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{KeyspacePolicy, LockoutConfig};
pub use error::Error;
pub use events::{EventBus, EventHandler, LockoutEvent};
pub use record::LockoutRecord;
pub use status::{AttemptOutcome, FailureReport, Keyspace, LockStatus};
pub use tracker::{LockoutTracker, normalize_account};
