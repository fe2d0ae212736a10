//! Per-key failure bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{config::KeyspacePolicy, status::LockStatus};

/// Failure history of a single account or IP address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutRecord {
    pub failed_attempts: u32,
    /// First failure of the current counting window
    pub first_attempt: DateTime<Utc>,
    pub last_attempt: DateTime<Utc>,
    pub is_locked: bool,
    /// Set when the record locks; kept after a lazy unlock for audit
    pub lockout_end: Option<DateTime<Utc>>,
}

impl LockoutRecord {
    /// A record for the first failure of a fresh window.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            failed_attempts: 1,
            first_attempt: now,
            last_attempt: now,
            is_locked: false,
            lockout_end: None,
        }
    }

    /// Whether the counting window that started at `first_attempt` is over.
    pub fn window_expired(&self, now: DateTime<Utc>, policy: &KeyspacePolicy) -> bool {
        now - self.first_attempt > policy.window
    }

    /// Count a failure at `now`.
    ///
    /// A failure after the window has expired replaces the record with a fresh one.
    /// Returns `true` if this failure flipped the record into the locked state.
    pub fn register_failure(&mut self, now: DateTime<Utc>, policy: &KeyspacePolicy) -> bool {
        if self.window_expired(now, policy) {
            *self = Self::new(now);
        } else {
            self.failed_attempts = self.failed_attempts.saturating_add(1);
            self.last_attempt = now;
        }

        self.apply_threshold(now, policy)
    }

    /// Lock the record if it has reached the policy threshold and is not locked yet.
    pub fn apply_threshold(&mut self, now: DateTime<Utc>, policy: &KeyspacePolicy) -> bool {
        if self.is_locked || self.failed_attempts < policy.max_attempts {
            return false;
        }

        self.is_locked = true;
        self.lockout_end = Some(now + policy.lockout_duration);
        true
    }

    /// Current lock state, clearing an expired lock in place.
    ///
    /// The second value is `true` when this call performed the lazy unlock.
    pub fn check_lock(&mut self, now: DateTime<Utc>) -> (LockStatus, bool) {
        if !self.is_locked {
            return (LockStatus::unlocked(), false);
        }

        match self.lockout_end {
            Some(end) if now < end => (LockStatus::locked(end - now), false),
            _ => {
                self.is_locked = false;
                (LockStatus::unlocked(), true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn policy() -> KeyspacePolicy {
        KeyspacePolicy {
            max_attempts: 3,
            window: Duration::minutes(15),
            lockout_duration: Duration::minutes(10),
        }
    }

    #[test]
    fn test_increment_within_window() {
        let start = Utc::now();
        let mut record = LockoutRecord::new(start);

        assert!(!record.register_failure(start + Duration::minutes(1), &policy()));
        assert_eq!(record.failed_attempts, 2);
        assert_eq!(record.first_attempt, start);
        assert_eq!(record.last_attempt, start + Duration::minutes(1));
    }

    #[test]
    fn test_expired_window_replaces_record() {
        let start = Utc::now();
        let mut record = LockoutRecord::new(start);
        record.register_failure(start + Duration::minutes(1), &policy());

        let later = start + Duration::minutes(16);
        record.register_failure(later, &policy());

        assert_eq!(record, LockoutRecord::new(later));
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let start = Utc::now();
        let mut record = LockoutRecord::new(start);

        // Exactly one window later still counts toward the same window
        record.register_failure(start + Duration::minutes(15), &policy());
        assert_eq!(record.failed_attempts, 2);
    }

    #[test]
    fn test_locks_once_at_threshold() {
        let now = Utc::now();
        let mut record = LockoutRecord::new(now);

        assert!(!record.register_failure(now, &policy()));
        assert!(record.register_failure(now, &policy()));
        assert!(record.is_locked);
        assert_eq!(record.lockout_end, Some(now + Duration::minutes(10)));

        // Further failures while locked keep counting but do not re-lock
        assert!(!record.register_failure(now + Duration::minutes(1), &policy()));
        assert_eq!(record.failed_attempts, 4);
        assert_eq!(record.lockout_end, Some(now + Duration::minutes(10)));
    }

    #[test]
    fn test_check_lock_lazily_unlocks() {
        let now = Utc::now();
        let mut record = LockoutRecord::new(now);
        record.register_failure(now, &policy());
        record.register_failure(now, &policy());

        let (status, cleared) = record.check_lock(now + Duration::minutes(5));
        assert!(status.is_locked());
        assert_eq!(status.remaining, Some(Duration::minutes(5)));
        assert!(!cleared);

        let (status, cleared) = record.check_lock(now + Duration::minutes(10));
        assert_eq!(status, LockStatus::unlocked());
        assert!(cleared);
        assert!(!record.is_locked);
        assert_eq!(record.failed_attempts, 3);

        let (_, cleared) = record.check_lock(now + Duration::minutes(11));
        assert!(!cleared);
    }
}
