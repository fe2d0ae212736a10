//! Results returned by the lockout tracker.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Which keyspace a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Keyspace {
    /// Accounts, keyed by lowercase email
    Account,
    /// Source IP addresses, keyed by the raw address string
    Ip,
}

impl fmt::Display for Keyspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Keyspace::Account => f.write_str("account"),
            Keyspace::Ip => f.write_str("ip"),
        }
    }
}

/// Point-in-time lock state of a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockStatus {
    pub locked: bool,
    /// Time until the lock expires, present only while locked
    pub remaining: Option<Duration>,
}

impl LockStatus {
    pub fn unlocked() -> Self {
        Self {
            locked: false,
            remaining: None,
        }
    }

    pub fn locked(remaining: Duration) -> Self {
        Self {
            locked: true,
            remaining: Some(remaining),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Whole seconds a client should wait before retrying, rounded up.
    ///
    /// Returns `None` when the key is not locked.
    pub fn retry_after_seconds(&self) -> Option<i64> {
        let remaining = self.remaining?;
        let millis = remaining.num_milliseconds().max(0);
        Some((millis + 999) / 1000)
    }
}

/// What a single failed attempt did to one keyspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptOutcome {
    pub keyspace: Keyspace,
    /// The normalized key the attempt was recorded under
    pub key: String,
    /// Failures counted in the current window, including this one
    pub failed_attempts: u32,
    pub is_locked: bool,
    /// True only for the attempt that flipped the key into the locked state
    pub newly_locked: bool,
    pub lockout_end: Option<DateTime<Utc>>,
}

/// Outcome of registering a failed login across both keyspaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub account: AttemptOutcome,
    /// Present when the attempt carried a non-empty IP address
    pub ip: Option<AttemptOutcome>,
}

impl FailureReport {
    /// Whether the account is locked after this attempt. IP state is not reflected here.
    pub fn is_account_locked(&self) -> bool {
        self.account.is_locked
    }

    pub fn is_ip_locked(&self) -> bool {
        self.ip.as_ref().is_some_and(|ip| ip.is_locked)
    }

    /// Outcomes that transitioned into the locked state during this attempt.
    pub fn lock_transitions(&self) -> impl Iterator<Item = &AttemptOutcome> {
        std::iter::once(&self.account)
            .chain(self.ip.as_ref())
            .filter(|outcome| outcome.newly_locked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(keyspace: Keyspace, newly_locked: bool) -> AttemptOutcome {
        AttemptOutcome {
            keyspace,
            key: "k".to_string(),
            failed_attempts: 1,
            is_locked: newly_locked,
            newly_locked,
            lockout_end: None,
        }
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let status = LockStatus::locked(Duration::milliseconds(1500));
        assert_eq!(status.retry_after_seconds(), Some(2));

        let status = LockStatus::locked(Duration::minutes(15));
        assert_eq!(status.retry_after_seconds(), Some(900));

        assert_eq!(LockStatus::unlocked().retry_after_seconds(), None);
    }

    #[test]
    fn test_lock_transitions() {
        let report = FailureReport {
            account: outcome(Keyspace::Account, false),
            ip: Some(outcome(Keyspace::Ip, true)),
        };

        let transitions: Vec<_> = report.lock_transitions().collect();
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].keyspace, Keyspace::Ip);
        assert!(!report.is_account_locked());
        assert!(report.is_ip_locked());
    }

    #[test]
    fn test_keyspace_display() {
        assert_eq!(Keyspace::Account.to_string(), "account");
        assert_eq!(Keyspace::Ip.to_string(), "ip");
    }
}
