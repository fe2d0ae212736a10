//! Account and IP lockout tracking.
//!
//! [`LockoutTracker`] keeps two independent tables of [`LockoutRecord`]s, one keyed by
//! account (lowercase email) and one keyed by source IP. Both tables run the same
//! sliding-window logic with their own [`KeyspacePolicy`].
//!
//! Every update of a key happens under that key's map entry lock, so concurrent
//! failures on one key are all counted and the lock transition happens exactly once.
//! Expired locks are cleared lazily when queried; there is no background task.
//!
//! # Example
//!
//! ```rust
//! use tollgate_core::{LockoutConfig, LockoutTracker};
//!
//! let tracker = LockoutTracker::new(LockoutConfig::default());
//!
//! for _ in 0..4 {
//!     assert!(!tracker.register_failed_attempt("user@x.com", Some("10.0.0.1")));
//! }
//! assert!(tracker.register_failed_attempt("USER@x.com", Some("10.0.0.1")));
//!
//! let status = tracker.is_account_locked("user@x.com");
//! assert!(status.locked);
//! assert!(!tracker.is_ip_locked("10.0.0.1").locked);
//!
//! // A successful login clears the account
//! tracker.reset_failed_attempts("user@x.com");
//! assert!(!tracker.is_account_locked("user@x.com").locked);
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::{DashMap, mapref::entry::Entry};

use crate::{
    clock::{Clock, SystemClock},
    config::{KeyspacePolicy, LockoutConfig},
    record::LockoutRecord,
    status::{AttemptOutcome, FailureReport, Keyspace, LockStatus},
};

/// Normalize an account identifier for use as a key.
pub fn normalize_account(account: &str) -> String {
    account.to_lowercase()
}

/// One keyspace: a policy plus the records it governs.
struct KeyTable {
    keyspace: Keyspace,
    policy: KeyspacePolicy,
    records: DashMap<String, LockoutRecord>,
}

impl KeyTable {
    fn new(keyspace: Keyspace, policy: KeyspacePolicy) -> Self {
        Self {
            keyspace,
            policy,
            records: DashMap::new(),
        }
    }

    fn register_failure(&self, key: &str, now: DateTime<Utc>) -> AttemptOutcome {
        // The entry guard holds the shard write lock for the whole read-modify-write
        let (record, newly_locked) = match self.records.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                let record = entry.get_mut();
                let newly_locked = record.register_failure(now, &self.policy);
                (record.clone(), newly_locked)
            }
            Entry::Vacant(entry) => {
                let mut record = LockoutRecord::new(now);
                let newly_locked = record.apply_threshold(now, &self.policy);
                entry.insert(record.clone());
                (record, newly_locked)
            }
        };

        if newly_locked {
            tracing::warn!(
                keyspace = %self.keyspace,
                key = %key,
                attempt_count = record.failed_attempts,
                lockout_end = ?record.lockout_end,
                "Lockout threshold reached, key locked"
            );
        } else {
            tracing::debug!(
                keyspace = %self.keyspace,
                key = %key,
                attempt_count = record.failed_attempts,
                "Recorded failed login attempt"
            );
        }

        AttemptOutcome {
            keyspace: self.keyspace,
            key: key.to_string(),
            failed_attempts: record.failed_attempts,
            is_locked: record.is_locked,
            newly_locked,
            lockout_end: record.lockout_end,
        }
    }

    fn status(&self, key: &str, now: DateTime<Utc>) -> LockStatus {
        let Some(mut record) = self.records.get_mut(key) else {
            return LockStatus::unlocked();
        };

        let (status, cleared) = record.check_lock(now);
        drop(record);

        if cleared {
            tracing::info!(
                keyspace = %self.keyspace,
                key = %key,
                "Lockout expired, key unlocked"
            );
        }

        status
    }

    fn remove(&self, key: &str) -> Option<LockoutRecord> {
        self.records.remove(key).map(|(_, record)| record)
    }

    fn snapshot(&self, key: &str) -> Option<LockoutRecord> {
        self.records.get(key).map(|record| record.clone())
    }
}

/// In-memory brute force tracker for accounts and source IPs.
///
/// Construct one per process and share it behind an [`Arc`]. All methods take `&self`,
/// never block on I/O and never fail.
///
/// State is not durable: dropping the tracker (or restarting the process) forgets all
/// failures and locks.
pub struct LockoutTracker {
    config: LockoutConfig,
    clock: Arc<dyn Clock>,
    accounts: KeyTable,
    ips: KeyTable,
}

impl LockoutTracker {
    /// Create a tracker that reads the system clock.
    pub fn new(config: LockoutConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a tracker driven by the given clock.
    pub fn with_clock(config: LockoutConfig, clock: Arc<dyn Clock>) -> Self {
        let accounts = KeyTable::new(Keyspace::Account, config.account_policy());
        let ips = KeyTable::new(Keyspace::Ip, config.ip_policy());

        Self {
            config,
            clock,
            accounts,
            ips,
        }
    }

    pub fn config(&self) -> &LockoutConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// The current time according to the tracker's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Record a failed login for `account` and, if present, `ip_address`.
    ///
    /// Returns whether the **account** is locked after this attempt. The IP keyspace is
    /// updated independently; query it with [`is_ip_locked`](Self::is_ip_locked).
    pub fn register_failed_attempt(&self, account: &str, ip_address: Option<&str>) -> bool {
        self.record_failure(account, ip_address).is_account_locked()
    }

    /// Record a failed login and report what happened in each keyspace.
    ///
    /// When tracking is disabled nothing is recorded and an unlocked report with zero
    /// attempts is returned.
    pub fn record_failure(&self, account: &str, ip_address: Option<&str>) -> FailureReport {
        let account_key = normalize_account(account);

        if !self.config.enabled {
            return FailureReport {
                account: AttemptOutcome {
                    keyspace: Keyspace::Account,
                    key: account_key,
                    failed_attempts: 0,
                    is_locked: false,
                    newly_locked: false,
                    lockout_end: None,
                },
                ip: None,
            };
        }

        let now = self.clock.now();
        let account = self.accounts.register_failure(&account_key, now);
        let ip = non_empty(ip_address).map(|ip| self.ips.register_failure(ip, now));

        FailureReport { account, ip }
    }

    /// Lock state of an account, clearing an expired lock in place.
    pub fn is_account_locked(&self, account: &str) -> LockStatus {
        if !self.config.enabled {
            return LockStatus::unlocked();
        }

        self.accounts
            .status(&normalize_account(account), self.clock.now())
    }

    /// Lock state of an IP address. An empty or missing address is never locked.
    pub fn is_ip_locked(&self, ip_address: &str) -> LockStatus {
        if !self.config.enabled {
            return LockStatus::unlocked();
        }

        match non_empty(Some(ip_address)) {
            Some(ip) => self.ips.status(ip, self.clock.now()),
            None => LockStatus::unlocked(),
        }
    }

    /// Forget all failures for an account, typically after a successful login.
    ///
    /// IP records are deliberately left alone; they only age out through their window.
    pub fn reset_failed_attempts(&self, account: &str) {
        let key = normalize_account(account);
        if let Some(record) = self.accounts.remove(&key) {
            tracing::info!(
                key = %key,
                failed_attempts = record.failed_attempts,
                was_locked = record.is_locked,
                "Reset failed login attempts"
            );
        }
    }

    /// Snapshot of an account's record, if one is tracked.
    pub fn account_record(&self, account: &str) -> Option<LockoutRecord> {
        self.accounts.snapshot(&normalize_account(account))
    }

    /// Snapshot of an IP address's record, if one is tracked.
    pub fn ip_record(&self, ip_address: &str) -> Option<LockoutRecord> {
        self.ips.snapshot(ip_address)
    }

    /// Number of accounts with a record.
    pub fn tracked_accounts(&self) -> usize {
        self.accounts.records.len()
    }

    /// Number of IP addresses with a record.
    pub fn tracked_ips(&self) -> usize {
        self.ips.records.len()
    }
}

fn non_empty(ip_address: Option<&str>) -> Option<&str> {
    ip_address.filter(|ip| !ip.trim().is_empty())
}
