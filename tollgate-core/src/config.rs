//! Lockout configuration.
//!
//! Two independent keyspaces are configured here: accounts (keyed by normalized email)
//! and source IP addresses. Each has its own threshold, counting window and lockout
//! duration.
//!
//! # Example
//!
//! ```rust
//! use tollgate_core::LockoutConfig;
//!
//! let config: LockoutConfig = serde_json::from_str(
//!     r#"{ "maxFailedAttempts": 3, "lockout_duration_minutes": 30 }"#,
//! ).unwrap();
//!
//! assert_eq!(config.max_failed_attempts, 3);
//! assert_eq!(config.lockout_duration_minutes, 30);
//! // Everything else keeps its default
//! assert_eq!(config.max_ip_failed_attempts, 20);
//! ```

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Configuration for account and IP lockout.
///
/// Durations are whole minutes. Unknown keys are ignored and missing keys take their
/// defaults, so a partial configuration block is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockoutConfig {
    /// Whether lockout tracking is enabled at all
    pub enabled: bool,

    /// Failed attempts on one account before it is locked
    #[serde(alias = "maxFailedAttempts")]
    pub max_failed_attempts: u32,

    /// How long failures on one account keep counting toward the threshold
    #[serde(alias = "attemptWindowMinutes")]
    pub attempt_window_minutes: u32,

    /// How long a locked account stays locked
    #[serde(alias = "lockoutDurationMinutes")]
    pub lockout_duration_minutes: u32,

    /// Failed attempts from one IP before it is locked
    #[serde(alias = "maxIpFailedAttempts")]
    pub max_ip_failed_attempts: u32,

    #[serde(alias = "ipAttemptWindowMinutes")]
    pub ip_attempt_window_minutes: u32,

    #[serde(alias = "ipLockoutDurationMinutes")]
    pub ip_lockout_duration_minutes: u32,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_failed_attempts: 5,
            attempt_window_minutes: 15,
            lockout_duration_minutes: 15,
            max_ip_failed_attempts: 20,
            ip_attempt_window_minutes: 60,
            ip_lockout_duration_minutes: 30,
        }
    }
}

impl LockoutConfig {
    /// A configuration that never records attempts and never locks anything.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Check that every threshold and duration is usable.
    ///
    /// A threshold of zero could never be reached by a counter that starts at one, and a
    /// zero-length window or lockout would make the tracker a no-op for that keyspace.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("max_failed_attempts", self.max_failed_attempts),
            ("attempt_window_minutes", self.attempt_window_minutes),
            ("lockout_duration_minutes", self.lockout_duration_minutes),
            ("max_ip_failed_attempts", self.max_ip_failed_attempts),
            ("ip_attempt_window_minutes", self.ip_attempt_window_minutes),
            ("ip_lockout_duration_minutes", self.ip_lockout_duration_minutes),
        ];

        for (name, value) in fields {
            if value == 0 {
                return Err(ValidationError::InvalidField(format!(
                    "{name} must be greater than zero"
                )));
            }
        }

        Ok(())
    }

    /// Policy applied to the account keyspace.
    pub fn account_policy(&self) -> KeyspacePolicy {
        KeyspacePolicy {
            max_attempts: self.max_failed_attempts,
            window: Duration::minutes(self.attempt_window_minutes.into()),
            lockout_duration: Duration::minutes(self.lockout_duration_minutes.into()),
        }
    }

    /// Policy applied to the IP keyspace.
    pub fn ip_policy(&self) -> KeyspacePolicy {
        KeyspacePolicy {
            max_attempts: self.max_ip_failed_attempts,
            window: Duration::minutes(self.ip_attempt_window_minutes.into()),
            lockout_duration: Duration::minutes(self.ip_lockout_duration_minutes.into()),
        }
    }
}

/// Thresholds for a single keyspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyspacePolicy {
    /// Count at which the key becomes locked
    pub max_attempts: u32,
    /// Maximum age of the first counted failure before the window restarts
    pub window: Duration,
    pub lockout_duration: Duration,
}
