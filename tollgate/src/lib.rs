//! # Tollgate
//!
//! Tollgate puts brute force protection in front of your login flow. It tracks failed
//! logins per account and per source IP, each with its own sliding window, threshold and
//! lockout duration, and tells the login flow when to refuse an attempt before it ever
//! reaches credential verification.
//!
//! - Account lockout: 5 failures in 15 minutes lock an account for 15 minutes by default
//! - IP lockout: 20 failures in 60 minutes lock a source address for 30 minutes by default
//! - Lazy expiry: locks are lifted when queried, there is no background task
//! - Security events fanned out to pluggable [`EventHandler`]s
//!
//! ## Warning
//!
//! All lockout state is held in memory. Restarting the process clears every counter and
//! every lock.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tollgate::{CredentialVerifier, Tollgate, TollgateError};
//! use async_trait::async_trait;
//!
//! struct Passwords;
//!
//! #[async_trait]
//! impl CredentialVerifier for Passwords {
//!     async fn verify(&self, email: &str, password: &str) -> Result<bool, TollgateError> {
//!         Ok(email == "user@example.com" && password == "hunter2")
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gate = Tollgate::builder().build().await?;
//!
//!     match gate
//!         .authenticate(&Passwords, "user@example.com", "wrong", Some("10.0.0.1"))
//!         .await
//!     {
//!         Err(TollgateError::TooManyAttempts { retry_after_seconds, .. }) => {
//!             println!("locked, retry in {retry_after_seconds}s");
//!         }
//!         Err(e) => println!("login failed: {e}"),
//!         Ok(()) => println!("welcome"),
//!     }
//!
//!     Ok(())
//! }
//! ```
use std::sync::Arc;

use async_trait::async_trait;
use tollgate_core::error::{EventError, ValidationError};

pub mod builder;
pub mod settings;

pub use builder::{TollgateBuilder, TollgateBuilderError};
pub use settings::Settings;

/// Re-export core types from tollgate_core
pub use tollgate_core::{
    AttemptOutcome, Clock, EventBus, EventHandler, FailureReport, Keyspace, LockStatus,
    LockoutConfig, LockoutEvent, LockoutRecord, LockoutTracker, ManualClock, SystemClock,
    normalize_account,
};

/// Errors that can occur when using Tollgate.
#[derive(Debug, thiserror::Error)]
pub enum TollgateError {
    /// The account or source address is locked out
    #[error("Too many failed attempts for this {scope}, retry after {retry_after_seconds} seconds")]
    TooManyAttempts {
        scope: Keyspace,
        retry_after_seconds: i64,
    },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Event error: {0}")]
    Event(#[from] EventError),

    /// The credential verifier could not reach a verdict
    #[error("Credential verification failed: {0}")]
    Verifier(String),
}

/// Checks a login's credentials. Implemented by the host application.
///
/// Return `Ok(false)` for wrong credentials; that counts as a failed attempt. Errors mean
/// no verdict was reached and are not counted.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, email: &str, password: &str) -> Result<bool, TollgateError>;
}

/// The login flow coordinator.
///
/// `Tollgate` wraps a shared [`LockoutTracker`] and an [`EventBus`]. It is the boundary of
/// the tracker: it rejects empty account identifiers and turns lock states into
/// [`TollgateError::TooManyAttempts`].
///
/// Cloning is cheap and shares the underlying tracker.
#[derive(Clone)]
pub struct Tollgate {
    tracker: Arc<LockoutTracker>,
    events: EventBus,
}

impl Tollgate {
    /// Create a Tollgate with the given configuration, the system clock and no event handlers.
    pub fn new(config: LockoutConfig) -> Self {
        Self::from_parts(Arc::new(LockoutTracker::new(config)), EventBus::new())
    }

    /// Assemble a Tollgate from an existing tracker and event bus.
    pub fn from_parts(tracker: Arc<LockoutTracker>, events: EventBus) -> Self {
        Self { tracker, events }
    }

    pub fn builder() -> TollgateBuilder {
        TollgateBuilder::new()
    }

    pub fn tracker(&self) -> &Arc<LockoutTracker> {
        &self.tracker
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Refuse a login attempt early if the account or the source address is locked.
    ///
    /// The account is checked first, so a locked account is reported even when the
    /// address is locked too.
    pub fn check(&self, email: &str, ip_address: Option<&str>) -> Result<(), TollgateError> {
        require_email(email)?;

        let account = self.tracker.is_account_locked(email);
        if account.locked {
            tracing::info!(email = %email, "Rejected login for locked account");
            return Err(too_many_attempts(Keyspace::Account, &account));
        }

        if let Some(ip) = ip_address {
            let ip_status = self.tracker.is_ip_locked(ip);
            if ip_status.locked {
                tracing::info!(ip_address = %ip, "Rejected login from locked address");
                return Err(too_many_attempts(Keyspace::Ip, &ip_status));
            }
        }

        Ok(())
    }

    /// Record a failed credential check and publish the resulting events.
    pub async fn record_failure(
        &self,
        email: &str,
        ip_address: Option<&str>,
    ) -> Result<FailureReport, TollgateError> {
        let (report, publish_result) = self.record_and_publish(email, ip_address).await?;
        publish_result?;
        Ok(report)
    }

    /// Record the failure, then offer every resulting event to the bus.
    ///
    /// A handler error does not stop later events: lock notifications are sent even when
    /// the `LoginFailed` event before them was rejected. The first error is returned
    /// alongside the report.
    async fn record_and_publish(
        &self,
        email: &str,
        ip_address: Option<&str>,
    ) -> Result<(FailureReport, Result<(), EventError>), TollgateError> {
        require_email(email)?;

        let report = self.tracker.record_failure(email, ip_address);
        let mut publish_result = Ok(());

        if self.tracker.is_enabled() {
            for event in LockoutEvent::from_report(&report, self.tracker.now()) {
                if let Err(e) = self.events.emit(&event).await {
                    tracing::error!(error = %e, event = ?event, "Failed to publish lockout event");
                    if publish_result.is_ok() {
                        publish_result = Err(e);
                    }
                }
            }
        }

        Ok((report, publish_result))
    }

    /// Clear the account's failures after a successful login.
    pub async fn record_success(&self, email: &str) -> Result<(), TollgateError> {
        require_email(email)?;

        self.tracker.reset_failed_attempts(email);

        if self.tracker.is_enabled() {
            self.events
                .emit(&LockoutEvent::AttemptsReset {
                    email: normalize_account(email),
                    timestamp: self.tracker.now(),
                })
                .await?;
        }

        Ok(())
    }

    /// Run a complete login attempt through the lockout checks.
    ///
    /// 1. Refuse early if the account or address is locked.
    /// 2. Verify the credentials.
    /// 3. On success reset the account, on failure record the attempt.
    ///
    /// A failure that locks the account is reported as `TooManyAttempts`, even if an
    /// event handler failed; any other failure as `InvalidCredentials`, or as the
    /// handler's error when publishing failed.
    pub async fn authenticate<V>(
        &self,
        verifier: &V,
        email: &str,
        password: &str,
        ip_address: Option<&str>,
    ) -> Result<(), TollgateError>
    where
        V: CredentialVerifier + ?Sized,
    {
        self.check(email, ip_address)?;

        if verifier.verify(email, password).await? {
            self.record_success(email).await?;
            return Ok(());
        }

        let (report, publish_result) = self.record_and_publish(email, ip_address).await?;
        if report.is_account_locked() {
            let status = self.tracker.is_account_locked(email);
            if status.locked {
                // The lock stands whether or not every handler heard about it
                return Err(too_many_attempts(Keyspace::Account, &status));
            }
        }

        publish_result?;
        Err(TollgateError::InvalidCredentials)
    }
}

fn require_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::MissingField("email".to_string()));
    }
    Ok(())
}

fn too_many_attempts(scope: Keyspace, status: &LockStatus) -> TollgateError {
    TollgateError::TooManyAttempts {
        scope,
        retry_after_seconds: status.retry_after_seconds().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_rejects_empty_email() {
        let gate = Tollgate::new(LockoutConfig::default());

        let err = gate.check("  ", None).unwrap_err();
        assert!(matches!(
            err,
            TollgateError::Validation(ValidationError::MissingField(ref field)) if field == "email"
        ));
    }

    #[test]
    fn test_too_many_attempts_message() {
        let err = too_many_attempts(Keyspace::Ip, &LockStatus::locked(chrono::Duration::seconds(90)));
        assert_eq!(
            err.to_string(),
            "Too many failed attempts for this ip, retry after 90 seconds"
        );
    }

    #[tokio::test]
    async fn test_clones_share_tracker() {
        let gate = Tollgate::new(LockoutConfig::default());
        let clone = gate.clone();

        clone.record_failure("a@x.com", None).await.unwrap();
        assert_eq!(gate.tracker().tracked_accounts(), 1);
    }
}
