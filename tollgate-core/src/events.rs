use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::{
    error::EventError,
    status::{FailureReport, Keyspace},
};

/// Security events produced by the login flow.
///
/// Events are fanned out to every registered [`EventHandler`], which is where audit
/// logs, alerting or message queue publishers plug in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LockoutEvent {
    /// Emitted for every failed login that was recorded.
    LoginFailed {
        email: String,
        ip_address: Option<String>,
        /// Failures on the account in the current window
        failed_attempts: u32,
        timestamp: DateTime<Utc>,
    },

    /// Emitted once, by the attempt that locked the account.
    AccountLocked {
        email: String,
        failed_attempts: u32,
        locked_until: DateTime<Utc>,
        /// IP address of the attempt that triggered the lock
        ip_address: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Emitted once, by the attempt that locked the IP address.
    IpLocked {
        ip_address: String,
        failed_attempts: u32,
        locked_until: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    /// Emitted when an account's failures are cleared after a successful login.
    AttemptsReset {
        email: String,
        timestamp: DateTime<Utc>,
    },
}

impl LockoutEvent {
    /// Build the events describing a recorded failure.
    ///
    /// Always yields `LoginFailed`, followed by a lock event for each keyspace the
    /// attempt transitioned into the locked state.
    pub fn from_report(report: &FailureReport, timestamp: DateTime<Utc>) -> Vec<LockoutEvent> {
        let ip_address = report.ip.as_ref().map(|ip| ip.key.clone());

        let mut events = vec![LockoutEvent::LoginFailed {
            email: report.account.key.clone(),
            ip_address: ip_address.clone(),
            failed_attempts: report.account.failed_attempts,
            timestamp,
        }];

        for outcome in report.lock_transitions() {
            let Some(locked_until) = outcome.lockout_end else {
                continue;
            };

            events.push(match outcome.keyspace {
                Keyspace::Account => LockoutEvent::AccountLocked {
                    email: outcome.key.clone(),
                    failed_attempts: outcome.failed_attempts,
                    locked_until,
                    ip_address: ip_address.clone(),
                    timestamp,
                },
                Keyspace::Ip => LockoutEvent::IpLocked {
                    ip_address: outcome.key.clone(),
                    failed_attempts: outcome.failed_attempts,
                    locked_until,
                    timestamp,
                },
            });
        }

        events
    }

    pub fn is_lock(&self) -> bool {
        matches!(
            self,
            LockoutEvent::AccountLocked { .. } | LockoutEvent::IpLocked { .. }
        )
    }
}

/// A trait for handling events emitted by the event bus
///
/// Implementors of this trait can be registered with the [`EventBus`] to receive and process events.
/// The handler is called asynchronously for each event emitted.
///
/// # Errors
///
/// Returns an [`EventError`] if event handling fails. The error is propagated back through the event bus.
///
/// # Examples
///
/// ```
/// # use tollgate_core::events::{LockoutEvent, EventHandler};
/// # use tollgate_core::error::EventError;
/// # use async_trait::async_trait;
/// struct AuditLog;
///
/// #[async_trait]
/// impl EventHandler for AuditLog {
///     async fn handle_event(&self, event: &LockoutEvent) -> Result<(), EventError> {
///         println!("{event:?}");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    async fn handle_event(&self, event: &LockoutEvent) -> Result<(), EventError>;
}

/// Event bus that can emit events and register event handlers
///
/// Handlers are called in registration order. Cloning the bus shares its handlers.
#[derive(Clone)]
pub struct EventBus {
    handlers: Arc<RwLock<Vec<Arc<dyn EventHandler>>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register an event handler with the event bus
    pub async fn register(&self, handler: Arc<dyn EventHandler>) {
        self.handlers.write().await.push(handler);
    }

    pub async fn handler_count(&self) -> usize {
        self.handlers.read().await.len()
    }

    /// Emit an event to all registered handlers
    ///
    /// Stops at the first handler that fails and returns its error.
    pub async fn emit(&self, event: &LockoutEvent) -> Result<(), EventError> {
        for handler in self.handlers.read().await.iter() {
            handler.handle_event(event).await?;
        }

        Ok(())
    }
}
