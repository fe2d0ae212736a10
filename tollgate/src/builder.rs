//! Builder for constructing [`Tollgate`] instances
//!
//! # Example
//!
//! ```rust,no_run
//! use tollgate::{LockoutConfig, TollgateBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gate = TollgateBuilder::new()
//!         .with_lockout(LockoutConfig {
//!             max_failed_attempts: 3,
//!             ..Default::default()
//!         })
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tollgate_core::{Clock, EventBus, EventHandler, LockoutConfig, LockoutTracker, SystemClock};

use crate::{Settings, Tollgate};

/// Errors that can occur when building a Tollgate instance.
#[derive(Debug, thiserror::Error)]
pub enum TollgateBuilderError {
    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Builder for [`Tollgate`].
///
/// # Defaults
///
/// - Lockout: enabled, 5 account attempts in 15 minutes, 20 IP attempts in 60 minutes
/// - Clock: [`SystemClock`]
/// - Event handlers: none
pub struct TollgateBuilder {
    lockout_config: LockoutConfig,
    clock: Arc<dyn Clock>,
    event_handlers: Vec<Arc<dyn EventHandler>>,
}

impl Default for TollgateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TollgateBuilder {
    pub fn new() -> Self {
        Self {
            lockout_config: LockoutConfig::default(),
            clock: Arc::new(SystemClock),
            event_handlers: Vec::new(),
        }
    }

    /// Configure lockout thresholds.
    pub fn with_lockout(mut self, config: LockoutConfig) -> Self {
        self.lockout_config = config;
        self
    }

    /// Take the lockout thresholds from loaded [`Settings`].
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.lockout_config = settings.lockout;
        self
    }

    /// Drive the tracker from a custom clock instead of the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register a handler for lockout events. Handlers run in registration order.
    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handlers.push(handler);
        self
    }

    /// Validate the configuration and build the Tollgate instance.
    pub async fn build(self) -> Result<Tollgate, TollgateBuilderError> {
        self.lockout_config
            .validate()
            .map_err(|e| TollgateBuilderError::InvalidConfiguration(e.to_string()))?;

        if !self.lockout_config.enabled {
            tracing::warn!("Brute force protection is disabled");
        }

        let events = EventBus::new();
        for handler in self.event_handlers {
            events.register(handler).await;
        }

        let tracker = LockoutTracker::with_clock(self.lockout_config, self.clock);
        tracing::info!(
            max_failed_attempts = tracker.config().max_failed_attempts,
            max_ip_failed_attempts = tracker.config().max_ip_failed_attempts,
            "Lockout tracker initialized"
        );

        Ok(Tollgate::from_parts(Arc::new(tracker), events))
    }
}
