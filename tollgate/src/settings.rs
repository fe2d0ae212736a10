//! Host configuration loading.
//!
//! The lockout thresholds live in a nested `lockout` block of the host's settings file:
//!
//! ```json
//! {
//!     "lockout": {
//!         "max_failed_attempts": 5,
//!         "attempt_window_minutes": 15,
//!         "lockout_duration_minutes": 15,
//!         "max_ip_failed_attempts": 20,
//!         "ip_attempt_window_minutes": 60,
//!         "ip_lockout_duration_minutes": 30
//!     }
//! }
//! ```
//!
//! Any field can be overridden from the environment with `TOLLGATE_LOCKOUT_<FIELD>`, for
//! example `TOLLGATE_LOCKOUT_MAX_FAILED_ATTEMPTS=3`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tollgate_core::LockoutConfig;

use crate::TollgateError;

/// Prefix of environment variables that override lockout settings.
pub const ENV_PREFIX: &str = "TOLLGATE_LOCKOUT_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(alias = "lockoutSettings", alias = "LockoutSettings")]
    pub lockout: LockoutConfig,
}

impl Settings {
    /// Parse settings from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, TollgateError> {
        serde_json::from_str(json)
            .map_err(|e| TollgateError::Configuration(format!("Failed to parse settings: {e}")))
    }

    /// Read and parse a JSON settings file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, TollgateError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            TollgateError::Configuration(format!(
                "Failed to read settings file {}: {e}",
                path.display()
            ))
        })?;

        let settings = Self::from_json_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded settings file");
        Ok(settings)
    }

    /// Apply `TOLLGATE_LOCKOUT_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, TollgateError> {
        self.with_overrides(std::env::vars())
    }

    /// Apply overrides from `(name, value)` pairs using the `TOLLGATE_LOCKOUT_` naming.
    ///
    /// Pairs without the prefix are ignored. An unknown field or an unparsable value is
    /// a configuration error.
    pub fn with_overrides<I, K, V>(mut self, vars: I) -> Result<Self, TollgateError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in vars {
            let Some(field) = name.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            apply_override(
                &mut self.lockout,
                &field.to_ascii_lowercase(),
                value.as_ref().trim(),
            )?;
            tracing::debug!(field = %field, "Applied lockout setting override");
        }

        Ok(self)
    }
}

fn apply_override(
    config: &mut LockoutConfig,
    field: &str,
    value: &str,
) -> Result<(), TollgateError> {
    if field == "enabled" {
        config.enabled = value.parse().map_err(|_| invalid_value(field, value))?;
        return Ok(());
    }

    let slot = match field {
        "max_failed_attempts" => &mut config.max_failed_attempts,
        "attempt_window_minutes" => &mut config.attempt_window_minutes,
        "lockout_duration_minutes" => &mut config.lockout_duration_minutes,
        "max_ip_failed_attempts" => &mut config.max_ip_failed_attempts,
        "ip_attempt_window_minutes" => &mut config.ip_attempt_window_minutes,
        "ip_lockout_duration_minutes" => &mut config.ip_lockout_duration_minutes,
        _ => {
            return Err(TollgateError::Configuration(format!(
                "Unknown lockout setting: {field}"
            )));
        }
    };

    *slot = value.parse().map_err(|_| invalid_value(field, value))?;
    Ok(())
}

fn invalid_value(field: &str, value: &str) -> TollgateError {
    TollgateError::Configuration(format!("Invalid value for {field}: {value:?}"))
}
