use std::sync::Arc;

use async_trait::async_trait;
use tollgate::{
    EventHandler, LockoutConfig, LockoutEvent, Settings, TollgateBuilder, TollgateBuilderError,
};
use tollgate_core::error::EventError;

struct FailingHandler;

#[async_trait]
impl EventHandler for FailingHandler {
    async fn handle_event(&self, _event: &LockoutEvent) -> Result<(), EventError> {
        Err(EventError::HandlerError("queue unavailable".to_string()))
    }
}

#[tokio::test]
async fn test_builder_defaults() {
    let gate = TollgateBuilder::new()
        .build()
        .await
        .expect("Failed to build Tollgate");

    assert_eq!(gate.tracker().config(), &LockoutConfig::default());
    assert_eq!(gate.events().handler_count().await, 0);
}

#[tokio::test]
async fn test_builder_with_lockout_config() {
    let gate = TollgateBuilder::new()
        .with_lockout(LockoutConfig {
            max_failed_attempts: 2,
            ..Default::default()
        })
        .build()
        .await
        .expect("Failed to build Tollgate");

    gate.record_failure("a@x.com", None).await.unwrap();
    let report = gate.record_failure("a@x.com", None).await.unwrap();
    assert!(report.is_account_locked());
}

#[tokio::test]
async fn test_builder_with_settings() {
    let settings = Settings::from_json_str(r#"{ "lockout": { "max_failed_attempts": 9 } }"#)
        .expect("Failed to parse settings");

    let gate = TollgateBuilder::new()
        .with_settings(settings)
        .build()
        .await
        .expect("Failed to build Tollgate");

    assert_eq!(gate.tracker().config().max_failed_attempts, 9);
}

#[tokio::test]
async fn test_builder_rejects_invalid_config() {
    let result = TollgateBuilder::new()
        .with_lockout(LockoutConfig {
            lockout_duration_minutes: 0,
            ..Default::default()
        })
        .build()
        .await;

    assert!(matches!(
        result,
        Err(TollgateBuilderError::InvalidConfiguration(msg)) if msg.contains("lockout_duration_minutes")
    ));
}

#[tokio::test]
async fn test_handler_errors_surface_after_recording() {
    let gate = TollgateBuilder::new()
        .with_event_handler(Arc::new(FailingHandler))
        .build()
        .await
        .unwrap();

    let result = gate.record_failure("a@x.com", Some("10.0.0.1")).await;
    assert!(matches!(result, Err(tollgate::TollgateError::Event(_))));

    // The attempt is counted even though fan-out failed
    assert_eq!(gate.tracker().account_record("a@x.com").unwrap().failed_attempts, 1);
}
