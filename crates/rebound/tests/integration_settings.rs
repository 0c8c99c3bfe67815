//! Integration tests for building policies from settings files and the environment

mod common;

use std::time::Duration;

use common::{Counter, Timeout, flaky};
use rebound::config::{BackoffPlan, ExponentialSettings};
use rebound::{ConfigError, Policy, RetrySettings};

#[test]
fn test_toml_delays_drive_policy() {
    let settings: RetrySettings = toml::from_str(
        r#"
        max_retries = 2
        delays_ms = [1, 2]
        "#,
    )
    .unwrap();

    let policy = Policy::handle_fault::<Timeout>()
        .retry_from_settings(&settings)
        .unwrap();
    assert_eq!(policy.permitted_retries(), Some(2));

    let counter = Counter::default();
    assert_eq!(policy.execute(|| flaky(&counter, 3, "ok")).unwrap(), "ok");
    assert_eq!(counter.get(), 3);
}

#[test]
fn test_toml_exponential_section() {
    let settings: RetrySettings = toml::from_str(
        r#"
        max_retries = 4

        [exponential]
        initial_delay_ms = 1
        max_delay_ms = 5
        multiplier = 2.0
        jitter = 0.0
        "#,
    )
    .unwrap();

    match settings.plan().unwrap() {
        BackoffPlan::Exponential { retries, backoff } => {
            assert_eq!(retries, Some(4));
            assert_eq!(backoff.delay(1), Duration::from_millis(1));
            assert_eq!(backoff.delay(10), Duration::from_millis(5));
        }
        other => panic!("expected exponential plan, got {other:?}"),
    }

    let policy = Policy::handle_all_faults()
        .returning::<u8>()
        .retry_from_settings(&settings)
        .unwrap();
    let counter = Counter::default();
    assert_eq!(policy.execute(|| flaky(&counter, 5, 1)).unwrap(), 1);
    assert_eq!(counter.get(), 5);
}

#[test]
fn test_toml_rejects_unknown_keys() {
    let parsed: Result<RetrySettings, _> = toml::from_str("retries = 3");
    assert!(parsed.is_err());
}

#[test]
fn test_json_and_toml_agree() {
    let from_json = RetrySettings::from_json(r#"{"max_retries": 1, "delays_ms": [10]}"#).unwrap();
    let from_toml: RetrySettings = toml::from_str("max_retries = 1\ndelays_ms = [10]").unwrap();
    assert_eq!(from_json, from_toml);
}

#[test]
fn test_env_overlays_file_settings() {
    let file = RetrySettings {
        max_retries: Some(9),
        ..Default::default()
    };

    temp_env::with_vars(
        [
            ("REBOUND_MAX_RETRIES", Some("1")),
            ("REBOUND_DELAYS_MS", None),
            ("REBOUND_INITIAL_DELAY_MS", None),
            ("REBOUND_MAX_DELAY_MS", None),
            ("REBOUND_MULTIPLIER", None),
            ("REBOUND_JITTER", None),
        ],
        || {
            let settings = file.clone().merge(RetrySettings::from_env().unwrap());
            let policy = Policy::handle_fault::<Timeout>()
                .retry_from_settings_async(&settings)
                .unwrap();
            assert_eq!(policy.permitted_retries(), Some(1));
        },
    );
}

#[test]
fn test_env_delay_list_builds_duration_plan() {
    temp_env::with_vars(
        [
            ("REBOUND_MAX_RETRIES", None),
            ("REBOUND_DELAYS_MS", Some("5, 10,20")),
            ("REBOUND_INITIAL_DELAY_MS", None),
            ("REBOUND_MAX_DELAY_MS", None),
            ("REBOUND_MULTIPLIER", None),
            ("REBOUND_JITTER", None),
        ],
        || {
            let plan = RetrySettings::from_env().unwrap().plan().unwrap();
            assert_eq!(
                plan,
                BackoffPlan::Durations(vec![
                    Duration::from_millis(5),
                    Duration::from_millis(10),
                    Duration::from_millis(20),
                ])
            );
        },
    );
}

#[test]
fn test_invalid_env_value_reported() {
    temp_env::with_var("REBOUND_JITTER", Some("lots"), || {
        match RetrySettings::from_env() {
            Err(ConfigError::InvalidEnv { var, value }) => {
                assert_eq!(var, "REBOUND_JITTER");
                assert_eq!(value, "lots");
            }
            other => panic!("expected InvalidEnv, got {other:?}"),
        }
    });
}

#[test]
fn test_invalid_settings_rejected_by_builders() {
    let mismatched = RetrySettings {
        max_retries: Some(3),
        delays_ms: vec![1],
        ..Default::default()
    };
    assert!(matches!(
        Policy::handle_all_faults().retry_from_settings(&mismatched),
        Err(ConfigError::RetryCountMismatch {
            max_retries: 3,
            delays: 1
        })
    ));

    let shrinking = RetrySettings {
        exponential: Some(ExponentialSettings {
            multiplier: 0.5,
            ..Default::default()
        }),
        ..Default::default()
    };
    assert!(matches!(
        Policy::for_result::<String>().retry_from_settings(&shrinking),
        Err(ConfigError::InvalidMultiplier(m)) if m == 0.5
    ));
}
