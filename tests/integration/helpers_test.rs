//! Helpers working together the way a page would use them
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use serde_json::json;
use tempfile::tempdir;

use pagekit::config::{Config, ConfigManager};
use pagekit::utils::{
    decode_params, encode_params, format_datetime, validate, CryptoManager, DateFormat, DeviceInfo,
    Storage, StorageKind, ValidationKind,
};
use pagekit::{retry, PageKitError, RetryPolicy};

#[test]
fn test_encrypted_value_survives_reopen() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("local.json");
    let crypto = CryptoManager::new("page-key", "page-iv", None);

    let token = crypto.encrypt_aes("session-token");
    Storage::open(&path)?.set(StorageKind::Local, "token", &json!(token))?;
    Storage::open(&path)?.set(StorageKind::Session, "scratch", &json!({ "a": 1 }))?;

    let reopened = Storage::open(&path)?;
    let stored = reopened.get(StorageKind::Local, "token")?;
    let stored = stored.as_ref().and_then(|v| v.as_str()).unwrap_or_default();
    assert_eq!(crypto.decrypt_aes(stored)?, "session-token");

    // Session area is never persisted
    assert_eq!(reopened.get(StorageKind::Session, "scratch")?, None);
    Ok(())
}

#[test]
fn test_query_round_trip_feeds_validation() -> Result<()> {
    let mut params = BTreeMap::new();
    params.insert("phone".to_string(), "13800138000".to_string());
    params.insert("email".to_string(), "a.b@example.com".to_string());
    params.insert("name".to_string(), "张三 & co".to_string());

    let url = format!("https://example.com/form{}#top", encode_params(&params));
    let decoded = decode_params(&url)?;
    assert_eq!(decoded, params);

    assert!(validate(ValidationKind::Phone, decoded.get("phone").map(String::as_str), true));
    assert!(validate(ValidationKind::Email, decoded.get("email").map(String::as_str), true));
    assert!(!validate(ValidationKind::Phone, decoded.get("missing").map(String::as_str), true));
    // Optional fields are still checked against the format
    assert!(!validate(ValidationKind::Phone, decoded.get("missing").map(String::as_str), false));
    Ok(())
}

#[test]
fn test_unknown_validation_kind_is_coded() {
    let err = "zipCode".parse::<ValidationKind>().unwrap_err();
    assert!(matches!(err, PageKitError::UnknownValidationKind(_)));
    assert_eq!(
        serde_json::to_value(err.code()).unwrap(),
        json!("unknown_validation_kind")
    );
}

#[test]
fn test_format_and_device_helpers() {
    let moment = NaiveDate::from_ymd_opt(2024, 3, 5)
        .and_then(|d| d.and_hms_opt(7, 8, 9))
        .unwrap();
    assert_eq!(format_datetime(&DateFormat::at(moment)), "2024/03/05 07:08:09");
    assert_eq!(
        format_datetime(&DateFormat::at(moment).date_only().separators("-", ":")),
        "2024-03-05"
    );

    let info = DeviceInfo::from_user_agent(
        "Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148",
    );
    assert!(info.ipad && info.ios && info.is_mobile());
}

#[tokio::test]
async fn test_configured_retry_policy_drives_retry() -> Result<()> {
    let dir = tempdir()?;
    let manager = ConfigManager::with_path(dir.path().join("pagekit.json")).await?;

    let mut config: Config = manager.get_config().await;
    config.retry.max_retries = 2;
    config.retry.delay_ms = 1;
    manager.update_config(config).await?;

    let policy: RetryPolicy = manager.get_config().await.retry_policy();
    assert_eq!(policy.max_attempts(), 3);

    let calls = Arc::new(AtomicUsize::new(0));
    let result: std::result::Result<(), String> = retry(
        || {
            let calls = calls.clone();
            async move {
                let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(format!("attempt {}", attempt))
            }
        },
        &policy,
        "configured retry",
    )
    .await;

    assert_eq!(result.unwrap_err(), "attempt 3");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(policy.delay_for(1), Duration::from_millis(1));
    Ok(())
}
