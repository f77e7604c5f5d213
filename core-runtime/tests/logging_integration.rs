//! Integration tests for logging helpers and configuration

use bridge_traits::time::LogLevel;
use core_runtime::logging::{
    init_logging, redact_if_sensitive, strip_path, LogFormat, LoggingConfig,
};

#[test]
fn test_second_init_fails() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn);

    // Another test binary may have installed a subscriber already; the second
    // call in this process must fail either way.
    let _ = init_logging(config.clone());
    assert!(init_logging(config).is_err());
}

#[test]
fn test_credentials_are_redacted() {
    for field in ["access_token", "refresh_token", "password", "apikey", "Authorization"] {
        assert_eq!(redact_if_sensitive(field, "value"), "[REDACTED]", "{}", field);
    }
}

#[test]
fn test_emails_are_masked() {
    let redacted = redact_if_sensitive("email", "artist@label.fm");
    assert!(redacted.starts_with('a'));
    assert!(!redacted.contains("label.fm"));
}

#[test]
fn test_catalog_values_pass_through() {
    assert_eq!(redact_if_sensitive("artist_name", "Nina Simone"), "Nina Simone");
    assert_eq!(redact_if_sensitive("track_id", "t-42"), "t-42");
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/var/mobile/tmp/cover.jpg"), "cover.jpg");
    assert_eq!(strip_path("D:\\uploads\\demo.mp3"), "demo.mp3");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_pii_redaction(false)
        .with_spans(false)
        .with_target(false);

    assert_eq!(config.format, LogFormat::Json);
    assert!(!config.redact_pii);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
}
