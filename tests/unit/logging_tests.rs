// Logging tests

use watermarker::logging::*;

#[test]
fn test_can_initialize_tracing_subscriber() {
    // Only the first initialization in a process can succeed
    let first = init_subscriber();
    let second = init_with_config(&LoggingConfig {
        level: "debug".to_string(),
        json: true,
    });

    assert!(first.is_ok());
    assert!(second.is_err());

    tracing::info!(component = "logging_tests", "subscriber ready");
}

#[test]
fn test_invalid_level_is_rejected_by_filter() {
    let config = LoggingConfig {
        level: "watermarker=shouting".to_string(),
        json: false,
    };
    if std::env::var("RUST_LOG").is_err() {
        assert!(build_filter(&config).is_err());
    }
    assert!(!is_valid_level(&config.level));
}
