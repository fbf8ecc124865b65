//! Config Validation Tests
//!
//! Typo detection and range validation for `EngineConfig`, exercised
//! independently from the rest of the engine.

use lead_engine::config::validation::{known_config_keys, suggest_correction, validate_unknown_keys};
use lead_engine::config::{ConfigError, EngineConfig};

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_threshold_warns_with_suggestion() {
    let toml_str = r#"
[thresholds]
temp_critcal_c = 110.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("temp_critcal_c"));
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("thresholds.temp_critical_c")
    );
}

#[test]
fn typo_in_engine_section_warns() {
    let toml_str = r#"
[engine]
dealershp = "Richard Automotive"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].suggestion.as_deref(), Some("engine.dealership"));
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[engine]
dealership = "Richard Automotive"
tenant_id = "richard"

[thresholds]
temp_warning_c = 95.0
temp_critical_c = 105.0

[orchestration]
generation_timeout_ms = 5000
generation_endpoint = "http://localhost:9000/draft"

[notifications]
webhook_url = "http://localhost:9000/hook"
"#;
    assert!(validate_unknown_keys(toml_str).is_empty());
}

#[test]
fn default_config_round_trips_through_toml_without_warnings() {
    let toml_str = EngineConfig::default().to_toml().unwrap();
    assert!(validate_unknown_keys(&toml_str).is_empty());
    assert!(EngineConfig::from_toml_str(&toml_str).is_ok());
}

#[test]
fn far_off_keys_get_no_suggestion() {
    let known = known_config_keys();
    assert!(suggest_correction("completely.unrelated.key", &known).is_none());
}

// ============================================================================
// Range Validation
// ============================================================================

#[test]
fn inverted_temperature_thresholds_are_rejected() {
    let toml_str = r#"
[thresholds]
temp_warning_c = 110.0
temp_critical_c = 100.0
"#;
    match EngineConfig::from_toml_str(toml_str) {
        Err(ConfigError::Validation(errors)) => {
            assert!(errors.iter().any(|e| e.contains("thresholds.temp")));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn all_errors_are_collected() {
    let toml_str = r#"
[thresholds]
battery_warning_v = 11.0
battery_critical_v = 12.0

[sync]
lead_poll_interval_ms = 0

[orchestration]
generation_timeout_ms = 0
"#;
    match EngineConfig::from_toml_str(toml_str) {
        Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 3, "{errors:?}"),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn config_file_is_loaded_from_disk() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[engine]\ndealership = \"Costa Motors\"\n").unwrap();

    let config = EngineConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.engine.dealership, "Costa Motors");
    assert_eq!(config.thresholds.temp_critical_c, 105.0);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = EngineConfig::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_, _)));
}
