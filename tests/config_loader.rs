mod common;

use common::temp_config;
use markpen::{App, ConfigurationError, LoadError, RuntimeConfig};

/// Test that RuntimeConfig::default() produces the documented values.
#[test]
fn test_config_default_values() {
    let config = RuntimeConfig::default();

    assert_eq!(config.markers.action, "data-action");
    assert_eq!(config.markers.event, "data-action-event");
    assert_eq!(config.markers.value, "data-action-value");
    assert_eq!(
        config.delegated_events,
        vec!["click", "change", "input", "submit", "keydown", "keyup"]
    );
    assert!(!config.coalesce_renders);
    assert_eq!(config.log_filter, "info");
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_path_ends_with_expected() {
    let path = RuntimeConfig::config_path();
    assert!(path.ends_with("markpen/config.toml"));
}

/// A partial file keeps defaults for everything it omits.
#[test]
fn test_load_partial_file() {
    let (_dir, path) = temp_config(
        r#"
coalesce_renders = true

[markers]
action = "data-oink"
"#,
    );

    let config = RuntimeConfig::load_from(&path).expect("Should load partial config");
    assert!(config.coalesce_renders);
    assert_eq!(config.markers.action, "data-oink");
    assert_eq!(config.markers.event, "data-action-event");
    assert_eq!(config.delegated_events.len(), 6);
    assert_eq!(config.log_filter, "info");
}

#[test]
fn test_load_full_file() {
    let (_dir, path) = temp_config(
        r#"
delegated_events = ["click", "dblclick"]
coalesce_renders = false
log_filter = "markpen=trace"

[markers]
action = "x-do"
event = "x-on"
value = "x-val"
"#,
    );

    let config = RuntimeConfig::load_from(&path).expect("Should load config");
    assert_eq!(config.delegated_events, vec!["click", "dblclick"]);
    assert_eq!(config.log_filter, "markpen=trace");
    assert_eq!(config.markers.value, "x-val");
}

#[test]
fn test_missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    match RuntimeConfig::load_from(&path) {
        Err(LoadError::ReadError { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("Expected ReadError, got: {other:?}"),
    }
}

#[test]
fn test_invalid_toml_is_a_parse_error() {
    let (_dir, path) = temp_config("this is not valid toml [[[");

    match RuntimeConfig::load_from(&path) {
        Err(LoadError::ParseError { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("Expected ParseError, got: {other:?}"),
    }
}

#[test]
fn test_wrong_field_type_is_a_parse_error() {
    let result = RuntimeConfig::from_toml("coalesce_renders = \"yes\"");
    assert!(matches!(result, Err(LoadError::ParseError { .. })));
}

#[test]
fn test_validation_fails_empty_marker() {
    let (_dir, path) = temp_config(
        r#"
[markers]
value = "  "
"#,
    );

    let err = RuntimeConfig::load_from(&path).unwrap_err().to_string();
    assert!(err.contains("value marker"), "got: {err}");
}

#[test]
fn test_validation_fails_duplicate_markers() {
    let result = RuntimeConfig::from_toml(
        r#"
[markers]
action = "data-x"
event = "data-x"
"#,
    );

    match result.unwrap_err() {
        LoadError::ValidationError { message } => assert!(message.contains("distinct")),
        other => panic!("Expected ValidationError, got: {other:?}"),
    }
}

#[test]
fn test_validation_fails_without_events() {
    let config = RuntimeConfig {
        delegated_events: vec![],
        ..RuntimeConfig::default()
    };

    match config.validate().unwrap_err() {
        LoadError::ValidationError { message } => {
            assert!(message.contains("At least one delegated event"));
        }
        other => panic!("Expected ValidationError, got: {other:?}"),
    }
}

#[test]
fn test_validation_fails_duplicate_or_empty_events() {
    let duplicate = RuntimeConfig::from_toml(r#"delegated_events = ["click", "input", "click"]"#);
    let err = duplicate.unwrap_err().to_string();
    assert!(err.contains("'click' is listed twice"), "got: {err}");

    let empty = RuntimeConfig::from_toml(r#"delegated_events = ["click", ""]"#);
    assert!(matches!(empty, Err(LoadError::ValidationError { .. })));
}

#[test]
fn test_config_roundtrip() {
    let original = RuntimeConfig {
        coalesce_renders: true,
        ..RuntimeConfig::default()
    };
    let serialized = toml::to_string(&original).expect("Should serialize");
    let deserialized = RuntimeConfig::from_toml(&serialized).expect("Should deserialize");
    assert_eq!(original, deserialized);
}

/// An invalid config handed to the builder fails construction.
#[test]
fn test_builder_rejects_invalid_config() {
    let host = common::host();
    let config = RuntimeConfig {
        delegated_events: vec!["click".to_string(), "click".to_string()],
        ..RuntimeConfig::default()
    };

    let result = App::builder(host.clone())
        .root("#app")
        .view(|_, _| String::new())
        .config(config)
        .build();
    assert!(matches!(
        result,
        Err(ConfigurationError::InvalidConfig(LoadError::ValidationError { .. }))
    ));
    assert_eq!(host.listener_count(), 0);
}
