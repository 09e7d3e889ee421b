//! Table-driven tests for configuration loading and validation.

use filepulse::config::load_config_from_str;

/// Represents a single config loading test case.
struct ConfigTestCase {
    /// Test case name for identification.
    name: &'static str,
    /// The config JSON content to test.
    config_json: &'static str,
    /// Whether loading should succeed.
    should_succeed: bool,
    /// Expected error substring (if should_succeed is false).
    expected_error: Option<&'static str>,
}

const CONFIG_TESTS: &[ConfigTestCase] = &[
    ConfigTestCase {
        name: "valid_minimal",
        config_json: r#"{ "version": "1.0" }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_no_pacing",
        config_json: r#"{
            "version": "1.0",
            "progress": { "checkpoints": [10, 50, 90], "tick_interval_ms": 0 }
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_no_checkpoints",
        config_json: r#"{ "version": "1.0", "progress": { "checkpoints": [] } }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "missing_version",
        config_json: r#"{ "upload_directory": "uploads" }"#,
        should_succeed: false,
        expected_error: Some("version"),
    },
    ConfigTestCase {
        name: "unsupported_version",
        config_json: r#"{ "version": "0.9" }"#,
        should_succeed: false,
        expected_error: Some("Unsupported config version"),
    },
    ConfigTestCase {
        name: "malformed_json",
        config_json: r#"{ "version": "1.0", "#,
        should_succeed: false,
        expected_error: Some("Failed to parse config JSON"),
    },
    ConfigTestCase {
        name: "checkpoint_hundred_reserved",
        config_json: r#"{ "version": "1.0", "progress": { "checkpoints": [50, 100] } }"#,
        should_succeed: false,
        expected_error: Some("outside 1..=99"),
    },
    ConfigTestCase {
        name: "duplicate_checkpoints",
        config_json: r#"{ "version": "1.0", "progress": { "checkpoints": [20, 20] } }"#,
        should_succeed: false,
        expected_error: Some("strictly ascending"),
    },
    ConfigTestCase {
        name: "zero_queue",
        config_json: r#"{ "version": "1.0", "queue_capacity": 0 }"#,
        should_succeed: false,
        expected_error: Some("queue_capacity"),
    },
    ConfigTestCase {
        name: "zero_upload_limit",
        config_json: r#"{ "version": "1.0", "max_upload_bytes": 0 }"#,
        should_succeed: false,
        expected_error: Some("max_upload_bytes"),
    },
    ConfigTestCase {
        name: "zero_observer_buffer",
        config_json: r#"{ "version": "1.0", "broadcast": { "observer_buffer": 0 } }"#,
        should_succeed: false,
        expected_error: Some("observer_buffer"),
    },
    ConfigTestCase {
        name: "empty_upload_directory",
        config_json: r#"{ "version": "1.0", "upload_directory": " " }"#,
        should_succeed: false,
        expected_error: Some("upload_directory"),
    },
    ConfigTestCase {
        name: "negative_tick_interval",
        config_json: r#"{ "version": "1.0", "progress": { "tick_interval_ms": -5 } }"#,
        should_succeed: false,
        expected_error: Some("Failed to parse config JSON"),
    },
];

#[test]
fn test_config_loading_cases() {
    for case in CONFIG_TESTS {
        let result = load_config_from_str(case.config_json);

        match (case.should_succeed, result) {
            (true, Ok(_)) => {}
            (true, Err(e)) => panic!("{}: expected success, got error: {}", case.name, e),
            (false, Ok(_)) => panic!("{}: expected an error, loading succeeded", case.name),
            (false, Err(e)) => {
                if let Some(expected) = case.expected_error {
                    let message = e.to_string();
                    assert!(
                        message.contains(expected),
                        "{}: error '{}' does not contain '{}'",
                        case.name,
                        message,
                        expected
                    );
                }
            }
        }
    }
}
