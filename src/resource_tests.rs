// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `resource.rs`

use super::*;
use serde_json::json;

fn run_object() -> Value {
    json!({
        "apiVersion": "tekton.dev/v1",
        "kind": "PipelineRun",
        "metadata": {
            "name": "build-1",
            "namespace": "ci",
            "resourceVersion": "4242",
            "labels": {
                "team": "payments",
                "tekton.dev/pipeline": "build"
            }
        },
        "status": {
            "startTime": "2024-01-01T00:00:00Z",
            "completionTime": "2024-01-01T00:05:00Z",
            "conditions": [
                {
                    "type": "Ready",
                    "status": "False"
                },
                {
                    "type": "Succeeded",
                    "status": "True",
                    "reason": "Completed",
                    "message": "Tasks Completed: 2"
                }
            ]
        }
    })
}

// ============================================================================
// basic_data
// ============================================================================

#[test]
fn test_basic_data() {
    let data = basic_data(&run_object()).expect("basic data");

    assert_eq!(
        data,
        BasicData {
            name: "build-1".to_string(),
            namespace: "ci".to_string(),
        }
    );
}

#[test]
fn test_basic_data_without_metadata() {
    let err = basic_data(&json!({"status": {}})).unwrap_err();

    assert_eq!(err, AccessorError::missing("metadata"));
}

#[test]
fn test_basic_data_with_malformed_metadata() {
    let err = basic_data(&json!({"metadata": "oops"})).unwrap_err();
    assert_eq!(err, AccessorError::missing("metadata"));

    let err = basic_data(&json!({"metadata": {"name": 7, "namespace": "ci"}})).unwrap_err();
    assert_eq!(err, AccessorError::missing("metadata.name"));

    let err = basic_data(&json!({"metadata": {"name": "x"}})).unwrap_err();
    assert_eq!(err, AccessorError::missing("metadata.namespace"));
}

// ============================================================================
// labels
// ============================================================================

#[test]
fn test_labels() {
    let labels = labels(&run_object());

    assert_eq!(labels.len(), 2);
    assert_eq!(labels["team"], "payments");
    assert_eq!(labels["tekton.dev/pipeline"], "build");
}

#[test]
fn test_labels_absent() {
    assert!(labels(&json!({"metadata": {"name": "x"}})).is_empty());
    assert!(labels(&json!({"metadata": {"labels": null}})).is_empty());
    assert!(labels(&json!({})).is_empty());
}

#[test]
fn test_labels_drops_non_string_values() {
    let obj = json!({
        "metadata": {
            "labels": {"team": "payments", "replicas": 3, "flag": true}
        }
    });

    let labels = labels(&obj);

    assert_eq!(labels.len(), 1);
    assert_eq!(labels["team"], "payments");
}

#[test]
fn test_labels_not_a_map() {
    assert!(labels(&json!({"metadata": {"labels": ["a", "b"]}})).is_empty());
}

#[test]
fn test_resource_version() {
    assert_eq!(resource_version(&run_object()).as_deref(), Some("4242"));
    assert_eq!(resource_version(&json!({"metadata": {}})), None);
}

// ============================================================================
// status / condition
// ============================================================================

#[test]
fn test_status_absent() {
    assert!(status(&json!({"metadata": {}})).is_none());
    assert!(status(&json!({"metadata": {}, "status": "pending"})).is_none());
    assert!(status(&run_object()).is_some());
}

#[test]
fn test_condition_found() {
    let condition = condition(&run_object(), "Succeeded").expect("condition");

    assert_eq!(condition.r#type, "Succeeded");
    assert_eq!(condition.status.as_deref(), Some("True"));
    assert_eq!(condition.reason.as_deref(), Some("Completed"));
    assert!(condition.is_true());
}

#[test]
fn test_condition_absent_cases() {
    assert!(condition(&json!({"metadata": {}}), "Succeeded").is_none());
    assert!(condition(&json!({"status": {}}), "Succeeded").is_none());
    assert!(condition(&json!({"status": {"conditions": {}}}), "Succeeded").is_none());
    assert!(condition(&run_object(), "Missing").is_none());
}

#[test]
fn test_condition_status_case_insensitive() {
    for (raw, expected) in [("true", true), ("TRUE", true), ("False", false), ("Unknown", false)] {
        let obj = json!({"status": {"conditions": [{"type": "Succeeded", "status": raw}]}});
        let cond = condition(&obj, "Succeeded").expect("condition");
        assert_eq!(cond.is_true(), expected, "status {raw}");
    }
}

#[test]
fn test_condition_without_status_is_not_true() {
    let obj = json!({"status": {"conditions": [{"type": "Succeeded"}]}});
    let cond = condition(&obj, "Succeeded").expect("condition");

    assert!(!cond.is_true());
    assert!(cond.reason.is_none());
}

#[test]
fn test_condition_tolerates_unexpected_field_types() {
    let obj = json!({"status": {"conditions": [{
        "type": "Succeeded",
        "status": "True",
        "reason": "Completed",
        "message": {"detail": "x"}
    }]}});
    let cond = condition(&obj, "Succeeded").expect("condition");
    assert!(cond.is_true());
    assert_eq!(cond.reason.as_deref(), Some("Completed"));

    let obj = json!({"status": {"conditions": [{
        "type": "Succeeded",
        "status": true,
        "reason": "Completed"
    }]}});
    let cond = condition(&obj, "Succeeded").expect("condition");
    assert!(cond.status.is_none());
    assert!(!cond.is_true());
    assert_eq!(cond.reason.as_deref(), Some("Completed"));
}

#[test]
fn test_condition_uses_first_matching_entry() {
    let obj = json!({"status": {"conditions": [
        {"type": "Succeeded", "status": 1, "reason": "Running"},
        {"type": "Succeeded", "status": "True", "reason": "Completed"}
    ]}});
    let cond = condition(&obj, "Succeeded").expect("condition");

    assert!(!cond.is_true());
    assert_eq!(cond.reason.as_deref(), Some("Running"));
}

// ============================================================================
// timestamp
// ============================================================================

#[test]
fn test_timestamp_parses_rfc3339() {
    let obj = run_object();

    assert_eq!(timestamp(&obj, "startTime"), Ok(Some(1_704_067_200)));
    assert_eq!(timestamp(&obj, "completionTime"), Ok(Some(1_704_067_500)));
}

#[test]
fn test_timestamp_with_offset() {
    let obj = json!({"status": {"startTime": "2024-01-01T01:00:00+01:00"}});

    assert_eq!(timestamp(&obj, "startTime"), Ok(Some(1_704_067_200)));
}

#[test]
fn test_timestamp_absent() {
    assert_eq!(timestamp(&json!({"metadata": {}}), "startTime"), Ok(None));
    assert_eq!(timestamp(&json!({"status": {}}), "startTime"), Ok(None));
    assert_eq!(
        timestamp(&json!({"status": {"startTime": null}}), "startTime"),
        Ok(None)
    );
}

#[test]
fn test_timestamp_malformed_is_error() {
    let obj = json!({"status": {"startTime": "yesterday", "completionTime": 12}});

    match timestamp(&obj, "startTime") {
        Err(AccessorError::TimestampParse { field, value, .. }) => {
            assert_eq!(field, "status.startTime");
            assert_eq!(value, "yesterday");
        }
        other => panic!("expected TimestampParse, got {other:?}"),
    }

    assert!(matches!(
        timestamp(&obj, "completionTime"),
        Err(AccessorError::TimestampParse { .. })
    ));
}
