// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `labels.rs`

use super::*;

fn object_labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[test]
fn test_sanitize_kubernetes_label_key() {
    assert_eq!(
        sanitize_label_name("app.kubernetes.io/team"),
        "app_kubernetes_io_team"
    );
}

#[test]
fn test_sanitize_collapses_runs() {
    assert_eq!(sanitize_label_name("a.-/b"), "a_b");
    assert_eq!(sanitize_label_name("tekton.dev/pipelineRun"), "tekton_dev_pipelineRun");
}

#[test]
fn test_sanitize_keeps_valid_name() {
    assert_eq!(sanitize_label_name("team"), "team");
    assert_eq!(sanitize_label_name("Team42"), "Team42");
}

#[test]
fn test_sanitize_is_idempotent() {
    for raw in ["app.kubernetes.io/team", "a__b", "__x..y__", "plain"] {
        let once = sanitize_label_name(raw);
        assert_eq!(sanitize_label_name(&once), once, "not idempotent for {raw}");
    }
}

#[test]
fn test_sanitize_label_names_mapping() {
    let mapping = sanitize_label_names(["team", "app.kubernetes.io/name"]);

    assert_eq!(mapping.len(), 2);
    assert_eq!(mapping["team"], "team");
    assert_eq!(mapping["app.kubernetes.io/name"], "app_kubernetes_io_name");
}

#[test]
fn test_spec_trims_and_skips_empty_names() {
    let spec = PopulatedLabelSpec::new([" team ", "", "  "]);

    let entries: Vec<_> = spec.entries().collect();
    assert_eq!(entries, vec![("team", "team")]);
    assert_eq!(PopulatedLabelSpec::new(Vec::<String>::new()).entries().count(), 0);
}

#[test]
fn test_spec_sanitized_names_deduplicated_in_order() {
    let spec = PopulatedLabelSpec::new(["b", "a.x", "a/x", "c"]);

    assert_eq!(spec.sanitized_names(), vec!["b", "a_x", "c"]);
    assert_eq!(spec.mapping()["a/x"], "a_x");
}

#[test]
fn test_populate_uses_sentinel_for_missing_label() {
    let spec = PopulatedLabelSpec::new(["app.kubernetes.io/team"]);

    let populated = spec.populate(&BTreeMap::new());

    assert_eq!(populated.len(), 1);
    assert_eq!(populated["app_kubernetes_io_team"], "#");
}

#[test]
fn test_populate_copies_present_labels_only() {
    let spec = PopulatedLabelSpec::new(["team", "env"]);

    let populated = spec.populate(&object_labels(&[
        ("team", "payments"),
        ("unrelated", "ignored"),
    ]));

    assert_eq!(populated.len(), 2);
    assert_eq!(populated["team"], "payments");
    assert_eq!(populated["env"], "#");
    assert!(!populated.contains_key("unrelated"));
}

#[test]
fn test_populate_collision_last_configured_wins() {
    let spec = PopulatedLabelSpec::new(["a.x", "a/x"]);

    let both = spec.populate(&object_labels(&[("a.x", "first"), ("a/x", "second")]));
    assert_eq!(both["a_x"], "second");

    let first_only = spec.populate(&object_labels(&[("a.x", "first")]));
    assert_eq!(first_only["a_x"], "first");
}
