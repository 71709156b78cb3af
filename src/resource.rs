// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed accessors over untyped resource objects.
//!
//! Watched runs arrive as `serde_json::Value` trees mirroring the API
//! server's JSON. Every accessor here is a pure function that tolerates a
//! missing or oddly shaped subtree:
//!
//! - structure the exporter cannot work without (`metadata.name`,
//!   `metadata.namespace`) yields [`AccessorError::MissingField`]
//! - structure that is legitimately absent on young objects (`status`,
//!   conditions, timestamps) yields `None`
//! - a timestamp that is present but unparsable yields
//!   [`AccessorError::TimestampParse`], since that indicates corrupt data

use crate::errors::AccessorError;
use chrono::DateTime;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

/// Identity of a resource object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicData {
    pub name: String,
    pub namespace: String,
}

/// A Kubernetes-style status condition.
///
/// Only the fields the exporter reads are kept. A field of the wrong JSON
/// type reads as `None` rather than rejecting the condition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub r#type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reason: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string))
}

impl Condition {
    /// True when `status` equals `"true"`, ignoring case.
    #[must_use]
    pub fn is_true(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|status| status.eq_ignore_ascii_case("true"))
    }
}

fn metadata(obj: &Value) -> Result<&Map<String, Value>, AccessorError> {
    obj.get("metadata")
        .and_then(Value::as_object)
        .ok_or_else(|| AccessorError::missing("metadata"))
}

fn metadata_string(obj: &Value, field: &str) -> Result<String, AccessorError> {
    metadata(obj)?
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AccessorError::missing(format!("metadata.{field}")))
}

/// Extract `metadata.name` and `metadata.namespace`.
///
/// # Errors
///
/// Returns [`AccessorError::MissingField`] when `metadata` is absent or not a
/// map, or when either field is absent or not a string.
pub fn basic_data(obj: &Value) -> Result<BasicData, AccessorError> {
    Ok(BasicData {
        name: metadata_string(obj, "name")?,
        namespace: metadata_string(obj, "namespace")?,
    })
}

/// Extract `metadata.labels`.
///
/// Returns an empty map when no labels are present. Non-string label values
/// are dropped with a warning instead of failing the whole extraction.
#[must_use]
pub fn labels(obj: &Value) -> BTreeMap<String, String> {
    let Some(raw) = obj.get("metadata").and_then(|m| m.get("labels")) else {
        return BTreeMap::new();
    };

    let Some(map) = raw.as_object() else {
        if !raw.is_null() {
            warn!(labels = %raw, "metadata.labels is not a map, ignoring it");
        }
        return BTreeMap::new();
    };

    map.iter()
        .filter_map(|(key, value)| match value.as_str() {
            Some(s) => Some((key.clone(), s.to_string())),
            None => {
                warn!(label = %key, value = %value, "Dropping non-string label value");
                None
            }
        })
        .collect()
}

/// Extract `metadata.resourceVersion`, if any.
#[must_use]
pub fn resource_version(obj: &Value) -> Option<String> {
    obj.get("metadata")
        .and_then(|m| m.get("resourceVersion"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Extract the `status` map.
///
/// `None` when the controller has not populated status yet.
#[must_use]
pub fn status(obj: &Value) -> Option<&Map<String, Value>> {
    obj.get("status").and_then(Value::as_object)
}

/// Find the first condition in `status.conditions` whose `type` matches.
///
/// `None` when status or conditions are missing or no entry matches.
#[must_use]
pub fn condition(obj: &Value, condition_type: &str) -> Option<Condition> {
    let entry = status(obj)?
        .get("conditions")?
        .as_array()?
        .iter()
        .find(|entry| entry.get("type").and_then(Value::as_str) == Some(condition_type))?;
    Condition::deserialize(entry).ok()
}

/// Parse the RFC3339 timestamp at `status.<field>` into epoch seconds.
///
/// # Errors
///
/// Returns [`AccessorError::TimestampParse`] when the field is present but is
/// not a string or not valid RFC3339. An absent or `null` field is `Ok(None)`.
pub fn timestamp(obj: &Value, field: &str) -> Result<Option<i64>, AccessorError> {
    let Some(raw) = status(obj).and_then(|s| s.get(field)) else {
        return Ok(None);
    };

    let text = match raw {
        Value::Null => return Ok(None),
        Value::String(text) => text,
        other => {
            return Err(AccessorError::TimestampParse {
                field: format!("status.{field}"),
                value: other.to_string(),
                reason: "not a string".to_string(),
            })
        }
    };

    DateTime::parse_from_rfc3339(text)
        .map(|parsed| Some(parsed.timestamp()))
        .map_err(|e| AccessorError::TimestampParse {
            field: format!("status.{field}"),
            value: text.clone(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod resource_tests;
