// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the Tekton exporter.
//!
//! Each layer owns one enum:
//! - [`AccessorError`] - reading fields out of an untyped resource object
//! - [`SchemaError`] - registering the metric label schema at start-up
//! - [`RegistryError`] - writing a series that does not fit the schema
//! - [`ProjectionError`] - projecting a single watch event
//! - [`WatchError`] - opening or consuming a watch subscription
//!
//! Only [`SchemaError`] is fatal; everything else is logged and the
//! affected event or subscription is skipped or retried.

use thiserror::Error;

/// Errors raised while extracting typed fields from a resource object.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessorError {
    /// A required field is absent or has the wrong shape
    #[error("Missing or malformed field '{field}'")]
    MissingField {
        /// Dotted path of the field, e.g. `metadata.name`
        field: String,
    },

    /// A timestamp field is present but is not a valid RFC3339 string
    #[error("Impossible to parse timestamp '{field}' = '{value}': {reason}")]
    TimestampParse {
        /// Dotted path of the timestamp field
        field: String,
        /// Raw value found on the object
        value: String,
        /// Parser error message
        reason: String,
    },
}

impl AccessorError {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}

/// Errors raised while registering the metric label schema.
///
/// These can only come from configuration, so the binary refuses to start.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A configured label sanitizes to a label the exporter already owns
    #[error("Configured label '{raw}' sanitizes to reserved label name '{sanitized}'")]
    ReservedLabel {
        /// Label name as configured
        raw: String,
        /// Label name after sanitizing
        sanitized: String,
    },

    /// The Prometheus client rejected a metric or label definition
    #[error("Failed to register metric: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Errors raised by metric registry writes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The label set handed to `set` does not match the registered schema
    #[error("Label set {actual:?} does not match schema {expected:?} of metric '{metric}'")]
    SchemaViolation {
        /// Series name
        metric: String,
        /// Label names registered for the series
        expected: Vec<String>,
        /// Label names that were supplied
        actual: Vec<String>,
    },
}

/// Errors raised while projecting one event onto the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    #[error(transparent)]
    Accessor(#[from] AccessorError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Errors raised by a watch subscription.
#[derive(Error, Debug)]
pub enum WatchError {
    /// The subscription could not be established
    #[error("Failed to open watch on {resource}: {source}")]
    Connect {
        /// Plural of the watched resource
        resource: String,
        #[source]
        source: kube::Error,
    },

    /// The open subscription failed mid-stream
    #[error("Watch stream on {resource} failed: {source}")]
    Stream {
        /// Plural of the watched resource
        resource: String,
        #[source]
        source: kube::Error,
    },

    /// A delivered object could not be converted to its untyped form
    #[error("Failed to decode watched object: {0}")]
    Decode(#[from] serde_json::Error),

    /// The API server reported an error inside the stream
    #[error("API server returned watch error (HTTP {code}): {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Server message
        message: String,
    },
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
