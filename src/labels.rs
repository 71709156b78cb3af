// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Object label selection and Prometheus-safe label naming.
//!
//! Users choose which Kubernetes object labels are surfaced on the exported
//! series (`--populated-labels`). Kubernetes label keys such as
//! `app.kubernetes.io/team` are not valid Prometheus label names, so every
//! configured key is sanitized once at start-up:
//!
//! ```text
//! app.kubernetes.io/team  ->  app_kubernetes_io_team
//! ```
//!
//! Every maximal run of characters outside `[A-Za-z0-9]` collapses into a
//! single `_`. Two raw keys that sanitize to the same name are not
//! disambiguated; the one configured last wins.

use crate::constants::LABEL_SENTINEL;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

/// Label set of one series, ordered by label name.
pub type Labels = BTreeMap<String, String>;

static INVALID_LABEL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-zA-Z0-9]+").expect("label sanitizer pattern is valid"));

/// Sanitize a single raw label name.
///
/// Deterministic and idempotent: sanitizing an already sanitized name
/// returns it unchanged.
#[must_use]
pub fn sanitize_label_name(raw: &str) -> String {
    INVALID_LABEL_CHARS.replace_all(raw, "_").into_owned()
}

/// Map every raw label name to its sanitized form.
#[must_use]
pub fn sanitize_label_names<I, S>(names: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| {
            let raw = name.as_ref();
            (raw.to_string(), sanitize_label_name(raw))
        })
        .collect()
}

/// The ordered set of object labels copied onto every series.
///
/// Built once from configuration and never modified afterwards: the
/// registry's label schema is derived from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulatedLabelSpec {
    /// `(raw, sanitized)` pairs in configuration order
    entries: Vec<(String, String)>,
}

impl PopulatedLabelSpec {
    /// Build the spec from raw label names.
    ///
    /// Surrounding whitespace is trimmed and empty names are ignored.
    pub fn new<I, S>(raw_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = raw_names
            .into_iter()
            .filter_map(|name| {
                let raw = name.as_ref().trim();
                if raw.is_empty() {
                    None
                } else {
                    Some((raw.to_string(), sanitize_label_name(raw)))
                }
            })
            .collect();

        Self { entries }
    }

    /// Iterate `(raw, sanitized)` pairs in configuration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(raw, sanitized)| (raw.as_str(), sanitized.as_str()))
    }

    /// Raw to sanitized mapping of the configured names.
    #[must_use]
    pub fn mapping(&self) -> HashMap<String, String> {
        sanitize_label_names(self.entries.iter().map(|(raw, _)| raw))
    }

    /// Distinct sanitized names, in first-seen order.
    #[must_use]
    pub fn sanitized_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.entries.len());
        for (_, sanitized) in &self.entries {
            if !names.contains(sanitized) {
                names.push(sanitized.clone());
            }
        }
        names
    }

    /// Select the configured labels from an object's labels.
    ///
    /// Every sanitized name is pre-seeded with the sentinel `#` and then
    /// overwritten by the object's value when the raw key is present, so
    /// the result always carries the full configured schema.
    #[must_use]
    pub fn populate(&self, object_labels: &BTreeMap<String, String>) -> Labels {
        let mut populated = Labels::new();

        for (raw, sanitized) in &self.entries {
            populated
                .entry(sanitized.clone())
                .or_insert_with(|| LABEL_SENTINEL.to_string());

            if let Some(value) = object_labels.get(raw) {
                populated.insert(sanitized.clone(), value.clone());
            }
        }

        populated
    }
}

#[cfg(test)]
#[path = "labels_tests.rs"]
mod labels_tests;
