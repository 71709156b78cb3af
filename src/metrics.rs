// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus registry holding the exported run series.
//!
//! Four gauge families are registered once at start-up, one per
//! (kind × metric type):
//!
//! | Series                                          | Labels                                                        |
//! |-------------------------------------------------|---------------------------------------------------------------|
//! | `tekton_exporter_pipelinerun_status`            | `name`, `namespace`, `status`, `reason`, extra labels         |
//! | `tekton_exporter_taskrun_status`                | `name`, `namespace`, `status`, `reason`, extra labels         |
//! | `tekton_exporter_pipelinerun_duration_seconds`  | `name`, `namespace`, `start_timestamp`, `completion_timestamp`, extra labels |
//! | `tekton_exporter_taskrun_duration_seconds`      | `name`, `namespace`, `start_timestamp`, `completion_timestamp`, extra labels |
//!
//! The extra labels come from the [`PopulatedLabelSpec`] and are fixed for
//! the lifetime of the registry.
//!
//! Next to each `GaugeVec` the registry keeps an index of live label sets,
//! which is what makes partial-match deletion possible. Every family is
//! guarded by its own mutex so concurrent writers never interleave an
//! index update with the matching gauge update.
//!
//! # Example
//!
//! ```rust
//! use tekton_exporter::kinds::{MetricType, RunKind};
//! use tekton_exporter::labels::{Labels, PopulatedLabelSpec};
//! use tekton_exporter::metrics::MetricsRegistry;
//!
//! let registry = MetricsRegistry::new(&PopulatedLabelSpec::default()).unwrap();
//! let labels: Labels = [
//!     ("name", "build-1"),
//!     ("namespace", "ci"),
//!     ("status", "success"),
//!     ("reason", "Completed"),
//! ]
//! .into_iter()
//! .map(|(k, v)| (k.to_string(), v.to_string()))
//! .collect();
//!
//! registry.set(RunKind::PipelineRun, MetricType::Status, &labels, 1.0).unwrap();
//! assert_eq!(registry.get(RunKind::PipelineRun, MetricType::Status, &labels), Some(1.0));
//! ```

use crate::constants::{
    LABEL_COMPLETION_TIMESTAMP, LABEL_NAME, LABEL_NAMESPACE, LABEL_REASON,
    LABEL_START_TIMESTAMP, LABEL_STATUS, RESERVED_LABELS,
};
use crate::errors::{RegistryError, SchemaError};
use crate::kinds::{MetricType, RunKind};
use crate::labels::{Labels, PopulatedLabelSpec};
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// One gauge family and the index of its live series.
struct Family {
    name: String,
    gauge: GaugeVec,
    label_names: BTreeSet<String>,
    series: Mutex<HashMap<Labels, f64>>,
}

impl Family {
    fn new(
        registry: &Registry,
        kind: RunKind,
        metric: MetricType,
        extra_labels: &[String],
    ) -> Result<Self, SchemaError> {
        let specific: [&str; 2] = match metric {
            MetricType::Status => [LABEL_STATUS, LABEL_REASON],
            MetricType::Duration => [LABEL_START_TIMESTAMP, LABEL_COMPLETION_TIMESTAMP],
        };

        let mut ordered: Vec<&str> = vec![LABEL_NAME, LABEL_NAMESPACE];
        ordered.extend(specific);
        ordered.extend(extra_labels.iter().map(String::as_str));

        let name = kind.metric_name(metric);
        let opts = Opts::new(name.clone(), kind.metric_help(metric));
        let gauge = GaugeVec::new(opts, &ordered)?;
        registry.register(Box::new(gauge.clone()))?;

        Ok(Self {
            name,
            gauge,
            label_names: ordered.iter().map(|l| (*l).to_string()).collect(),
            series: Mutex::new(HashMap::new()),
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Labels, f64>> {
        self.series.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn violation(&self, labels: &Labels) -> RegistryError {
        RegistryError::SchemaViolation {
            metric: self.name.clone(),
            expected: self.label_names.iter().cloned().collect(),
            actual: labels.keys().cloned().collect(),
        }
    }

    fn check_schema(&self, labels: &Labels) -> Result<(), RegistryError> {
        let matches = labels.len() == self.label_names.len()
            && labels.keys().all(|k| self.label_names.contains(k));
        if matches {
            Ok(())
        } else {
            Err(self.violation(labels))
        }
    }

    fn remove_from_gauge(&self, labels: &Labels) {
        let values: HashMap<&str, &str> = labels
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        if let Err(e) = self.gauge.remove(&values) {
            // Index and gauge are updated under the same lock, so this only
            // fires if someone bypassed the registry.
            debug!(metric = %self.name, error = %e, "Series already absent from gauge");
        }
    }
}

/// Returns true when `labels` carries every key of `subset` with the same value.
fn partially_matches(labels: &Labels, subset: &Labels) -> bool {
    subset
        .iter()
        .all(|(key, value)| labels.get(key).is_some_and(|v| v == value))
}

/// Registry of the exported run series.
///
/// Constructed explicitly and shared by reference (`Arc`) between the watch
/// workers and the HTTP server.
pub struct MetricsRegistry {
    registry: Registry,
    extra_labels: Vec<String>,
    pipelinerun_status: Family,
    pipelinerun_duration: Family,
    taskrun_status: Family,
    taskrun_duration: Family,
}

impl MetricsRegistry {
    /// Register the four gauge families with the configured extra labels.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::ReservedLabel`] when a configured label
    /// sanitizes to a built-in label name, or [`SchemaError::Prometheus`]
    /// when the Prometheus client rejects a name.
    pub fn new(spec: &PopulatedLabelSpec) -> Result<Self, SchemaError> {
        for (raw, sanitized) in spec.entries() {
            if RESERVED_LABELS.iter().any(|reserved| *reserved == sanitized) {
                return Err(SchemaError::ReservedLabel {
                    raw: raw.to_string(),
                    sanitized: sanitized.to_string(),
                });
            }
        }

        let registry = Registry::new();
        let extra_labels = spec.sanitized_names();

        let pipelinerun_status =
            Family::new(&registry, RunKind::PipelineRun, MetricType::Status, &extra_labels)?;
        let pipelinerun_duration =
            Family::new(&registry, RunKind::PipelineRun, MetricType::Duration, &extra_labels)?;
        let taskrun_status =
            Family::new(&registry, RunKind::TaskRun, MetricType::Status, &extra_labels)?;
        let taskrun_duration =
            Family::new(&registry, RunKind::TaskRun, MetricType::Duration, &extra_labels)?;

        debug!(extra_labels = ?extra_labels, "Registered run metrics");

        Ok(Self {
            registry,
            extra_labels,
            pipelinerun_status,
            pipelinerun_duration,
            taskrun_status,
            taskrun_duration,
        })
    }

    fn family(&self, kind: RunKind, metric: MetricType) -> &Family {
        match (kind, metric) {
            (RunKind::PipelineRun, MetricType::Status) => &self.pipelinerun_status,
            (RunKind::PipelineRun, MetricType::Duration) => &self.pipelinerun_duration,
            (RunKind::TaskRun, MetricType::Status) => &self.taskrun_status,
            (RunKind::TaskRun, MetricType::Duration) => &self.taskrun_duration,
        }
    }

    /// Sanitized extra label names every series carries.
    #[must_use]
    pub fn extra_labels(&self) -> &[String] {
        &self.extra_labels
    }

    /// Create or overwrite the series identified by `labels`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SchemaViolation`] when `labels` does not carry
    /// exactly the label names registered for the family.
    pub fn set(
        &self,
        kind: RunKind,
        metric: MetricType,
        labels: &Labels,
        value: f64,
    ) -> Result<(), RegistryError> {
        let family = self.family(kind, metric);
        family.check_schema(labels)?;

        let values: HashMap<&str, &str> = labels
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let mut series = family.lock();
        let gauge = family
            .gauge
            .get_metric_with(&values)
            .map_err(|_| family.violation(labels))?;
        gauge.set(value);
        series.insert(labels.clone(), value);

        Ok(())
    }

    /// Delete every series whose labels contain `subset`.
    ///
    /// Returns the number of series deleted.
    pub fn delete_partial_match(&self, kind: RunKind, metric: MetricType, subset: &Labels) -> usize {
        let family = self.family(kind, metric);
        let mut series = family.lock();

        let doomed: Vec<Labels> = series
            .keys()
            .filter(|labels| partially_matches(labels, subset))
            .cloned()
            .collect();

        for labels in &doomed {
            family.remove_from_gauge(labels);
            series.remove(labels);
        }

        doomed.len()
    }

    /// Delete the series identified exactly by `labels`.
    ///
    /// Returns true if a series was deleted.
    pub fn delete(&self, kind: RunKind, metric: MetricType, labels: &Labels) -> bool {
        let family = self.family(kind, metric);
        let mut series = family.lock();

        if series.remove(labels).is_some() {
            family.remove_from_gauge(labels);
            true
        } else {
            false
        }
    }

    /// Current value of one series.
    #[must_use]
    pub fn get(&self, kind: RunKind, metric: MetricType, labels: &Labels) -> Option<f64> {
        self.family(kind, metric).lock().get(labels).copied()
    }

    /// Label sets of every live series in a family, sorted.
    #[must_use]
    pub fn series(&self, kind: RunKind, metric: MetricType) -> Vec<Labels> {
        let mut all: Vec<Labels> = self.family(kind, metric).lock().keys().cloned().collect();
        all.sort();
        all
    }

    /// Gather and encode all metrics in Prometheus text format
    ///
    /// # Errors
    ///
    /// Returns error if encoding fails
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod metrics_tests;
