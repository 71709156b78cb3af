// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Projection of run lifecycle events onto the metric registry.
//!
//! The projector is stateless: every event is turned into a label set and a
//! value from the object alone, and all memory of earlier events lives in
//! the [`MetricsRegistry`]. The same algorithm serves both kinds:
//!
//! 1. `commonLabels` = `{name, namespace}` ∪ configured extra labels
//! 2. status labels/value from the `Succeeded` condition
//! 3. duration labels/value from `status.startTime` / `status.completionTime`
//! 4. dispatch on the event type:
//!    - `Added`: set both series
//!    - `Modified`: delete every series partially matching `commonLabels`,
//!      then set both series
//!    - `Deleted`: delete every series partially matching `commonLabels`
//!
//! The delete and the set of a `Modified` event are separate registry
//! operations; a scrape in between may briefly miss the series.

use crate::constants::{
    CONDITION_SUCCEEDED, FIELD_COMPLETION_TIME, FIELD_START_TIME, LABEL_COMPLETION_TIMESTAMP,
    LABEL_NAME, LABEL_NAMESPACE, LABEL_REASON, LABEL_SENTINEL, LABEL_START_TIMESTAMP,
    LABEL_STATUS, REASON_UNKNOWN, STATUS_FAILED, STATUS_SUCCESS,
};
use crate::errors::{AccessorError, ProjectionError};
use crate::kinds::{MetricType, RunKind};
use crate::labels::{Labels, PopulatedLabelSpec};
use crate::metrics::MetricsRegistry;
use crate::resource;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Lifecycle event type delivered by a watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Added,
    Modified,
    Deleted,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventType::Added => "Added",
            EventType::Modified => "Modified",
            EventType::Deleted => "Deleted",
        };
        f.write_str(s)
    }
}

/// One watch notification about one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEvent {
    pub kind: RunKind,
    pub event_type: EventType,
    pub object: Value,
}

impl ResourceEvent {
    #[must_use]
    pub fn new(kind: RunKind, event_type: EventType, object: Value) -> Self {
        Self {
            kind,
            event_type,
            object,
        }
    }
}

/// `status` / `reason` labels derived from the `Succeeded` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLabels {
    pub succeeded: bool,
    pub reason: String,
}

impl StatusLabels {
    /// Derive from the object's `Succeeded` condition.
    ///
    /// Defaults to `{failed, Unknown}` when the condition is absent.
    #[must_use]
    pub fn from_object(obj: &Value) -> Self {
        match resource::condition(obj, CONDITION_SUCCEEDED) {
            Some(condition) => Self {
                succeeded: condition.is_true(),
                reason: condition
                    .reason
                    .unwrap_or_else(|| REASON_UNKNOWN.to_string()),
            },
            None => Self {
                succeeded: false,
                reason: REASON_UNKNOWN.to_string(),
            },
        }
    }

    /// Gauge value: 1 for success, 0 otherwise.
    #[must_use]
    pub fn value(&self) -> f64 {
        if self.succeeded {
            1.0
        } else {
            0.0
        }
    }

    fn extend(&self, labels: &mut Labels) {
        let status = if self.succeeded {
            STATUS_SUCCESS
        } else {
            STATUS_FAILED
        };
        labels.insert(LABEL_STATUS.to_string(), status.to_string());
        labels.insert(LABEL_REASON.to_string(), self.reason.clone());
    }
}

/// Start / completion epoch seconds of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationLabels {
    pub start: Option<i64>,
    pub completion: Option<i64>,
}

impl DurationLabels {
    /// Derive from `status.startTime` and `status.completionTime`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessorError::TimestampParse`] when a timestamp is present
    /// but unparsable.
    pub fn from_object(obj: &Value) -> Result<Self, AccessorError> {
        Ok(Self {
            start: resource::timestamp(obj, FIELD_START_TIME)?,
            completion: resource::timestamp(obj, FIELD_COMPLETION_TIME)?,
        })
    }

    /// Gauge value: `completion - start` in seconds, 0 unless both are known.
    ///
    /// Not clamped; clock skew can make it negative.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(&self) -> f64 {
        match (self.start, self.completion) {
            (Some(start), Some(completion)) => (completion - start) as f64,
            _ => 0.0,
        }
    }

    fn extend(&self, labels: &mut Labels) {
        let render = |ts: Option<i64>| ts.map_or_else(|| LABEL_SENTINEL.to_string(), |t| t.to_string());
        labels.insert(LABEL_START_TIMESTAMP.to_string(), render(self.start));
        labels.insert(LABEL_COMPLETION_TIMESTAMP.to_string(), render(self.completion));
    }
}

/// Everything derived from one object, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// `{name, namespace}` ∪ extra labels; identifies the object
    pub common: Labels,
    pub status: StatusLabels,
    pub duration: DurationLabels,
}

impl Projection {
    /// Derive the projection of one object.
    ///
    /// # Errors
    ///
    /// Returns [`AccessorError`] when `metadata` is unusable or a timestamp
    /// is malformed.
    pub fn from_object(obj: &Value, spec: &PopulatedLabelSpec) -> Result<Self, AccessorError> {
        let basic = resource::basic_data(obj)?;

        let mut common = spec.populate(&resource::labels(obj));
        common.insert(LABEL_NAME.to_string(), basic.name);
        common.insert(LABEL_NAMESPACE.to_string(), basic.namespace);

        Ok(Self {
            common,
            status: StatusLabels::from_object(obj),
            duration: DurationLabels::from_object(obj)?,
        })
    }

    /// Full label set of the status series.
    #[must_use]
    pub fn status_labels(&self) -> Labels {
        let mut labels = self.common.clone();
        self.status.extend(&mut labels);
        labels
    }

    /// Full label set of the duration series.
    #[must_use]
    pub fn duration_labels(&self) -> Labels {
        let mut labels = self.common.clone();
        self.duration.extend(&mut labels);
        labels
    }
}

/// Applies events of one kind to the shared registry.
#[derive(Clone)]
pub struct EventProjector {
    kind: RunKind,
    spec: Arc<PopulatedLabelSpec>,
    registry: Arc<MetricsRegistry>,
}

impl EventProjector {
    #[must_use]
    pub fn new(kind: RunKind, spec: Arc<PopulatedLabelSpec>, registry: Arc<MetricsRegistry>) -> Self {
        Self {
            kind,
            spec,
            registry,
        }
    }

    #[must_use]
    pub fn kind(&self) -> RunKind {
        self.kind
    }

    /// Project one event onto the registry.
    ///
    /// Events of another kind are ignored. On error nothing has been
    /// written for this event, except that a `Modified` event whose write is
    /// rejected has already removed the object's previous series.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::Accessor`] for an object that cannot be
    /// projected and [`ProjectionError::Registry`] for a write outside the
    /// registered schema.
    pub fn project(&self, event: &ResourceEvent) -> Result<(), ProjectionError> {
        if event.kind != self.kind {
            debug!(
                expected = %self.kind,
                received = %event.kind,
                "Ignoring event for another kind"
            );
            return Ok(());
        }

        let projection = Projection::from_object(&event.object, &self.spec)?;
        let name = &projection.common[LABEL_NAME];
        let namespace = &projection.common[LABEL_NAMESPACE];

        match event.event_type {
            EventType::Added => {
                info!(kind = %self.kind, %name, %namespace, "Run created, exposing metrics");
                self.write(&projection)?;
            }
            EventType::Modified => {
                info!(kind = %self.kind, %name, %namespace, "Run modified, replacing metrics");
                self.forget(&projection.common);
                self.write(&projection)?;
            }
            EventType::Deleted => {
                info!(kind = %self.kind, %name, %namespace, "Run deleted, cleaning metrics");
                self.forget(&projection.common);
            }
        }

        Ok(())
    }

    fn write(&self, projection: &Projection) -> Result<(), ProjectionError> {
        self.registry.set(
            self.kind,
            MetricType::Status,
            &projection.status_labels(),
            projection.status.value(),
        )?;
        self.registry.set(
            self.kind,
            MetricType::Duration,
            &projection.duration_labels(),
            projection.duration.value(),
        )?;
        Ok(())
    }

    fn forget(&self, common: &Labels) {
        let status = self
            .registry
            .delete_partial_match(self.kind, MetricType::Status, common);
        let duration = self
            .registry
            .delete_partial_match(self.kind, MetricType::Duration, common);
        debug!(kind = %self.kind, status, duration, "Deleted stale series");
    }
}

#[cfg(test)]
#[path = "projector_tests.rs"]
mod projector_tests;
