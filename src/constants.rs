// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the Tekton exporter.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for the watched Tekton resources
pub const API_GROUP: &str = "tekton.dev";

/// API version for the watched Tekton resources
pub const API_VERSION: &str = "v1";

/// Kind name for `PipelineRun` resource
pub const KIND_PIPELINE_RUN: &str = "PipelineRun";

/// Kind name for `TaskRun` resource
pub const KIND_TASK_RUN: &str = "TaskRun";

/// Plural (REST path segment) for `PipelineRun`
pub const PLURAL_PIPELINE_RUNS: &str = "pipelineruns";

/// Plural (REST path segment) for `TaskRun`
pub const PLURAL_TASK_RUNS: &str = "taskruns";

// ============================================================================
// Resource Field Constants
// ============================================================================

/// Condition type reporting the terminal outcome of a run
pub const CONDITION_SUCCEEDED: &str = "Succeeded";

/// Status field holding the RFC3339 start time of a run
pub const FIELD_START_TIME: &str = "startTime";

/// Status field holding the RFC3339 completion time of a run
pub const FIELD_COMPLETION_TIME: &str = "completionTime";

/// Reason reported when the `Succeeded` condition is absent
pub const REASON_UNKNOWN: &str = "Unknown";

// ============================================================================
// Metric Constants
// ============================================================================

/// Prefix shared by every exported series name
pub const METRICS_PREFIX: &str = "tekton_exporter_";

/// Placeholder for a configured label or timestamp missing on an object
pub const LABEL_SENTINEL: &str = "#";

/// Label carrying `metadata.name`
pub const LABEL_NAME: &str = "name";

/// Label carrying `metadata.namespace`
pub const LABEL_NAMESPACE: &str = "namespace";

/// Label carrying `success` or `failed`
pub const LABEL_STATUS: &str = "status";

/// Label carrying the `Succeeded` condition's reason
pub const LABEL_REASON: &str = "reason";

/// Label carrying the start epoch seconds (or sentinel)
pub const LABEL_START_TIMESTAMP: &str = "start_timestamp";

/// Label carrying the completion epoch seconds (or sentinel)
pub const LABEL_COMPLETION_TIMESTAMP: &str = "completion_timestamp";

/// Value of the `status` label for a succeeded run
pub const STATUS_SUCCESS: &str = "success";

/// Value of the `status` label for any other run
pub const STATUS_FAILED: &str = "failed";

/// Labels every series carries before the configured extra labels.
///
/// A configured label may not sanitize to any of these.
pub const RESERVED_LABELS: [&str; 6] = [
    LABEL_NAME,
    LABEL_NAMESPACE,
    LABEL_STATUS,
    LABEL_REASON,
    LABEL_START_TIMESTAMP,
    LABEL_COMPLETION_TIMESTAMP,
];

// ============================================================================
// Watch Constants
// ============================================================================

/// Resource version that asks the API server to replay current state
pub const INITIAL_RESOURCE_VERSION: &str = "0";

/// HTTP status the API server uses for an expired resource version
pub const HTTP_GONE: u16 = 410;

/// Server-side timeout for a single watch request (must stay below 295s)
pub const WATCH_TIMEOUT_SECS: u32 = 290;

/// Initial reconnect delay after a watch ends (100ms)
pub const WATCH_BACKOFF_INITIAL_MILLIS: u64 = 100;

/// Maximum reconnect delay between watch attempts (30 seconds)
pub const WATCH_BACKOFF_MAX_SECS: u64 = 30;

/// Backoff multiplier (exponential growth factor)
pub const WATCH_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Randomization factor to prevent thundering herd (±10%)
pub const WATCH_BACKOFF_RANDOMIZATION_FACTOR: f64 = 0.1;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Default port for the Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 2112;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Path for the liveness endpoint
pub const HEALTH_SERVER_PATH: &str = "/healthz";

/// Default bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";

/// Content type of the Prometheus text exposition format
pub const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;
