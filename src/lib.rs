// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # Tekton Exporter - Prometheus metrics for Tekton runs
//!
//! Watches Tekton `PipelineRun` and `TaskRun` resources and projects their
//! status and timing onto Prometheus gauges.
//!
//! ## Overview
//!
//! Each watched kind has its own worker. Every `Added`, `Modified` or
//! `Deleted` notification is projected onto a shared registry:
//!
//! ```text
//! WatchController --(event)--> EventProjector --(labels, value)--> MetricsRegistry --> /metrics
//! ```
//!
//! ## Modules
//!
//! - [`labels`] - Prometheus-safe naming of user-selected object labels
//! - [`resource`] - Typed accessors over untyped resource objects
//! - [`metrics`] - Registry holding the four exported gauge families
//! - [`projector`] - Event-to-metric projection
//! - [`watch`] - Watch subscriptions and their supervision
//! - [`server`] - HTTP endpoint serving the registry
//! - [`cli`] - Command-line flags
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use tekton_exporter::kinds::{MetricType, RunKind};
//! use tekton_exporter::labels::PopulatedLabelSpec;
//! use tekton_exporter::metrics::MetricsRegistry;
//! use tekton_exporter::projector::{EventProjector, EventType, ResourceEvent};
//!
//! let spec = Arc::new(PopulatedLabelSpec::new(["team"]));
//! let registry = Arc::new(MetricsRegistry::new(&spec).unwrap());
//! let projector = EventProjector::new(RunKind::PipelineRun, spec, registry.clone());
//!
//! let object = json!({
//!     "metadata": {"name": "build-1", "namespace": "ci", "labels": {"team": "payments"}},
//!     "status": {"conditions": [{"type": "Succeeded", "status": "True", "reason": "Completed"}]}
//! });
//! projector
//!     .project(&ResourceEvent::new(RunKind::PipelineRun, EventType::Added, object))
//!     .unwrap();
//!
//! assert_eq!(registry.series(RunKind::PipelineRun, MetricType::Status).len(), 1);
//! ```

pub mod backoff;
pub mod cli;
pub mod constants;
pub mod errors;
pub mod kinds;
pub mod labels;
pub mod metrics;
pub mod projector;
pub mod resource;
pub mod server;
pub mod watch;
