// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The Tekton resource kinds watched by the exporter.

use crate::constants::{
    API_GROUP, API_VERSION, KIND_PIPELINE_RUN, KIND_TASK_RUN, METRICS_PREFIX,
    PLURAL_PIPELINE_RUNS, PLURAL_TASK_RUNS,
};
use kube::core::{ApiResource, GroupVersionKind};
use std::fmt;

/// A watched custom-resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunKind {
    PipelineRun,
    TaskRun,
}

/// The two gauge families exported per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    /// 1 for a succeeded run, 0 otherwise
    Status,
    /// Seconds between start and completion
    Duration,
}

impl RunKind {
    /// Every kind, in the order the binary starts their watches.
    pub const ALL: [RunKind; 2] = [RunKind::PipelineRun, RunKind::TaskRun];

    /// Kubernetes `kind` name
    #[must_use]
    pub fn kind(self) -> &'static str {
        match self {
            RunKind::PipelineRun => KIND_PIPELINE_RUN,
            RunKind::TaskRun => KIND_TASK_RUN,
        }
    }

    /// REST plural used in the watch URL
    #[must_use]
    pub fn plural(self) -> &'static str {
        match self {
            RunKind::PipelineRun => PLURAL_PIPELINE_RUNS,
            RunKind::TaskRun => PLURAL_TASK_RUNS,
        }
    }

    /// Dynamic API descriptor for an untyped watch.
    #[must_use]
    pub fn api_resource(self) -> ApiResource {
        let gvk = GroupVersionKind::gvk(API_GROUP, API_VERSION, self.kind());
        ApiResource::from_gvk_with_plural(&gvk, self.plural())
    }

    /// Full series name, e.g. `tekton_exporter_pipelinerun_status`.
    #[must_use]
    pub fn metric_name(self, metric: MetricType) -> String {
        let kind = self.kind().to_lowercase();
        match metric {
            MetricType::Status => format!("{METRICS_PREFIX}{kind}_status"),
            MetricType::Duration => format!("{METRICS_PREFIX}{kind}_duration_seconds"),
        }
    }

    /// Help text exposed alongside the series.
    #[must_use]
    pub fn metric_help(self, metric: MetricType) -> String {
        match metric {
            MetricType::Status => format!(
                "Outcome of each {} (1 = succeeded, 0 = failed or unknown)",
                self.kind()
            ),
            MetricType::Duration => format!(
                "Seconds between start and completion of each {} (0 while running)",
                self.kind()
            ),
        }
    }
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}
