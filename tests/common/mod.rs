// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tekton_exporter::errors::WatchError;
use tekton_exporter::kinds::RunKind;
use tekton_exporter::projector::{EventType, ResourceEvent};
use tekton_exporter::watch::{EventSource, WatchItem, WatchStream};

/// Event source replaying one recorded subscription per call.
#[derive(Clone, Default)]
pub struct RecordedSource {
    subscriptions: Arc<Mutex<VecDeque<Vec<WatchItem>>>>,
}

impl RecordedSource {
    pub fn push(&self, items: Vec<WatchItem>) {
        self.subscriptions.lock().unwrap().push_back(items);
    }
}

#[async_trait]
impl EventSource for RecordedSource {
    async fn subscribe(
        &self,
        _kind: RunKind,
        _namespace: Option<&str>,
        _resource_version: &str,
    ) -> Result<WatchStream, WatchError> {
        let items = self.subscriptions.lock().unwrap().pop_front();
        match items {
            Some(items) => Ok(futures::stream::iter(items.into_iter().map(Ok)).boxed()),
            None => Err(WatchError::Api {
                code: 503,
                message: "no more recorded subscriptions".to_string(),
            }),
        }
    }
}

/// A finished `PipelineRun` with the given condition status.
pub fn pipeline_run(name: &str, rv: &str, status: &str, reason: &str) -> Value {
    json!({
        "apiVersion": "tekton.dev/v1",
        "kind": "PipelineRun",
        "metadata": {
            "name": name,
            "namespace": "ci",
            "resourceVersion": rv,
            "labels": {"app.kubernetes.io/team": "payments"}
        },
        "status": {
            "startTime": "2024-01-01T00:00:00Z",
            "completionTime": "2024-01-01T00:05:00Z",
            "conditions": [{"type": "Succeeded", "status": status, "reason": reason}]
        }
    })
}

pub fn event(event_type: EventType, object: Value) -> WatchItem {
    WatchItem::Event(ResourceEvent::new(RunKind::PipelineRun, event_type, object))
}
