// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Watch controllers feeding run events into the projector.
//!
//! One [`WatchController`] runs per [`RunKind`] on its own task. It opens a
//! watch subscription through an [`EventSource`], hands every event to its
//! [`EventProjector`] synchronously and in arrival order, and reopens the
//! subscription whenever it ends.
//!
//! # Resumption
//!
//! The controller remembers the last `resourceVersion` it saw (from objects
//! and bookmarks) and resumes from it. When the API server answers that the
//! version has expired (HTTP 410), the controller restarts from `"0"`, which
//! replays every existing object as `Added`.
//!
//! # Errors
//!
//! A single event that cannot be projected is logged and skipped. A failing
//! subscription is logged and retried with [`watch_backoff`]; nothing in
//! here ends the process.

use crate::backoff::{watch_backoff, ExponentialBackoff};
use crate::constants::{HTTP_GONE, INITIAL_RESOURCE_VERSION, WATCH_TIMEOUT_SECS};
use crate::errors::WatchError;
use crate::kinds::RunKind;
use crate::projector::{EventProjector, EventType, ResourceEvent};
use crate::resource;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use kube::api::{Api, DynamicObject, WatchEvent, WatchParams};
use kube::Client;
use tracing::{debug, error, info, warn};

/// One item delivered by a watch subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchItem {
    /// A lifecycle event about one object
    Event(ResourceEvent),
    /// Progress marker carrying only a resource version
    Bookmark(String),
    /// The requested resource version is too old to resume from
    Expired,
}

/// Stream of items from one subscription.
pub type WatchStream = BoxStream<'static, Result<WatchItem, WatchError>>;

/// The external resource store the controllers subscribe to.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Open a watch on `kind`, optionally limited to `namespace`, starting
    /// after `resource_version`.
    async fn subscribe(
        &self,
        kind: RunKind,
        namespace: Option<&str>,
        resource_version: &str,
    ) -> Result<WatchStream, WatchError>;
}

/// [`EventSource`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeEventSource {
    client: Client,
}

impl KubeEventSource {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, kind: RunKind, namespace: Option<&str>) -> Api<DynamicObject> {
        let ar = kind.api_resource();
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &ar),
            None => Api::all_with(self.client.clone(), &ar),
        }
    }
}

fn to_item(kind: RunKind, event: WatchEvent<DynamicObject>) -> Result<WatchItem, WatchError> {
    let lifecycle = |event_type, obj: DynamicObject| -> Result<WatchItem, WatchError> {
        let object = serde_json::to_value(&obj)?;
        Ok(WatchItem::Event(ResourceEvent::new(kind, event_type, object)))
    };

    match event {
        WatchEvent::Added(obj) => lifecycle(EventType::Added, obj),
        WatchEvent::Modified(obj) => lifecycle(EventType::Modified, obj),
        WatchEvent::Deleted(obj) => lifecycle(EventType::Deleted, obj),
        WatchEvent::Bookmark(bookmark) => Ok(WatchItem::Bookmark(bookmark.metadata.resource_version)),
        WatchEvent::Error(e) if e.code == HTTP_GONE => Ok(WatchItem::Expired),
        WatchEvent::Error(e) => Err(WatchError::Api {
            code: e.code,
            message: e.message,
        }),
    }
}

#[async_trait]
impl EventSource for KubeEventSource {
    async fn subscribe(
        &self,
        kind: RunKind,
        namespace: Option<&str>,
        resource_version: &str,
    ) -> Result<WatchStream, WatchError> {
        let api = self.api(kind, namespace);
        let wp = WatchParams::default().timeout(WATCH_TIMEOUT_SECS);

        let stream = api
            .watch(&wp, resource_version)
            .await
            .map_err(|source| WatchError::Connect {
                resource: kind.plural().to_string(),
                source,
            })?;

        Ok(stream
            .map_err(move |source| WatchError::Stream {
                resource: kind.plural().to_string(),
                source,
            })
            .and_then(move |event| futures::future::ready(to_item(kind, event)))
            .boxed())
    }
}

/// How one subscription ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionSummary {
    /// Lifecycle events handed to the projector
    pub events: usize,
    /// Events the projector rejected
    pub skipped: usize,
}

/// Supervises the watch of one kind.
pub struct WatchController<S> {
    source: S,
    projector: EventProjector,
    namespace: Option<String>,
    resource_version: String,
}

impl<S: EventSource> WatchController<S> {
    #[must_use]
    pub fn new(source: S, projector: EventProjector, namespace: Option<String>) -> Self {
        Self {
            source,
            projector,
            namespace,
            resource_version: INITIAL_RESOURCE_VERSION.to_string(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> RunKind {
        self.projector.kind()
    }

    /// Resource version the next subscription resumes from.
    #[must_use]
    pub fn resource_version(&self) -> &str {
        &self.resource_version
    }

    /// Run one subscription until the stream ends.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError`] when the subscription cannot be opened or fails
    /// mid-stream. Events projected before the failure stay applied.
    pub async fn watch_once(&mut self) -> Result<SubscriptionSummary, WatchError> {
        let kind = self.kind();
        let mut stream = self
            .source
            .subscribe(kind, self.namespace.as_deref(), &self.resource_version)
            .await?;

        info!(
            %kind,
            namespace = ?self.namespace,
            resource_version = %self.resource_version,
            "Watching resources"
        );

        let mut summary = SubscriptionSummary {
            events: 0,
            skipped: 0,
        };

        while let Some(item) = stream.next().await {
            match item? {
                WatchItem::Event(event) => {
                    summary.events += 1;
                    if let Some(rv) = resource::resource_version(&event.object) {
                        self.resource_version = rv;
                    }
                    if let Err(e) = self.projector.project(&event) {
                        summary.skipped += 1;
                        warn!(
                            %kind,
                            event = %event.event_type,
                            error = %e,
                            "Skipping event that could not be projected"
                        );
                    }
                }
                WatchItem::Bookmark(rv) => {
                    debug!(%kind, resource_version = %rv, "Watch bookmark");
                    self.resource_version = rv;
                }
                WatchItem::Expired => {
                    warn!(
                        %kind,
                        resource_version = %self.resource_version,
                        "Resource version expired, restarting watch from current state"
                    );
                    self.resource_version = INITIAL_RESOURCE_VERSION.to_string();
                    break;
                }
            }
        }

        Ok(summary)
    }

    /// Keep the watch open for the lifetime of the process.
    ///
    /// Reopens the subscription after every end or failure, waiting
    /// according to the backoff schedule. Never returns.
    pub async fn run(mut self) {
        let mut backoff = watch_backoff();
        self.supervise(&mut backoff).await;
    }

    async fn supervise(&mut self, backoff: &mut ExponentialBackoff) {
        let kind = self.kind();
        loop {
            match self.watch_once().await {
                Ok(summary) => {
                    if summary.events > 0 {
                        backoff.reset();
                    }
                    info!(
                        %kind,
                        events = summary.events,
                        skipped = summary.skipped,
                        "Watch stream ended, reopening"
                    );
                }
                Err(e) => {
                    error!(%kind, error = %e, "Watch failed, reopening");
                }
            }

            let delay = backoff.next_backoff();
            debug!(%kind, delay_ms = delay.as_millis(), "Waiting before reopening watch");
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod watch_tests;
