// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use clap::Parser;
use kube::Client;
use std::sync::Arc;
use tekton_exporter::{
    cli::{Cli, Command, LogFormat, RunArgs},
    constants::TOKIO_WORKER_THREADS,
    kinds::RunKind,
    metrics::MetricsRegistry,
    projector::EventProjector,
    server,
    watch::{KubeEventSource, WatchController},
};
use tracing::{debug, error, info};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Version => {
            println!("version: {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Run(args) => {
            // Build Tokio runtime with custom thread names
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(TOKIO_WORKER_THREADS)
                .thread_name("tekton-exporter")
                .enable_all()
                .build()?;

            runtime.block_on(async_main(args))
        }
    }
}

/// Initialize logging.
///
/// Respects `RUST_LOG` if set, otherwise uses `--log-level`.
/// Format: timestamp file:line LEVEL message, or JSON with `--log-format json`.
fn init_logging(args: &RunArgs) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level));

    match args.log_format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main(args: RunArgs) -> Result<()> {
    init_logging(&args);

    info!("Starting Tekton exporter");

    let addr = args.metrics_addr().await?;

    // Label schema is fixed from here on
    let spec = Arc::new(args.populated_label_spec());
    let registry = Arc::new(MetricsRegistry::new(&spec)?);
    info!(
        populated_labels = ?spec.mapping(),
        extra_labels = ?registry.extra_labels(),
        "Metrics registered"
    );

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let source = KubeEventSource::new(client);
    let [pipelinerun_watch, taskrun_watch] = RunKind::ALL.map(|kind| {
        let projector = EventProjector::new(kind, Arc::clone(&spec), Arc::clone(&registry));
        WatchController::new(source.clone(), projector, args.namespace.clone())
    });

    info!("Starting all watchers");

    // Each kind gets its own worker; ordering is only guaranteed within a kind
    let pipelinerun_task = tokio::spawn(pipelinerun_watch.run());
    let taskrun_task = tokio::spawn(taskrun_watch.run());

    // Watchers and server should never exit - if one does, exit the main process
    tokio::select! {
        result = pipelinerun_task => {
            error!("CRITICAL: PipelineRun watcher exited unexpectedly: {:?}", result);
            anyhow::bail!("PipelineRun watcher exited unexpectedly")
        }
        result = taskrun_task => {
            error!("CRITICAL: TaskRun watcher exited unexpectedly: {:?}", result);
            anyhow::bail!("TaskRun watcher exited unexpectedly")
        }
        result = server::serve(addr, Arc::clone(&registry)) => {
            error!("CRITICAL: Metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Metrics server exited unexpectedly without error")
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    }
}
