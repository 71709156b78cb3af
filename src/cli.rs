// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command-line interface.
//!
//! ```text
//! tekton-exporter run --populated-labels app.kubernetes.io/team,env --metrics-port 2112
//! tekton-exporter version
//! ```

use crate::constants::{METRICS_SERVER_BIND_ADDRESS, METRICS_SERVER_PORT};
use crate::labels::PopulatedLabelSpec;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use tokio::net::lookup_host;

/// Tekton Prometheus exporter.
///
/// Exposes status and duration of PipelineRun and TaskRun resources.
#[derive(Debug, Parser)]
#[command(name = "tekton-exporter", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watch runs and serve their metrics
    Run(RunArgs),
    /// Print the current version
    Version,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Verbosity level for logs (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Output format for logs
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Host where the metrics web server listens
    #[arg(long, default_value = METRICS_SERVER_BIND_ADDRESS)]
    pub metrics_host: String,

    /// Port where the metrics web server listens
    #[arg(long, default_value_t = METRICS_SERVER_PORT)]
    pub metrics_port: u16,

    /// Comma-separated list of object labels populated on metrics
    #[arg(long, value_delimiter = ',')]
    pub populated_labels: Vec<String>,

    /// Only watch runs in this namespace (default: all namespaces)
    #[arg(long)]
    pub namespace: Option<String>,
}

impl RunArgs {
    /// Socket address of the metrics server.
    ///
    /// `--metrics-host` may be an IP address or a host name; a name is
    /// resolved and its first address used.
    ///
    /// # Errors
    ///
    /// Returns an error if `--metrics-host` does not resolve.
    pub async fn metrics_addr(&self) -> Result<SocketAddr> {
        lookup_host((self.metrics_host.as_str(), self.metrics_port))
            .await
            .with_context(|| format!("Failed to resolve --metrics-host '{}'", self.metrics_host))?
            .next()
            .with_context(|| format!("No address found for --metrics-host '{}'", self.metrics_host))
    }

    /// Label spec built from `--populated-labels`.
    #[must_use]
    pub fn populated_label_spec(&self) -> PopulatedLabelSpec {
        PopulatedLabelSpec::new(&self.populated_labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_run(args: &[&str]) -> RunArgs {
        let cli = Cli::try_parse_from(args).expect("parse");
        match cli.command {
            Command::Run(run) => run,
            Command::Version => panic!("expected run"),
        }
    }

    #[tokio::test]
    async fn test_run_defaults() {
        let run = parse_run(&["tekton-exporter", "run"]);

        assert_eq!(run.log_level, "info");
        assert_eq!(run.log_format, LogFormat::Text);
        assert_eq!(run.metrics_port, 2112);
        assert!(run.populated_labels.is_empty());
        assert!(run.namespace.is_none());
        assert_eq!(
            run.metrics_addr().await.expect("addr"),
            "0.0.0.0:2112".parse::<SocketAddr>().expect("socket")
        );
    }

    #[test]
    fn test_run_populated_labels() {
        let run = parse_run(&[
            "tekton-exporter",
            "run",
            "--populated-labels",
            "app.kubernetes.io/team,env",
            "--namespace",
            "ci",
        ]);

        assert_eq!(run.populated_labels, vec!["app.kubernetes.io/team", "env"]);
        assert_eq!(run.namespace.as_deref(), Some("ci"));

        let spec = run.populated_label_spec();
        assert_eq!(spec.sanitized_names(), vec!["app_kubernetes_io_team", "env"]);
    }

    #[tokio::test]
    async fn test_run_json_logs_and_custom_address() {
        let run = parse_run(&[
            "tekton-exporter",
            "run",
            "--log-format",
            "json",
            "--metrics-host",
            "127.0.0.1",
            "--metrics-port",
            "9090",
        ]);

        assert_eq!(run.log_format, LogFormat::Json);
        assert_eq!(
            run.metrics_addr().await.expect("addr"),
            "127.0.0.1:9090".parse::<SocketAddr>().expect("socket")
        );
    }

    #[tokio::test]
    async fn test_metrics_host_accepts_host_name() {
        let run = parse_run(&["tekton-exporter", "run", "--metrics-host", "localhost"]);

        let addr = run.metrics_addr().await.expect("addr");
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 2112);
    }

    #[tokio::test]
    async fn test_unresolvable_metrics_host() {
        let run = parse_run(&["tekton-exporter", "run", "--metrics-host", "metrics.invalid"]);

        assert!(run.metrics_addr().await.is_err());
    }

    #[test]
    fn test_version_subcommand() {
        let cli = Cli::try_parse_from(["tekton-exporter", "version"]).expect("parse");

        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["tekton-exporter"]).is_err());
    }
}
