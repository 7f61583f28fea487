//! Pod health CLI
//!
//! Runs the federated pod health analysis over pod lists exported with
//! `kubectl get pods -o json`, either for a single workload or for one
//! workload across several clusters.

mod commands;
mod config;
mod input;
mod output;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{analyze, status};

/// Federated pod health CLI
#[derive(Parser)]
#[command(name = "podhealth")]
#[command(author, version, about = "Pod health analysis for federated workloads", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    /// Seconds a pod must stay unschedulable before it is counted
    #[arg(long, global = true)]
    pub threshold_secs: Option<u64>,

    /// Evaluate as of this RFC 3339 timestamp instead of the current time
    #[arg(long, global = true, value_parser = parse_timestamp)]
    pub now: Option<DateTime<Utc>>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze the pods of one workload
    Analyze {
        /// Pod list file (reads stdin when omitted or '-')
        file: Option<PathBuf>,

        /// Cluster name used in logs, metrics and output
        #[arg(long, short, default_value = "default")]
        cluster: String,

        /// Show the health of each pod
        #[arg(long)]
        pods: bool,

        /// Print Prometheus metrics after the result
        #[arg(long)]
        emit_metrics: bool,
    },

    /// Build a federated status document from per-cluster pod lists
    Status {
        /// Cluster pod list as NAME=FILE (repeatable)
        #[arg(long = "cluster", short, required = true, value_parser = status::parse_cluster_source)]
        clusters: Vec<(String, PathBuf)>,

        /// Federated resource name
        #[arg(long)]
        name: String,

        /// Federated resource namespace
        #[arg(long, short)]
        namespace: Option<String>,

        /// Federated resource kind
        #[arg(long, default_value = "FederatedDeployment")]
        kind: String,

        /// Federated resource API version
        #[arg(long, default_value = "types.kubefed.io/v1beta1")]
        api_version: String,
    },
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp '{}': {}", value, e))
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    let analyzer_config = config::load(cli.threshold_secs)?;
    let analyzer = analyzer_config
        .analyzer()
        .context("Invalid analyzer configuration")?;
    tracing::debug!(
        threshold_secs = analyzer_config.unschedulable_threshold_secs,
        "Analyzer configured"
    );

    let now = cli.now.unwrap_or_else(Utc::now);

    match cli.command {
        Commands::Analyze {
            file,
            cluster,
            pods,
            emit_metrics,
        } => {
            analyze::analyze(
                &analyzer,
                analyze::AnalyzeOptions {
                    file: file.as_deref(),
                    cluster: &cluster,
                    now,
                    show_pods: pods,
                    emit_metrics,
                },
                cli.format,
            )?;
        }
        Commands::Status {
            clusters,
            name,
            namespace,
            kind,
            api_version,
        } => {
            status::show_status(
                &analyzer,
                status::ResourceIdentity {
                    api_version,
                    kind,
                    name,
                    namespace,
                },
                &clusters,
                now,
                cli.format,
            )?;
        }
    }

    Ok(())
}
