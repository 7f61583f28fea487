//! Assemble a federated status document from per-cluster pod lists

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use podhealth_lib::{
    FederatedResource, PodAnalyzer, PodObservation, ReconciliationStatus, ResourceClusterStatus,
    StructuredLogger,
};
use std::path::PathBuf;
use tabled::Tabled;

use crate::input::read_pods;
use crate::output::{
    color_status, format_duration, print_info, print_json, print_rows, print_success,
    OutputFormat,
};

/// Identity of the federated resource being reported
pub struct ResourceIdentity {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
}

#[derive(Tabled)]
struct ClusterRow {
    #[tabled(rename = "Cluster")]
    cluster: String,
    #[tabled(rename = "Total")]
    total: usize,
    #[tabled(rename = "Running+Ready")]
    running_and_ready: usize,
    #[tabled(rename = "Unschedulable")]
    unschedulable: usize,
    #[tabled(rename = "Status")]
    status: String,
}

/// Parse a `NAME=FILE` cluster argument
pub fn parse_cluster_source(value: &str) -> Result<(String, PathBuf), String> {
    match value.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=FILE, got '{}'", value)),
    }
}

/// Analyze every cluster and print the federated status document
pub fn show_status(
    analyzer: &PodAnalyzer,
    identity: ResourceIdentity,
    clusters: &[(String, PathBuf)],
    now: DateTime<Utc>,
    format: OutputFormat,
) -> Result<()> {
    let metadata = ObjectMeta {
        name: Some(identity.name.clone()),
        namespace: identity.namespace.clone(),
        ..Default::default()
    };
    let mut resource = FederatedResource::new(identity.api_version, identity.kind, metadata);
    let logger = StructuredLogger::new(identity.name);

    let mut rows = Vec::with_capacity(clusters.len());
    let mut needs_recheck = false;

    for (cluster, path) in clusters {
        let pods: Vec<PodObservation> = read_pods(Some(path.as_path()))?
            .iter()
            .map(PodObservation::from)
            .collect();
        let (result, status) = analyzer.analyze(&pods, now);
        logger.log_analysis(cluster, &result, status);

        if status == ReconciliationStatus::NeedsRecheck {
            needs_recheck = true;
            logger.log_recheck(cluster, analyzer.requeue_after().as_secs());
        }

        resource.push_cluster_status(ResourceClusterStatus::from_pod_analysis(
            cluster.as_str(),
            &result,
        ));
        rows.push(ClusterRow {
            cluster: cluster.clone(),
            total: result.total,
            running_and_ready: result.running_and_ready,
            unschedulable: result.unschedulable,
            status: color_status(status.as_str()),
        });
    }

    match format {
        OutputFormat::Json => print_json(&resource)?,
        OutputFormat::Table => {
            println!("{}", "Federated Status".bold());
            println!("{}", "=".repeat(60));
            println!("Resource: {} {}", resource.kind, identity_label(&resource).cyan());
            println!();
            print_rows(&rows, "No clusters reported");
            println!();
            if needs_recheck {
                print_info(&format!(
                    "Recheck required; reconcile again after {}",
                    format_duration(analyzer.requeue_after())
                ));
            } else {
                print_success("All cluster results are settled");
            }
        }
    }

    Ok(())
}

fn identity_label(resource: &FederatedResource) -> String {
    let name = resource.metadata.name.as_deref().unwrap_or_default();
    match resource.metadata.namespace.as_deref() {
        Some(namespace) => format!("{}/{}", namespace, name),
        None => name.to_string(),
    }
}
