//! Per-cluster status aggregation for federated resources
//!
//! A federated resource reports one status entry per member cluster. The
//! status payload is opaque to this crate and is kept as a JSON object.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::analyzer::PodAnalysisResult;

/// Status of a federated resource within one cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceClusterStatus {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster_name: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub status: Map<String, Value>,
}

impl ResourceClusterStatus {
    pub fn new(cluster_name: impl Into<String>, status: Map<String, Value>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            status,
        }
    }

    /// Record carrying the pod counts of an analysis
    pub fn from_pod_analysis(cluster_name: impl Into<String>, result: &PodAnalysisResult) -> Self {
        let mut status = Map::new();
        status.insert("total".to_string(), Value::from(result.total));
        status.insert(
            "runningAndReady".to_string(),
            Value::from(result.running_and_ready),
        );
        status.insert("unschedulable".to_string(), Value::from(result.unschedulable));
        Self::new(cluster_name, status)
    }
}

/// Generic representation of a federated type and its cluster statuses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederatedResource {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cluster_status: Vec<ResourceClusterStatus>,
}

impl FederatedResource {
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>, metadata: ObjectMeta) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            metadata,
            cluster_status: Vec::new(),
        }
    }

    /// Append a cluster's status; duplicate cluster names are not checked
    pub fn push_cluster_status(&mut self, status: ResourceClusterStatus) {
        self.cluster_status.push(status);
    }

    /// First status entry reported for `cluster_name`
    pub fn cluster_status(&self, cluster_name: &str) -> Option<&ResourceClusterStatus> {
        self.cluster_status
            .iter()
            .find(|s| s.cluster_name == cluster_name)
    }
}
