//! Pod observation models consumed by the analyzer
//!
//! These are narrow, typed views of the parts of a Kubernetes pod the
//! health analysis reads. They are built from `k8s_openapi` pods or
//! constructed directly in tests and by callers that already hold the data.

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{Pod, PodCondition};
use serde::Serialize;

/// Reason reported by the scheduler on the `PodScheduled` condition
/// when a pod cannot be placed on any node.
pub const UNSCHEDULABLE_REASON: &str = "Unschedulable";

/// Pod execution phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
    /// Phase string not known to this crate
    Other(String),
}

impl PodPhase {
    pub fn from_api(phase: &str) -> Self {
        match phase {
            "Pending" => PodPhase::Pending,
            "Running" => PodPhase::Running,
            "Succeeded" => PodPhase::Succeeded,
            "Failed" => PodPhase::Failed,
            "Unknown" => PodPhase::Unknown,
            other => PodPhase::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PodPhase::Pending => "Pending",
            PodPhase::Running => "Running",
            PodPhase::Succeeded => "Succeeded",
            PodPhase::Failed => "Failed",
            PodPhase::Unknown => "Unknown",
            PodPhase::Other(phase) => phase,
        }
    }
}

/// Pod condition type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ConditionType {
    Ready,
    Scheduled,
    ContainersReady,
    Initialized,
    Other(String),
}

impl ConditionType {
    pub fn from_api(condition_type: &str) -> Self {
        match condition_type {
            "Ready" => ConditionType::Ready,
            "PodScheduled" => ConditionType::Scheduled,
            "ContainersReady" => ConditionType::ContainersReady,
            "Initialized" => ConditionType::Initialized,
            other => ConditionType::Other(other.to_string()),
        }
    }
}

/// Tri-state condition status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    /// Anything other than `"True"` or `"False"` is reported as unknown
    pub fn from_api(status: &str) -> Self {
        match status {
            "True" => ConditionStatus::True,
            "False" => ConditionStatus::False,
            _ => ConditionStatus::Unknown,
        }
    }
}

/// A single condition observed on a pod
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PodConditionObservation {
    pub condition_type: ConditionType,
    pub status: ConditionStatus,
    pub reason: Option<String>,
    /// `None` when the API object carried no transition time. The API
    /// machinery decodes that as the zero timestamp, so it is treated as
    /// arbitrarily old.
    pub last_transition_time: Option<DateTime<Utc>>,
}

impl PodConditionObservation {
    pub fn new(condition_type: ConditionType, status: ConditionStatus) -> Self {
        Self {
            condition_type,
            status,
            reason: None,
            last_transition_time: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_last_transition_time(mut self, at: DateTime<Utc>) -> Self {
        self.last_transition_time = Some(at);
        self
    }

    /// `PodScheduled=False` with the scheduler's unschedulable reason
    pub fn is_unschedulable(&self) -> bool {
        self.condition_type == ConditionType::Scheduled
            && self.status == ConditionStatus::False
            && self.reason.as_deref() == Some(UNSCHEDULABLE_REASON)
    }
}

impl From<&PodCondition> for PodConditionObservation {
    fn from(condition: &PodCondition) -> Self {
        Self {
            condition_type: ConditionType::from_api(&condition.type_),
            status: ConditionStatus::from_api(&condition.status),
            reason: condition.reason.clone(),
            last_transition_time: condition.last_transition_time.as_ref().map(|t| t.0),
        }
    }
}

/// One pod in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PodObservation {
    pub name: String,
    pub phase: PodPhase,
    pub conditions: Vec<PodConditionObservation>,
}

impl PodObservation {
    pub fn new(name: impl Into<String>, phase: PodPhase) -> Self {
        Self {
            name: name.into(),
            phase,
            conditions: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: PodConditionObservation) -> Self {
        self.conditions.push(condition);
        self
    }
}

impl From<&Pod> for PodObservation {
    fn from(pod: &Pod) -> Self {
        let status = pod.status.as_ref();
        // The API server reports a missing phase as Pending
        let phase = status
            .and_then(|s| s.phase.as_deref())
            .map(PodPhase::from_api)
            .unwrap_or(PodPhase::Pending);
        let conditions = status
            .and_then(|s| s.conditions.as_ref())
            .map(|conditions| conditions.iter().map(PodConditionObservation::from).collect())
            .unwrap_or_default();

        Self {
            name: pod.metadata.name.clone().unwrap_or_default(),
            phase,
            conditions,
        }
    }
}
