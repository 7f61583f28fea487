//! Pod health analysis for a federated workload
//!
//! Classifies the pods of one workload and reports whether the caller has
//! to look at the group again later. Pods that the scheduler cannot place
//! are only counted as unschedulable once the condition has persisted for
//! the debounce threshold, so short scheduling hiccups do not move
//! replicas between clusters. While some pods are unschedulable but not yet
//! past the threshold the analysis undercounts, and the returned
//! [`ReconciliationStatus::NeedsRecheck`] tells the caller to requeue.
//!
//! The analysis is a pure function of its inputs. Both counts are
//! recomputed from condition timestamps on every call; nothing is cached
//! between reconcile passes.

use std::borrow::Borrow;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Pod;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{ConditionType, PodConditionObservation, PodObservation, PodPhase};

#[cfg(test)]
mod tests;

/// Minimum time a pod must stay unschedulable before it is counted
pub const DEFAULT_UNSCHEDULABLE_THRESHOLD: Duration = Duration::from_secs(60);

/// Pod counts for one workload snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodAnalysisResult {
    /// Number of pods observed
    pub total: usize,
    /// Number of pods that are running and ready
    pub running_and_ready: usize,
    /// Number of pods unschedulable for longer than the threshold
    pub unschedulable: usize,
}

/// Whether the caller can trust the current result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReconciliationStatus {
    #[serde(rename = "AllOK")]
    AllOk,
    NeedsRecheck,
}

impl ReconciliationStatus {
    pub fn needs_recheck(&self) -> bool {
        matches!(self, ReconciliationStatus::NeedsRecheck)
    }

    /// Delay after which the caller should reconcile again, if at all
    pub fn requeue_after(&self, threshold: Duration) -> Option<Duration> {
        match self {
            ReconciliationStatus::AllOk => None,
            ReconciliationStatus::NeedsRecheck => Some(threshold),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReconciliationStatus::AllOk => "AllOK",
            ReconciliationStatus::NeedsRecheck => "NeedsRecheck",
        }
    }
}

impl fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health bucket of a single pod
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PodHealth {
    /// Phase is running and a ready condition is present
    RunningAndReady,
    /// Unschedulable for longer than the threshold
    Unschedulable,
    /// Unschedulable right now but still inside the debounce window
    PendingUnschedulable,
    /// None of the above
    Other,
}

impl PodHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            PodHealth::RunningAndReady => "running_and_ready",
            PodHealth::Unschedulable => "unschedulable",
            PodHealth::PendingUnschedulable => "pending_unschedulable",
            PodHealth::Other => "other",
        }
    }
}

/// Classifies pod snapshots using a debounce threshold for unschedulable pods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PodAnalyzer {
    threshold: Duration,
    threshold_delta: chrono::Duration,
}

impl Default for PodAnalyzer {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_UNSCHEDULABLE_THRESHOLD,
            threshold_delta: chrono::Duration::seconds(
                DEFAULT_UNSCHEDULABLE_THRESHOLD.as_secs() as i64,
            ),
        }
    }
}

impl PodAnalyzer {
    /// Create an analyzer with a custom unschedulable threshold
    pub fn with_threshold(threshold: Duration) -> Result<Self> {
        let threshold_delta = chrono::Duration::from_std(threshold)
            .map_err(|_| Error::ThresholdOutOfRange(threshold))?;
        Ok(Self {
            threshold,
            threshold_delta,
        })
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Delay a caller should wait before re-evaluating after `NeedsRecheck`
    pub fn requeue_after(&self) -> Duration {
        self.threshold
    }

    /// Analyze a pod snapshot as of `now`
    ///
    /// An empty snapshot yields zero counts and [`ReconciliationStatus::AllOk`].
    pub fn analyze<I>(&self, pods: I, now: DateTime<Utc>) -> (PodAnalysisResult, ReconciliationStatus)
    where
        I: IntoIterator,
        I::Item: Borrow<PodObservation>,
    {
        let mut result = PodAnalysisResult::default();
        let mut unschedulable_right_now = 0;

        for pod in pods {
            result.total += 1;
            match self.classify(pod.borrow(), now) {
                PodHealth::RunningAndReady => result.running_and_ready += 1,
                PodHealth::Unschedulable => {
                    unschedulable_right_now += 1;
                    result.unschedulable += 1;
                }
                PodHealth::PendingUnschedulable => unschedulable_right_now += 1,
                PodHealth::Other => {}
            }
        }

        if unschedulable_right_now != result.unschedulable {
            return (result, ReconciliationStatus::NeedsRecheck);
        }

        (result, ReconciliationStatus::AllOk)
    }

    /// Analyze pods as returned by the Kubernetes API
    pub fn analyze_api_pods(
        &self,
        pods: &[Pod],
        now: DateTime<Utc>,
    ) -> (PodAnalysisResult, ReconciliationStatus) {
        self.analyze(pods.iter().map(PodObservation::from), now)
    }

    /// Classify a single pod as of `now`
    ///
    /// Running pods are only checked for a ready condition; its status is
    /// not inspected. Pods in any other phase are only checked for the
    /// unschedulable condition.
    pub fn classify(&self, pod: &PodObservation, now: DateTime<Utc>) -> PodHealth {
        if pod.phase == PodPhase::Running {
            let has_ready = pod
                .conditions
                .iter()
                .any(|c| c.condition_type == ConditionType::Ready);
            return if has_ready {
                PodHealth::RunningAndReady
            } else {
                PodHealth::Other
            };
        }

        // TODO: pods waiting too long for the scheduler (no Unschedulable
        // reason yet) are not detected
        let mut unschedulable = false;
        for condition in pod.conditions.iter().filter(|c| c.is_unschedulable()) {
            if self.is_past_threshold(condition, now) {
                return PodHealth::Unschedulable;
            }
            unschedulable = true;
        }

        if unschedulable {
            PodHealth::PendingUnschedulable
        } else {
            PodHealth::Other
        }
    }

    /// `lastTransitionTime + threshold` strictly before `now`
    fn is_past_threshold(&self, condition: &PodConditionObservation, now: DateTime<Utc>) -> bool {
        match condition.last_transition_time {
            None => true,
            Some(since) => since
                .checked_add_signed(self.threshold_delta)
                .map_or(false, |deadline| deadline < now),
        }
    }
}

/// Analyze with the default 60 second threshold
pub fn analyze_pods<I>(pods: I, now: DateTime<Utc>) -> (PodAnalysisResult, ReconciliationStatus)
where
    I: IntoIterator,
    I::Item: Borrow<PodObservation>,
{
    PodAnalyzer::default().analyze(pods, now)
}
