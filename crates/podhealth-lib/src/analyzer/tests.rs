//! Tests for pod health analysis
//!
//! Snapshots are built directly from observations with fixed timestamps so
//! every scenario is deterministic.

use super::*;
use crate::models::{ConditionStatus, PodConditionObservation, UNSCHEDULABLE_REASON};
use chrono::TimeZone;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn secs_ago(secs: i64) -> DateTime<Utc> {
    now() - chrono::Duration::seconds(secs)
}

fn running_ready(name: &str) -> PodObservation {
    PodObservation::new(name, PodPhase::Running)
        .with_condition(PodConditionObservation::new(
            ConditionType::Initialized,
            ConditionStatus::True,
        ))
        .with_condition(PodConditionObservation::new(
            ConditionType::Ready,
            ConditionStatus::True,
        ))
}

fn unschedulable_since(name: &str, since: DateTime<Utc>) -> PodObservation {
    PodObservation::new(name, PodPhase::Pending).with_condition(
        PodConditionObservation::new(ConditionType::Scheduled, ConditionStatus::False)
            .with_reason(UNSCHEDULABLE_REASON)
            .with_last_transition_time(since),
    )
}

#[test]
fn test_empty_snapshot() {
    let pods: Vec<PodObservation> = Vec::new();
    let (result, status) = analyze_pods(&pods, now());

    assert_eq!(result, PodAnalysisResult::default());
    assert_eq!(status, ReconciliationStatus::AllOk);
}

#[test]
fn test_running_ready_counts_once() {
    let pod = running_ready("web-0")
        .with_condition(PodConditionObservation::new(
            ConditionType::ContainersReady,
            ConditionStatus::True,
        ))
        .with_condition(PodConditionObservation::new(
            ConditionType::Other("example.com/gate".to_string()),
            ConditionStatus::False,
        ));

    let (result, status) = analyze_pods([pod], now());

    assert_eq!(result.total, 1);
    assert_eq!(result.running_and_ready, 1);
    assert_eq!(result.unschedulable, 0);
    assert_eq!(status, ReconciliationStatus::AllOk);
}

#[test]
fn test_ready_status_not_inspected_for_running_pod() {
    let pod = PodObservation::new("web-0", PodPhase::Running).with_condition(
        PodConditionObservation::new(ConditionType::Ready, ConditionStatus::False),
    );

    let (result, _) = analyze_pods([pod], now());
    assert_eq!(result.running_and_ready, 1);
}

#[test]
fn test_running_without_ready_condition() {
    let pod = PodObservation::new("web-0", PodPhase::Running).with_condition(
        PodConditionObservation::new(ConditionType::Scheduled, ConditionStatus::True),
    );

    let (result, status) = analyze_pods([pod], now());
    assert_eq!(result.total, 1);
    assert_eq!(result.running_and_ready, 0);
    assert_eq!(status, ReconciliationStatus::AllOk);
}

#[test]
fn test_ready_condition_ignored_when_not_running() {
    let pod = PodObservation::new("web-0", PodPhase::Pending).with_condition(
        PodConditionObservation::new(ConditionType::Ready, ConditionStatus::True),
    );

    let (result, _) = analyze_pods([pod], now());
    assert_eq!(result.running_and_ready, 0);
}

#[test]
fn test_unschedulable_past_threshold() {
    let (result, status) = analyze_pods([unschedulable_since("web-0", secs_ago(61))], now());

    assert_eq!(result.total, 1);
    assert_eq!(result.unschedulable, 1);
    assert_eq!(status, ReconciliationStatus::AllOk);
}

#[test]
fn test_unschedulable_within_threshold_needs_recheck() {
    let (result, status) = analyze_pods([unschedulable_since("web-0", secs_ago(10))], now());

    assert_eq!(result.total, 1);
    assert_eq!(result.unschedulable, 0);
    assert_eq!(status, ReconciliationStatus::NeedsRecheck);
}

#[test]
fn test_threshold_boundary_is_strict() {
    // Exactly at the threshold the deadline equals now, which is not before now
    let (result, status) = analyze_pods([unschedulable_since("web-0", secs_ago(60))], now());

    assert_eq!(result.unschedulable, 0);
    assert_eq!(status, ReconciliationStatus::NeedsRecheck);
}

#[test]
fn test_unschedulable_requires_reason_and_false_status() {
    let other_reason = PodObservation::new("a", PodPhase::Pending).with_condition(
        PodConditionObservation::new(ConditionType::Scheduled, ConditionStatus::False)
            .with_reason("SchedulingGated")
            .with_last_transition_time(secs_ago(600)),
    );
    let unknown_status = PodObservation::new("b", PodPhase::Pending).with_condition(
        PodConditionObservation::new(ConditionType::Scheduled, ConditionStatus::Unknown)
            .with_reason(UNSCHEDULABLE_REASON)
            .with_last_transition_time(secs_ago(600)),
    );
    let no_reason = PodObservation::new("c", PodPhase::Pending).with_condition(
        PodConditionObservation::new(ConditionType::Scheduled, ConditionStatus::False)
            .with_last_transition_time(secs_ago(600)),
    );

    let (result, status) = analyze_pods([other_reason, unknown_status, no_reason], now());

    assert_eq!(result.total, 3);
    assert_eq!(result.unschedulable, 0);
    assert_eq!(status, ReconciliationStatus::AllOk);
}

#[test]
fn test_unschedulable_condition_ignored_for_running_pod() {
    let pod = running_ready("web-0").with_condition(
        PodConditionObservation::new(ConditionType::Scheduled, ConditionStatus::False)
            .with_reason(UNSCHEDULABLE_REASON)
            .with_last_transition_time(secs_ago(5)),
    );

    let (result, status) = analyze_pods([pod], now());
    assert_eq!(result.running_and_ready, 1);
    assert_eq!(result.unschedulable, 0);
    assert_eq!(status, ReconciliationStatus::AllOk);
}

#[test]
fn test_missing_transition_time_counts_as_debounced() {
    let pod = PodObservation::new("web-0", PodPhase::Pending).with_condition(
        PodConditionObservation::new(ConditionType::Scheduled, ConditionStatus::False)
            .with_reason(UNSCHEDULABLE_REASON),
    );

    let (result, status) = analyze_pods([pod], now());
    assert_eq!(result.unschedulable, 1);
    assert_eq!(status, ReconciliationStatus::AllOk);
}

#[test]
fn test_far_future_transition_time_not_debounced() {
    let (result, status) = analyze_pods(
        [unschedulable_since("web-0", DateTime::<Utc>::MAX_UTC)],
        now(),
    );

    assert_eq!(result.unschedulable, 0);
    assert_eq!(status, ReconciliationStatus::NeedsRecheck);
}

#[test]
fn test_mixed_snapshot() {
    let pods = vec![
        running_ready("web-0"),
        running_ready("web-1"),
        unschedulable_since("web-2", secs_ago(120)),
        unschedulable_since("web-3", secs_ago(5)),
        PodObservation::new("web-4", PodPhase::Pending),
    ];

    let (result, status) = analyze_pods(&pods, now());

    assert_eq!(
        result,
        PodAnalysisResult {
            total: 5,
            running_and_ready: 2,
            unschedulable: 1,
        }
    );
    assert_eq!(status, ReconciliationStatus::NeedsRecheck);
}

#[test]
fn test_duplicate_conditions_count_pod_once() {
    let ready = PodConditionObservation::new(ConditionType::Ready, ConditionStatus::True);
    let running = PodObservation::new("web-0", PodPhase::Running)
        .with_condition(ready.clone())
        .with_condition(ready);

    let stuck = unschedulable_since("web-1", secs_ago(300)).with_condition(
        PodConditionObservation::new(ConditionType::Scheduled, ConditionStatus::False)
            .with_reason(UNSCHEDULABLE_REASON)
            .with_last_transition_time(secs_ago(3)),
    );

    let (result, status) = analyze_pods([running, stuck], now());

    assert_eq!(result.total, 2);
    assert_eq!(result.running_and_ready, 1);
    assert_eq!(result.unschedulable, 1);
    assert_eq!(status, ReconciliationStatus::AllOk);
}

#[test]
fn test_counts_bounded_by_total() {
    let pods = vec![
        running_ready("a"),
        unschedulable_since("b", secs_ago(90)),
        unschedulable_since("c", secs_ago(1)),
        PodObservation::new("d", PodPhase::Failed),
        PodObservation::new("e", PodPhase::Other("Evicted".to_string())),
    ];

    for offset in [0, 30, 59, 61, 3600] {
        let at = now() + chrono::Duration::seconds(offset);
        let (result, _) = analyze_pods(&pods, at);
        assert!(result.running_and_ready <= result.total);
        assert!(result.unschedulable <= result.total);
    }
}

#[test]
fn test_idempotent() {
    let pods = vec![
        running_ready("a"),
        unschedulable_since("b", secs_ago(90)),
        unschedulable_since("c", secs_ago(1)),
    ];

    let first = analyze_pods(&pods, now());
    let second = analyze_pods(&pods, now());
    assert_eq!(first, second);
}

#[test]
fn test_unschedulable_monotonic_in_time() {
    let pods: Vec<PodObservation> = (0..10)
        .map(|i| unschedulable_since(&format!("web-{i}"), secs_ago(i * 15)))
        .collect();

    let mut previous = 0;
    for offset in (0..=180).step_by(5) {
        let at = now() + chrono::Duration::seconds(offset);
        let (result, _) = analyze_pods(&pods, at);
        assert!(result.unschedulable >= previous);
        previous = result.unschedulable;
    }
    assert_eq!(previous, 10);
}

#[test]
fn test_recheck_clears_after_threshold() {
    let pods = vec![unschedulable_since("web-0", secs_ago(10))];

    let (_, status) = analyze_pods(&pods, now());
    assert!(status.needs_recheck());

    let later = now() + chrono::Duration::seconds(51);
    let (result, status) = analyze_pods(&pods, later);
    assert_eq!(result.unschedulable, 1);
    assert_eq!(status, ReconciliationStatus::AllOk);
}

#[test]
fn test_custom_threshold() {
    let analyzer = PodAnalyzer::with_threshold(Duration::from_secs(5)).unwrap();
    let pods = vec![unschedulable_since("web-0", secs_ago(10))];

    let (result, status) = analyzer.analyze(&pods, now());
    assert_eq!(result.unschedulable, 1);
    assert_eq!(status, ReconciliationStatus::AllOk);
    assert_eq!(analyzer.requeue_after(), Duration::from_secs(5));
}

#[test]
fn test_threshold_out_of_range() {
    let result = PodAnalyzer::with_threshold(Duration::from_secs(u64::MAX));
    assert!(matches!(result, Err(Error::ThresholdOutOfRange(_))));
}

#[test]
fn test_default_threshold() {
    let analyzer = PodAnalyzer::default();
    assert_eq!(analyzer.threshold(), DEFAULT_UNSCHEDULABLE_THRESHOLD);
    assert_eq!(
        analyzer,
        PodAnalyzer::with_threshold(DEFAULT_UNSCHEDULABLE_THRESHOLD).unwrap()
    );
}

#[test]
fn test_classify() {
    let analyzer = PodAnalyzer::default();

    assert_eq!(
        analyzer.classify(&running_ready("a"), now()),
        PodHealth::RunningAndReady
    );
    assert_eq!(
        analyzer.classify(&unschedulable_since("b", secs_ago(120)), now()),
        PodHealth::Unschedulable
    );
    assert_eq!(
        analyzer.classify(&unschedulable_since("c", secs_ago(1)), now()),
        PodHealth::PendingUnschedulable
    );
    assert_eq!(
        analyzer.classify(&PodObservation::new("d", PodPhase::Succeeded), now()),
        PodHealth::Other
    );
}

#[test]
fn test_requeue_after() {
    let threshold = Duration::from_secs(60);
    assert_eq!(ReconciliationStatus::AllOk.requeue_after(threshold), None);
    assert_eq!(
        ReconciliationStatus::NeedsRecheck.requeue_after(threshold),
        Some(threshold)
    );
}

#[test]
fn test_status_serialization() {
    assert_eq!(
        serde_json::to_string(&ReconciliationStatus::AllOk).unwrap(),
        "\"AllOK\""
    );
    assert_eq!(ReconciliationStatus::NeedsRecheck.to_string(), "NeedsRecheck");

    let json = serde_json::to_value(PodAnalysisResult {
        total: 3,
        running_and_ready: 2,
        unschedulable: 1,
    })
    .unwrap();
    assert_eq!(json["runningAndReady"], 2);
}

#[test]
fn test_analyze_api_pods() {
    use k8s_openapi::api::core::v1::{PodCondition, PodStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

    let pod = |phase: &str, type_: &str, status: &str, reason: Option<&str>, since: i64| Pod {
        status: Some(PodStatus {
            phase: Some(phase.to_string()),
            conditions: Some(vec![PodCondition {
                type_: type_.to_string(),
                status: status.to_string(),
                reason: reason.map(str::to_string),
                last_transition_time: Some(Time(secs_ago(since))),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    };

    let pods = vec![
        pod("Running", "Ready", "True", None, 300),
        pod("Pending", "PodScheduled", "False", Some("Unschedulable"), 120),
        pod("Pending", "PodScheduled", "False", Some("Unschedulable"), 5),
    ];

    let (result, status) = PodAnalyzer::default().analyze_api_pods(&pods, now());
    assert_eq!(result.total, 3);
    assert_eq!(result.running_and_ready, 1);
    assert_eq!(result.unschedulable, 1);
    assert_eq!(status, ReconciliationStatus::NeedsRecheck);
}

#[test]
fn test_concurrent_analysis() {
    let analyzer = PodAnalyzer::default();
    let pods = vec![
        running_ready("a"),
        unschedulable_since("b", secs_ago(90)),
        unschedulable_since("c", secs_ago(1)),
    ];
    let expected = analyzer.analyze(&pods, now());

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| analyzer.analyze(&pods, now())))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
