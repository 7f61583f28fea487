//! Analyze the pods of a single workload

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use podhealth_lib::{
    AnalyzerMetrics, PodAnalysisResult, PodAnalyzer, PodHealth, PodObservation,
    ReconciliationStatus, StructuredLogger,
};
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

use crate::input::read_pods;
use crate::output::{
    color_status, format_duration, print_info, print_json, print_rows, print_warning,
    OutputFormat,
};

/// Options for the analyze command
pub struct AnalyzeOptions<'a> {
    pub file: Option<&'a Path>,
    pub cluster: &'a str,
    pub now: DateTime<Utc>,
    pub show_pods: bool,
    pub emit_metrics: bool,
}

#[derive(Tabled)]
struct SummaryRow {
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

#[derive(Tabled)]
struct PodRow {
    #[tabled(rename = "Pod")]
    name: String,
    #[tabled(rename = "Phase")]
    phase: String,
    #[tabled(rename = "Health")]
    health: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisReport<'a> {
    cluster: &'a str,
    evaluated_at: DateTime<Utc>,
    result: PodAnalysisResult,
    status: ReconciliationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    requeue_after_secs: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pods: Vec<PodReport>,
}

#[derive(Serialize)]
struct PodReport {
    name: String,
    phase: String,
    health: PodHealth,
}

/// Run the analysis and print the result
pub fn analyze(analyzer: &PodAnalyzer, options: AnalyzeOptions<'_>, format: OutputFormat) -> Result<()> {
    let pods: Vec<PodObservation> = read_pods(options.file)?
        .iter()
        .map(PodObservation::from)
        .collect();

    let (result, status) = analyzer.analyze(&pods, options.now);
    let requeue_after = status.requeue_after(analyzer.requeue_after());

    let logger = StructuredLogger::new(options.file.map_or_else(
        || "stdin".to_string(),
        |p| p.display().to_string(),
    ));
    logger.log_analysis(options.cluster, &result, status);
    if let Some(delay) = requeue_after {
        logger.log_recheck(options.cluster, delay.as_secs());
    }

    let pod_reports: Vec<PodReport> = if options.show_pods {
        pods.iter()
            .map(|pod| PodReport {
                name: pod.name.clone(),
                phase: pod.phase.as_str().to_string(),
                health: analyzer.classify(pod, options.now),
            })
            .collect()
    } else {
        Vec::new()
    };

    match format {
        OutputFormat::Json => {
            print_json(&AnalysisReport {
                cluster: options.cluster,
                evaluated_at: options.now,
                result,
                status,
                requeue_after_secs: requeue_after.map(|d| d.as_secs()),
                pods: pod_reports,
            })?;
        }
        OutputFormat::Table => {
            println!("{}", "Pod Health".bold());
            println!("{}", "=".repeat(60));
            println!("Evaluated at: {}", options.now.to_rfc3339().cyan());
            println!("Threshold:    {}", format_duration(analyzer.threshold()));
            println!();

            if result.total == 0 {
                print_warning("No pods found");
            }

            print_rows(
                &[SummaryRow {
                    cluster: options.cluster.to_string(),
                    total: result.total,
                    running_and_ready: result.running_and_ready,
                    unschedulable: result.unschedulable,
                    status: color_status(status.as_str()),
                }],
                "No results",
            );

            if options.show_pods {
                let rows: Vec<PodRow> = pod_reports
                    .into_iter()
                    .map(|p| PodRow {
                        name: p.name,
                        phase: p.phase,
                        health: color_status(p.health.as_str()),
                    })
                    .collect();
                println!();
                print_rows(&rows, "No pods found");
            }

            if let Some(delay) = requeue_after {
                println!();
                print_info(&format!(
                    "Some pods are unschedulable but inside the debounce window; re-run after {}",
                    format_duration(delay)
                ));
            }
        }
    }

    if options.emit_metrics {
        let metrics = AnalyzerMetrics::new();
        metrics.record(options.cluster, &result, status);
        print!("{}", metrics.encode_text()?);
    }

    Ok(())
}
