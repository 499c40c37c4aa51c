use crate::analysis::Evaluation;
use crate::domain::report::{AnalysisReport, ColumnMapping, ExecutionMetadata};
use chrono::Utc;
use std::time::Duration;
use uuid::Uuid;

/// Run details that are not produced by the rule pipeline itself.
#[derive(Debug, Clone)]
pub struct RunInfo {
    pub elapsed: Duration,
    pub llm_model: String,
    pub column_mapping: ColumnMapping,
}

pub fn build_report(evaluation: Evaluation, summary: String, run: RunInfo) -> AnalysisReport {
    let execution_metadata = ExecutionMetadata {
        analysis_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        execution_time_seconds: round2(run.elapsed.as_secs_f64()),
        llm_model: run.llm_model,
        total_ads_analyzed: evaluation.decisions.len(),
        column_mapping: run.column_mapping,
        insights_generated: evaluation.findings.len(),
    };

    AnalysisReport {
        summary,
        insights: evaluation.findings,
        ad_insights: evaluation.decisions,
        metrics_overview: evaluation.metrics,
        execution_metadata,
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
