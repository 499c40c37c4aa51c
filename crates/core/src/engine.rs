use crate::analysis::{self, Evaluation};
use crate::columns::{collect_columns, normalize_records, resolve_columns};
use crate::domain::report::{AnalysisReport, AnalysisRequest, ColumnMapping};
use crate::llm::{ColumnResolver, SummaryGenerator, SummaryInput};
use crate::report::{build_report, RunInfo};
use anyhow::Context;
use std::sync::Arc;
use std::time::Instant;

/// Ties the rule pipeline to its two external collaborators.
///
/// Holds no per-run state, so one engine can serve concurrent requests.
#[derive(Clone)]
pub struct InsightEngine {
    resolver: Arc<dyn ColumnResolver>,
    summarizer: Arc<dyn SummaryGenerator>,
    llm_model: String,
}

impl InsightEngine {
    pub fn new(
        resolver: Arc<dyn ColumnResolver>,
        summarizer: Arc<dyn SummaryGenerator>,
        llm_model: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            summarizer,
            llm_model: llm_model.into(),
        }
    }

    pub fn llm_model(&self) -> &str {
        &self.llm_model
    }

    pub async fn map_columns(&self, columns: &[String]) -> ColumnMapping {
        resolve_columns(columns, self.resolver.as_ref()).await
    }

    /// Normalize and evaluate without writing a summary.
    pub async fn evaluate(&self, request: &AnalysisRequest) -> (ColumnMapping, Evaluation) {
        // An empty explicit mapping means "detect".
        let column_mapping = match request.column_mapping.as_ref().filter(|m| !m.is_empty()) {
            Some(explicit) => explicit.clone(),
            None => self.map_columns(&collect_columns(&request.data)).await,
        };
        let records = normalize_records(&request.data, &column_mapping);
        let evaluation = analysis::evaluate(&records, request.analysis_focus.as_deref());
        (column_mapping, evaluation)
    }

    pub async fn analyze(&self, request: AnalysisRequest) -> anyhow::Result<AnalysisReport> {
        let started = Instant::now();
        let (column_mapping, evaluation) = self.evaluate(&request).await;

        let input = SummaryInput {
            metrics: evaluation.metrics,
            counts: evaluation.counts(),
        };
        let summary = self
            .summarizer
            .generate_summary(&input)
            .await
            .context("summary generation failed")?;

        tracing::info!(
            total_ads = evaluation.decisions.len(),
            findings = evaluation.findings.len(),
            pause = input.counts.pause,
            fix = input.counts.fix,
            test = input.counts.test,
            "analysis complete"
        );

        Ok(build_report(
            evaluation,
            summary,
            RunInfo {
                elapsed: started.elapsed(),
                llm_model: self.llm_model.clone(),
                column_mapping,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::Record;
    use crate::domain::recommendation::AdStatus;
    use crate::llm::NoColumnResolver;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSummary {
        fail: bool,
        seen: Mutex<Option<SummaryInput>>,
    }

    #[async_trait]
    impl SummaryGenerator for FakeSummary {
        async fn generate_summary(&self, input: &SummaryInput) -> anyhow::Result<String> {
            *self.seen.lock().unwrap() = Some(input.clone());
            anyhow::ensure!(!self.fail, "model unavailable");
            Ok(format!("{} ads reviewed.", input.metrics.total_ads))
        }
    }

    #[derive(Default)]
    struct CountingResolver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ColumnResolver for CountingResolver {
        async fn map_unknown_columns(&self, columns: &[String]) -> anyhow::Result<ColumnMapping> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(columns
                .iter()
                .map(|c| (c.clone(), "spend".to_string()))
                .collect())
        }
    }

    fn engine(resolver: Arc<dyn ColumnResolver>, summary: Arc<FakeSummary>) -> InsightEngine {
        InsightEngine::new(resolver, summary, "test-model")
    }

    fn export_rows() -> Vec<Record> {
        serde_json::from_value(json!([
            {
                "Campaign name": "Summer Sale", "Ad name": "Beach Creative A", "Ad ID": "ad_001",
                "Spend": 1500, "Impressions": 75000, "Clicks": 1200, "CTR %": 1.6,
                "Frequency": 2.8, "ROAS": 1.8, "Purchases": 45, "Purchase value": 2700,
                "Adds to cart": 120, "ATC→Purchase %": 37.5
            },
            {
                "Campaign name": "Summer Sale", "Ad name": "Beach Creative B", "Ad ID": "ad_002",
                "Spend": 2000, "Impressions": 120000, "Clicks": 800, "CTR %": 0.67,
                "Frequency": 4.2, "ROAS": 0.8
            }
        ]))
        .unwrap()
    }

    #[tokio::test]
    async fn analyzes_raw_export_end_to_end() {
        let resolver = Arc::new(CountingResolver::default());
        let summary = Arc::new(FakeSummary::default());
        let report = engine(resolver.clone(), summary.clone())
            .analyze(AnalysisRequest::from_records(export_rows()))
            .await
            .unwrap();

        // Every header is resolvable locally.
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
        assert_eq!(report.summary, "2 ads reviewed.");

        let statuses: Vec<AdStatus> = report.ad_insights.iter().map(|d| d.status).collect();
        assert_eq!(statuses, vec![AdStatus::Test, AdStatus::Pause]);
        assert_eq!(report.ad_insights[0].ad_name, "Beach Creative A");

        assert_eq!(report.metrics_overview.total_spend, 3500.0);
        assert_eq!(report.execution_metadata.llm_model, "test-model");
        assert_eq!(report.execution_metadata.column_mapping["Ad ID"], "ad_id");
        assert_eq!(
            report.execution_metadata.insights_generated,
            report.insights.len()
        );

        let seen = summary.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.counts.pause, 1);
        assert_eq!(seen.counts.test, 1);
    }

    #[tokio::test]
    async fn explicit_mapping_skips_resolution() {
        let resolver = Arc::new(CountingResolver::default());
        let rows: Vec<Record> =
            serde_json::from_value(json!([{"Mood": "x", "Outlay": 500, "Return": 0.5}])).unwrap();
        let mut mapping = ColumnMapping::new();
        mapping.insert("Outlay".to_string(), "spend".to_string());
        mapping.insert("Return".to_string(), "roas".to_string());

        let request = AnalysisRequest {
            data: rows,
            column_mapping: Some(mapping),
            analysis_focus: None,
        };
        let report = engine(resolver.clone(), Arc::new(FakeSummary::default()))
            .analyze(request)
            .await
            .unwrap();

        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
        assert_eq!(report.ad_insights[0].status, AdStatus::Pause);
    }

    #[tokio::test]
    async fn empty_explicit_mapping_falls_back_to_detection() {
        let resolver = Arc::new(CountingResolver::default());
        let rows: Vec<Record> = serde_json::from_value(
            json!([{"Mood": "x", "Ad ID": "a", "Spend": 500, "ROAS": 0.5}]),
        )
        .unwrap();
        let request = AnalysisRequest {
            data: rows,
            column_mapping: Some(ColumnMapping::new()),
            analysis_focus: None,
        };
        let report = engine(resolver.clone(), Arc::new(FakeSummary::default()))
            .analyze(request)
            .await
            .unwrap();

        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
        let mapping = &report.execution_metadata.column_mapping;
        assert_eq!(mapping["Spend"], "spend");
        assert_eq!(mapping["ROAS"], "roas");
        assert_eq!(report.ad_insights[0].status, AdStatus::Pause);
    }

    #[tokio::test]
    async fn unresolved_columns_are_dropped_from_rules() {
        let rows: Vec<Record> =
            serde_json::from_value(json!([{"ad_id": "a", "Outlay": 500, "roas": 0.5}])).unwrap();
        let report = engine(Arc::new(NoColumnResolver), Arc::new(FakeSummary::default()))
            .analyze(AnalysisRequest::from_records(rows))
            .await
            .unwrap();

        assert_eq!(report.execution_metadata.column_mapping["Outlay"], "unknown");
        // Without spend the unprofitable pause cannot fire.
        assert_eq!(report.ad_insights[0].status, AdStatus::Keep);
    }

    #[tokio::test]
    async fn summary_failure_fails_the_run() {
        let summary = Arc::new(FakeSummary {
            fail: true,
            ..FakeSummary::default()
        });
        let err = engine(Arc::new(NoColumnResolver), summary)
            .analyze(AnalysisRequest::from_records(export_rows()))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("summary generation failed"));
    }

    #[tokio::test]
    async fn empty_input_still_summarizes_zeroed_metrics() {
        let resolver = Arc::new(CountingResolver::default());
        let summary = Arc::new(FakeSummary::default());
        let report = engine(resolver.clone(), summary.clone())
            .analyze(AnalysisRequest::default())
            .await
            .unwrap();

        assert!(report.insights.is_empty());
        assert!(report.ad_insights.is_empty());
        assert!(report.execution_metadata.column_mapping.is_empty());
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
        let seen = summary.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.metrics.overall_roas, 0.0);
        assert_eq!(seen.metrics.total_ads, 0);
    }
}
