use crate::domain::record::Record;
use crate::domain::recommendation::{Category, Decision, Finding};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Raw column name -> canonical field name (or `"unknown"`).
pub type ColumnMapping = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub data: Vec<Record>,

    #[serde(default)]
    pub column_mapping: Option<ColumnMapping>,

    /// Restrict the run to these analyzers. `None` runs all of them.
    #[serde(default)]
    pub analysis_focus: Option<Vec<Category>>,
}

impl AnalysisRequest {
    pub fn from_records(data: Vec<Record>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsOverview {
    pub total_spend: f64,
    pub total_revenue: f64,
    pub overall_roas: f64,
    pub total_purchases: f64,
    pub total_clicks: f64,
    pub total_impressions: f64,
    pub overall_ctr: f64,
    pub total_ads: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionMetadata {
    pub analysis_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub execution_time_seconds: f64,
    pub llm_model: String,
    pub total_ads_analyzed: usize,
    pub column_mapping: ColumnMapping,
    pub insights_generated: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub summary: String,
    pub insights: Vec<Finding>,
    pub ad_insights: Vec<Decision>,
    pub metrics_overview: MetricsOverview,
    pub execution_metadata: ExecutionMetadata,
}
