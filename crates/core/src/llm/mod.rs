pub mod anthropic;
pub mod error;
pub mod json;

use crate::domain::report::{ColumnMapping, MetricsOverview};
use serde::Serialize;

#[derive(Debug, Clone)]
pub enum Provider {
    Anthropic,
}

/// Counts handed to the summary writer alongside the account metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FindingCounts {
    pub total_findings: usize,
    pub high_priority: usize,
    pub pause: usize,
    pub fix: usize,
    pub test: usize,
    pub keep: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryInput {
    pub metrics: MetricsOverview,
    pub counts: FindingCounts,
}

/// Resolves columns the local fuzzy matcher could not place.
#[async_trait::async_trait]
pub trait ColumnResolver: Send + Sync {
    async fn map_unknown_columns(&self, columns: &[String]) -> anyhow::Result<ColumnMapping>;
}

/// Writes the short account-level summary for a finished run.
#[async_trait::async_trait]
pub trait SummaryGenerator: Send + Sync {
    async fn generate_summary(&self, input: &SummaryInput) -> anyhow::Result<String>;
}

/// Resolves nothing: every column it is asked about stays unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoColumnResolver;

#[async_trait::async_trait]
impl ColumnResolver for NoColumnResolver {
    async fn map_unknown_columns(&self, _columns: &[String]) -> anyhow::Result<ColumnMapping> {
        Ok(ColumnMapping::new())
    }
}
