use insight_core::analysis::Evaluation;
use insight_core::domain::recommendation::{Decision, Finding};
use insight_core::domain::report::{ColumnMapping, MetricsOverview};
use insight_core::llm::FindingCounts;
use serde::Serialize;
use std::io::Write;

/// Rule output of an offline run. No summary is attached.
#[derive(Debug, Serialize)]
pub struct DryRun<'a> {
    pub column_mapping: ColumnMapping,
    pub counts: FindingCounts,
    pub metrics_overview: MetricsOverview,
    pub insights: &'a [Finding],
    pub ad_insights: &'a [Decision],
}

impl<'a> DryRun<'a> {
    pub fn new(column_mapping: ColumnMapping, evaluation: &'a Evaluation) -> Self {
        Self {
            column_mapping,
            counts: evaluation.counts(),
            metrics_overview: evaluation.metrics,
            insights: &evaluation.findings,
            ad_insights: &evaluation.decisions,
        }
    }
}

pub fn print_json<T: Serialize>(value: &T, compact: bool) -> anyhow::Result<()> {
    let text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{text}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use insight_core::analysis::evaluate;
    use insight_core::domain::record::Record;
    use serde_json::json;

    #[test]
    fn dry_run_carries_rules_output_without_summary() {
        let records: Vec<Record> =
            serde_json::from_value(json!([{"ad_id": "a", "spend": 200, "roas": 0.5}])).unwrap();
        let eval = evaluate(&records, None);
        let v = serde_json::to_value(DryRun::new(ColumnMapping::new(), &eval)).unwrap();

        assert!(v.get("summary").is_none());
        assert_eq!(v["counts"]["pause"], 1);
        assert_eq!(v["ad_insights"][0]["status"], "pause");
        assert_eq!(v["insights"][0]["category"], "roas");
        assert_eq!(v["metrics_overview"]["total_ads"], 1);
    }
}
