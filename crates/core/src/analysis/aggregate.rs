use crate::domain::record::Record;
use crate::domain::recommendation::Finding;
use crate::domain::report::MetricsOverview;

/// Concatenate analyzer outputs in the order given, then stable-sort by priority.
pub fn merge_findings(batches: Vec<Vec<Finding>>) -> Vec<Finding> {
    let mut all: Vec<Finding> = batches.into_iter().flatten().collect();
    sort_by_priority(&mut all);
    all
}

/// High before medium before low. Equal priorities keep their relative order.
pub fn sort_by_priority(findings: &mut [Finding]) {
    findings.sort_by_key(|f| f.priority.rank());
}

pub fn account_metrics(records: &[Record]) -> MetricsOverview {
    let total = |key: &str| records.iter().map(|r| r.number(key)).sum::<f64>();

    let total_spend = total("spend");
    let total_revenue = total("purchase_value");
    let total_purchases = total("purchases");
    let total_clicks = total("clicks");
    let total_impressions = total("impressions");

    MetricsOverview {
        total_spend,
        total_revenue,
        overall_roas: if total_spend > 0.0 {
            total_revenue / total_spend
        } else {
            0.0
        },
        total_purchases,
        total_clicks,
        total_impressions,
        overall_ctr: if total_impressions > 0.0 {
            total_clicks / total_impressions * 100.0
        } else {
            0.0
        },
        total_ads: records.len(),
    }
}
