use crate::domain::record::Record;
use crate::domain::recommendation::{Category, Finding, Priority};

const ROTATE_CREATIVE: &str =
    "Creative fatigue detected; rotate in fresh ad creative; test new angles/hooks";
const STRONGER_HOOKS: &str =
    "Poor creative engagement; test stronger hooks, better visuals, or clearer CTA";
const SCALE_ENGAGEMENT: &str =
    "High engagement; scale impressions, create similar variants, analyze winning elements";

pub fn analyze(records: &[Record]) -> Vec<Finding> {
    records.iter().filter_map(analyze_record).collect()
}

fn analyze_record(record: &Record) -> Option<Finding> {
    let ctr = record.number("ctr");
    let ctr_7d = record.number("ctr_7d");
    let ctr_prev_7d = record.number("ctr_prev_7d");
    let ctr_drop = record.number("ctr_drop");
    let impressions = record.number("impressions");
    let ad_id = record.ad_id();

    if ctr_drop > 30.0 || (ctr_prev_7d > 0.0 && ctr_7d < ctr_prev_7d * 0.7) {
        Some(Finding::for_ad(
            Category::Ctr,
            Priority::High,
            ad_id,
            format!("CTR dropped {ctr_drop:.1}% vs previous period"),
            ROTATE_CREATIVE,
            &[
                ("ctr", ctr),
                ("ctr_7d", ctr_7d),
                ("ctr_prev_7d", ctr_prev_7d),
                ("ctr_drop", ctr_drop),
            ],
        ))
    } else if ctr < 1.0 && impressions > 1000.0 {
        Some(Finding::for_ad(
            Category::Ctr,
            Priority::High,
            ad_id,
            format!("Low CTR {ctr:.2}% with {} impressions", impressions as i64),
            STRONGER_HOOKS,
            &[("ctr", ctr), ("impressions", impressions)],
        ))
    } else if ctr > 3.0 {
        Some(Finding::for_ad(
            Category::Ctr,
            Priority::Medium,
            ad_id,
            format!("Strong CTR {ctr:.2}%"),
            SCALE_ENGAGEMENT,
            &[("ctr", ctr), ("impressions", impressions)],
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(v: serde_json::Value) -> Vec<Finding> {
        analyze(&[serde_json::from_value(v).unwrap()])
    }

    #[test]
    fn reported_drop_over_thirty_fires() {
        let out = run(json!({"ad_id": "a", "ctr": 0.67, "ctr_drop": 45.8}));
        assert_eq!(out[0].condition, "CTR dropped 45.8% vs previous period");
        assert_eq!(out[0].priority, Priority::High);
        assert!(run(json!({"ad_id": "a", "ctr": 2.0, "ctr_drop": 30})).is_empty());
    }

    #[test]
    fn week_over_week_decline_fires_without_reported_drop() {
        // 0.69 < 0.7 * 1.0
        let out = run(json!({"ad_id": "a", "ctr": 2.0, "ctr_7d": 0.69, "ctr_prev_7d": 1.0}));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].metrics.get("ctr_prev_7d"), Some(&1.0));

        // No previous period means no decline.
        assert!(run(json!({"ad_id": "a", "ctr": 2.0, "ctr_7d": 0.1, "ctr_prev_7d": 0})).is_empty());
    }

    #[test]
    fn low_ctr_needs_volume() {
        let out = run(json!({"ad_id": "a", "ctr": 0.5, "impressions": "12,000"}));
        assert_eq!(out[0].condition, "Low CTR 0.50% with 12000 impressions");
        assert!(run(json!({"ad_id": "a", "ctr": 0.5, "impressions": 1000})).is_empty());
    }

    #[test]
    fn strong_ctr_is_medium() {
        assert!(run(json!({"ad_id": "a", "ctr": 3.0})).is_empty());
        let out = run(json!({"ad_id": "a", "ctr": "3.2%"}));
        assert_eq!(out[0].condition, "Strong CTR 3.20%");
        assert_eq!(out[0].priority, Priority::Medium);
    }

    #[test]
    fn middle_band_is_quiet() {
        assert!(run(json!({"ad_id": "a", "ctr": 1.6, "impressions": 75000})).is_empty());
    }
}
