use crate::domain::record::Record;
use crate::domain::recommendation::{AdStatus, Decision, Finding, Priority};
use std::collections::BTreeMap;

const MAX_RECOMMENDATIONS: usize = 5;
const DEFAULT_RECOMMENDATIONS: usize = 3;
const PERFORMING_WELL: &str = "Continue monitoring; performing well";

/// Pick one status for `record` from the findings that name it.
///
/// Guards are checked in order and the first match wins: unprofitable pause, fatigue
/// pause, fix (two or more high-priority findings), test, keep-performing, keep.
pub fn decide(record: &Record, findings: &[Finding]) -> Decision {
    let ad_id = record.ad_id();
    let ad_name = record.ad_name();

    let matched: Vec<&Finding> = findings.iter().filter(|f| f.affects(&ad_id)).collect();
    let high: Vec<&Finding> = matched
        .iter()
        .copied()
        .filter(|f| f.priority == Priority::High)
        .collect();

    let roas = record.number("roas");
    let ctr = record.number("ctr");
    let spend = record.number("spend");
    let frequency = record.number("frequency");

    let mut issues = Vec::new();
    let mut recommendations: Vec<String> = Vec::new();

    let status = if roas < 1.0 && spend > 50.0 {
        issues.push(format!("Unprofitable: ROAS {roas:.2}"));
        AdStatus::Pause
    } else if frequency > 5.0 && ctr < 0.5 {
        issues.push(format!(
            "Severe fatigue: Frequency {frequency:.2}, CTR {ctr:.2}%"
        ));
        AdStatus::Pause
    } else if high.len() >= 2 {
        for f in &high {
            issues.push(f.condition.clone());
            recommendations.push(f.recommendation.clone());
        }
        AdStatus::Fix
    } else if (1.0..=2.5).contains(&roas) || (ctr > 2.0 && roas < 2.0) {
        recommendations.extend(matched.iter().map(|f| f.recommendation.clone()));
        AdStatus::Test
    } else if roas > 2.5 && ctr > 1.5 {
        recommendations.push(PERFORMING_WELL.to_string());
        AdStatus::Keep
    } else {
        AdStatus::Keep
    };

    if recommendations.is_empty() {
        recommendations = matched
            .iter()
            .take(DEFAULT_RECOMMENDATIONS)
            .map(|f| f.recommendation.clone())
            .collect();
    }
    recommendations.truncate(MAX_RECOMMENDATIONS);

    let metrics = BTreeMap::from([
        ("roas".to_string(), roas),
        ("ctr".to_string(), ctr),
        ("spend".to_string(), spend),
        ("frequency".to_string(), frequency),
    ]);

    Decision {
        ad_id,
        ad_name,
        status,
        recommendations,
        metrics,
        issues,
    }
}
