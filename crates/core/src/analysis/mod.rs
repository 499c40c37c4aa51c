//! The deterministic rule pipeline.
//!
//! `evaluate` is a fixed linear composition: run the category analyzers in order,
//! merge and priority-sort their findings, compute account totals, then decide a
//! status for every record. Nothing here performs I/O.

pub mod aggregate;
pub mod conversion;
pub mod ctr;
pub mod decide;
pub mod frequency;
pub mod roas;

use crate::domain::record::Record;
use crate::domain::recommendation::{AdStatus, Category, Decision, Finding, Priority};
use crate::domain::report::MetricsOverview;
use crate::llm::FindingCounts;

type Analyzer = fn(&[Record]) -> Vec<Finding>;

/// Analyzers in merge order. The order only matters for tie-breaks after sorting.
pub const ANALYZERS: [(Category, Analyzer); 4] = [
    (Category::Roas, roas::analyze),
    (Category::Ctr, ctr::analyze),
    (Category::Conversion, conversion::analyze),
    (Category::Frequency, frequency::analyze),
];

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub findings: Vec<Finding>,
    pub decisions: Vec<Decision>,
    pub metrics: MetricsOverview,
}

impl Evaluation {
    pub fn counts(&self) -> FindingCounts {
        let mut counts = FindingCounts {
            total_findings: self.findings.len(),
            high_priority: self
                .findings
                .iter()
                .filter(|f| f.priority == Priority::High)
                .count(),
            ..FindingCounts::default()
        };
        for decision in &self.decisions {
            match decision.status {
                AdStatus::Pause => counts.pause += 1,
                AdStatus::Fix => counts.fix += 1,
                AdStatus::Test => counts.test += 1,
                AdStatus::Keep => counts.keep += 1,
            }
        }
        counts
    }
}

/// Run the analyzers selected by `focus` (all when `None`) and merge their findings.
pub fn run_analyzers(records: &[Record], focus: Option<&[Category]>) -> Vec<Finding> {
    let batches = ANALYZERS
        .iter()
        .filter(|(category, _)| focus.map_or(true, |f| f.contains(category)))
        .map(|(_, analyze)| analyze(records))
        .collect();
    aggregate::merge_findings(batches)
}

pub fn evaluate(records: &[Record], focus: Option<&[Category]>) -> Evaluation {
    let findings = run_analyzers(records, focus);
    let metrics = aggregate::account_metrics(records);
    let decisions = records
        .iter()
        .map(|record| decide::decide(record, &findings))
        .collect();

    Evaluation {
        findings,
        decisions,
        metrics,
    }
}
