use crate::domain::record::Record;
use crate::domain::recommendation::{Category, Finding, Priority};

const TEST_CREATIVES: &str =
    "Test 2-3 new hooks/thumbnails; rotate in new ad creative; cap frequency to avoid fatigue";
const CUT_LOSSES: &str =
    "Pause immediately or reduce budget by 75%; audit targeting and creative quality";
const SCALE_UP: &str =
    "Scale budget by 20-30%; create lookalike audiences; duplicate winning creative";

pub fn analyze(records: &[Record]) -> Vec<Finding> {
    records.iter().filter_map(analyze_record).collect()
}

fn analyze_record(record: &Record) -> Option<Finding> {
    let roas = record.number("roas");
    let spend = record.number("spend");
    let frequency = record.number("frequency");
    let ad_id = record.ad_id();

    if (1.0..=2.0).contains(&roas) {
        Some(Finding::for_ad(
            Category::Roas,
            Priority::High,
            ad_id,
            format!("ROAS {roas:.2} (1-2 range)"),
            TEST_CREATIVES,
            &[("roas", roas), ("spend", spend), ("frequency", frequency)],
        ))
    } else if roas < 1.0 && spend > 50.0 {
        Some(Finding::for_ad(
            Category::Roas,
            Priority::High,
            ad_id,
            format!("ROAS {roas:.2} (unprofitable)"),
            CUT_LOSSES,
            &[("roas", roas), ("spend", spend)],
        ))
    } else if roas > 3.0 {
        Some(Finding::for_ad(
            Category::Roas,
            Priority::Medium,
            ad_id,
            format!("ROAS {roas:.2} (high performance)"),
            SCALE_UP,
            &[("roas", roas), ("spend", spend)],
        ))
    } else {
        None
    }
}
