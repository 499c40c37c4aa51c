use crate::domain::record::Record;
use crate::domain::recommendation::{Category, Finding, Priority};

const CAP_FREQUENCY: &str =
    "Ad fatigue detected; cap frequency at 3, expand audience, or rotate creative";
const EXPAND_AUDIENCE: &str =
    "Audience saturation; expand targeting, add exclusions, or pause for creative refresh";

pub fn analyze(records: &[Record]) -> Vec<Finding> {
    records.iter().filter_map(analyze_record).collect()
}

fn analyze_record(record: &Record) -> Option<Finding> {
    let frequency = record.number("frequency");
    let ctr = record.number("ctr");
    let ctr_drop = record.number("ctr_drop");
    let ad_id = record.ad_id();

    if frequency > 3.5 && (ctr_drop > 20.0 || ctr < 1.0) {
        Some(Finding::for_ad(
            Category::Frequency,
            Priority::High,
            ad_id,
            format!("Frequency {frequency:.2} with performance decline"),
            CAP_FREQUENCY,
            &[("frequency", frequency), ("ctr", ctr), ("ctr_drop", ctr_drop)],
        ))
    } else if frequency > 5.0 {
        Some(Finding::for_ad(
            Category::Frequency,
            Priority::High,
            ad_id,
            format!("Very high frequency {frequency:.2}"),
            EXPAND_AUDIENCE,
            &[("frequency", frequency)],
        ))
    } else {
        None
    }
}
