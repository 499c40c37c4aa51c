use crate::domain::record::Record;
use crate::domain::recommendation::{Category, Finding, Priority};

const AUDIT_CHECKOUT: &str = "Audit landing page and checkout flow; check for friction, page speed, trust signals; review pricing and shipping";
const FIX_LANDING_PAGE: &str = "Landing page issue; ensure message match, improve product presentation, add urgency/scarcity";
const SCALE_FUNNEL: &str =
    "Excellent conversion funnel; scale traffic to this flow, document winning elements";

pub fn analyze(records: &[Record]) -> Vec<Finding> {
    records.iter().filter_map(analyze_record).collect()
}

fn analyze_record(record: &Record) -> Option<Finding> {
    let atc_to_purchase = record.number("atc_to_purchase");
    let ctr = record.number("ctr");
    let add_to_cart = record.number("add_to_cart");
    let purchases = record.number("purchases");
    let ad_id = record.ad_id();

    if ctr > 1.5 && atc_to_purchase < 20.0 && add_to_cart > 10.0 {
        Some(Finding::for_ad(
            Category::Conversion,
            Priority::High,
            ad_id,
            format!("CTR {ctr:.2}% healthy but ATC→Purchase {atc_to_purchase:.1}% < 20%"),
            AUDIT_CHECKOUT,
            &[
                ("ctr", ctr),
                ("atc_to_purchase", atc_to_purchase),
                ("add_to_cart", add_to_cart),
            ],
        ))
    } else if add_to_cart < 5.0 && ctr > 1.0 {
        Some(Finding::for_ad(
            Category::Conversion,
            Priority::High,
            ad_id,
            format!("Low cart adds ({}) despite clicks", add_to_cart as i64),
            FIX_LANDING_PAGE,
            &[("add_to_cart", add_to_cart), ("ctr", ctr)],
        ))
    } else if atc_to_purchase > 30.0 {
        Some(Finding::for_ad(
            Category::Conversion,
            Priority::Low,
            ad_id,
            format!("Strong ATC→Purchase rate {atc_to_purchase:.1}%"),
            SCALE_FUNNEL,
            &[("atc_to_purchase", atc_to_purchase), ("purchases", purchases)],
        ))
    } else {
        None
    }
}
