//! Column normalization: raw export headers to the canonical field set.

use crate::domain::record::Record;
use crate::domain::report::ColumnMapping;
use crate::llm::ColumnResolver;
use serde_json::Map;
use std::collections::HashSet;

pub const UNKNOWN_FIELD: &str = "unknown";

pub struct CanonicalField {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

/// Canonical fields in match priority order.
pub const CANONICAL_FIELDS: &[CanonicalField] = &[
    CanonicalField {
        name: "campaign_name",
        aliases: &["campaign name", "campaign", "campaign_name"],
    },
    CanonicalField {
        name: "ad_set_name",
        aliases: &["ad set name", "ad set", "adset", "ad_set_name"],
    },
    CanonicalField {
        name: "ad_name",
        aliases: &["ad name", "ad", "ad_name", "creative name"],
    },
    CanonicalField {
        name: "ad_id",
        aliases: &["ad id", "ad_id", "adid", "creative id"],
    },
    CanonicalField {
        name: "spend",
        aliases: &["spend", "cost", "amount spent", "budget spent"],
    },
    CanonicalField {
        name: "impressions",
        aliases: &["impressions", "impr", "views"],
    },
    CanonicalField {
        name: "clicks",
        aliases: &["clicks", "link clicks", "click"],
    },
    CanonicalField {
        name: "ctr",
        aliases: &["ctr", "ctr %", "click through rate", "clickthrough rate"],
    },
    CanonicalField {
        name: "frequency",
        aliases: &["frequency", "freq", "avg frequency"],
    },
    CanonicalField {
        name: "roas",
        aliases: &["roas", "return on ad spend", "roi"],
    },
    CanonicalField {
        name: "purchases",
        aliases: &["purchases", "conversions", "sales", "purchase"],
    },
    CanonicalField {
        name: "purchase_value",
        aliases: &["purchase value", "revenue", "conversion value", "sales value"],
    },
    CanonicalField {
        name: "add_to_cart",
        aliases: &["adds to cart", "add to cart", "atc", "cart adds"],
    },
    CanonicalField {
        name: "atc_to_purchase",
        aliases: &[
            "atc→purchase %",
            "atc to purchase",
            "cart to purchase",
            "conversion rate",
        ],
    },
    CanonicalField {
        name: "ctr_7d",
        aliases: &["ctr 7d %", "ctr 7d", "ctr last 7 days"],
    },
    CanonicalField {
        name: "ctr_prev_7d",
        aliases: &["ctr prev7 %", "ctr prev 7d", "ctr previous 7 days"],
    },
    CanonicalField {
        name: "ctr_drop",
        aliases: &["ctr drop vs prev7 %", "ctr drop", "ctr decline"],
    },
    CanonicalField {
        name: "status",
        aliases: &["status", "state", "ad status"],
    },
];

pub fn canonical_names() -> impl Iterator<Item = &'static str> {
    CANONICAL_FIELDS.iter().map(|f| f.name)
}

pub fn is_canonical(name: &str) -> bool {
    CANONICAL_FIELDS.iter().any(|f| f.name == name)
}

/// Local, deterministic match of one raw column.
///
/// An exact hit on any field's name or alias wins over every substring hit. Substring
/// matching is bidirectional (`alias` in `column` or `column` in `alias`) and takes
/// the first field in priority order.
pub fn fuzzy_match(column: &str) -> Option<&'static str> {
    let needle = column.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    let exact = CANONICAL_FIELDS
        .iter()
        .find(|f| f.name == needle || f.aliases.contains(&needle.as_str()));
    if let Some(field) = exact {
        return Some(field.name);
    }

    CANONICAL_FIELDS
        .iter()
        .find(|f| {
            f.aliases
                .iter()
                .any(|alias| needle.contains(alias) || alias.contains(needle.as_str()))
        })
        .map(|f| f.name)
}

/// Every distinct column across `records`, in first-seen order.
pub fn collect_columns(records: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for record in records {
        for column in record.columns() {
            if seen.insert(column) {
                out.push(column.to_string());
            }
        }
    }
    out
}

/// Map raw columns to canonical fields.
///
/// Columns the fuzzy matcher cannot place are sent to `resolver` in a single call. A
/// failed call maps all of them to `"unknown"` instead of failing the run.
pub async fn resolve_columns(columns: &[String], resolver: &dyn ColumnResolver) -> ColumnMapping {
    let mut mapping = ColumnMapping::new();
    let mut unmapped: Vec<String> = Vec::new();

    for column in columns {
        if mapping.contains_key(column) || unmapped.contains(column) {
            continue;
        }
        match fuzzy_match(column) {
            Some(field) => {
                mapping.insert(column.clone(), field.to_string());
            }
            None => unmapped.push(column.clone()),
        }
    }

    if unmapped.is_empty() {
        return mapping;
    }

    match resolver.map_unknown_columns(&unmapped).await {
        Ok(resolved) => {
            for column in unmapped {
                let field = resolved
                    .get(&column)
                    .filter(|f| is_canonical(f))
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_FIELD.to_string());
                mapping.insert(column, field);
            }
        }
        Err(err) => {
            tracing::warn!(
                unmapped_len = unmapped.len(),
                error = %err,
                "column resolver failed; marking unmapped columns unknown"
            );
            for column in unmapped {
                mapping.insert(column, UNKNOWN_FIELD.to_string());
            }
        }
    }

    mapping
}

/// Rewrite every record's keys through `mapping`.
///
/// Columns mapped to `"unknown"` or absent from the mapping keep their original name.
pub fn normalize_records(records: &[Record], mapping: &ColumnMapping) -> Vec<Record> {
    records
        .iter()
        .map(|record| {
            let mut fields = Map::new();
            for (column, value) in record.fields() {
                let key = match mapping.get(column) {
                    Some(field) if field != UNKNOWN_FIELD => field.clone(),
                    _ => column.clone(),
                };
                fields.insert(key, value.clone());
            }
            Record::new(fields)
        })
        .collect()
}
