use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const UNKNOWN_ID: &str = "unknown";

/// One row of campaign performance data, keyed by column name.
///
/// Before normalization the keys are whatever the export used ("Amount spent", "CTR %").
/// After normalization the keys recognised by the column mapping are canonical field names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Numeric value of `key`, or `default` when the field is missing or not numeric.
    pub fn number_or(&self, key: &str, default: f64) -> f64 {
        coerce_f64(self.fields.get(key), default)
    }

    /// Numeric value of `key`, missing and malformed values read as 0.
    pub fn number(&self, key: &str) -> f64 {
        self.number_or(key, 0.0)
    }

    pub fn ad_id(&self) -> String {
        self.text_or_unknown("ad_id")
    }

    pub fn ad_name(&self) -> String {
        self.text_or_unknown("ad_name")
    }

    fn text_or_unknown(&self, key: &str) -> String {
        match self.fields.get(key) {
            None | Some(Value::Null) => UNKNOWN_ID.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Coerce a heterogeneous field value into a float.
///
/// Text has every `%` and `,` removed and surrounding whitespace trimmed before parsing.
/// Anything that still does not parse degrades to `default`; this never fails.
pub fn coerce_f64(value: Option<&Value>, default: f64) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(default),
        Some(Value::String(s)) => {
            let cleaned: String = s.chars().filter(|c| *c != '%' && *c != ',').collect();
            cleaned.trim().parse::<f64>().unwrap_or(default)
        }
        Some(Value::Bool(true)) => 1.0,
        _ => default,
    }
}
