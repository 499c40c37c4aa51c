use crate::domain::contract::LlmColumnMapping;
use crate::domain::report::ColumnMapping;
use anyhow::Context;
use serde_json::Value;
use std::collections::BTreeMap;

pub fn extract_json(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.starts_with("```") {
        // Strip the fence line (```json or ```) and the closing fence.
        let mut inner = trimmed;
        if let Some(after_first) = inner.splitn(2, '\n').nth(1) {
            inner = after_first;
        }
        if let Some(end) = inner.rfind("```") {
            inner = &inner[..end];
        }
        return Some(inner.trim().to_string());
    }

    // Best-effort extraction: first '{' to last '}'.
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(trimmed[start..=end].trim().to_string())
}

/// Parse a free-text column mapping reply.
///
/// Accepts either `{"mapping": {...}}` or a bare `{"column": "field"}` object.
pub fn parse_column_mapping(text: &str, requested: &[String]) -> anyhow::Result<ColumnMapping> {
    let json_str = extract_json(text).unwrap_or_else(|| text.trim().to_string());
    let value = serde_json::from_str::<Value>(&json_str)
        .with_context(|| format!("LLM output is not valid JSON for column mapping: {json_str}"))?;

    let object = match value {
        Value::Object(mut o) => match o.remove("mapping") {
            Some(Value::Object(inner)) => inner,
            Some(other) => {
                o.insert("mapping".to_string(), other);
                o
            }
            None => o,
        },
        other => anyhow::bail!("LLM column mapping must be a JSON object, got: {other}"),
    };

    let mapping: BTreeMap<String, String> = object
        .into_iter()
        .filter_map(|(k, v)| match v {
            Value::String(s) => Some((k, s)),
            _ => None,
        })
        .collect();

    LlmColumnMapping { mapping }.validate_and_into_mapping(requested)
}
