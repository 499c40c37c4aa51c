use crate::columns::{is_canonical, UNKNOWN_FIELD};
use crate::domain::report::ColumnMapping;
use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column mapping as emitted by the language model, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmColumnMapping {
    pub mapping: BTreeMap<String, String>,
}

impl LlmColumnMapping {
    /// Constrain the model's answer to the columns that were asked about.
    ///
    /// Every requested column appears exactly once in the result. Values outside the
    /// canonical field set, and columns the model skipped, become `"unknown"`; columns
    /// that were never requested are dropped.
    pub fn validate_and_into_mapping(self, requested: &[String]) -> anyhow::Result<ColumnMapping> {
        ensure!(
            requested.is_empty() || !self.mapping.is_empty(),
            "LLM column mapping is empty for {} requested columns",
            requested.len()
        );

        let mut out = ColumnMapping::new();
        for column in requested {
            let field = self
                .mapping
                .get(column)
                .map(|v| v.trim().to_ascii_lowercase())
                .filter(|v| is_canonical(v))
                .unwrap_or_else(|| UNKNOWN_FIELD.to_string());
            out.insert(column.clone(), field);
        }

        let dropped = self
            .mapping
            .keys()
            .filter(|k| !out.contains_key(k.as_str()))
            .count();
        if dropped > 0 {
            tracing::debug!(dropped, "ignoring columns the model was not asked about");
        }

        Ok(out)
    }
}
