//! Loading campaign exports from disk.

pub mod export;

use crate::domain::record::Record;
use crate::domain::report::AnalysisRequest;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

/// A JSON payload is either a bare record array or a full request.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonPayload {
    Records(Vec<Record>),
    Request(AnalysisRequest),
}

pub fn parse_json_request(text: &str) -> anyhow::Result<AnalysisRequest> {
    let payload = serde_json::from_str::<JsonPayload>(text)
        .context("expected a JSON array of records or an object with a \"data\" array")?;
    Ok(match payload {
        JsonPayload::Records(data) => AnalysisRequest::from_records(data),
        JsonPayload::Request(request) => request,
    })
}

/// Load `path` as JSON or CSV, chosen by file extension.
pub fn load_request(path: &Path) -> anyhow::Result<AnalysisRequest> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("csv") => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            let data = export::read_csv_records(file)
                .with_context(|| format!("failed to read CSV {}", path.display()))?;
            Ok(AnalysisRequest::from_records(data))
        }
        Some("json") | None => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            parse_json_request(&text).with_context(|| format!("invalid JSON in {}", path.display()))
        }
        Some(other) => anyhow::bail!("unsupported input extension: .{other} (expected .json or .csv)"),
    }
}
