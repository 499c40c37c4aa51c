use crate::columns::{canonical_names, UNKNOWN_FIELD};
use crate::config::Settings;
use crate::domain::contract::LlmColumnMapping;
use crate::domain::report::ColumnMapping;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::json;
use crate::llm::{ColumnResolver, Provider, SummaryGenerator, SummaryInput};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
const DEFAULT_MAX_TOKENS: u32 = 1024;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_RETRIES: u32 = 3;
const DEFAULT_TEMPERATURE: f32 = 0.1;

const TOOL_NAME_EMIT_COLUMN_MAPPING: &str = "emit_column_mapping";

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    retries: u32,
}

impl AnthropicClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_anthropic_api_key()?.to_string();
        let base_url =
            std::env::var("ANTHROPIC_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = settings.anthropic_model().to_string();
        let max_tokens = std::env::var("ANTHROPIC_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let timeout_secs = std::env::var("ANTHROPIC_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("ANTHROPIC_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|n| *n >= 1)
            .unwrap_or(DEFAULT_RETRIES);

        let temperature = std::env::var("ANTHROPIC_TEMPERATURE")
            .ok()
            .and_then(|s| s.parse::<f32>().ok())
            .unwrap_or(DEFAULT_TEMPERATURE);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
            max_tokens,
            temperature,
            retries,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn create_message(
        &self,
        req: &CreateMessageRequest,
    ) -> anyhow::Result<(serde_json::Value, CreateMessageResponse)> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.create_message_once(req).await {
                Ok(out) => return Ok(out),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(attempt, ?backoff, error = %err, "Anthropic request failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    async fn create_message_once(
        &self,
        req: &CreateMessageRequest,
    ) -> anyhow::Result<(serde_json::Value, CreateMessageResponse)> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(req)
            .send()
            .await
            .context("Anthropic request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Anthropic response body")?;
        if !status.is_success() {
            let raw_response_json = serde_json::from_str::<serde_json::Value>(&text).ok();
            return Err(LlmDiagnosticsError {
                provider: Provider::Anthropic,
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
                raw_response_json,
            }
            .into());
        }

        let raw_json = serde_json::from_str::<serde_json::Value>(&text)
            .with_context(|| format!("failed to parse Anthropic response JSON: {text}"))?;
        let parsed = serde_json::from_value::<CreateMessageResponse>(raw_json.clone())
            .context("failed to decode Anthropic response into CreateMessageResponse")?;
        Ok((raw_json, parsed))
    }

    fn column_mapping_tools() -> Vec<Tool> {
        let mut allowed: Vec<&str> = canonical_names().collect();
        allowed.push(UNKNOWN_FIELD);

        let schema = serde_json::json!({
            "type": "object",
            "additionalProperties": false,
            "required": ["mapping"],
            "properties": {
                "mapping": {
                    "type": "object",
                    "additionalProperties": {"type": "string", "enum": allowed}
                }
            }
        });

        vec![Tool {
            name: TOOL_NAME_EMIT_COLUMN_MAPPING,
            description: "Emit the mapping from input column names to standard fields",
            input_schema: schema,
        }]
    }

    fn tool_choice() -> ToolChoice {
        ToolChoice::Tool {
            name: TOOL_NAME_EMIT_COLUMN_MAPPING,
        }
    }

    fn column_mapping_system_prompt() -> String {
        let fields: Vec<&str> = canonical_names().collect();
        [
            "You are a data column mapper for marketing analytics.".to_string(),
            "Map the given column names to standard schema fields.".to_string(),
            String::new(),
            "Standard fields available:".to_string(),
            fields.join(", "),
            String::new(),
            "Return ONLY a JSON object mapping input columns to standard fields.".to_string(),
            "If a column doesn't match any standard field, map it to \"unknown\".".to_string(),
            String::new(),
            "Example:".to_string(),
            "Input: [\"Daily Budget\", \"Link Clicks\", \"Revenue\"]".to_string(),
            "Output: {\"Daily Budget\": \"spend\", \"Link Clicks\": \"clicks\", \"Revenue\": \"purchase_value\"}"
                .to_string(),
        ]
        .join("\n")
    }

    fn column_mapping_user_prompt(columns: &[String]) -> String {
        let list = serde_json::to_string(columns).unwrap_or_else(|_| format!("{columns:?}"));
        format!("Map these columns: {list}")
    }

    fn summary_prompt(input: &SummaryInput) -> String {
        let m = &input.metrics;
        let c = &input.counts;
        format!(
            "Generate a concise executive summary (2-3 sentences) for this marketing analysis:\n\n\
Total Spend: ${:.2}\n\
Total Revenue: ${:.2}\n\
Overall ROAS: {:.2}\n\
Overall CTR: {:.2}%\n\n\
High Priority Issues: {}\n\
Ads to Pause: {}\n\
Ads to Fix: {}\n\
Ads to Test: {}\n\n\
Focus on actionable insights and overall account health.",
            m.total_spend,
            m.total_revenue,
            m.overall_roas,
            m.overall_ctr,
            c.high_priority,
            c.pause,
            c.fix,
            c.test,
        )
    }

    fn response_text(res: &CreateMessageResponse) -> String {
        let mut out = String::new();
        for block in &res.content {
            if let ContentBlock::Text { text } = block {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(text);
            }
        }
        out
    }

    fn response_tool_mapping(res: &CreateMessageResponse) -> anyhow::Result<Option<LlmColumnMapping>> {
        for block in &res.content {
            if let ContentBlock::ToolUse { name, input, .. } = block {
                if name == TOOL_NAME_EMIT_COLUMN_MAPPING {
                    let parsed = serde_json::from_value::<LlmColumnMapping>(input.clone())
                        .context("failed to decode tool_use.input into LlmColumnMapping")?;
                    return Ok(Some(parsed));
                }
            }
        }
        Ok(None)
    }
}

#[async_trait::async_trait]
impl ColumnResolver for AnthropicClient {
    async fn map_unknown_columns(&self, columns: &[String]) -> anyhow::Result<ColumnMapping> {
        let req = CreateMessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: Some(0.0),
            system: Some(Self::column_mapping_system_prompt()),
            messages: vec![Message {
                role: "user",
                content: Self::column_mapping_user_prompt(columns),
            }],
            tools: Some(Self::column_mapping_tools()),
            tool_choice: Some(Self::tool_choice()),
        };

        let (_raw, res) = self.create_message(&req).await?;

        if let Some(tool_mapping) = Self::response_tool_mapping(&res)? {
            return tool_mapping.validate_and_into_mapping(columns);
        }

        // Fallback to text (should be rare with a forced tool choice).
        let text = Self::response_text(&res);
        json::parse_column_mapping(&text, columns).map_err(|err| {
            anyhow::Error::from(
                LlmDiagnosticsError::new(Provider::Anthropic, "column_mapping", format!("{err:#}"))
                    .with_raw_output(text.clone()),
            )
        })
    }
}

#[async_trait::async_trait]
impl SummaryGenerator for AnthropicClient {
    async fn generate_summary(&self, input: &SummaryInput) -> anyhow::Result<String> {
        let req = CreateMessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
            system: None,
            messages: vec![Message {
                role: "user",
                content: Self::summary_prompt(input),
            }],
            tools: None,
            tool_choice: None,
        };

        let (raw_json, res) = self.create_message(&req).await?;
        let summary = Self::response_text(&res).trim().to_string();
        if summary.is_empty() {
            return Err(LlmDiagnosticsError {
                provider: Provider::Anthropic,
                stage: "summary",
                detail: format!("empty summary (stop_reason={:?})", res.stop_reason),
                raw_output: None,
                raw_response_json: Some(raw_json),
            }
            .into());
        }
        Ok(summary)
    }
}

#[derive(Debug, Clone, Serialize)]
struct CreateMessageRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,

    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlock>,

    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct Tool {
    name: &'static str,
    description: &'static str,
    input_schema: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
enum ToolChoice {
    #[serde(rename = "tool")]
    Tool { name: &'static str },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(rename = "tool_use")]
    ToolUse {
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },

    #[serde(other)]
    Unknown,
}
