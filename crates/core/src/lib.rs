pub mod analysis;
pub mod columns;
pub mod domain;
pub mod engine;
pub mod ingest;
pub mod llm;
pub mod report;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub anthropic_api_key: Option<String>,
        pub anthropic_model: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY"),
                anthropic_model: non_empty_var("ANTHROPIC_MODEL"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            self.anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY is required")
        }

        pub fn anthropic_configured(&self) -> bool {
            self.anthropic_api_key.is_some()
        }

        pub fn anthropic_model(&self) -> &str {
            self.anthropic_model
                .as_deref()
                .unwrap_or(crate::llm::anthropic::DEFAULT_MODEL)
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

}
