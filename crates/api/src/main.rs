use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use insight_core::domain::record::Record;
use insight_core::domain::report::{AnalysisReport, AnalysisRequest, ColumnMapping};
use insight_core::engine::InsightEngine;
use insight_core::llm::anthropic::AnthropicClient;

const SERVICE_NAME: &str = "InsightAgent Engine";
const DEFAULT_PORT: u16 = 8000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = insight_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let engine = match AnthropicClient::from_settings(&settings) {
        Ok(client) => {
            let client = Arc::new(client);
            let model = client.model().to_string();
            Some(InsightEngine::new(client.clone(), client, model))
        }
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "LLM client unavailable; starting API in degraded mode");
            None
        }
    };

    let state = AppState {
        engine,
        llm_model: settings.anthropic_model().to_string(),
        anthropic_configured: settings.anthropic_configured(),
    };

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .route("/analyze/simple", post(analyze_simple))
        .route("/columns/map", post(map_columns))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(Clone)]
struct AppState {
    engine: Option<InsightEngine>,
    llm_model: String,
    anthropic_configured: bool,
}

impl AppState {
    fn engine(&self) -> Result<&InsightEngine, ApiError> {
        self.engine.as_ref().ok_or_else(|| ApiError {
            status: StatusCode::SERVICE_UNAVAILABLE,
            detail: "Engine not initialized".to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    detail: String,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: rejection.body_text(),
        }
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
struct ServiceInfo {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
struct HealthReport {
    status: &'static str,
    engine_initialized: bool,
    llm_model: String,
    anthropic_configured: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "healthy",
        engine_initialized: state.engine.is_some(),
        llm_model: state.llm_model.clone(),
        anthropic_configured: state.anthropic_configured,
    })
}

async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let engine = state.engine()?;
    let Json(request) = payload?;
    run_analysis(engine, request).await
}

async fn analyze_simple(
    State(state): State<AppState>,
    payload: Result<Json<Vec<Record>>, JsonRejection>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let engine = state.engine()?;
    let Json(data) = payload?;
    run_analysis(engine, AnalysisRequest::from_records(data)).await
}

async fn run_analysis(
    engine: &InsightEngine,
    request: AnalysisRequest,
) -> Result<Json<AnalysisReport>, ApiError> {
    let records_len = request.data.len();
    match engine.analyze(request).await {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(records_len, error = %e, "analysis failed");
            Err(ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                detail: format!("Analysis failed: {e:#}"),
            })
        }
    }
}

#[derive(Debug, Deserialize)]
struct ColumnMappingRequest {
    columns: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ColumnMappingResponse {
    mapping: ColumnMapping,
}

async fn map_columns(
    State(state): State<AppState>,
    payload: Result<Json<ColumnMappingRequest>, JsonRejection>,
) -> Result<Json<ColumnMappingResponse>, ApiError> {
    let engine = state.engine()?;
    let Json(request) = payload?;
    let mapping = engine.map_columns(&request.columns).await;
    Ok(Json(ColumnMappingResponse { mapping }))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &insight_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use insight_core::llm::{ColumnResolver, SummaryGenerator, SummaryInput};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct FakeLlm {
        fail_summary: bool,
    }

    #[async_trait]
    impl ColumnResolver for FakeLlm {
        async fn map_unknown_columns(&self, columns: &[String]) -> anyhow::Result<ColumnMapping> {
            Ok(columns
                .iter()
                .map(|c| (c.clone(), "purchase_value".to_string()))
                .collect())
        }
    }

    #[async_trait]
    impl SummaryGenerator for FakeLlm {
        async fn generate_summary(&self, input: &SummaryInput) -> anyhow::Result<String> {
            anyhow::ensure!(!self.fail_summary, "upstream timeout");
            Ok(format!("Pause {} ads.", input.counts.pause))
        }
    }

    fn state(fail_summary: bool) -> AppState {
        let llm = Arc::new(FakeLlm { fail_summary });
        AppState {
            engine: Some(InsightEngine::new(llm.clone(), llm, "fake-model")),
            llm_model: "fake-model".to_string(),
            anthropic_configured: true,
        }
    }

    fn degraded() -> AppState {
        AppState {
            engine: None,
            llm_model: "fake-model".to_string(),
            anthropic_configured: false,
        }
    }

    async fn send(state: AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(v) => builder
                .header("content-type", "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let res = app(state).oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn analyze_simple_returns_report() {
        let body = json!([
            {"Ad ID": "ad_002", "Ad name": "B", "Spend": 2000, "ROAS": 0.8, "CTR %": 0.67, "Frequency": 4.2, "Impressions": 120000}
        ]);
        let (status, v) = send(state(false), "POST", "/analyze/simple", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["summary"], "Pause 1 ads.");
        assert_eq!(v["ad_insights"][0]["status"], "pause");
        assert_eq!(v["ad_insights"][0]["ad_id"], "ad_002");
        assert_eq!(v["execution_metadata"]["llm_model"], "fake-model");
        assert_eq!(v["insights"][0]["priority"], "high");
    }

    #[tokio::test]
    async fn analyze_accepts_explicit_mapping() {
        let body = json!({
            "data": [{"id": "x", "Outlay": 100, "Return": 4.0, "Rate": 3.5}],
            "column_mapping": {"id": "ad_id", "Outlay": "spend", "Return": "roas", "Rate": "ctr"}
        });
        let (status, v) = send(state(false), "POST", "/analyze", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["ad_insights"][0]["status"], "keep");
        assert_eq!(v["execution_metadata"]["column_mapping"]["Outlay"], "spend");
    }

    #[tokio::test]
    async fn summary_failure_is_a_server_error() {
        let (status, v) = send(state(true), "POST", "/analyze/simple", Some(json!([]))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = v["detail"].as_str().unwrap();
        assert!(detail.contains("summary generation failed"));
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let (status, v) = send(state(false), "POST", "/analyze", Some(json!({"rows": 1}))).await;
        assert!(status.is_client_error());
        assert!(v["detail"].is_string());
    }

    #[tokio::test]
    async fn maps_columns() {
        let body = json!({"columns": ["Amount spent", "Money Back"]});
        let (status, v) = send(state(false), "POST", "/columns/map", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["mapping"]["Amount spent"], "spend");
        assert_eq!(v["mapping"]["Money Back"], "purchase_value");
    }

    #[tokio::test]
    async fn degraded_mode_reports_health_and_refuses_work() {
        let (status, v) = send(degraded(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["engine_initialized"], false);
        assert_eq!(v["anthropic_configured"], false);

        let (status, _) = send(degraded(), "POST", "/analyze/simple", Some(json!([]))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _) = send(degraded(), "POST", "/columns/map", Some(json!({"columns": []}))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn root_banner() {
        let (status, v) = send(degraded(), "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["service"], SERVICE_NAME);
    }
}
