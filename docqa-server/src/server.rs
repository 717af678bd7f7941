use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use docqa_model::{ModelError, OpenAIChatModel};
use docqa_rag::{AnswerPipeline, OpenAIEmbeddingProvider, RagError};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    config::ServerConfig,
    counter::RequestCounter,
    error::ApiError,
    protocol::{HealthResponse, MessageResponse, QuestionRequest, RequestCountResponse},
};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnswerPipeline>,
    pub counter: Arc<RequestCounter>,
}

impl AppState {
    pub fn new(pipeline: Arc<AnswerPipeline>) -> Self {
        Self { pipeline, counter: Arc::new(RequestCounter::new()) }
    }

    pub fn with_counter(mut self, counter: Arc<RequestCounter>) -> Self {
        self.counter = counter;
        self
    }
}

/// Construct the OpenAI-backed pipeline described by `config`.
///
/// The pipeline is not initialized yet.
pub fn build_pipeline(config: &ServerConfig) -> Result<AnswerPipeline, RagError> {
    let embedder = OpenAIEmbeddingProvider::new(config.openai_api_key.clone())?
        .with_base_url(config.openai_base_url.clone())
        .with_model(config.embedding_model.clone())
        .with_timeout(config.request_timeout)?;

    let chat_model = OpenAIChatModel::new(config.openai_api_key.clone())
        .and_then(|m| {
            m.with_base_url(config.openai_base_url.clone()).with_timeout(config.request_timeout)
        })
        .map_err(|e| match e {
            ModelError::Config(message) => RagError::ConfigError(message),
            other => RagError::ConfigError(other.to_string()),
        })?;

    AnswerPipeline::builder()
        .config(config.pipeline.clone())
        .embedding_provider(Arc::new(embedder))
        .chat_model(Arc::new(chat_model))
        .build()
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/get_answer", post(get_answer))
        .route("/api/request_count", get(request_count))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(config: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let addr = config.bind_addr().context("invalid host/port for docqa server")?;
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("docqa listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> Json<MessageResponse> {
    Json(MessageResponse { message: "docqa is running".to_string() })
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        initialized: state.pipeline.is_initialized(),
        chunks: state.pipeline.chunk_count(),
    })
}

async fn get_answer(
    State(state): State<AppState>,
    Json(request): Json<QuestionRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let total = state.counter.increment();

    if request.text.trim().is_empty() {
        warn!(total, "empty question rejected");
        return Err(ApiError::BadRequest("Question text cannot be empty".into()));
    }

    let message = state.pipeline.answer(&request.text).await?;
    Ok(Json(MessageResponse { message }))
}

async fn request_count(State(state): State<AppState>) -> Json<RequestCountResponse> {
    Json(RequestCountResponse { total_get_answer_requests: state.counter.get() })
}
