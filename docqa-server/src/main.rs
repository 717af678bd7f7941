use std::sync::Arc;

use anyhow::Context;
use docqa_server::{AppState, ServerConfig, build_pipeline, run_server};
use docqa_telemetry::init_telemetry;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("failed to load configuration")?;
    init_telemetry(&config.telemetry())?;
    info!(?config, "starting docqa-server");

    let pipeline = build_pipeline(&config).context("failed to build answer pipeline")?;
    pipeline.initialize().await.context("failed to initialize answer pipeline")?;

    run_server(&config, AppState::new(Arc::new(pipeline))).await
}
