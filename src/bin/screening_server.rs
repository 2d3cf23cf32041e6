//! Screening REST server
//!
//! ```bash
//! SCREENING_REFERENCE_PATH=data/reference_data.json cargo run --bin screening_server
//!
//! curl -F excelFile=@transactions.xlsx http://localhost:8000/upload
//! curl -F txtFile=@memo.txt http://localhost:8000/upload
//! curl http://localhost:8000/health
//! ```
//!
//! Configuration comes from `SCREENING_CONFIG` (YAML, default
//! `config/screening.yaml`) with `SCREENING_BIND_ADDR` and
//! `SCREENING_REFERENCE_PATH` overrides. `.env` is honoured.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aml_screen::api::{build_router, AppState};
use aml_screen::{default_embedder, EntityRecognizer, PatternRecognizer, ScreeningConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aml_screen=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ScreeningConfig::from_env().context("Failed to load configuration")?;

    // Backends are built once and shared read-only by every request
    let embedder = default_embedder().context("Failed to initialise embedder")?;
    let recognizer = Arc::new(PatternRecognizer::new());
    tracing::info!(
        embedder = embedder.model_name(),
        dimension = embedder.dimension(),
        recognizer = recognizer.name(),
        reference = %config.reference.path.display(),
        granularity = ?config.scoring.granularity,
        risk_aggregation = ?config.scoring.risk_aggregation,
        "Screening backends ready"
    );

    let bind_addr = config.server.bind_addr.clone();
    let app = build_router(AppState::new(embedder, recognizer, config));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    tracing::info!("Screening server listening on http://{}", bind_addr);
    tracing::info!("  POST /upload  - screen excelFile and/or txtFile");
    tracing::info!("  GET  /health  - liveness");

    axum::serve(listener, app).await?;
    Ok(())
}
