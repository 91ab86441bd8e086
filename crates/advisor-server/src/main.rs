//! consolidation-advisor HTTP Server
//!
//! Axum-based front end: accepts consolidation requests over REST or a
//! WebSocket chat, replies with a summary and the comparison chart.

mod config;
mod error;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use consolidation_advisor::{ChartStyle, ConsolidationAdvisor};

use crate::config::ServerConfig;
use crate::handlers::{
    chart_handler, chat_handler, chat_stream_handler, health_check, optimize_handler, usage,
};
use crate::state::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))
        .route("/api/usage", get(usage))
        // Optimizer
        .route("/api/optimize", post(optimize_handler))
        .route("/api/optimize/chart", post(chart_handler))
        // Conversation
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/stream", get(chat_stream_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    let advisor = ConsolidationAdvisor::with_format(config.chart_format, ChartStyle::default());
    tracing::info!("✓ Charts rendered as {}", advisor.content_type());

    let state = AppState {
        advisor: Arc::new(advisor),
        chart_format: config.chart_format,
    };

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 consolidation-advisor running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health             - Health check");
    tracing::info!("  GET  /api/usage          - Welcome text and example request");
    tracing::info!("  POST /api/optimize       - Summary, breakdown and chart (base64)");
    tracing::info!("  POST /api/optimize/chart - Chart image only");
    tracing::info!("  POST /api/chat           - Send message");
    tracing::info!("  GET  /api/chat/stream    - WebSocket chat");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
