//! AdPredict Server
//!
//! Serves a pre-trained marketing regression model over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        ADPREDICT                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │  query / JSON ──▶ RawInput ──▶ assemble ──▶ FeatureVector    │
//! │                                   │              │           │
//! │                            ValidationError       ▼           │
//! │                               (400)        LoadedModel       │
//! │                                           (read-only, Arc)   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod features;
mod handlers;
mod model;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::get,
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

use config::{Config, DotenvStatus, LogFormat};
use features::FeatureSchema;
use model::LoadedModel;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let dotenv = DotenvStatus::from_result(dotenvy::dotenv());
    let config = Config::from_env();

    init_tracing(config.log_format);
    dotenv.log();

    tracing::info!("AdPredict server starting ({})...", config.environment);
    if !config.is_production() {
        tracing::debug!("Config: {:?}", config);
    }

    let schema = config
        .load_schema()
        .context("Failed to load feature schema")?;
    tracing::info!(
        "Feature schema: {} v{} ({} features, layout {:08x})",
        schema.name(),
        schema.version(),
        schema.len(),
        schema.layout_hash()
    );

    let model = model::load_model(&config.model_path, &schema)
        .with_context(|| format!("Failed to load model from {}", config.model_path))?;

    // Build application state
    let state = AppState {
        schema: Arc::new(schema),
        model: Arc::new(model),
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.host, config.port))?;
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "adpredict=debug,tower_http=debug".into());

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub schema: Arc<FeatureSchema>,
    pub model: Arc<LoadedModel>,
    pub config: Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::form::index))
        .route("/health", get(handlers::health::check))
        .route("/model/info", get(handlers::model_info::info))
        .route(
            "/predict",
            get(handlers::predict::predict_query).post(handlers::predict::predict_json),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
