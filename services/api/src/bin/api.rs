//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{lead_feed::PgLeadFeedAdapter, webhook::WebhookAutomationAdapter},
    config::Config,
    error::ApiError,
    web::{health_handler, state::AppState, ws_handler},
};
use axum::{routing::get, Router};
use leadmaster_core::classify::KeywordClarificationPolicy;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let lead_feed = Arc::new(PgLeadFeedAdapter::new(
        db_pool.clone(),
        config.leads_channel.clone(),
    ));
    info!("Running database migrations...");
    lead_feed.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let automation = Arc::new(WebhookAutomationAdapter::new(
        reqwest::Client::new(),
        config.webhook_url.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        automation,
        lead_feed,
        classifier: Arc::new(KeywordClarificationPolicy),
    });

    // --- 5. Create the Web Router ---
    // The browser client is served from another origin; no credentials are
    // involved, so the CORS policy stays permissive.
    let cors = CorsLayer::new().allow_origin(Any).allow_headers(Any);

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(app_state);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
