//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{CreemAdapter, DbAdapter, OpenAiVocabularyAdapter, UnconfiguredVocabulary},
    config::Config,
    error::ApiError,
    web::{build_router, state::AppState},
};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use bizchinese_core::ports::VocabularyExtractionService;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
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
    info!(
        "Connecting to database (max {} connections)...",
        config.database_max_connections
    );
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let vocab: Arc<dyn VocabularyExtractionService> = match config.llm_api_key.as_deref() {
        Some(api_key) => Arc::new(OpenAiVocabularyAdapter::new(
            OpenAiVocabularyAdapter::client_for(&config.llm_api_base, api_key),
            config.llm_model.clone(),
        )),
        None => {
            warn!("LLM_API_KEY is not set; text analysis is disabled");
            Arc::new(UnconfiguredVocabulary)
        }
    };
    if config.creem_api_key.is_none() {
        warn!("CREEM_API_KEY is not set; checkout will fail");
    }
    let payments = Arc::new(CreemAdapter::new(
        config.creem_api_base.clone(),
        config.creem_api_key.clone(),
        config.app_url.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db: db_adapter.clone(),
        config: config.clone(),
        vocab,
        payments,
    });

    // --- 5. Create the Web Router ---
    let cors_origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS_ORIGIN '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    let app = build_router(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, closing database pool");
    db_adapter.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
