use axum::{Router, http::HeaderValue, response::Json, routing::get};
use dotenv::dotenv;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod db;
mod errors;
mod routes;
mod services;
mod utils;

use db::{init_db, run_migrations};
use services::gemini::{GeminiService, GenerateAnswer};
use services::intent::{ClassifyIntent, IntentClassifier};
use services::orchestrator::ChatEngine;
use services::retriever::DocumentStore;
use services::sentiment::{AnalyzeSentiment, LexiconSentiment};
use utils::config::{AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenv().ok();

    // Setup tracing/logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new("info"))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Prat.AI server...");

    let config = Arc::new(Config::from_env()?);

    // Initialize DB - server will not start if this fails
    tracing::info!("Connecting to database...");
    let pool = init_db(&config.database_url).await?;
    tracing::info!("Database connected successfully");

    run_migrations(&pool).await?;

    // Each capability is constructed once here and injected into the engine.
    // A capability that fails to initialize is absent, and the orchestrator
    // degrades accordingly at request time.
    let classifier: Option<Arc<dyn ClassifyIntent>> =
        match IntentClassifier::load(&config.intents_path()) {
            Ok(classifier) => {
                tracing::info!("Intent classifier loaded");
                Some(Arc::new(classifier))
            }
            Err(e) => {
                tracing::warn!("Intent classifier load failed, keyword fallback only: {}", e);
                None
            }
        };

    let sentiment: Option<Arc<dyn AnalyzeSentiment>> = Some(Arc::new(LexiconSentiment::new()));

    let store = match DocumentStore::load(&config.document_store_path()) {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!("Document store load failed, building index: {}", e);
            match DocumentStore::index_directories(&[
                config.knowledge_base_dir.clone(),
                config.pdf_content_dir.clone(),
            ]) {
                Ok(store) => {
                    if let Err(save_err) = store.save(&config.document_store_path()) {
                        tracing::warn!("Could not persist document store: {}", save_err);
                    }
                    store
                }
                Err(build_err) => {
                    tracing::error!("Index build failed, serving with empty corpus: {}", build_err);
                    DocumentStore::new()
                }
            }
        }
    };
    let retriever = Arc::new(RwLock::new(store));

    let generator: Option<Arc<dyn GenerateAnswer>> = match GeminiService::new() {
        Ok(service) => {
            tracing::info!("Gemini client initialized");
            Some(Arc::new(service))
        }
        Err(e) => {
            tracing::warn!("Gemini client initialization failed: {}", e);
            None
        }
    };

    let engine = Arc::new(ChatEngine::new(
        classifier,
        sentiment,
        retriever.clone(),
        generator,
    ));

    let app_state = AppState {
        db: Arc::new(pool),
        engine,
        retriever,
        config: config.clone(),
    };

    // Health check handler
    async fn health_handler() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "message": "Prat.AI server is running",
            "timestamp": chrono::Utc::now().to_rfc3339()
        }))
    }

    // Define routes
    let app = Router::new()
        .route("/health", get(health_handler))
        .nest("/api", routes::create_api_router())
        .layer(build_cors_layer(&config))
        .with_state(app_state);

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server running on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    let mut origins: Vec<HeaderValue> = vec![
        HeaderValue::from_static("http://localhost:5173"),
        HeaderValue::from_static("http://localhost:3000"),
    ];
    if let Some(frontend_url) = &config.frontend_url {
        match frontend_url.parse() {
            Ok(origin) => origins.push(origin),
            Err(e) => tracing::warn!("Ignoring invalid FRONTEND_URL: {}", e),
        }
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
