use std::env;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use sqlx::PgPool;

use crate::errors::{AppError, AppResult};
use crate::services::orchestrator::ChatEngine;
use crate::services::retriever::DocumentStore;

/// Process configuration, collected once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub knowledge_base_dir: PathBuf,
    pub pdf_content_dir: PathBuf,
    pub models_dir: PathBuf,
    pub frontend_url: Option<String>,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Other("DATABASE_URL must be set in .env".to_string()))?;

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        Ok(Self {
            database_url,
            knowledge_base_dir: env_path("KNOWLEDGE_BASE_DIR", "data/knowledge_base"),
            pdf_content_dir: env_path("PDF_CONTENT_DIR", "data/pdf_content"),
            models_dir: env_path("MODELS_DIR", "models"),
            frontend_url: env::var("FRONTEND_URL").ok(),
            port,
        })
    }

    /// Path of the persisted retrieval index blob.
    pub fn document_store_path(&self) -> PathBuf {
        self.models_dir.join("documents.json")
    }

    /// Path of the intent definitions file.
    pub fn intents_path(&self) -> PathBuf {
        self.models_dir.join("intents.json")
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    env::var(key).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(default))
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<PgPool>,
    pub engine: Arc<ChatEngine>,
    pub retriever: Arc<RwLock<DocumentStore>>,
    pub config: Arc<Config>,
}
