use std::sync::{Arc, RwLock};

use axum::{
    Router,
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
    routing::post,
};
use serde_json::{Value, json};

use crate::errors::{AppError, AppResult};
use crate::services::retriever::DocumentStore;
use crate::utils::config::{AppState, Config};
use crate::utils::pdf::{estimate_pages, extract_text_from_bytes, save_pdf_content};

// Extract text from an uploaded PDF without indexing it. The client attaches
// the returned content to its next /chat request.
pub async fn process_pdf_handler(
    State(_app_state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, StatusCode> {
    tracing::info!("Processing PDF for inline chat context");

    let (file_name, file_data) = read_pdf_field(multipart).await?;

    let content = extract_text_from_bytes(&file_data).map_err(|e| {
        tracing::error!("PDF extraction failed: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    Ok(Json(json!({
        "content": content,
        "filename": file_name
    })))
}

// Upload a PDF into the knowledge base: extract, persist as text, rebuild
// the retrieval index over both corpus directories.
pub async fn upload_pdf_handler(
    State(app_state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, StatusCode> {
    tracing::info!("Starting PDF upload process");

    let (file_name, file_data) = read_pdf_field(multipart).await?;

    let content = extract_text_from_bytes(&file_data).map_err(|e| {
        tracing::error!("PDF extraction failed: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    save_pdf_content(&app_state.config.pdf_content_dir, &file_name, &content)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save PDF content: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    // The directory scan and blob write are synchronous; keep them off the
    // async executor.
    let config = app_state.config.clone();
    let retriever = app_state.retriever.clone();
    let indexed = tokio::task::spawn_blocking(move || rebuild_index(&config, &retriever))
        .await
        .map_err(|e| {
            tracing::error!("Index rebuild task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            tracing::error!("Failed to rebuild retrieval index: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    tracing::info!("PDF '{}' uploaded, index now holds {} documents", file_name, indexed);

    Ok(Json(json!({
        "message": format!("PDF '{}' uploaded and indexed successfully", file_name),
        "filename": file_name,
        "pages_processed": estimate_pages(&content)
    })))
}

// Parse the multipart body and return the PDF file's name and bytes.
async fn read_pdf_field(mut multipart: Multipart) -> Result<(String, Vec<u8>), StatusCode> {
    let mut file_name: Option<String> = None;
    let mut file_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        StatusCode::BAD_REQUEST
    })? {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            file_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to read file data: {}", e);
                        StatusCode::BAD_REQUEST
                    })?
                    .to_vec(),
            );
        } else {
            tracing::warn!("Unknown field: {:?}", field.name());
        }
    }

    let file_name = file_name.ok_or_else(|| {
        tracing::error!("Missing file in request");
        StatusCode::BAD_REQUEST
    })?;

    if !file_name.ends_with(".pdf") {
        tracing::error!("Rejected non-PDF upload: {}", file_name);
        return Err(StatusCode::BAD_REQUEST);
    }

    let file_data = file_data.ok_or(StatusCode::BAD_REQUEST)?;
    Ok((file_name, file_data))
}

/// Build a complete replacement index over both corpus directories, persist
/// it, then swap it in. Readers see either the old index or the new one,
/// never a partial rebuild.
fn rebuild_index(config: &Config, retriever: &Arc<RwLock<DocumentStore>>) -> AppResult<usize> {
    let store = DocumentStore::index_directories(&[
        config.knowledge_base_dir.clone(),
        config.pdf_content_dir.clone(),
    ])?;
    store.save(&config.document_store_path())?;

    let indexed = store.len();
    let mut guard = retriever
        .write()
        .map_err(|_| AppError::Other("document store lock poisoned".to_string()))?;
    *guard = store;

    Ok(indexed)
}

// Create the router for PDF routes
pub fn create_pdf_router() -> Router<AppState> {
    Router::new()
        .route("/process-pdf", post(process_pdf_handler))
        .route("/upload-pdf", post(upload_pdf_handler))
}
