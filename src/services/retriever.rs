use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::AppResult;

/// A knowledge-base document. Immutable once indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub filename: String,
    pub content: String,
}

/// In-memory retrieval index over the knowledge-base corpus.
///
/// Search is deliberately coarse keyword overlap, not semantic similarity:
/// a document matches when any whitespace token of the lowercased query
/// appears as a substring of the lowercased body. Results come back in index
/// order, truncated at `k`.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self { documents: Vec::new() }
    }

    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Build a fresh index from every `.txt` file directly inside the given
    /// directories (non-recursive). Filenames are sorted per directory so the
    /// index order is deterministic across runs.
    pub fn index_directories<P: AsRef<Path>>(dirs: &[P]) -> AppResult<Self> {
        let mut documents = Vec::new();

        for dir in dirs {
            let dir = dir.as_ref();
            if !dir.exists() {
                tracing::warn!("Knowledge directory {:?} does not exist, skipping", dir);
                continue;
            }

            let mut entries: Vec<_> = fs::read_dir(dir)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "txt"))
                .collect();
            entries.sort();

            for path in entries {
                let content = fs::read_to_string(&path)?;
                let filename = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                documents.push(Document { filename, content });
            }
        }

        tracing::info!("Indexed {} knowledge-base documents", documents.len());
        Ok(Self::from_documents(documents))
    }

    /// Return the bodies of up to `k` matching documents, in index order.
    pub fn search(&self, query: &str, k: usize) -> Vec<String> {
        let query_lower = query.to_lowercase();
        let tokens: Vec<&str> = query_lower.split_whitespace().collect();

        self.documents
            .iter()
            .filter(|doc| {
                let content = doc.content.to_lowercase();
                tokens.iter().any(|token| content.contains(token))
            })
            .take(k)
            .map(|doc| doc.content.clone())
            .collect()
    }

    /// Persist the index as a JSON blob so a restart skips the corpus scan.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let blob = serde_json::to_string(&self.documents)?;
        fs::write(path, blob)?;
        tracing::info!("Saved document store ({} documents) to {:?}", self.documents.len(), path);
        Ok(())
    }

    pub fn load(path: &Path) -> AppResult<Self> {
        let blob = fs::read_to_string(path)?;
        let documents: Vec<Document> = serde_json::from_str(&blob)?;
        tracing::info!("Loaded document store ({} documents) from {:?}", documents.len(), path);
        Ok(Self { documents })
    }
}
