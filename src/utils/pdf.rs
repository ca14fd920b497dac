use std::path::{Path, PathBuf};

use pdf_extract::extract_text_from_mem;
use tokio::fs;

use crate::errors::{AppError, AppResult};

/// Extract text content from uploaded PDF bytes. Fails if the bytes are not
/// a readable PDF or contain no extractable text.
pub fn extract_text_from_bytes(data: &[u8]) -> AppResult<String> {
    let text = extract_text_from_mem(data)
        .map_err(|e| AppError::Validation(format!("Error extracting text from PDF: {}", e)))?;

    if text.trim().is_empty() {
        return Err(AppError::Validation("No text found in PDF".to_string()));
    }

    Ok(text.trim().to_string())
}

/// Persist extracted PDF text as a `.txt` file alongside the knowledge base,
/// so the retrieval index can pick it up on the next rebuild. The upload
/// filename is client-supplied; only its final component is used, so path
/// separators or `..` segments cannot escape the content directory.
pub async fn save_pdf_content(dir: &Path, filename: &str, content: &str) -> AppResult<PathBuf> {
    fs::create_dir_all(dir).await?;

    let base_name = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| AppError::Validation(format!("Invalid filename: {}", filename)))?;

    let path = dir.join(txt_filename(&base_name));
    fs::write(&path, content).await?;

    tracing::info!("Saved extracted PDF content to {:?}", path);
    Ok(path)
}

/// Map an uploaded PDF filename to the text filename it is stored under.
pub fn txt_filename(pdf_filename: &str) -> String {
    match pdf_filename.strip_suffix(".pdf") {
        Some(stem) => format!("{}.txt", stem),
        None => format!("{}.txt", pdf_filename),
    }
}

/// Rough page estimate used in the upload response: one "page" per
/// blank-line-separated block.
pub fn estimate_pages(text: &str) -> usize {
    text.split("\n\n").count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txt_filename_replaces_pdf_extension() {
        assert_eq!(txt_filename("report.pdf"), "report.txt");
        assert_eq!(txt_filename("notes"), "notes.txt");
    }

    #[test]
    fn test_estimate_pages() {
        assert_eq!(estimate_pages("one block"), 1);
        assert_eq!(estimate_pages("page one\n\npage two\n\npage three"), 3);
    }

    #[test]
    fn test_extract_rejects_non_pdf_bytes() {
        let result = extract_text_from_bytes(b"definitely not a pdf");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_save_strips_path_components_from_filename() {
        let dir = tempfile::tempdir().unwrap();

        let path = save_pdf_content(dir.path(), "../../escape.pdf", "text").await.unwrap();

        assert_eq!(path, dir.path().join("escape.txt"));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_save_rejects_filename_without_final_component() {
        let dir = tempfile::tempdir().unwrap();
        assert!(save_pdf_content(dir.path(), "..", "text").await.is_err());
    }
}
