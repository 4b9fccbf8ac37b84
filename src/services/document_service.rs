use crate::error::{Error, Result};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())?;
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "txt" => Some(DocumentKind::Text),
            _ => None,
        }
    }
}

/// Text of one uploaded file. Unsupported extensions yield `Ok(None)`; an
/// unreadable PDF is a client error that aborts the request.
pub async fn extract_text(filename: &str, data: bytes::Bytes) -> Result<Option<String>> {
    match DocumentKind::from_filename(filename) {
        Some(DocumentKind::Pdf) => extract_pdf_text(data).await.map(Some),
        Some(DocumentKind::Text) => Ok(Some(decode_text(&data))),
        None => {
            tracing::info!("Ignoring upload with unsupported type: {}", filename);
            Ok(None)
        }
    }
}

/// UTF-8 decode that drops invalid byte sequences instead of substituting them.
pub fn decode_text(data: &[u8]) -> String {
    data.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

/// Page texts in page order; pages without a text layer contribute nothing.
pub async fn extract_pdf_text(data: bytes::Bytes) -> Result<String> {
    if !data.starts_with(b"%PDF") {
        return Err(Error::BadRequest(
            "Failed to process PDF: file does not have a PDF header".into(),
        ));
    }

    let extracted = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
        .await
        .map_err(|e| {
            tracing::error!("PDF extraction task failed: {}", e);
            Error::BadRequest("Failed to process PDF: the document could not be parsed".into())
        })?;

    extracted.map_err(|e| Error::BadRequest(format!("Failed to process PDF: {}", e)))
}
