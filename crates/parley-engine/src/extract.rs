use std::path::Path;

use crate::error::{EngineError, Result};

const UNSUPPORTED: &str = "Unsupported file type. Use .txt or .pdf.";

/// Plain text of an uploaded `.txt` or `.pdf` file
pub fn extract_text(file_name: &str, bytes: &[u8]) -> Result<String> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    let text = match extension.as_deref() {
        Some("txt") => String::from_utf8_lossy(bytes).into_owned(),
        Some("pdf") => pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            tracing::warn!(file_name, error = %e, "pdf extraction failed");
            EngineError::UnsupportedFile(format!("Could not read PDF {}", file_name))
        })?,
        _ => return Err(EngineError::UnsupportedFile(UNSUPPORTED.to_string())),
    };

    if text.trim().is_empty() {
        return Err(EngineError::EmptyUpload);
    }
    Ok(text)
}
