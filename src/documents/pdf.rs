// PDF text extraction via lopdf

use lopdf::Document;
use tracing::warn;

use crate::types::{AppError, AppResult};

/// Text of every page that has any, in page order, one page per line group
pub fn extract(data: &[u8]) -> AppResult<String> {
    let document = Document::load_mem(data)
        .map_err(|e| AppError::Extraction(format!("invalid PDF: {}", e)))?;

    let mut pages = Vec::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(text) => {
                let text = text.trim_end();
                if !text.trim().is_empty() {
                    pages.push(text.to_string());
                }
            }
            Err(e) => {
                warn!(page = page_number, error = %e, "Skipping PDF page without extractable text");
            }
        }
    }

    Ok(pages.join("\n"))
}
