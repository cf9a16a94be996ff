//! Document Processing
//!
//! Turns an uploaded file into plain text for summarization. The format is
//! picked from the declared media type, with one twist:
//! plain-text and Word uploads are only read as DOCX when the file name ends
//! in `.docx`; anything else under those media types is decoded as UTF-8.
//!
//! | Media type                 | File name      | Format      |
//! |----------------------------|----------------|-------------|
//! | `application/pdf`          | any            | Pdf         |
//! | `text/plain` or DOCX       | `*.docx`       | Docx        |
//! | `text/plain` or DOCX       | anything else  | PlainText   |
//! | `text/csv`                 | any            | Csv         |
//! | anything else              | any            | Unsupported |

pub mod docx;
pub mod pdf;
pub mod table;

use tracing::{debug, info};

use crate::models::UploadedDocument;
use crate::types::{AppError, AppResult};

pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    PlainText,
    Csv,
    Unsupported,
}

impl DocumentFormat {
    /// Pick the extraction strategy from the declared media type and the file name
    pub fn detect(content_type: &str, filename: &str) -> Self {
        let essence = media_essence(content_type);

        if essence == mime::APPLICATION_PDF.essence_str() {
            DocumentFormat::Pdf
        } else if essence == mime::TEXT_PLAIN.essence_str() || essence == DOCX_MIME {
            // Extension-gated: a real DOCX without the suffix falls through to UTF-8 decoding
            if filename.ends_with(".docx") {
                DocumentFormat::Docx
            } else {
                DocumentFormat::PlainText
            }
        } else if essence == mime::TEXT_CSV.essence_str() {
            DocumentFormat::Csv
        } else {
            DocumentFormat::Unsupported
        }
    }
}

/// `type/subtype` lowercased, without parameters
fn media_essence(content_type: &str) -> String {
    match content_type.parse::<mime::Mime>() {
        Ok(parsed) => parsed.essence_str().to_ascii_lowercase(),
        Err(_) => content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase(),
    }
}

/// Media type to use when the upload did not declare one
pub fn guess_content_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Text pulled out of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedText {
    Text(String),
    /// The format is not one we can read; not an error
    Unsupported,
}

impl ExtractedText {
    pub const UNSUPPORTED: &'static str = "Unsupported file format.";

    pub fn as_str(&self) -> &str {
        match self {
            ExtractedText::Text(text) => text,
            ExtractedText::Unsupported => Self::UNSUPPORTED,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, ExtractedText::Unsupported)
    }
}

impl std::fmt::Display for ExtractedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extract text from an uploaded document
pub fn extract_text(document: &UploadedDocument) -> AppResult<ExtractedText> {
    let format = DocumentFormat::detect(&document.content_type, &document.filename);
    info!(
        filename = %document.filename,
        content_type = %document.content_type,
        size = document.data.len(),
        format = ?format,
        "Extracting text from upload"
    );

    let text = match format {
        DocumentFormat::Pdf => pdf::extract(&document.data)?,
        DocumentFormat::Docx => docx::extract(&document.data)?,
        DocumentFormat::PlainText => String::from_utf8(document.data.clone())
            .map_err(|e| AppError::Extraction(format!("file is not valid UTF-8: {}", e)))?,
        DocumentFormat::Csv => table::render_csv(&document.data)?,
        DocumentFormat::Unsupported => return Ok(ExtractedText::Unsupported),
    };

    debug!(chars = text.chars().count(), "Extraction complete");
    Ok(ExtractedText::Text(text))
}
