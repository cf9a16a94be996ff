// DOCX text extraction via docx-rust

use docx_rust::document::BodyContent;
use docx_rust::DocxFile;
use std::io::Cursor;

use crate::types::{AppError, AppResult};

/// Top-level paragraphs of the document body, one per line
pub fn extract(data: &[u8]) -> AppResult<String> {
    let file = DocxFile::from_reader(Cursor::new(data))
        .map_err(|e| AppError::Extraction(format!("invalid DOCX archive: {:?}", e)))?;
    let docx = file
        .parse()
        .map_err(|e| AppError::Extraction(format!("invalid DOCX document: {:?}", e)))?;

    let paragraphs: Vec<String> = docx
        .document
        .body
        .content
        .iter()
        .filter_map(|content| match content {
            BodyContent::Paragraph(paragraph) => {
                let mut line = String::new();
                for text in paragraph.iter_text() {
                    line.push_str(text);
                }
                Some(line)
            }
            _ => None,
        })
        .collect();

    Ok(paragraphs.join("\n"))
}
