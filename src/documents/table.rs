// CSV to text table, laid out like a data-frame string dump:
//
//    a  b
// 0  1  2
//
// Index column left-aligned, data columns right-aligned, two-space gutters.

use crate::types::{AppError, AppResult};

const MISSING: &str = "NaN";

pub fn render_csv(data: &[u8]) -> AppResult<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::Extraction(format!("invalid CSV header: {}", e)))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(AppError::Extraction("no columns to parse from file".to_string()));
    }

    let mut rows: Vec<Vec<String>> = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| AppError::Extraction(format!("invalid CSV: {}", e)))?;
        if record.len() > headers.len() {
            return Err(AppError::Extraction(format!(
                "expected {} fields in line {}, saw {}",
                headers.len(),
                i + 2,
                record.len()
            )));
        }

        let mut row: Vec<String> = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    MISSING.to_string()
                } else {
                    field.to_string()
                }
            })
            .collect();
        row.resize(headers.len(), MISSING.to_string());
        rows.push(row);
    }

    if rows.is_empty() {
        return Ok(format!("Empty DataFrame\nColumns: [{}]\nIndex: []", headers.join(", ")));
    }

    Ok(render_table(&headers, &rows))
}

fn width(s: &str) -> usize {
    s.chars().count()
}

fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let index: Vec<String> = (0..rows.len()).map(|i| i.to_string()).collect();
    let index_width = index.iter().map(|s| width(s)).max().unwrap_or(0);

    let column_widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            rows.iter()
                .map(|row| width(&row[col]))
                .chain(std::iter::once(width(header)))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut lines = Vec::with_capacity(rows.len() + 1);

    let mut header_line = " ".repeat(index_width);
    for (header, w) in headers.iter().zip(&column_widths) {
        header_line.push_str(&format!("  {:>w$}", header, w = w));
    }
    lines.push(header_line);

    for (label, row) in index.iter().zip(rows) {
        let mut line = format!("{:<w$}", label, w = index_width);
        for (cell, w) in row.iter().zip(&column_widths) {
            line.push_str(&format!("  {:>w$}", cell, w = w));
        }
        lines.push(line);
    }

    lines.join("\n")
}
