//! DOCX summary extraction.
//!
//! The official document system publishes most reports as Word files whose
//! first page carries a one-column table headed "Summary". Its rows are a
//! richer abstract than the catalogue notes, so the report thread uses them
//! as extra reply paragraphs.

use crate::error::HarvestError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use tracing::debug;

type Table = Vec<Vec<String>>;

/// Rows following the "Summary" header row of the first summary table.
///
/// Empty when the document has no such table. Only top-level tables are
/// considered; text of nested tables is ignored.
pub fn summary_paragraphs(docx: &[u8]) -> Result<Vec<String>, HarvestError> {
    let xml = document_xml(docx)?;
    let tables = tables(&xml)?;
    debug!("DOCX has {} top-level tables", tables.len());

    let rows = tables
        .iter()
        .map(|table| table.iter().map(|cells| cells.join(" | ")).collect::<Vec<_>>())
        .find(|rows| rows.first().is_some_and(|header| header.trim() == "Summary"))
        .unwrap_or_default();

    Ok(rows
        .into_iter()
        .skip(1)
        .map(|row| row.trim().to_string())
        .filter(|row| !row.is_empty())
        .collect())
}

fn document_xml(docx: &[u8]) -> Result<String, HarvestError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(docx))
        .map_err(|e| HarvestError::Docx(format!("not a zip archive: {}", e)))?;
    let mut entry = archive
        .by_name("word/document.xml")
        .map_err(|e| HarvestError::Docx(format!("missing word/document.xml: {}", e)))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| HarvestError::Docx(format!("unreadable word/document.xml: {}", e)))?;
    Ok(xml)
}

/// Top-level tables as rows of cell texts. A cell's paragraphs are joined
/// with newlines.
fn tables(xml: &str) -> Result<Vec<Table>, HarvestError> {
    let mut reader = Reader::from_str(xml);

    let mut tables: Vec<Table> = Vec::new();
    let mut depth = 0usize;
    let mut row: Option<Vec<String>> = None;
    let mut cell: Option<Vec<String>> = None;
    let mut paragraph: Option<String> = None;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| HarvestError::Docx(format!("XML error: {}", e)))?;
        match event {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"tbl" => {
                    depth += 1;
                    if depth == 1 {
                        tables.push(Vec::new());
                    }
                }
                b"tr" if depth == 1 => row = Some(Vec::new()),
                b"tc" if depth == 1 => cell = Some(Vec::new()),
                b"p" if depth == 1 && cell.is_some() => paragraph = Some(String::new()),
                b"t" => in_text = depth == 1 && paragraph.is_some(),
                _ => {}
            },
            Event::Empty(ref e) if depth == 1 => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(cell) = cell.as_mut() {
                        cell.push(String::new());
                    }
                }
                b"tab" => {
                    if let Some(p) = paragraph.as_mut() {
                        p.push('\t');
                    }
                }
                b"br" | b"cr" => {
                    if let Some(p) = paragraph.as_mut() {
                        p.push('\n');
                    }
                }
                _ => {}
            },
            Event::Text(ref t) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| HarvestError::Docx(format!("bad text escape: {}", e)))?;
                if let Some(p) = paragraph.as_mut() {
                    p.push_str(&text);
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"tbl" => depth = depth.saturating_sub(1),
                b"t" => in_text = false,
                b"p" if depth == 1 => {
                    if let (Some(p), Some(cell)) = (paragraph.take(), cell.as_mut()) {
                        cell.push(p);
                    }
                }
                b"tc" if depth == 1 => {
                    if let (Some(paragraphs), Some(row)) = (cell.take(), row.as_mut()) {
                        row.push(paragraphs.join("\n").trim().to_string());
                    }
                }
                b"tr" if depth == 1 => {
                    if let (Some(cells), Some(table)) = (row.take(), tables.last_mut()) {
                        table.push(cells);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(tables)
}
