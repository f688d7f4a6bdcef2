//! PDF table extraction and styled XLSX export using lopdf
//!
//! This crate provides:
//! - Positioned text extraction from PDF pages
//! - Row reconstruction from raw (x, y) coordinates, one table per page
//! - Styled workbook export with presets, auto column widths and frozen headers
//! - A session state machine driving extraction and export for one document

pub mod export;
pub mod extractor;
pub mod layout;
pub mod rows;
pub mod session;
pub mod styles;
pub mod tables;
pub mod workbook;
pub mod xlsx;

pub use export::{build_workbook, xlsx_file_name, ExportError, ExportOptions};
pub use extractor::{extract_fragments, extract_fragments_mem, Fragment, PageFragments};
pub use rows::{group_into_rows, Row, Y_THRESHOLD};
pub use session::{
    DocumentInput, ExportArtifact, PipelineError, PipelineEvent, PipelineObserver,
    PipelineState, Session,
};
pub use styles::{StylePreset, StyleRegistry};
pub use tables::{aggregate_pages, Table, TableCollection};
pub use workbook::{Sheet, Workbook};
pub use xlsx::{WorkbookEncoder, XlsxEncoder};

use std::path::Path;

/// Result of a one-shot conversion
#[derive(Debug)]
pub struct ConvertResult {
    /// Tables found, one per non-empty page
    pub tables: TableCollection,
    /// Encoded xlsx bytes
    pub xlsx: Vec<u8>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Convert a PDF file to an xlsx workbook in one call
///
/// This function will:
/// 1. Extract positioned text from every page
/// 2. Reconstruct one table per page
/// 3. Style and encode all tables into one workbook
pub fn convert_pdf<P: AsRef<Path>>(
    path: P,
    options: &ExportOptions,
) -> Result<ConvertResult, PipelineError> {
    let buffer = std::fs::read(path).map_err(PdfError::from)?;
    convert_pdf_mem(&buffer, options)
}

/// Convert a PDF held in memory to an xlsx workbook
pub fn convert_pdf_mem(
    buffer: &[u8],
    options: &ExportOptions,
) -> Result<ConvertResult, PipelineError> {
    let start = std::time::Instant::now();

    let pages = extract_fragments_mem(buffer)?;
    let tables = aggregate_pages(&pages);
    if tables.is_empty() {
        return Err(PipelineError::EmptyResult);
    }

    let workbook = build_workbook(&tables, options, &StyleRegistry::default())?;
    let xlsx = XlsxEncoder.encode(&workbook)?;

    Ok(ConvertResult {
        tables,
        xlsx,
        processing_time_ms: start.elapsed().as_millis() as u64,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("PDF is encrypted")]
    Encrypted,
    #[error("Invalid PDF structure")]
    InvalidStructure,
}

impl From<lopdf::Error> for PdfError {
    fn from(e: lopdf::Error) -> Self {
        PdfError::Parse(e.to_string())
    }
}
