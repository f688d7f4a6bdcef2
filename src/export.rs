//! Export orchestration: tables to a styled workbook
//!
//! For each table, resolves every cell's style from the selected preset,
//! applies column widths and the header freeze when requested, and names the
//! sheet. Export is all-or-nothing: any error means no workbook.

use crate::layout::{column_widths, freeze_pane};
use crate::styles::{resolve_cell_style, StylePreset, StyleRegistry};
use crate::tables::{Table, TableCollection};
use crate::workbook::{Cell, Sheet, Workbook};
use once_cell::sync::Lazy;
use regex::Regex;

/// Sheet name used when the caller leaves it blank
pub const DEFAULT_SHEET_NAME: &str = "Estado de Cuenta";
/// Preset used by [`ExportOptions::default`]
pub const DEFAULT_STYLE: &str = "modern";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("unknown style preset: {0}")]
    UnknownStyle(String),
    #[error("no tables to export")]
    EmptyResult,
    #[error("invalid ARGB color: {0:?}")]
    InvalidColor(String),
    #[error("xlsx write error: {0}")]
    Encode(String),
    #[error("xlsx read error: {0}")]
    Read(String),
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        ExportError::Encode(e.to_string())
    }
}

/// Caller-supplied export settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Base sheet name; blank falls back to [`DEFAULT_SHEET_NAME`]
    pub sheet_name_base: String,
    /// Preset name, looked up in the [`StyleRegistry`]
    pub style_name: String,
    /// Size columns from their content
    pub auto_width: bool,
    /// Keep the header row visible while scrolling
    pub freeze_header: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            sheet_name_base: DEFAULT_SHEET_NAME.to_string(),
            style_name: DEFAULT_STYLE.to_string(),
            auto_width: true,
            freeze_header: true,
        }
    }
}

impl ExportOptions {
    /// The base sheet name with the blank fallback applied
    pub fn effective_sheet_name(&self) -> &str {
        if self.sheet_name_base.trim().is_empty() {
            DEFAULT_SHEET_NAME
        } else {
            &self.sheet_name_base
        }
    }
}

/// Name of the sheet at `index` (0-based) among `count` sheets.
///
/// A lone sheet takes the base name verbatim; otherwise sheets are numbered
/// from 1.
pub fn sheet_name(base: &str, index: usize, count: usize) -> String {
    if count == 1 {
        base.to_string()
    } else {
        format!("{} {}", base, index + 1)
    }
}

/// Build a workbook with one styled sheet per table, in collection order.
pub fn build_workbook(
    collection: &TableCollection,
    options: &ExportOptions,
    styles: &StyleRegistry,
) -> Result<Workbook, ExportError> {
    if collection.is_empty() {
        return Err(ExportError::EmptyResult);
    }

    let preset = styles.get(&options.style_name)?;
    let base = options.effective_sheet_name();
    let count = collection.len();

    let sheets = collection
        .iter()
        .enumerate()
        .map(|(index, table)| build_sheet(table, sheet_name(base, index, count), preset, options))
        .collect();

    Ok(Workbook { sheets })
}

/// Build one sheet from a table
pub fn build_sheet(
    table: &Table,
    name: String,
    preset: &StylePreset,
    options: &ExportOptions,
) -> Sheet {
    let cells = table
        .rows
        .iter()
        .enumerate()
        .map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(|(c, value)| Cell {
                    value: value.clone(),
                    style: resolve_cell_style(preset, r, c),
                })
                .collect()
        })
        .collect();

    Sheet {
        name,
        cells,
        column_widths: options.auto_width.then(|| column_widths(&table.rows)),
        freeze: freeze_pane(&table.rows, options.freeze_header),
    }
}

/// Output file name for a source document: `.pdf` becomes `.xlsx`.
///
/// Names without a `.pdf` suffix get `.xlsx` appended.
pub fn xlsx_file_name(source_name: &str) -> String {
    static PDF_SUFFIX_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)\.pdf$").expect("valid regex"));

    if PDF_SUFFIX_RE.is_match(source_name) {
        PDF_SUFFIX_RE.replace(source_name, ".xlsx").into_owned()
    } else {
        format!("{source_name}.xlsx")
    }
}
