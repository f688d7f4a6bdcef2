//! Per-page table aggregation and preview
//!
//! Each page is reconstructed independently into one table; pages that
//! produce no rows are left out. No cross-page merging happens here.

use crate::extractor::PageFragments;
use crate::rows::{group_into_rows, Row};

/// Maximum number of rows shown in a table preview
pub const PREVIEW_ROW_LIMIT: usize = 15;

/// A reconstructed table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Stable per-page label
    pub name: String,
    /// Rows in top-to-bottom page order; may be ragged.
    ///
    /// A trailing empty cell does not survive an xlsx round trip (see
    /// [`crate::xlsx::read_sheet_grids`]). [`crate::extractor::LopdfSource`]
    /// never produces blank cells.
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Length of the longest row
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Build a preview of the first [`PREVIEW_ROW_LIMIT`] rows
    pub fn preview(&self) -> TablePreview {
        let rows: Vec<Row> = self.rows.iter().take(PREVIEW_ROW_LIMIT).cloned().collect();
        TablePreview {
            name: self.name.clone(),
            rows,
            total_rows: self.rows.len(),
        }
    }
}

/// First rows of a table, ready for display. Row 0 is the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePreview {
    pub name: String,
    pub rows: Vec<Row>,
    /// Row count of the full table
    pub total_rows: usize,
}

impl TablePreview {
    pub fn is_truncated(&self) -> bool {
        self.total_rows > self.rows.len()
    }

    /// Rows padded to a rectangle, missing cells rendered as empty strings
    pub fn padded_rows(&self) -> Vec<Row> {
        let width = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        self.rows
            .iter()
            .map(|row| {
                let mut padded = row.clone();
                padded.resize(width, String::new());
                padded
            })
            .collect()
    }

    /// Footer note shown under the preview, if any
    pub fn note(&self) -> Option<String> {
        if self.rows.is_empty() {
            Some("No hay datos para mostrar".to_string())
        } else if self.is_truncated() {
            Some(format!(
                "Mostrando {} de {} filas",
                self.rows.len(),
                self.total_rows
            ))
        } else {
            None
        }
    }
}

/// Tables reconstructed from one document, one per non-empty page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableCollection {
    tables: Vec<Table>,
}

impl TableCollection {
    pub fn new(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Table> {
        self.tables.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Table> {
        self.tables.iter()
    }

    /// Labels in collection order, for selection lists
    pub fn names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    pub fn into_tables(self) -> Vec<Table> {
        self.tables
    }
}

impl<'a> IntoIterator for &'a TableCollection {
    type Item = &'a Table;
    type IntoIter = std::slice::Iter<'a, Table>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}

/// Label for the table reconstructed from 1-based page `page`
pub fn page_table_name(page: u32) -> String {
    format!("Página {page}")
}

/// Reconstruct every page and collect the non-empty ones.
///
/// Tables are named after their source page's ordinal.
pub fn aggregate_pages(pages: &[PageFragments]) -> TableCollection {
    let mut tables = Vec::new();

    for page in pages {
        let rows = group_into_rows(&page.fragments);
        log::debug!("page {}: {} rows", page.page, rows.len());
        if rows.is_empty() {
            continue;
        }
        tables.push(Table::new(page_table_name(page.page), rows));
    }

    TableCollection::new(tables)
}
