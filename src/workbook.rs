//! In-memory workbook artifact handed to an encoder

use crate::layout::FreezePane;
use crate::rows::Row;
use crate::styles::CellStyle;

/// A string cell and its resolved style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub value: String,
    pub style: CellStyle,
}

/// One named grid of styled cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    /// Cells row by row; rows keep the source table's ragged lengths
    pub cells: Vec<Vec<Cell>>,
    /// Width per column in characters, when auto width is on
    pub column_widths: Option<Vec<usize>>,
    pub freeze: Option<FreezePane>,
}

impl Sheet {
    /// Cell values without styling
    pub fn values(&self) -> Vec<Row> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|cell| cell.value.clone()).collect())
            .collect()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(row).and_then(|r| r.get(col))
    }
}

/// Ordered sequence of sheets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}
