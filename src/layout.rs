//! Column widths and freeze panes

use crate::rows::Row;

/// Narrowest content width considered, in characters
pub const MIN_COLUMN_WIDTH: usize = 10;
/// Widest column, in characters, padding included
pub const MAX_COLUMN_WIDTH: usize = 50;
/// Extra characters added to the widest cell
pub const COLUMN_PADDING: usize = 2;

/// Width hint for every column index from 0 to the longest row's length - 1.
///
/// Each column is `min(max(10, longest cell) + 2, 50)` characters wide.
/// Rows too short to reach a column, and empty cells, contribute nothing.
pub fn column_widths(rows: &[Row]) -> Vec<usize> {
    let column_count = rows.iter().map(Vec::len).max().unwrap_or(0);

    (0..column_count)
        .map(|col| {
            let longest = rows
                .iter()
                .filter_map(|row| row.get(col))
                .filter(|cell| !cell.is_empty())
                .map(|cell| cell.chars().count())
                .fold(MIN_COLUMN_WIDTH, usize::max);
            (longest + COLUMN_PADDING).min(MAX_COLUMN_WIDTH)
        })
        .collect()
}

/// Split position for a frozen pane: rows above `row`, columns left of `col`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreezePane {
    pub row: u32,
    pub col: u16,
}

impl FreezePane {
    /// Keep the first row visible, no column freeze
    pub const HEADER_ROW: FreezePane = FreezePane { row: 1, col: 0 };
}

/// Freeze marker for a table, if requested and the table has rows
pub fn freeze_pane(rows: &[Row], freeze_header: bool) -> Option<FreezePane> {
    (freeze_header && !rows.is_empty()).then_some(FreezePane::HEADER_ROW)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[&[&str]]) -> Vec<Row> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_short_cells_get_minimum_width() {
        let data = rows(&[&["Fecha", "Monto"], &["01/02", "1.200"]]);
        assert_eq!(column_widths(&data), vec![12, 12]);
    }

    #[test]
    fn test_long_cell_capped() {
        let long = "x".repeat(60);
        let data = vec![vec![long]];
        assert_eq!(column_widths(&data), vec![50]);
    }

    #[test]
    fn test_content_driven_width() {
        let data = rows(&[&["Descripción del movimiento"]]);
        // 26 characters + 2
        assert_eq!(column_widths(&data), vec![28]);
    }

    #[test]
    fn test_ragged_rows() {
        let data = rows(&[&["a"], &["b", "a fifteen chars"], &[]]);
        assert_eq!(column_widths(&data), vec![12, 17]);
    }

    #[test]
    fn test_no_rows() {
        assert!(column_widths(&[]).is_empty());
    }

    #[test]
    fn test_freeze_requires_rows() {
        let data = rows(&[&["h"]]);
        assert_eq!(freeze_pane(&data, true), Some(FreezePane { row: 1, col: 0 }));
        assert_eq!(freeze_pane(&data, false), None);
        assert_eq!(freeze_pane(&[], true), None);
    }
}
