//! XLSX encoding of [`Workbook`] artifacts, and read-back
//!
//! Encoding uses rust_xlsxwriter; reading back uses calamine.

use crate::export::ExportError;
use crate::rows::Row;
use crate::styles::{BorderStyle, CellStyle, HorizontalAlign};
use crate::workbook::{Sheet, Workbook};
use calamine::{Data, Reader, Xlsx};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Worksheet};
use std::collections::{BTreeSet, HashMap};
use std::io::Cursor;
use std::path::Path;

/// Excel sheet name maximum length
pub const SHEET_NAME_MAX_LEN: usize = 31;
/// Characters not allowed in sheet names
pub const SHEET_NAME_ILLEGAL: [char; 7] = ['*', ':', '?', '/', '\\', '[', ']'];

/// Serializes a workbook artifact into a spreadsheet file.
pub trait WorkbookEncoder {
    fn encode(&self, workbook: &Workbook) -> Result<Vec<u8>, ExportError>;

    /// File extension of the encoded output, without the dot
    fn extension(&self) -> &str;
}

/// [`WorkbookEncoder`] producing `.xlsx` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxEncoder;

impl WorkbookEncoder for XlsxEncoder {
    fn encode(&self, workbook: &Workbook) -> Result<Vec<u8>, ExportError> {
        let mut out = rust_xlsxwriter::Workbook::new();
        let mut used_names = BTreeSet::new();

        for sheet in &workbook.sheets {
            let name = unique_sheet_name(&sanitize_sheet_name(&sheet.name), &mut used_names);
            if name != sheet.name {
                log::warn!("sheet name {:?} written as {:?}", sheet.name, name);
            }
            let worksheet = out.add_worksheet();
            worksheet.set_name(&name)?;
            write_sheet(worksheet, sheet)?;
        }

        let bytes = out.save_to_buffer()?;
        log::info!(
            "encoded {} sheets into {} bytes",
            workbook.sheets.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    fn extension(&self) -> &str {
        "xlsx"
    }
}

impl XlsxEncoder {
    /// Encode and write the workbook to `path`
    pub fn save<P: AsRef<Path>>(&self, workbook: &Workbook, path: P) -> Result<(), ExportError> {
        let bytes = self.encode(workbook)?;
        std::fs::write(path, bytes).map_err(|e| ExportError::Encode(e.to_string()))
    }
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet) -> Result<(), ExportError> {
    let mut formats: HashMap<CellStyle, Format> = HashMap::new();

    for (r, row) in sheet.cells.iter().enumerate() {
        let row_num = cast_row_num(r)?;
        for (c, cell) in row.iter().enumerate() {
            let format = formats
                .entry(cell.style)
                .or_insert_with(|| derive_format(&cell.style));
            worksheet.write_string_with_format(row_num, cast_col_num(c)?, &cell.value, format)?;
        }
    }

    if let Some(widths) = &sheet.column_widths {
        for (c, width) in widths.iter().enumerate() {
            worksheet.set_column_width(cast_col_num(c)?, *width as f64)?;
        }
    }

    if let Some(freeze) = sheet.freeze {
        worksheet.set_freeze_panes(freeze.row, freeze.col)?;
    }

    Ok(())
}

fn derive_format(style: &CellStyle) -> Format {
    let border_color = Color::RGB(style.border.color.rgb());
    let mut format = Format::new()
        .set_background_color(Color::RGB(style.fill.rgb()))
        .set_border(derive_format_border(style.border.style))
        .set_border_color(border_color);

    if let Some(color) = style.font_color {
        format = format.set_font_color(Color::RGB(color.rgb()));
    }
    if style.bold {
        format = format.set_bold();
    }
    if style.align == HorizontalAlign::Center {
        format = format.set_align(FormatAlign::Center);
    }
    if style.vertical_center {
        format = format.set_align(FormatAlign::VerticalCenter);
    }

    format
}

fn derive_format_border(style: BorderStyle) -> FormatBorder {
    match style {
        BorderStyle::Thin => FormatBorder::Thin,
    }
}

/// Replace illegal characters, trim quotes and whitespace, and cut to 31 chars.
pub fn sanitize_sheet_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if SHEET_NAME_ILLEGAL.contains(&c) { '_' } else { c })
        .collect();
    let trimmed = replaced.trim().trim_matches('\'').trim();
    let name: String = trimmed.chars().take(SHEET_NAME_MAX_LEN).collect();
    if name.is_empty() {
        "Sheet".to_string()
    } else {
        name
    }
}

/// Excel compares sheet names case-insensitively
fn unique_sheet_name(name: &str, used: &mut BTreeSet<String>) -> String {
    if used.insert(name.to_lowercase()) {
        return name.to_string();
    }

    let mut n_idx = 2usize;
    loop {
        let suffix = format!(" ({n_idx})");
        let base: String = name
            .chars()
            .take(SHEET_NAME_MAX_LEN.saturating_sub(suffix.chars().count()))
            .collect();
        let candidate = format!("{}{}", base.trim_end(), suffix);
        if used.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n_idx += 1;
    }
}

fn cast_row_num(value: usize) -> Result<u32, ExportError> {
    u32::try_from(value).map_err(|_| ExportError::Encode(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, ExportError> {
    u16::try_from(value)
        .map_err(|_| ExportError::Encode(format!("column index overflow: {value}")))
}

/// Read an xlsx back into `(sheet name, rows)` pairs, in workbook order.
///
/// Trailing empty cells are dropped from each row, so ragged rows come back
/// with their original lengths. An xlsx cannot tell a written empty string
/// from a missing cell, so a row ending in `""` reads back shorter.
pub fn read_sheet_grids(bytes: &[u8]) -> Result<Vec<(String, Vec<Row>)>, ExportError> {
    let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| ExportError::Read(format!("failed to open xlsx: {e}")))?;

    let mut out = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ExportError::Read(format!("sheet {name:?}: {e}")))?;

        let mut rows = Vec::new();
        if let Some((last_row, last_col)) = range.end() {
            for r in 0..=last_row {
                let mut row: Row = (0..=last_col)
                    .map(|c| range.get_value((r, c)).map(cell_text).unwrap_or_default())
                    .collect();
                while row.last().is_some_and(String::is_empty) {
                    row.pop();
                }
                rows.push(row);
            }
        }
        out.push((name, rows));
    }

    Ok(out)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("Report"), "Report");
        assert_eq!(sanitize_sheet_name("Q1/Q2 [draft]"), "Q1_Q2 _draft_");
        assert_eq!(sanitize_sheet_name("  "), "Sheet");
        assert_eq!(sanitize_sheet_name("'quoted'"), "quoted");
        assert_eq!(sanitize_sheet_name(&"a".repeat(40)).len(), SHEET_NAME_MAX_LEN);
    }

    #[test]
    fn test_unique_sheet_name() {
        let mut used = BTreeSet::new();
        assert_eq!(unique_sheet_name("Report", &mut used), "Report");
        assert_eq!(unique_sheet_name("REPORT", &mut used), "REPORT (2)");
        assert_eq!(unique_sheet_name("Report", &mut used), "Report (3)");

        let long = "b".repeat(SHEET_NAME_MAX_LEN);
        assert_eq!(unique_sheet_name(&long, &mut used), long);
        let second = unique_sheet_name(&long, &mut used);
        assert_eq!(second.chars().count(), SHEET_NAME_MAX_LEN);
        assert!(second.ends_with(" (2)"));
    }

    #[test]
    fn test_trailing_empty_cell_reads_back_shorter() {
        let registry = crate::styles::StyleRegistry::default();
        let preset = registry.get("modern").unwrap();
        let cell = |value: &str, row: usize, col: usize| crate::workbook::Cell {
            value: value.to_string(),
            style: crate::styles::resolve_cell_style(preset, row, col),
        };
        let workbook = Workbook {
            sheets: vec![Sheet {
                name: "Report".into(),
                cells: vec![
                    vec![cell("a", 0, 0), cell("", 0, 1), cell("c", 0, 2)],
                    vec![cell("d", 1, 0), cell("", 1, 1)],
                ],
                column_widths: None,
                freeze: None,
            }],
        };

        let grids = read_sheet_grids(&XlsxEncoder.encode(&workbook).unwrap()).unwrap();
        assert_eq!(grids[0].1, vec![vec!["a", "", "c"], vec!["d"]]);
    }

    #[test]
    fn test_read_garbage_fails() {
        assert!(matches!(
            read_sheet_grids(b"not a zip"),
            Err(ExportError::Read(_))
        ));
    }
}
