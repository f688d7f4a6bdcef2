//! Style presets and per-cell style resolution
//!
//! A preset is a named bundle of five ARGB colors. Cell styles depend only on
//! the preset and the cell's row index: row 0 is the header, body rows
//! alternate between the two row colors.

use crate::export::ExportError;
use std::collections::BTreeMap;
use std::fmt;

/// A color as an `AARRGGBB` value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArgbColor(u32);

impl ArgbColor {
    pub const fn new(argb: u32) -> Self {
        Self(argb)
    }

    /// Parse an 8-hex-digit ARGB string such as `FF667EEA`.
    pub fn from_hex(value: &str) -> Result<Self, ExportError> {
        let hex = value.trim();
        if hex.len() != 8 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ExportError::InvalidColor(value.to_string()));
        }
        u32::from_str_radix(hex, 16)
            .map(Self)
            .map_err(|_| ExportError::InvalidColor(value.to_string()))
    }

    pub fn argb(self) -> u32 {
        self.0
    }

    /// The color without its alpha channel
    pub fn rgb(self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    pub fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }
}

impl fmt::Display for ArgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

/// Named bundle of colors applied to header, body and border cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StylePreset {
    pub header_bg: ArgbColor,
    pub header_font: ArgbColor,
    /// Background of even body rows
    pub row_bg1: ArgbColor,
    /// Background of odd body rows
    pub row_bg2: ArgbColor,
    pub border_color: ArgbColor,
}

impl StylePreset {
    /// Build a preset from five ARGB hex strings, validating each.
    pub fn from_hex(
        header_bg: &str,
        header_font: &str,
        row_bg1: &str,
        row_bg2: &str,
        border_color: &str,
    ) -> Result<Self, ExportError> {
        Ok(Self {
            header_bg: ArgbColor::from_hex(header_bg)?,
            header_font: ArgbColor::from_hex(header_font)?,
            row_bg1: ArgbColor::from_hex(row_bg1)?,
            row_bg2: ArgbColor::from_hex(row_bg2)?,
            border_color: ArgbColor::from_hex(border_color)?,
        })
    }

    const fn builtin(
        header_bg: u32,
        header_font: u32,
        row_bg1: u32,
        row_bg2: u32,
        border_color: u32,
    ) -> Self {
        Self {
            header_bg: ArgbColor::new(header_bg),
            header_font: ArgbColor::new(header_font),
            row_bg1: ArgbColor::new(row_bg1),
            row_bg2: ArgbColor::new(row_bg2),
            border_color: ArgbColor::new(border_color),
        }
    }
}

/// Built-in presets, by name
pub const BUILTIN_PRESETS: [(&str, StylePreset); 4] = [
    (
        "modern",
        StylePreset::builtin(0xFF66_7EEA, 0xFFFF_FFFF, 0xFFF8_F9FF, 0xFFFF_FFFF, 0xFFE2_E8F0),
    ),
    (
        "classic",
        StylePreset::builtin(0xFF2C_3E50, 0xFFFF_FFFF, 0xFFEC_F0F1, 0xFFFF_FFFF, 0xFFBD_C3C7),
    ),
    (
        "minimal",
        StylePreset::builtin(0xFF00_0000, 0xFFFF_FFFF, 0xFFFF_FFFF, 0xFFFF_FFFF, 0xFFE0_E0E0),
    ),
    (
        "colorful",
        StylePreset::builtin(0xFFFF_6B6B, 0xFFFF_FFFF, 0xFFFF_E66D, 0xFF4E_CDC4, 0xFF95_E1D3),
    ),
];

/// Lookup table from preset name to preset.
///
/// `StyleRegistry::default()` holds [`BUILTIN_PRESETS`]; callers may build
/// their own with [`StyleRegistry::empty`] and [`StyleRegistry::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRegistry {
    presets: BTreeMap<String, StylePreset>,
}

impl Default for StyleRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for (name, preset) in BUILTIN_PRESETS {
            registry.insert(name, preset);
        }
        registry
    }
}

impl StyleRegistry {
    pub fn empty() -> Self {
        Self {
            presets: BTreeMap::new(),
        }
    }

    /// Add or replace a preset
    pub fn insert(&mut self, name: impl Into<String>, preset: StylePreset) -> &mut Self {
        self.presets.insert(name.into(), preset);
        self
    }

    pub fn get(&self, name: &str) -> Result<&StylePreset, ExportError> {
        self.presets
            .get(name)
            .ok_or_else(|| ExportError::UnknownStyle(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.presets.contains_key(name)
    }

    /// Registered preset names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }
}

/// Border line style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BorderStyle {
    Thin,
}

/// Border applied identically to all four sides of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Border {
    pub style: BorderStyle,
    pub color: ArgbColor,
}

/// Horizontal alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalAlign {
    #[default]
    General,
    Center,
}

/// Concrete formatting for one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellStyle {
    /// Solid fill color
    pub fill: ArgbColor,
    /// Font color; `None` keeps the default font color
    pub font_color: Option<ArgbColor>,
    pub bold: bool,
    pub align: HorizontalAlign,
    pub vertical_center: bool,
    pub border: Border,
}

/// Resolve the style of the cell at (`row`, `col`).
///
/// Only the row index matters; `col` is accepted so callers can resolve
/// cell by cell.
pub fn resolve_cell_style(preset: &StylePreset, row: usize, _col: usize) -> CellStyle {
    let border = Border {
        style: BorderStyle::Thin,
        color: preset.border_color,
    };

    if row == 0 {
        return CellStyle {
            fill: preset.header_bg,
            font_color: Some(preset.header_font),
            bold: true,
            align: HorizontalAlign::Center,
            vertical_center: true,
            border,
        };
    }

    let fill = if row % 2 == 0 {
        preset.row_bg1
    } else {
        preset.row_bg2
    };

    CellStyle {
        fill,
        font_color: None,
        bold: false,
        align: HorizontalAlign::General,
        vertical_center: false,
        border,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_argb() {
        let color = ArgbColor::from_hex("FF667EEA").unwrap();
        assert_eq!(color.argb(), 0xFF66_7EEA);
        assert_eq!(color.rgb(), 0x0066_7EEA);
        assert_eq!(color.alpha(), 0xFF);
        assert_eq!(color.to_string(), "FF667EEA");
    }

    #[test]
    fn test_reject_bad_colors() {
        for bad in ["FFFFFF", "FF667EEAX", "GG667EEA", "", "+F667EEA"] {
            assert!(
                matches!(ArgbColor::from_hex(bad), Err(ExportError::InvalidColor(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_default_registry() {
        let registry = StyleRegistry::default();
        assert_eq!(registry.names(), vec!["classic", "colorful", "minimal", "modern"]);
        let modern = registry.get("modern").unwrap();
        assert_eq!(modern.header_bg.to_string(), "FF667EEA");
        assert_eq!(modern.header_font.to_string(), "FFFFFFFF");
    }

    #[test]
    fn test_unknown_style() {
        let registry = StyleRegistry::default();
        match registry.get("neon") {
            Err(ExportError::UnknownStyle(name)) => assert_eq!(name, "neon"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_custom_registry() {
        let mut registry = StyleRegistry::empty();
        let preset =
            StylePreset::from_hex("FF112233", "FFFFFFFF", "FFEEEEEE", "FFDDDDDD", "FF000000")
                .unwrap();
        registry.insert("house", preset);
        assert!(registry.contains("house"));
        assert!(!registry.contains("modern"));
    }

    #[test]
    fn test_header_style() {
        let preset = BUILTIN_PRESETS[1].1;
        let style = resolve_cell_style(&preset, 0, 3);
        assert_eq!(style.fill, preset.header_bg);
        assert_eq!(style.font_color, Some(preset.header_font));
        assert!(style.bold);
        assert_eq!(style.align, HorizontalAlign::Center);
        assert!(style.vertical_center);
        assert_eq!(style.border.color, preset.border_color);
    }

    #[test]
    fn test_alternating_body_rows() {
        for (_, preset) in BUILTIN_PRESETS {
            assert_eq!(resolve_cell_style(&preset, 1, 0).fill, preset.row_bg2);
            assert_eq!(resolve_cell_style(&preset, 2, 0).fill, preset.row_bg1);
            assert_eq!(resolve_cell_style(&preset, 3, 5).fill, preset.row_bg2);
            let body = resolve_cell_style(&preset, 4, 1);
            assert!(!body.bold);
            assert_eq!(body.font_color, None);
            assert_eq!(body.border.style, BorderStyle::Thin);
            assert_eq!(body.border.color, preset.border_color);
        }
    }

    #[test]
    fn test_column_does_not_matter() {
        let preset = BUILTIN_PRESETS[3].1;
        assert_eq!(
            resolve_cell_style(&preset, 2, 0),
            resolve_cell_style(&preset, 2, 9)
        );
    }
}
