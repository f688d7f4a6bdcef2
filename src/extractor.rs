//! Positioned text extraction from PDF using lopdf
//!
//! Walks each page's content stream and emits one [`Fragment`] per shown
//! string, positioned in page space (origin at bottom-left).

use crate::PdfError;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::Path;

/// One piece of text as located on a page
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// The text content
    pub text: String,
    /// X position on page
    pub x: f32,
    /// Y position on page (PDF coordinates, origin at bottom-left)
    pub y: f32,
    /// Height (rendered font size)
    pub height: f32,
}

impl Fragment {
    pub fn new(text: impl Into<String>, x: f32, y: f32, height: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            height,
        }
    }
}

/// All fragments decoded from a single page, in content-stream order
#[derive(Debug, Clone, PartialEq)]
pub struct PageFragments {
    /// Page number (1-indexed)
    pub page: u32,
    pub fragments: Vec<Fragment>,
}

/// Source of positioned text for a whole document.
///
/// The session talks to the decoder only through this trait.
pub trait FragmentSource {
    /// Decode `buffer` into one [`PageFragments`] per page, in page order.
    fn extract_pages(&self, buffer: &[u8]) -> Result<Vec<PageFragments>, PdfError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// [`FragmentSource`] backed by lopdf.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfSource;

impl FragmentSource for LopdfSource {
    fn extract_pages(&self, buffer: &[u8]) -> Result<Vec<PageFragments>, PdfError> {
        extract_fragments_mem(buffer)
    }

    fn backend_name(&self) -> &str {
        "lopdf"
    }
}

/// Extract positioned fragments from a PDF file
pub fn extract_fragments<P: AsRef<Path>>(path: P) -> Result<Vec<PageFragments>, PdfError> {
    let doc = Document::load(path)?;
    extract_fragments_from_doc(&doc)
}

/// Extract positioned fragments from a memory buffer
pub fn extract_fragments_mem(buffer: &[u8]) -> Result<Vec<PageFragments>, PdfError> {
    let doc = Document::load_mem(buffer)?;
    extract_fragments_from_doc(&doc)
}

fn extract_fragments_from_doc(doc: &Document) -> Result<Vec<PageFragments>, PdfError> {
    if doc.is_encrypted() {
        return Err(PdfError::Encrypted);
    }

    let pages = doc.get_pages();
    if pages.is_empty() {
        return Err(PdfError::InvalidStructure);
    }

    let mut out = Vec::with_capacity(pages.len());
    for (&page_num, &page_id) in pages.iter() {
        let fragments = extract_page_fragments(doc, page_id)?;
        log::debug!("page {}: {} fragments", page_num, fragments.len());
        out.push(PageFragments {
            page: page_num,
            fragments,
        });
    }

    Ok(out)
}

/// Multiply two 2D transformation matrices
/// Matrix format: [a, b, c, d, e, f] representing:
/// | a  b  0 |
/// | c  d  0 |
/// | e  f  1 |
fn multiply_matrices(m1: &[f32; 6], m2: &[f32; 6]) -> [f32; 6] {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Graphics and text state while walking a content stream
struct TextState {
    ctm: [f32; 6],
    ctm_stack: Vec<[f32; 6]>,
    font: String,
    font_size: f32,
    /// Text leading in unscaled text space units (`TL`)
    leading: f32,
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    in_text_block: bool,
}

impl TextState {
    fn new() -> Self {
        Self {
            ctm: IDENTITY,
            ctm_stack: Vec::new(),
            font: String::new(),
            font_size: 12.0,
            leading: 0.0,
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            in_text_block: false,
        }
    }

    /// Start a new line offset by (tx, ty) in text space: Tlm = [1 0 0 1 tx ty] x Tlm
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = multiply_matrices(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    /// Build a fragment at the current text position
    fn fragment(&self, text: String) -> Fragment {
        let rendered_size = effective_font_size(self.font_size, &self.text_matrix);
        let combined = multiply_matrices(&self.text_matrix, &self.ctm);
        Fragment {
            text,
            x: combined[4],
            y: combined[5],
            height: rendered_size,
        }
    }
}

/// Extract fragments from a single page
fn extract_page_fragments(doc: &Document, page_id: ObjectId) -> Result<Vec<Fragment>, PdfError> {
    let fonts = doc.get_page_fonts(page_id).unwrap_or_default();

    let content_data = doc
        .get_page_content(page_id)
        .map_err(|e| PdfError::Parse(e.to_string()))?;
    let content = Content::decode(&content_data).map_err(|e| PdfError::Parse(e.to_string()))?;

    Ok(walk_operations(&content.operations, |operand, font| {
        decode_operand(operand, doc, &fonts, font)
    }))
}

/// Run the text operators of a content stream.
///
/// `decode` turns a string operand into text given the current font resource
/// name; non-string operands yield `None`.
fn walk_operations<F>(operations: &[Operation], decode: F) -> Vec<Fragment>
where
    F: Fn(&Object, &str) -> Option<String>,
{
    let mut fragments = Vec::new();
    let mut state = TextState::new();

    for op in operations {
        match op.operator.as_str() {
            "q" => state.ctm_stack.push(state.ctm),
            "Q" => {
                if let Some(saved) = state.ctm_stack.pop() {
                    state.ctm = saved;
                }
            }
            "cm" => {
                if op.operands.len() >= 6 {
                    let new_matrix = read_matrix(&op.operands);
                    state.ctm = multiply_matrices(&new_matrix, &state.ctm);
                }
            }
            "BT" => {
                state.in_text_block = true;
                state.text_matrix = IDENTITY;
                state.line_matrix = IDENTITY;
            }
            "ET" => state.in_text_block = false,
            "Tf" => {
                if op.operands.len() >= 2 {
                    if let Ok(name) = op.operands[0].as_name() {
                        state.font = String::from_utf8_lossy(name).to_string();
                    }
                    if let Some(size) = get_number(&op.operands[1]) {
                        state.font_size = size;
                    }
                }
            }
            "TL" => {
                if let Some(leading) = op.operands.first().and_then(get_number) {
                    state.leading = leading;
                }
            }
            "Td" | "TD" => {
                if op.operands.len() >= 2 {
                    let tx = get_number(&op.operands[0]).unwrap_or(0.0);
                    let ty = get_number(&op.operands[1]).unwrap_or(0.0);
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.move_line(tx, ty);
                }
            }
            "Tm" => {
                if op.operands.len() >= 6 {
                    state.text_matrix = read_matrix(&op.operands);
                    state.line_matrix = state.text_matrix;
                }
            }
            "T*" => state.next_line(),
            "Tj" => {
                if state.in_text_block {
                    if let Some(text) = op
                        .operands
                        .first()
                        .and_then(|operand| decode(operand, state.font.as_str()))
                    {
                        push_fragment(&mut fragments, &state, text);
                    }
                }
            }
            "TJ" => {
                if state.in_text_block {
                    if let Some(Ok(array)) = op.operands.first().map(Object::as_array) {
                        let text: String = array
                            .iter()
                            .filter_map(|item| decode(item, state.font.as_str()))
                            .collect();
                        push_fragment(&mut fragments, &state, text);
                    }
                }
            }
            // `'` shows its only operand, `"` its third (after word and char spacing)
            "'" | "\"" => {
                if state.in_text_block {
                    state.next_line();
                    let index = if op.operator == "'" { 0 } else { 2 };
                    if let Some(text) = op
                        .operands
                        .get(index)
                        .and_then(|operand| decode(operand, state.font.as_str()))
                    {
                        push_fragment(&mut fragments, &state, text);
                    }
                }
            }
            _ => {}
        }
    }

    fragments
}

fn push_fragment(fragments: &mut Vec<Fragment>, state: &TextState, text: String) {
    if !text.trim().is_empty() {
        fragments.push(state.fragment(text));
    }
}

fn read_matrix(operands: &[Object]) -> [f32; 6] {
    let mut matrix = IDENTITY;
    for (i, operand) in operands.iter().take(6).enumerate() {
        matrix[i] = get_number(operand).unwrap_or(IDENTITY[i]);
    }
    matrix
}

/// Helper to get f32 from Object
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Compute effective font size from base size and text matrix
fn effective_font_size(base_size: f32, text_matrix: &[f32; 6]) -> f32 {
    let scale_x = (text_matrix[0].powi(2) + text_matrix[1].powi(2)).sqrt();
    let scale_y = (text_matrix[2].powi(2) + text_matrix[3].powi(2)).sqrt();
    base_size * scale_x.max(scale_y)
}

/// Decode a string operand using the current font's encoding
fn decode_operand(
    obj: &Object,
    doc: &Document,
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    current_font: &str,
) -> Option<String> {
    let Object::String(bytes, _) = obj else {
        return None;
    };

    if let Some(font_dict) = fonts.get(current_font.as_bytes()) {
        if let Ok(encoding) = font_dict.get_font_encoding(doc) {
            if let Ok(text) = Document::decode_text(&encoding, bytes) {
                return Some(text);
            }
        }
    }

    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&utf16));
    }

    // Latin-1
    Some(bytes.iter().map(|&b| b as char).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiply_identity() {
        let m = [2.0, 0.0, 0.0, 2.0, 10.0, 20.0];
        assert_eq!(multiply_matrices(&m, &IDENTITY), m);
        assert_eq!(multiply_matrices(&IDENTITY, &m), m);
    }

    #[test]
    fn test_translation_through_ctm() {
        let text_matrix = [1.0, 0.0, 0.0, 1.0, 100.0, 700.0];
        let ctm = [1.0, 0.0, 0.0, 1.0, 0.0, -50.0];
        let combined = multiply_matrices(&text_matrix, &ctm);
        assert_eq!((combined[4], combined[5]), (100.0, 650.0));
    }

    #[test]
    fn test_effective_font_size_scales() {
        let scaled = [2.0, 0.0, 0.0, 2.0, 0.0, 0.0];
        assert_eq!(effective_font_size(10.0, &scaled), 20.0);
        assert_eq!(effective_font_size(9.0, &IDENTITY), 9.0);
    }

    #[test]
    fn test_read_matrix_defaults_non_numeric() {
        let operands = vec![
            Object::Integer(3),
            Object::Null,
            Object::Null,
            Object::Real(1.5),
            Object::Integer(40),
            Object::Integer(50),
        ];
        assert_eq!(read_matrix(&operands), [3.0, 0.0, 0.0, 1.5, 40.0, 50.0]);
    }

    #[test]
    fn test_blank_text_skipped() {
        let state = TextState::new();
        let mut fragments = Vec::new();
        push_fragment(&mut fragments, &state, "   ".into());
        assert!(fragments.is_empty());
        push_fragment(&mut fragments, &state, "Total".into());
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].height, 12.0);
    }

    fn int(value: i64) -> Object {
        Object::Integer(value)
    }

    fn real(value: f32) -> Object {
        Object::Real(value)
    }

    fn text(value: &str) -> Object {
        Object::string_literal(value)
    }

    fn op(operator: &str, operands: Vec<Object>) -> Operation {
        Operation::new(operator, operands)
    }

    fn walk(operations: &[Operation]) -> Vec<Fragment> {
        walk_operations(operations, |operand, _font| match operand {
            Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        })
    }

    fn positions(fragments: &[Fragment]) -> Vec<(&str, f32, f32)> {
        fragments
            .iter()
            .map(|f| (f.text.as_str(), f.x, f.y))
            .collect()
    }

    /// `/F1 1 Tf 10 0 0 10 72 700 Tm`: unit font size scaled by the text matrix
    fn scaled_text_start() -> Vec<Operation> {
        vec![
            op("BT", vec![]),
            op("Tf", vec!["F1".into(), int(1)]),
            op("Tm", vec![int(10), int(0), int(0), int(10), int(72), int(700)]),
        ]
    }

    #[test]
    fn test_td_scaled_by_line_matrix() {
        let mut ops = scaled_text_start();
        ops.extend([
            op("Tj", vec![text("Fecha")]),
            op("Td", vec![int(0), int(-2)]),
            op("Tj", vec![text("01/03")]),
            op("Td", vec![int(3), int(0)]),
            op("Tj", vec![text("Deposito")]),
            op("ET", vec![]),
        ]);

        let fragments = walk(&ops);
        assert_eq!(
            positions(&fragments),
            vec![
                ("Fecha", 72.0, 700.0),
                ("01/03", 72.0, 680.0),
                ("Deposito", 102.0, 680.0)
            ]
        );
        assert!(fragments.iter().all(|f| f.height == 10.0));
    }

    #[test]
    fn test_td_sets_leading_for_next_line() {
        let mut ops = scaled_text_start();
        ops.extend([
            op("Tj", vec![text("a")]),
            op("TD", vec![int(0), real(-1.5)]),
            op("Tj", vec![text("b")]),
            op("T*", vec![]),
            op("Tj", vec![text("c")]),
            op("ET", vec![]),
        ]);

        let ys: Vec<f32> = walk(&ops).iter().map(|f| f.y).collect();
        assert_eq!(ys, vec![700.0, 685.0, 670.0]);
    }

    #[test]
    fn test_quote_operators_use_leading() {
        let ops = vec![
            op("BT", vec![]),
            op("TL", vec![int(14)]),
            op("Td", vec![int(50), int(500)]),
            op("Tj", vec![text("first")]),
            op("'", vec![text("second")]),
            op("\"", vec![int(1), int(0), text("third")]),
            op("ET", vec![]),
        ];

        assert_eq!(
            positions(&walk(&ops)),
            vec![
                ("first", 50.0, 500.0),
                ("second", 50.0, 486.0),
                ("third", 50.0, 472.0)
            ]
        );
    }

    #[test]
    fn test_quote_outside_text_block_ignored() {
        let ops = vec![op("TL", vec![int(14)]), op("'", vec![text("stray")])];
        assert!(walk(&ops).is_empty());
    }

    #[test]
    fn test_tj_array_concatenates_strings() {
        let ops = vec![
            op("BT", vec![]),
            op("Td", vec![int(72), int(600)]),
            op(
                "TJ",
                vec![Object::Array(vec![text("Sal"), int(-120), text("do")])],
            ),
            op("ET", vec![]),
        ];
        assert_eq!(positions(&walk(&ops)), vec![("Saldo", 72.0, 600.0)]);
    }

    #[test]
    fn test_cm_restored_by_q() {
        let ops = vec![
            op("q", vec![]),
            op("cm", vec![int(1), int(0), int(0), int(1), int(0), int(-50)]),
            op("BT", vec![]),
            op("Td", vec![int(100), int(700)]),
            op("Tj", vec![text("inside")]),
            op("ET", vec![]),
            op("Q", vec![]),
            op("BT", vec![]),
            op("Td", vec![int(100), int(700)]),
            op("Tj", vec![text("outside")]),
            op("ET", vec![]),
        ];
        assert_eq!(
            positions(&walk(&ops)),
            vec![("inside", 100.0, 650.0), ("outside", 100.0, 700.0)]
        );
    }

    #[test]
    fn test_utf16_bom_fallback() {
        let doc = Document::with_version("1.5");
        let fonts = BTreeMap::new();
        let operand = Object::String(
            vec![0xFE, 0xFF, 0x00, 0x50, 0x00, 0xE1, 0x00, 0x67],
            lopdf::StringFormat::Hexadecimal,
        );
        assert_eq!(
            decode_operand(&operand, &doc, &fonts, "F1").as_deref(),
            Some("Pág")
        );
    }

    #[test]
    fn test_latin1_fallback() {
        let doc = Document::with_version("1.5");
        let fonts = BTreeMap::new();
        let operand = Object::String(vec![b'D', 0xE9, b'b'], lopdf::StringFormat::Literal);
        assert_eq!(
            decode_operand(&operand, &doc, &fonts, "F1").as_deref(),
            Some("Déb")
        );
    }

    #[test]
    fn test_encrypted_document_rejected() {
        let mut doc = Document::with_version("1.5");
        doc.trailer.set("Encrypt", lopdf::dictionary! { "Filter" => "Standard" });
        assert!(matches!(
            extract_fragments_from_doc(&doc),
            Err(PdfError::Encrypted)
        ));
    }

    #[test]
    fn test_garbage_bytes_fail_to_parse() {
        assert!(extract_fragments_mem(b"not a pdf at all").is_err());
    }
}
