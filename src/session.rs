//! Extraction/export pipeline as an explicit state machine
//!
//! A [`Session`] owns everything one document needs: the decoder, the
//! encoder, the style registry, the extracted tables and the observers that
//! get told about transitions. Nothing is global, so sessions are
//! independent of each other.
//!
//! ```text
//! Idle -> Extracting -> (Idle on failure | Previewing)
//! Previewing -> Exporting -> (ExportFailed | ExportSucceeded) -> Previewing
//! any -> Idle on reset
//! ```

use crate::export::{build_workbook, xlsx_file_name, ExportError, ExportOptions};
use crate::extractor::{FragmentSource, LopdfSource};
use crate::styles::StyleRegistry;
use crate::tables::{aggregate_pages, TableCollection, TablePreview};
use crate::xlsx::{WorkbookEncoder, XlsxEncoder};
use crate::PdfError;
use std::fmt;

/// MIME type accepted as a PDF
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Observable pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Extracting,
    Previewing,
    Exporting,
    ExportFailed,
    ExportSucceeded,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PipelineState::Idle => "idle",
            PipelineState::Extracting => "extracting",
            PipelineState::Previewing => "previewing",
            PipelineState::Exporting => "exporting",
            PipelineState::ExportFailed => "export failed",
            PipelineState::ExportSucceeded => "export succeeded",
        };
        f.write_str(label)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("not a PDF file: {0}")]
    InputType(String),
    #[error("PDF extraction failed: {0}")]
    Extraction(#[from] PdfError),
    #[error("no tables found in the PDF")]
    EmptyResult,
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: PipelineState,
    },
    #[error("table index {index} out of range ({count} tables)")]
    TableIndex { index: usize, count: usize },
}

/// Notification sent to observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    StateChanged {
        from: PipelineState,
        to: PipelineState,
    },
    /// Extraction produced tables; names in collection order
    TablesReady { names: Vec<String> },
    ExportReady { file_name: String },
    /// A user-facing failure message, one per failed operation
    Failed { message: String },
}

/// Receives pipeline notifications. The core never drives presentation
/// directly; UIs subscribe here instead.
pub trait PipelineObserver {
    fn on_event(&self, event: &PipelineEvent);
}

/// A caller-supplied document
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub file_name: String,
    /// Declared MIME type, if the caller knows one
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl DocumentInput {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: None,
            bytes,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// PDF by declared type or by a case-insensitive `.pdf` suffix
    pub fn is_pdf(&self) -> bool {
        self.mime_type.as_deref() == Some(PDF_MIME_TYPE)
            || self.file_name.to_lowercase().ends_with(".pdf")
    }
}

/// What the session remembers about the loaded document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub file_name: String,
    pub size: u64,
}

impl DocumentInfo {
    pub fn size_label(&self) -> String {
        format_file_size(self.size)
    }
}

/// Output of a successful export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub sheet_names: Vec<String>,
    pub bytes: Vec<u8>,
}

/// One document's pipeline.
pub struct Session {
    source: Box<dyn FragmentSource>,
    encoder: Box<dyn WorkbookEncoder>,
    styles: StyleRegistry,
    observers: Vec<Box<dyn PipelineObserver>>,
    state: PipelineState,
    document: Option<DocumentInfo>,
    tables: Option<TableCollection>,
    selected: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Session on lopdf and rust_xlsxwriter with the built-in presets
    pub fn new() -> Self {
        Self {
            source: Box::new(LopdfSource),
            encoder: Box::new(XlsxEncoder),
            styles: StyleRegistry::default(),
            observers: Vec::new(),
            state: PipelineState::Idle,
            document: None,
            tables: None,
            selected: 0,
        }
    }

    pub fn with_source(mut self, source: impl FragmentSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    pub fn with_encoder(mut self, encoder: impl WorkbookEncoder + 'static) -> Self {
        self.encoder = Box::new(encoder);
        self
    }

    pub fn with_styles(mut self, styles: StyleRegistry) -> Self {
        self.styles = styles;
        self
    }

    pub fn subscribe(&mut self, observer: impl PipelineObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn document(&self) -> Option<&DocumentInfo> {
        self.document.as_ref()
    }

    pub fn tables(&self) -> Option<&TableCollection> {
        self.tables.as_ref()
    }

    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    /// Index of the table currently selected for preview
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Extract tables from a document. Only allowed from `Idle`.
    ///
    /// A non-PDF input is rejected without any state change. Decode failures
    /// and documents without tables return the session to `Idle`.
    pub fn load(&mut self, input: DocumentInput) -> Result<&TableCollection, PipelineError> {
        self.require(PipelineState::Idle, "load a document")?;

        if !input.is_pdf() {
            log::warn!("rejected non-PDF input {:?}", input.file_name);
            return Err(self.fail(PipelineError::InputType(input.file_name)));
        }

        self.document = Some(DocumentInfo {
            file_name: input.file_name.clone(),
            size: input.bytes.len() as u64,
        });
        self.transition(PipelineState::Extracting);

        let pages = match self.source.extract_pages(&input.bytes) {
            Ok(pages) => pages,
            Err(e) => {
                self.reset();
                return Err(self.fail(PipelineError::Extraction(e)));
            }
        };

        let collection = aggregate_pages(&pages);
        log::info!(
            "{}: {} pages, {} tables ({})",
            input.file_name,
            pages.len(),
            collection.len(),
            self.source.backend_name()
        );

        if collection.is_empty() {
            self.reset();
            return Err(self.fail(PipelineError::EmptyResult));
        }

        let names = collection.names();
        self.selected = 0;
        self.transition(PipelineState::Previewing);
        self.notify(&PipelineEvent::TablesReady { names });

        Ok(self.tables.insert(collection))
    }

    /// Select a table for preview. Re-entrant; the state stays `Previewing`.
    pub fn select(&mut self, index: usize) -> Result<TablePreview, PipelineError> {
        self.require(PipelineState::Previewing, "select a table")?;
        let tables = self.collection()?;
        let preview = tables
            .get(index)
            .map(|table| table.preview())
            .ok_or(PipelineError::TableIndex {
                index,
                count: tables.len(),
            })?;
        self.selected = index;
        Ok(preview)
    }

    /// Preview of the currently selected table
    pub fn preview(&self) -> Option<TablePreview> {
        self.tables
            .as_ref()
            .and_then(|tables| tables.get(self.selected))
            .map(|table| table.preview())
    }

    /// Export every table to one workbook. Only allowed from `Previewing`.
    ///
    /// Whatever the outcome, the session settles back in `Previewing` with
    /// its tables intact, so the caller may retry.
    pub fn export(&mut self, options: &ExportOptions) -> Result<ExportArtifact, PipelineError> {
        self.require(PipelineState::Previewing, "export")?;
        self.transition(PipelineState::Exporting);

        match self.run_export(options) {
            Ok(artifact) => {
                self.transition(PipelineState::ExportSucceeded);
                self.notify(&PipelineEvent::ExportReady {
                    file_name: artifact.file_name.clone(),
                });
                self.transition(PipelineState::Previewing);
                Ok(artifact)
            }
            Err(e) => {
                self.transition(PipelineState::ExportFailed);
                let err = self.fail(PipelineError::Export(e));
                self.transition(PipelineState::Previewing);
                Err(err)
            }
        }
    }

    fn run_export(&self, options: &ExportOptions) -> Result<ExportArtifact, ExportError> {
        let tables = self.tables.as_ref().ok_or(ExportError::EmptyResult)?;
        let workbook = build_workbook(tables, options, &self.styles)?;
        let bytes = self.encoder.encode(&workbook)?;

        let source_name = self
            .document
            .as_ref()
            .map_or("tables.pdf", |doc| doc.file_name.as_str());
        let file_name = output_file_name(source_name, self.encoder.extension());

        Ok(ExportArtifact {
            file_name,
            sheet_names: workbook.sheets.into_iter().map(|s| s.name).collect(),
            bytes,
        })
    }

    /// Discard the document and its tables; back to `Idle`.
    pub fn reset(&mut self) {
        self.document = None;
        self.tables = None;
        self.selected = 0;
        self.transition(PipelineState::Idle);
    }

    fn collection(&self) -> Result<&TableCollection, PipelineError> {
        self.tables.as_ref().ok_or(PipelineError::InvalidTransition {
            action: "read tables",
            state: self.state,
        })
    }

    fn require(&self, expected: PipelineState, action: &'static str) -> Result<(), PipelineError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(PipelineError::InvalidTransition {
                action,
                state: self.state,
            })
        }
    }

    fn transition(&mut self, to: PipelineState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        log::info!("pipeline: {} -> {}", from, to);
        self.notify(&PipelineEvent::StateChanged { from, to });
    }

    /// Report a failure to observers and hand the error back
    fn fail(&self, error: PipelineError) -> PipelineError {
        self.notify(&PipelineEvent::Failed {
            message: error.to_string(),
        });
        error
    }

    fn notify(&self, event: &PipelineEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}

fn output_file_name(source_name: &str, extension: &str) -> String {
    if extension == "xlsx" {
        return xlsx_file_name(source_name);
    }
    let stem = source_name
        .rsplit_once('.')
        .map_or(source_name, |(stem, _)| stem);
    format!("{stem}.{extension}")
}

/// Human-readable size: `0 Bytes`, `512 Bytes`, `1.5 KB`, `2 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
