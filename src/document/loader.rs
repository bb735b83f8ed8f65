//! Extension-based text extraction.
//!
//! Plain text and Markdown are decoded as UTF-8.  Word documents go through
//! `docx-rs` and PDFs through `pdf-extract`; a PDF whose text layer is empty
//! is reported as a scan rather than loaded as a blank transcript.

use std::path::Path;

use thiserror::Error;

/// Extensions accepted by the loader, in display order.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["txt", "md", "docx", "pdf"];

// ---------------------------------------------------------------------------
// DocumentError
// ---------------------------------------------------------------------------

/// Errors raised while turning an uploaded file into text.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The extension is not one of [`SUPPORTED_EXTENSIONS`].
    #[error("unsupported file format {extension:?}; please upload a .txt, .md, .docx or .pdf file")]
    UnsupportedFormat { extension: String },

    /// The file is corrupt, encrypted, or has no extractable text.
    #[error("could not extract text: {0}")]
    ExtractionFailed(String),

    /// The file could not be read from disk.
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// DocumentFormat
// ---------------------------------------------------------------------------

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Markdown,
    Docx,
    Pdf,
}

impl DocumentFormat {
    /// Detect the format from a file name (case-insensitive extension).
    ///
    /// ```
    /// use transcript_purifier::document::DocumentFormat;
    ///
    /// assert_eq!(DocumentFormat::from_file_name("notes.PDF").unwrap(), DocumentFormat::Pdf);
    /// assert!(DocumentFormat::from_file_name("table.csv").is_err());
    /// ```
    pub fn from_file_name(name: &str) -> Result<Self, DocumentError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "txt" => Ok(Self::PlainText),
            "md" => Ok(Self::Markdown),
            "docx" => Ok(Self::Docx),
            "pdf" => Ok(Self::Pdf),
            _ => Err(DocumentError::UnsupportedFormat { extension }),
        }
    }
}

// ---------------------------------------------------------------------------
// LoadedDocument
// ---------------------------------------------------------------------------

/// A transcript ready for review.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub text: String,
    pub display_name: String,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Load a transcript from disk.
///
/// The format is checked before the file is read, so an unsupported file is
/// rejected without touching the filesystem.
pub fn load_path(path: &Path) -> Result<LoadedDocument, DocumentError> {
    let display_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    DocumentFormat::from_file_name(&display_name)?;

    let bytes = std::fs::read(path)?;
    load_bytes(&display_name, &bytes)
}

/// Extract text from an in-memory file, dispatching on the name's extension.
pub fn load_bytes(name: &str, bytes: &[u8]) -> Result<LoadedDocument, DocumentError> {
    let format = DocumentFormat::from_file_name(name)?;

    let text = match format {
        DocumentFormat::PlainText | DocumentFormat::Markdown => read_utf8(bytes)?,
        DocumentFormat::Docx => extract_docx(bytes)?,
        DocumentFormat::Pdf => extract_pdf(bytes)?,
    };

    log::info!(
        "document: loaded {name} as {format:?} ({} chars)",
        text.chars().count()
    );

    Ok(LoadedDocument {
        text,
        display_name: name.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Format handlers
// ---------------------------------------------------------------------------

fn read_utf8(bytes: &[u8]) -> Result<String, DocumentError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| DocumentError::ExtractionFailed(format!("file is not valid UTF-8: {e}")))?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
}

fn extract_docx(bytes: &[u8]) -> Result<String, DocumentError> {
    let doc = docx_rs::read_docx(bytes)
        .map_err(|e| DocumentError::ExtractionFailed(format!("failed to parse DOCX: {e}")))?;

    let mut text = String::new();
    for child in &doc.document.children {
        push_docx_content(child, &mut text);
    }

    log::debug!("document: DOCX body yielded {} bytes of text", text.len());
    Ok(text)
}

/// Append the text of one body element; one line per paragraph or table row.
fn push_docx_content(element: &docx_rs::DocumentChild, output: &mut String) {
    match element {
        docx_rs::DocumentChild::Paragraph(para) => {
            push_paragraph(para, output);
            output.push('\n');
        }
        docx_rs::DocumentChild::Table(table) => {
            for row in &table.rows {
                let docx_rs::TableChild::TableRow(tr) = row;
                let mut cells = Vec::new();
                for cell in &tr.cells {
                    let docx_rs::TableRowChild::TableCell(tc) = cell;
                    let mut cell_text = String::new();
                    for content in &tc.children {
                        if let docx_rs::TableCellContent::Paragraph(para) = content {
                            push_paragraph(para, &mut cell_text);
                        }
                    }
                    cells.push(cell_text);
                }
                output.push_str(&cells.join(" | "));
                output.push('\n');
            }
        }
        _ => {}
    }
}

fn push_paragraph(para: &docx_rs::Paragraph, output: &mut String) {
    for child in &para.children {
        match child {
            docx_rs::ParagraphChild::Run(run) => push_run(run, output),
            docx_rs::ParagraphChild::Hyperlink(link) => {
                for inner in &link.children {
                    if let docx_rs::ParagraphChild::Run(run) = inner {
                        push_run(run, output);
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_run(run: &docx_rs::Run, output: &mut String) {
    for run_child in &run.children {
        if let docx_rs::RunChild::Text(text) = run_child {
            output.push_str(&text.text);
        }
    }
}

/// Extract the PDF text layer.
///
/// `pdf-extract` can panic on malformed fonts, so the call runs under
/// `catch_unwind` and a panic is reported as an extraction failure.
fn extract_pdf(bytes: &[u8]) -> Result<String, DocumentError> {
    let text = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    })) {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            log::warn!("document: PDF extraction failed: {e}");
            return Err(DocumentError::ExtractionFailed(format!(
                "cannot read PDF content; make sure the file is not encrypted or damaged ({e})"
            )));
        }
        Err(_) => {
            log::error!("document: PDF extraction panicked, likely a malformed font");
            return Err(DocumentError::ExtractionFailed(
                "cannot read PDF content; the file appears to be damaged".into(),
            ));
        }
    };

    require_text_layer(text)
}

/// Reject whitespace-only output: the PDF is a scan without a text layer.
fn require_text_layer(text: String) -> Result<String, DocumentError> {
    if text.trim().is_empty() {
        return Err(DocumentError::ExtractionFailed(
            "the PDF looks like a scanned image and contains no recognisable text".into(),
        ));
    }
    Ok(text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
