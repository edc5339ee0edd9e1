//! Document text loading: PDF, DOCX and plain-text files to prompt-ready text.
//!
//! The format is chosen from the file extension. Pages and paragraphs are
//! joined with newlines; no layout is preserved.
//!
//! ## PDF engine
//!
//! PDF text comes from the pdfium library through `pdfium-render`. The
//! library is bound at call time: `PDFIUM_LIB_PATH` (when set) names the
//! shared library, otherwise the system library is used. A missing engine
//! surfaces as [`ExtractError::NoExtractableText`], not a crash.
//!
//! pdfium and the DOCX reader are CPU-bound, so loading runs inside
//! `tokio::task::spawn_blocking`.

use crate::error::ExtractError;
use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Supported input document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Text,
}

impl DocumentFormat {
    /// Detect the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("pdf") => Ok(DocumentFormat::Pdf),
            Some("docx") => Ok(DocumentFormat::Docx),
            Some("txt" | "text" | "md" | "markdown") => Ok(DocumentFormat::Text),
            _ => Err(ExtractError::UnsupportedFileType {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Load a document from disk and return its text.
///
/// # Errors
/// * [`ExtractError::UnsupportedFileType`] for anything but PDF, DOCX or text
/// * [`ExtractError::InputReadFailed`] when the file cannot be read
/// * [`ExtractError::NoExtractableText`] when parsing fails or yields only
///   whitespace (e.g. a scanned PDF without a text layer)
pub async fn load_document(path: impl AsRef<Path>) -> Result<String, ExtractError> {
    let path = path.as_ref();
    let format = DocumentFormat::from_path(path)?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ExtractError::InputReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
    document_text(format, path, bytes).await
}

/// Extract text from an in-memory document, e.g. an uploaded file.
///
/// `name` only labels errors and log lines.
pub async fn document_text(
    format: DocumentFormat,
    name: impl AsRef<Path>,
    bytes: Vec<u8>,
) -> Result<String, ExtractError> {
    let name = name.as_ref();

    let text = tokio::task::spawn_blocking(move || match format {
        DocumentFormat::Pdf => pdf_text(&bytes),
        DocumentFormat::Docx => docx_text(&bytes),
        DocumentFormat::Text => Ok(String::from_utf8_lossy(&bytes).into_owned()),
    })
    .await
    .map_err(|e| ExtractError::Internal(format!("Document task panicked: {}", e)))?
    .map_err(|detail| no_text(name, detail))?;

    if text.trim().is_empty() {
        return Err(no_text(name, "document contains no text".to_string()));
    }
    info!("Loaded {:?} ({:?}): {} chars", name, format, text.chars().count());
    Ok(text)
}

fn no_text(path: &Path, detail: String) -> ExtractError {
    ExtractError::NoExtractableText {
        path: PathBuf::from(path),
        detail,
    }
}

// ── PDF ──────────────────────────────────────────────────────────────────────

fn bind_pdfium() -> Result<Pdfium, String> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(lib) if !lib.is_empty() => Pdfium::bind_to_library(Path::new(&lib)),
        _ => Pdfium::bind_to_system_library(),
    };
    bindings
        .map(Pdfium::new)
        .map_err(|e| format!("PDF engine unavailable: {}", e))
}

fn pdf_text(bytes: &[u8]) -> Result<String, String> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| format!("cannot open PDF: {}", e))?;

    let mut pages = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| format!("page {}: {}", idx + 1, e))?;
        pages.push(text.all());
    }
    debug!("PDF text layer read from {} pages", pages.len());
    Ok(pages.join("\n"))
}

// ── DOCX ─────────────────────────────────────────────────────────────────────

fn docx_text(bytes: &[u8]) -> Result<String, String> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| format!("cannot open DOCX: {}", e))?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(para) => Some(
                para.children
                    .iter()
                    .filter_map(|pc| match pc {
                        ParagraphChild::Run(run) => Some(run_text(&run.children)),
                        _ => None,
                    })
                    .collect::<String>(),
            ),
            _ => None,
        })
        .collect();

    debug!("DOCX read: {} paragraphs", paragraphs.len());
    Ok(paragraphs.join("\n"))
}

fn run_text(children: &[RunChild]) -> String {
    children
        .iter()
        .filter_map(|rc| match rc {
            RunChild::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
        .collect()
}
