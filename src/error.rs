//! Error types for the edgequake-json-extract library.
//!
//! Extraction itself never fails (see [`crate::pipeline::extract`]). Errors
//! appear only once a caller *decodes* the extracted candidate or talks to an
//! LLM provider:
//!
//! * [`ExtractError`]: the typed failure returned by decoding and generation
//!   entry points. Decode-related variants are retryable with a stricter
//!   prompt; provider and configuration variants are not.
//!
//! * [`ErrorPayload`]: the serialisable, user-facing form of an
//!   [`ExtractError`]. Handlers return it instead of propagating the error so
//!   end users see a message (and the raw generator text) rather than a
//!   stack trace.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-json-extract library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Decode errors ─────────────────────────────────────────────────────
    /// The generator response contained nothing that looks like JSON.
    #[error("The AI service did not return any JSON content.")]
    NotFound { raw: String },

    /// A candidate was isolated but is still not valid JSON.
    #[error("The AI service returned malformed JSON at line {line}, column {column}: {message}")]
    Malformed {
        line: usize,
        column: usize,
        message: String,
        candidate: String,
        raw: String,
    },

    /// Valid JSON that does not match the expected material schema.
    #[error("The AI service returned an invalid {kind}: {message}")]
    Schema {
        kind: String,
        message: String,
        raw: String,
    },

    // ── Input errors ──────────────────────────────────────────────────────
    /// The document text is empty after trimming.
    #[error("No content provided.")]
    EmptyInput,

    /// The document is not a PDF, DOCX or plain-text file.
    #[error("Unsupported file type '{path}'. Use PDF, DOCX, or TXT.")]
    UnsupportedFileType { path: PathBuf },

    /// The document could not be read from disk.
    #[error("Failed to read input file '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document was parsed but yielded no text, or could not be parsed.
    #[error("Could not extract text from the document. ('{path}': {detail})")]
    NoExtractableText { path: PathBuf, detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API failed after all transport retries.
    #[error("LLM API error after {retries} retries: {message}")]
    LlmApiError { retries: u32, message: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExtractError {
    /// Whether a second generation attempt with a stricter prompt may help.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExtractError::NotFound { .. }
                | ExtractError::Malformed { .. }
                | ExtractError::Schema { .. }
        )
    }

    /// Short machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            ExtractError::NotFound { .. } => "not_found",
            ExtractError::Malformed { .. } => "malformed",
            ExtractError::Schema { .. } => "schema",
            ExtractError::EmptyInput => "empty_input",
            ExtractError::UnsupportedFileType { .. } => "unsupported_file_type",
            ExtractError::InputReadFailed { .. } => "input_read_failed",
            ExtractError::NoExtractableText { .. } => "no_extractable_text",
            ExtractError::ProviderNotConfigured { .. } => "provider_not_configured",
            ExtractError::LlmApiError { .. } => "llm_api_error",
            ExtractError::OutputWriteFailed { .. } => "output_write_failed",
            ExtractError::InvalidConfig(_) => "invalid_config",
            ExtractError::Internal(_) => "internal",
        }
    }

    /// The unparsed generator text, when the error came from decoding.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            ExtractError::NotFound { raw }
            | ExtractError::Malformed { raw, .. }
            | ExtractError::Schema { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Convert into the user-facing payload.
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            error: self.to_string(),
            kind: self.code().to_string(),
            raw_response: self.raw_response().map(str::to_string),
        }
    }
}

/// Typed error body returned to end users in place of a stack trace.
///
/// Serialises as `{"error": "...", "kind": "malformed", "raw_response": "..."}`;
/// `raw_response` is omitted when there is no generator text to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl From<ExtractError> for ErrorPayload {
    fn from(e: ExtractError) -> Self {
        e.to_payload()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_display() {
        let e = ExtractError::Malformed {
            line: 3,
            column: 14,
            message: "expected value".into(),
            candidate: "{".into(),
            raw: "{".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("line 3"), "got: {msg}");
        assert!(msg.contains("column 14"), "got: {msg}");
    }

    #[test]
    fn decode_errors_are_retryable() {
        assert!(ExtractError::NotFound { raw: String::new() }.is_retryable());
        assert!(ExtractError::Schema {
            kind: "quiz".into(),
            message: "no questions".into(),
            raw: "{}".into(),
        }
        .is_retryable());
    }

    #[test]
    fn provider_errors_are_not_retryable() {
        let e = ExtractError::LlmApiError {
            retries: 3,
            message: "503".into(),
        };
        assert!(!e.is_retryable());
        assert!(!ExtractError::EmptyInput.is_retryable());
    }

    #[test]
    fn payload_carries_raw_response() {
        let e = ExtractError::NotFound {
            raw: "sorry, I can't".into(),
        };
        let payload = e.to_payload();
        assert_eq!(payload.kind, "not_found");
        assert_eq!(payload.raw_response.as_deref(), Some("sorry, I can't"));
    }

    #[test]
    fn document_errors_have_codes_and_are_not_retryable() {
        let e = ExtractError::UnsupportedFileType {
            path: "slides.pptx".into(),
        };
        assert_eq!(e.code(), "unsupported_file_type");
        assert!(!e.is_retryable());
        assert!(e.to_payload().raw_response.is_none());

        let e = ExtractError::NoExtractableText {
            path: "scan.pdf".into(),
            detail: "document contains no text".into(),
        };
        assert_eq!(e.code(), "no_extractable_text");
        assert!(e.to_string().starts_with("Could not extract text from the document."));
    }

    #[test]
    fn payload_omits_missing_raw_response() {
        let payload: ErrorPayload = ExtractError::EmptyInput.into();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["error"], "No content provided.");
        assert!(json.get("raw_response").is_none());
    }
}
