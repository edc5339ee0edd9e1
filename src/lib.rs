//! # edgequake-json-extract
//!
//! Pull one JSON value out of noisy LLM output, then decode it into a typed
//! learning material (mind map, quiz, summary, infographic, podcast script).
//!
//! ## Why this crate?
//!
//! Generators asked for "only raw JSON" still answer with markdown fences,
//! a sentence of prose, trailing commas, or a response cut off at the token
//! limit. [`extract_json`] is a lenient, infallible text transform that
//! isolates the most likely JSON value; decoding is done separately and
//! strictly, so a decode error always means the text is still not valid JSON.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document (PDF / DOCX / TXT) → text
//!  │
//!  ├─ 1. Prompt   per-material prompt (mind map, quiz, summary, …)
//!  ├─ 2. LLM      provider call with transport retry/backoff
//!  ├─ 3. Extract  fences → root → depth scan → trailing commas
//!  ├─ 4. Decode   serde_json + schema validation
//!  └─ 5. Retry    exactly one strict re-prompt on NotFound/Malformed/Schema
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use edgequake_json_extract::{decode_material, extract_json, Quiz};
//!
//! let raw = "Sure! ```json\n{\"quiz_type\": \"mcq\", \"questions\": [\
//!            {\"question\": \"2+2?\", \"options\": [\"3\", \"4\"], \"answer\": \"4\"},]}\n```";
//! assert!(extract_json(raw).starts_with('{'));
//!
//! let quiz: Quiz = decode_material(raw).unwrap();
//! assert_eq!(quiz.questions.len(), 1);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `json-extract` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod generate;
pub mod materials;
pub mod output;
pub mod pipeline;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationConfig, GenerationConfigBuilder, MaterialKind};
pub use document::{document_text, load_document, DocumentFormat};
pub use error::{ErrorPayload, ExtractError};
pub use generate::{generate, generate_value, generate_value_with, resolve_provider};
pub use materials::{
    Dialogue, DialogueLine, Infographic, KeyPoint, Material, MindMap, MindMapNode, Quiz,
    QuizQuestion, Stat, Summary,
};
pub use output::{render_json, write_atomic};
pub use pipeline::decode::{decode, decode_kind, decode_material, decode_value};
pub use pipeline::extract::{
    extract_json, extract_json_opt, locate_root, repair_trailing_commas, RootKind,
};
pub use pipeline::llm::{
    generate_material, generate_or_payload, generate_podcast, ProviderGenerator, TextGenerator,
};
