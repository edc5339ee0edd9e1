//! Pipeline stages from raw LLM text to a validated learning material.
//!
//! ## Data Flow
//!
//! ```text
//! llm ──▶ extract ──▶ decode ──▶ (strict retry via llm on failure)
//! (raw)   (candidate) (typed)
//! ```
//!
//! 1. [`llm`]:     prompt the provider with transport retry/backoff; drives
//!    the one strict retry when decoding fails
//! 2. [`extract`]: lenient, infallible isolation of the JSON value
//! 3. [`decode`]:  strict `serde_json` decoding, schema validation and
//!    failure classification

pub mod decode;
pub mod extract;
pub mod llm;
