//! Configuration types for learning-material generation.
//!
//! Every generation knob lives in [`GenerationConfig`], built via its
//! [`GenerationConfigBuilder`]. Extraction and decoding take no configuration
//! at all; only the LLM round-trip does.

use crate::error::ExtractError;
use crate::pipeline::extract::RootKind;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Configuration for generating a learning material through an LLM.
///
/// # Example
/// ```rust
/// use edgequake_json_extract::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .model("gemini-2.5-flash")
///     .num_questions(10)
///     .build()
///     .unwrap();
/// assert_eq!(config.num_questions, 10);
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// LLM model identifier, e.g. "gemini-2.5-flash", "gpt-4.1-mini".
    /// If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "ollama").
    /// If None along with `provider`, the provider is auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.3.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate. Default: 8192.
    ///
    /// Podcast scripts for long documents run to several thousand tokens;
    /// a low cap truncates the JSON and forces the strict retry.
    pub max_tokens: usize,

    /// Maximum transport retries on a failed LLM call. Default: 3.
    ///
    /// Independent of the single strict retry taken on undecodable output.
    pub max_retries: u32,

    /// Initial transport retry delay in milliseconds (exponential backoff). Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-LLM-call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Retry once with a stricter instruction when the reply does not decode. Default: true.
    pub strict_retry: bool,

    /// Custom system prompt. If None, uses [`crate::prompts::JSON_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Document text beyond this many characters is cut before prompting. Default: 60 000.
    pub max_input_chars: usize,

    /// Quiz flavour requested from the model, e.g. "mcq". Default: "mcq".
    pub quiz_type: String,

    /// Number of quiz questions to request. Range: 1–50. Default: 5.
    pub num_questions: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.3,
            max_tokens: 8192,
            max_retries: 3,
            retry_backoff_ms: 500,
            api_timeout_secs: 120,
            strict_retry: true,
            system_prompt: None,
            max_input_chars: 60_000,
            quiz_type: "mcq".to_string(),
            num_questions: 5,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("strict_retry", &self.strict_retry)
            .field("max_input_chars", &self.max_input_chars)
            .field("quiz_type", &self.quiz_type)
            .field("num_questions", &self.num_questions)
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn strict_retry(mut self, v: bool) -> Self {
        self.config.strict_retry = v;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn max_input_chars(mut self, n: usize) -> Self {
        self.config.max_input_chars = n;
        self
    }

    pub fn quiz_type(mut self, quiz_type: impl Into<String>) -> Self {
        self.config.quiz_type = quiz_type.into();
        self
    }

    pub fn num_questions(mut self, n: usize) -> Self {
        self.config.num_questions = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, ExtractError> {
        let c = &self.config;
        if c.num_questions == 0 || c.num_questions > 50 {
            return Err(ExtractError::InvalidConfig(format!(
                "num_questions must be 1–50, got {}",
                c.num_questions
            )));
        }
        if c.quiz_type.trim().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "quiz_type must not be empty".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(ExtractError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.max_input_chars == 0 {
            return Err(ExtractError::InvalidConfig(
                "max_input_chars must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// The learning materials a document can be turned into.
///
/// | Kind | Root | Shape |
/// |------|------|-------|
/// | `MindMap` | object | `{"root": {"topic", "children": [...]}}` |
/// | `Quiz` | object | `{"quiz_type", "questions": [...]}` |
/// | `Summary` | object | `{"title", "summary", "key_points": [...]}` |
/// | `Infographic` | object | `{"title", "subtitle", "stats", "key_points", "conclusion"}` |
/// | `Podcast` | array | `[{"text", "voice_id"}, ...]` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialKind {
    MindMap,
    Quiz,
    Summary,
    Infographic,
    Podcast,
}

impl MaterialKind {
    /// All kinds, in display order.
    pub const ALL: [MaterialKind; 5] = [
        MaterialKind::MindMap,
        MaterialKind::Quiz,
        MaterialKind::Summary,
        MaterialKind::Infographic,
        MaterialKind::Podcast,
    ];

    /// Root JSON type the model is asked to emit.
    pub fn root_kind(self) -> RootKind {
        match self {
            MaterialKind::Podcast => RootKind::Array,
            _ => RootKind::Object,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MaterialKind::MindMap => "mind map",
            MaterialKind::Quiz => "quiz",
            MaterialKind::Summary => "summary",
            MaterialKind::Infographic => "infographic",
            MaterialKind::Podcast => "podcast script",
        }
    }
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaterialKind {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "mindmap" | "visual" => Ok(MaterialKind::MindMap),
            "quiz" => Ok(MaterialKind::Quiz),
            "summary" => Ok(MaterialKind::Summary),
            "infographic" => Ok(MaterialKind::Infographic),
            "podcast" | "audio" | "dialogue" => Ok(MaterialKind::Podcast),
            other => Err(ExtractError::InvalidConfig(format!(
                "unknown material kind '{other}'"
            ))),
        }
    }
}
