//! LLM interaction: prompt the model, extract, decode, retry once strictly.
//!
//! ## Two retry loops
//!
//! * **Transport retries** ([`ProviderGenerator`]): HTTP 429 / 503 and
//!   timeouts are transient, so the call is repeated with exponential backoff
//!   (`retry_backoff_ms * 2^attempt`), up to `max_retries` times.
//! * **Strict retry** ([`generate_material`]): when the model *did* answer
//!   but the answer does not decode or validate, the prompt is re-sent once
//!   with [`crate::prompts::STRICT_RETRY_SUFFIX`] and the parser's complaint.
//!   A second failure is returned to the caller as-is.

use crate::config::GenerationConfig;
use crate::error::{ErrorPayload, ExtractError};
use crate::materials::{Dialogue, Material};
use crate::pipeline::decode::decode_material;
use crate::prompts::{self, JSON_SYSTEM_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// Something that turns a (system, user) prompt pair into raw model text.
///
/// [`ProviderGenerator`] is the production implementation; tests substitute
/// a scripted one.
pub trait TextGenerator {
    fn generate(
        &self,
        system: &str,
        user: &str,
    ) -> impl Future<Output = Result<String, ExtractError>> + Send;
}

/// [`TextGenerator`] backed by an `edgequake-llm` provider.
pub struct ProviderGenerator {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
    max_retries: u32,
    retry_backoff_ms: u64,
    api_timeout_secs: u64,
}

impl ProviderGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &GenerationConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
            api_timeout_secs: config.api_timeout_secs,
        }
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

impl TextGenerator for ProviderGenerator {
    async fn generate(&self, system: &str, user: &str) -> Result<String, ExtractError> {
        let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
        let options = self.options();
        let start = Instant::now();
        let mut last_err: Option<String> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!(
                    "LLM retry {}/{} after {}ms",
                    attempt, self.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            let call = self.provider.chat(&messages, Some(&options));
            match timeout(Duration::from_secs(self.api_timeout_secs), call).await {
                Ok(Ok(response)) => {
                    debug!(
                        "{} input tokens, {} output tokens, {:?}",
                        response.prompt_tokens,
                        response.completion_tokens,
                        start.elapsed()
                    );
                    return Ok(response.content);
                }
                Ok(Err(e)) => {
                    let err_msg = format!("{}", e);
                    warn!("LLM attempt {} failed: {}", attempt + 1, err_msg);
                    last_err = Some(err_msg);
                }
                Err(_) => {
                    warn!(
                        "LLM attempt {} timed out after {}s",
                        attempt + 1,
                        self.api_timeout_secs
                    );
                    last_err = Some(format!("timed out after {}s", self.api_timeout_secs));
                }
            }
        }

        Err(ExtractError::LlmApiError {
            retries: self.max_retries,
            message: last_err.unwrap_or_else(|| "Unknown error".to_string()),
        })
    }
}

/// Generate, decode and validate a material of type `M` from document text.
///
/// Makes one call with the material's prompt. If the reply is retryable
/// ([`ExtractError::is_retryable`]) and `config.strict_retry` is set, makes
/// exactly one more call with the strict suffix appended.
pub async fn generate_material<M, G>(
    generator: &G,
    document_text: &str,
    config: &GenerationConfig,
) -> Result<M, ExtractError>
where
    M: Material,
    G: TextGenerator,
{
    let text = prepare_document(document_text, config.max_input_chars)?;
    let prompt = prompts::material_prompt(M::KIND, text, config);
    generate_checked(generator, &prompt, config, |_: &M| Ok(())).await
}

/// Generate a two-speaker podcast script whose lines use only `host` and `guest`.
pub async fn generate_podcast<G: TextGenerator>(
    generator: &G,
    document_text: &str,
    host_voice_id: &str,
    guest_voice_id: &str,
    config: &GenerationConfig,
) -> Result<Dialogue, ExtractError> {
    if host_voice_id.trim().is_empty() || guest_voice_id.trim().is_empty() {
        return Err(ExtractError::InvalidConfig(
            "podcast generation needs both a host and a guest voice id".into(),
        ));
    }
    let text = prepare_document(document_text, config.max_input_chars)?;
    let prompt = prompts::podcast_prompt(text, host_voice_id, guest_voice_id);
    generate_checked(generator, &prompt, config, |d: &Dialogue| {
        d.check_voices(host_voice_id, guest_voice_id)
    })
    .await
}

/// [`generate_material`], with any failure converted to an [`ErrorPayload`].
pub async fn generate_or_payload<M, G>(
    generator: &G,
    document_text: &str,
    config: &GenerationConfig,
) -> Result<M, ErrorPayload>
where
    M: Material,
    G: TextGenerator,
{
    generate_material(generator, document_text, config)
        .await
        .map_err(|e| {
            warn!("{} generation failed: {}", M::KIND, e);
            e.to_payload()
        })
}

async fn generate_checked<M, G, F>(
    generator: &G,
    prompt: &str,
    config: &GenerationConfig,
    check: F,
) -> Result<M, ExtractError>
where
    M: Material,
    G: TextGenerator,
    F: Fn(&M) -> Result<(), String>,
{
    let system = config.system_prompt.as_deref().unwrap_or(JSON_SYSTEM_PROMPT);
    let decode = |raw: &str| -> Result<M, ExtractError> {
        let material = decode_material::<M>(raw)?;
        check(&material).map_err(|message| ExtractError::Schema {
            kind: M::KIND.to_string(),
            message,
            raw: raw.to_string(),
        })?;
        Ok(material)
    };

    let raw = generator.generate(system, prompt).await?;
    debug!("{}: received {} bytes", M::KIND, raw.len());

    match decode(&raw) {
        Ok(material) => Ok(material),
        Err(e) if e.is_retryable() && config.strict_retry => {
            warn!("{}: first reply rejected ({}); retrying strictly", M::KIND, e);
            let strict = prompts::strict_retry_prompt(prompt, &e.to_string());
            let raw = generator.generate(system, &strict).await?;
            let material = decode(&raw)?;
            info!("{}: strict retry succeeded", M::KIND);
            Ok(material)
        }
        Err(e) => Err(e),
    }
}

/// Trim the document and cap it at `max_chars` characters.
pub(crate) fn prepare_document(text: &str, max_chars: usize) -> Result<&str, ExtractError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractError::EmptyInput);
    }
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            debug!("document truncated to {} chars", max_chars);
            Ok(&text[..cut])
        }
        None => Ok(text),
    }
}
