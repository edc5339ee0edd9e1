//! Config-driven generation entry points.
//!
//! [`crate::pipeline::llm`] works against any [`TextGenerator`]; this module
//! resolves a real provider from [`GenerationConfig`] (or the environment)
//! and wires it in. Use these functions from request handlers and the CLI;
//! use the `pipeline::llm` functions directly when injecting a generator.

use crate::config::{GenerationConfig, MaterialKind};
use crate::error::ExtractError;
use crate::materials::{Infographic, Material, MindMap, Quiz, Summary};
use crate::pipeline::decode::to_value;
use crate::pipeline::llm::{self, ProviderGenerator, TextGenerator};
use edgequake_llm::{LLMProvider, ProviderFactory};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Default model when a provider is named without one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Generate a material of type `M` using the provider resolved from `config`.
///
/// # Example
/// ```rust,no_run
/// use edgequake_json_extract::{generate, GenerationConfig, MindMap};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = GenerationConfig::default();
/// let map: MindMap = generate("Mitochondria produce ATP ...", &config).await?;
/// println!("{}", map.root.topic);
/// # Ok(())
/// # }
/// ```
pub async fn generate<M: Material>(
    document_text: &str,
    config: &GenerationConfig,
) -> Result<M, ExtractError> {
    let generator = ProviderGenerator::new(resolve_provider(config)?, config);
    llm::generate_material(&generator, document_text, config).await
}

/// Generate the material selected at runtime and return it as JSON.
///
/// Podcast scripts need voice ids; `voices` must be `Some((host, guest))`
/// for [`MaterialKind::Podcast`] and is ignored otherwise.
pub async fn generate_value(
    kind: MaterialKind,
    document_text: &str,
    voices: Option<(&str, &str)>,
    config: &GenerationConfig,
) -> Result<Value, ExtractError> {
    let generator = ProviderGenerator::new(resolve_provider(config)?, config);
    generate_value_with(&generator, kind, document_text, voices, config).await
}

/// [`generate_value`] with an injected generator.
pub async fn generate_value_with<G: TextGenerator>(
    generator: &G,
    kind: MaterialKind,
    document_text: &str,
    voices: Option<(&str, &str)>,
    config: &GenerationConfig,
) -> Result<Value, ExtractError> {
    let start = Instant::now();
    let value = match kind {
        MaterialKind::MindMap => {
            to_value(llm::generate_material::<MindMap, _>(generator, document_text, config).await?)
        }
        MaterialKind::Quiz => {
            to_value(llm::generate_material::<Quiz, _>(generator, document_text, config).await?)
        }
        MaterialKind::Summary => {
            to_value(llm::generate_material::<Summary, _>(generator, document_text, config).await?)
        }
        MaterialKind::Infographic => to_value(
            llm::generate_material::<Infographic, _>(generator, document_text, config)
                .await?
                .normalized(),
        ),
        MaterialKind::Podcast => {
            let (host, guest) = voices.ok_or_else(|| {
                ExtractError::InvalidConfig(
                    "podcast generation needs --host-voice and --guest-voice".into(),
                )
            })?;
            to_value(llm::generate_podcast(generator, document_text, host, guest, config).await?)
        }
    }?;
    info!("Generated {} in {}ms", kind, start.elapsed().as_millis());
    Ok(value)
}

// ── Provider resolution ──────────────────────────────────────────────────

fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ExtractError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ExtractError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`, `config.model`).
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_provider(config: &GenerationConfig) -> Result<Arc<dyn LLMProvider>, ExtractError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ExtractError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
