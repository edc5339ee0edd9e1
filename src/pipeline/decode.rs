//! Strict decoding of extracted candidates.
//!
//! [`crate::pipeline::extract`] is lenient and never fails; this module is
//! where failure is detected. Keeping the two apart means a decode error
//! always means "still not valid JSON" (or "valid JSON of the wrong shape"),
//! never "the extractor gave up".
//!
//! Failures are classified so callers can choose a policy:
//!
//! | Variant | Meaning |
//! |---------|---------|
//! | [`ExtractError::NotFound`]  | nothing JSON-looking in the response |
//! | [`ExtractError::Malformed`] | a candidate was isolated but `serde_json` rejects it |
//! | [`ExtractError::Schema`]    | valid JSON, wrong shape or failed [`Material::validate`] |

use crate::config::MaterialKind;
use crate::error::ExtractError;
use crate::materials::{Dialogue, Infographic, Material, MindMap, Quiz, Summary};
use crate::pipeline::extract::{extract_json, locate_root};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Extract and decode into an untyped JSON value.
pub fn decode_value(raw: &str) -> Result<Value, ExtractError> {
    decode(raw)
}

/// Extract and decode into `T`.
///
/// Shape mismatches are reported as [`ExtractError::Schema`] with the short
/// type name of `T` as the kind.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, ExtractError> {
    let candidate = extract_json(raw);
    if candidate.is_empty() || locate_root(&candidate).is_none() {
        debug!("no JSON found in {} bytes of response", raw.len());
        return Err(ExtractError::NotFound {
            raw: raw.to_string(),
        });
    }

    serde_json::from_str::<T>(&candidate)
        .map_err(|e| classify(e, candidate, raw, short_type_name::<T>()))
}

/// Extract, decode and validate a learning material.
///
/// When the located root is the wrong kind (an object where a podcast
/// script's array belongs, say) the Schema message says so first.
pub fn decode_material<M: Material>(raw: &str) -> Result<M, ExtractError> {
    let material: M = decode(raw).map_err(|e| match e {
        ExtractError::Schema { message, raw, .. } => {
            let expected = M::KIND.root_kind();
            let message = match locate_root(&extract_json(&raw)) {
                Some((_, found)) if found != expected => {
                    format!("expected an {expected} at the root, found an {found}: {message}")
                }
                _ => message,
            };
            ExtractError::Schema {
                kind: M::KIND.to_string(),
                message,
                raw,
            }
        }
        other => other,
    })?;

    material.validate().map_err(|message| {
        warn!("{} failed validation: {}", M::KIND, message);
        ExtractError::Schema {
            kind: M::KIND.to_string(),
            message,
            raw: raw.to_string(),
        }
    })?;

    Ok(material)
}

/// Decode and validate the material selected at runtime, returning it as JSON.
///
/// Infographics are normalised (stats truncated) before re-serialisation.
pub fn decode_kind(kind: MaterialKind, raw: &str) -> Result<Value, ExtractError> {
    match kind {
        MaterialKind::MindMap => to_value(decode_material::<MindMap>(raw)?),
        MaterialKind::Quiz => to_value(decode_material::<Quiz>(raw)?),
        MaterialKind::Summary => to_value(decode_material::<Summary>(raw)?),
        MaterialKind::Infographic => to_value(decode_material::<Infographic>(raw)?.normalized()),
        MaterialKind::Podcast => to_value(decode_material::<Dialogue>(raw)?),
    }
}

pub(crate) fn to_value<M: serde::Serialize>(material: M) -> Result<Value, ExtractError> {
    serde_json::to_value(material).map_err(|e| ExtractError::Internal(format!("re-serialise: {e}")))
}

fn classify(e: serde_json::Error, candidate: String, raw: &str, kind: &str) -> ExtractError {
    use serde_json::error::Category;

    match e.classify() {
        Category::Data => ExtractError::Schema {
            kind: kind.to_string(),
            message: e.to_string(),
            raw: raw.to_string(),
        },
        Category::Syntax | Category::Eof | Category::Io => {
            debug!("candidate rejected at {}:{}: {}", e.line(), e.column(), e);
            ExtractError::Malformed {
                line: e.line(),
                column: e.column(),
                message: e.to_string(),
                candidate,
                raw: raw.to_string(),
            }
        }
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
