//! Rendering and writing decoded JSON.

use crate::error::ExtractError;
use serde::Serialize;
use std::path::Path;

/// Serialise `value` as compact or pretty JSON.
pub fn render_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String, ExtractError> {
    let out = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    out.map_err(|e| ExtractError::Internal(format!("serialise: {e}")))
}

/// Write `contents` to `path` atomically (temp file + rename).
///
/// Parent directories are created as needed. A crash mid-write leaves at most
/// a stray `*.tmp` file, never a truncated output.
pub async fn write_atomic(path: impl AsRef<Path>, contents: &str) -> Result<(), ExtractError> {
    let path = path.as_ref();
    let write_err = |e: std::io::Error| ExtractError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, contents).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_compact_and_pretty() {
        let v = json!({"a": [1, 2]});
        assert_eq!(render_json(&v, false).unwrap(), r#"{"a":[1,2]}"#);
        assert!(render_json(&v, true).unwrap().contains("\n  \"a\""));
    }

    #[tokio::test]
    async fn write_atomic_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/map.json");
        write_atomic(&path, "{}").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
        assert!(!path.with_extension("tmp").exists());
    }
}
