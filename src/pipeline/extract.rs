//! Resilient JSON extraction: isolate one JSON value from noisy LLM output.
//!
//! ## Why is extraction necessary?
//!
//! Even when the prompt says "return only raw JSON", generators regularly
//! wrap their answer in noise:
//!
//! - A ` ```json ... ``` ` fence, sometimes without the closing marker when
//!   the response was cut off at the token limit
//! - A sentence of prose before the value ("Here is the result:") and a
//!   sign-off after it ("Let me know!")
//! - A dangling comma before the final `]` or `}`
//!
//! This module applies a fixed sequence of cheap, deterministic steps that
//! turn such a response into a candidate string for a strict JSON decoder.
//! It never fails: the worst case is an empty string or the trimmed input.
//! Decoding, and therefore failure detection, is left to
//! [`crate::pipeline::decode`].
//!
//! ## Step Order
//!
//! Fences are stripped before the root is located so a language tag or prose
//! inside the fence line cannot be mistaken for the start of the value. The
//! span is bounded before commas are repaired so trailing commentary (which
//! may legitimately contain `,]`) is never rewritten.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

/// Type of the outermost JSON value being extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// `{ ... }`
    Object,
    /// `[ ... ]`
    Array,
}

impl RootKind {
    /// Opening and closing structural characters for this root type.
    pub fn delimiters(self) -> (char, char) {
        match self {
            RootKind::Object => ('{', '}'),
            RootKind::Array => ('[', ']'),
        }
    }
}

impl std::fmt::Display for RootKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RootKind::Object => write!(f, "object"),
            RootKind::Array => write!(f, "array"),
        }
    }
}

/// Extract the most likely JSON value from a raw generator response.
///
/// Steps (applied in order):
/// 1. Trim; empty input returns `""`
/// 2. Strip a markdown fence (complete or truncated)
/// 3. Locate the root `{` or `[` (whichever comes first)
/// 4. Bound the value by a string-aware depth scan, falling back to the last
///    terminator and finally to end-of-text
/// 5. Remove trailing commas before `]` / `}`
/// 6. Trim
///
/// Text with no `{` or `[` at all is returned trimmed but otherwise verbatim.
///
/// # Example
/// ```rust
/// use edgequake_json_extract::extract_json;
///
/// let raw = "Here is the result:\n```json\n{\"a\": 1, \"b\": [1,2,],}\n```\nLet me know!";
/// assert_eq!(extract_json(raw), r#"{"a": 1, "b": [1,2]}"#);
/// ```
pub fn extract_json(raw: &str) -> String {
    let text = raw.trim();
    if text.is_empty() {
        return String::new();
    }

    let text = strip_fences(text);

    let Some((start, kind)) = locate_root(text) else {
        trace!("no JSON root found in {} bytes", text.len());
        return text.trim().to_string();
    };

    let span = bound_span(text, start, kind);
    repair_trailing_commas(span).trim().to_string()
}

/// [`extract_json`] for an optional input; `None` is treated as empty.
pub fn extract_json_opt(raw: Option<&str>) -> String {
    extract_json(raw.unwrap_or_default())
}

// ── Step 2: Strip markdown fences ────────────────────────────────────────────

static RE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?i:json)?[ \t]*\r?\n?(.*?)```").unwrap());

static RE_OPEN_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^```(?i:json)?").unwrap());

/// Replace the text with the contents of its first fenced block.
///
/// A response that already starts with `{` or `[` is returned untouched, so a
/// fence quoted inside a string value of clean JSON is never unwrapped. When
/// several fences exist, the first one whose body contains a JSON opener wins.
///
/// Only the outermost fence delimiters count. The fence regex is lazy, so a
/// fence quoted inside a string value closes the block early; such a body
/// does not balance, and the block is widened to the last closing marker.
fn strip_fences(text: &str) -> &str {
    if text.starts_with('{') || text.starts_with('[') {
        return text;
    }

    let mut first: Option<&str> = None;
    for caps in RE_FENCE.captures_iter(text) {
        let Some(body) = caps.get(1) else {
            continue;
        };
        let trimmed = body.as_str().trim();
        if !(trimmed.contains('{') || trimmed.contains('[')) {
            first.get_or_insert(trimmed);
            continue;
        }
        if root_balances(trimmed) {
            trace!("using fenced block of {} bytes", trimmed.len());
            return trimmed;
        }
        if let Some(widened) = widen_to_last_fence(text, body.start()) {
            if root_balances(widened) {
                trace!("fence closed inside a value; widened to {} bytes", widened.len());
                return widened;
            }
        }
        trace!("using unbalanced fenced block of {} bytes", trimmed.len());
        return trimmed;
    }

    // Fences that hold no JSON do not hide a value written outside them.
    if let Some(body) = first {
        return if locate_root(text).is_some() { text } else { body };
    }

    // Truncated fence: opening marker but no closing one.
    if let Some(m) = RE_OPEN_FENCE.find(text) {
        trace!("stripping unterminated fence");
        return text[m.end()..].trim_end_matches('`').trim();
    }

    text
}

/// Body from `body_start` up to the last closing fence marker in `text`.
fn widen_to_last_fence(text: &str, body_start: usize) -> Option<&str> {
    let end = text.rfind("```").filter(|&end| end > body_start)?;
    Some(text[body_start..end].trim())
}

fn root_balances(body: &str) -> bool {
    locate_root(body)
        .and_then(|(start, kind)| find_balanced_close(body, start, kind))
        .is_some()
}

// ── Step 3: Locate the root value ────────────────────────────────────────────

/// Find the opening character of the root value and its kind.
///
/// An array wins only when its `[` appears before any `{`.
pub fn locate_root(text: &str) -> Option<(usize, RootKind)> {
    match (text.find('['), text.find('{')) {
        (Some(arr), Some(obj)) if arr < obj => Some((arr, RootKind::Array)),
        (Some(arr), None) => Some((arr, RootKind::Array)),
        (_, Some(obj)) => Some((obj, RootKind::Object)),
        (None, None) => None,
    }
}

// ── Step 4: Bound the span ───────────────────────────────────────────────────

fn bound_span(text: &str, start: usize, kind: RootKind) -> &str {
    if let Some(end) = find_balanced_close(text, start, kind) {
        return &text[start..=end];
    }

    let (_, close) = kind.delimiters();
    match text.rfind(close).filter(|&end| end > start) {
        Some(end) => {
            trace!("depth scan unbalanced; using last '{}' at {}", close, end);
            &text[start..=end]
        }
        None => {
            trace!("no terminator '{}'; keeping tail from {}", close, start);
            &text[start..]
        }
    }
}

/// Scan forward from `start` and return the byte index of the matching close.
///
/// Only the root kind's own delimiters change the depth. Characters inside
/// string literals are skipped, honouring backslash escapes. All structural
/// characters are ASCII, so scanning bytes is safe on UTF-8 input.
fn find_balanced_close(text: &str, start: usize, kind: RootKind) -> Option<usize> {
    let (open, close) = kind.delimiters();
    let (open, close) = (open as u8, close as u8);

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in text.as_bytes()[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        if b == b'"' {
            in_string = true;
        } else if b == open {
            depth += 1;
        } else if b == close {
            // depth >= 1 here: the scan starts on an opener
            depth -= 1;
            if depth == 0 {
                return Some(start + offset);
            }
        }
    }

    None
}

// ── Step 5: Repair trailing commas ───────────────────────────────────────────

/// Remove every comma that is followed (after optional whitespace) by `]` or `}`.
///
/// Commas inside string literals are preserved.
pub fn repair_trailing_commas(span: &str) -> String {
    let bytes = span.as_bytes();
    let mut out = String::with_capacity(span.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in span.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            out.push(ch);
            continue;
        }

        match ch {
            '"' => in_string = true,
            ',' => {
                let next = bytes[i + 1..]
                    .iter()
                    .find(|b| !b.is_ascii_whitespace())
                    .copied();
                if matches!(next, Some(b']') | Some(b'}')) {
                    continue;
                }
            }
            _ => {}
        }
        out.push(ch);
    }

    out
}

// ── Tests ────────────────────────────────────────────────────────────────────
