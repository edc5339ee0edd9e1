//! Integration tests for extraction and decoding over realistic model replies.
//!
//! No network access: every input below is a captured-style generator
//! response. Run with:
//!   cargo test --test extract

use edgequake_json_extract::{
    decode_kind, decode_material, decode_value, extract_json, extract_json_opt, Dialogue,
    ExtractError, MaterialKind, MindMap, Quiz, Summary,
};
use serde_json::{json, Value};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Assert `raw` extracts to something that decodes to `expected`.
fn assert_decodes_to(raw: &str, expected: Value, context: &str) {
    let candidate = extract_json(raw);
    let got: Value = serde_json::from_str(&candidate)
        .unwrap_or_else(|e| panic!("[{context}] candidate does not decode ({e}): {candidate}"));
    assert_eq!(got, expected, "[{context}]");
}

// ── Extractor properties ─────────────────────────────────────────────────────

#[test]
fn test_clean_json_roundtrips() {
    let inputs = [
        json!({"root": {"topic": "Cells", "children": [{"topic": "Nucleus"}]}}),
        json!([{"text": "Hi", "voice_id": "a"}, {"text": "Bye", "voice_id": "b"}]),
        json!({"nested": [[1, [2, [3]]], {"k": {"k": {}}}], "s": "}]{["}),
    ];
    for value in inputs {
        let s = serde_json::to_string_pretty(&value).unwrap();
        assert_decodes_to(&s, value.clone(), "clean");
        assert_eq!(extract_json(&extract_json(&s)), extract_json(&s), "idempotence");
    }
}

#[test]
fn test_fenced_block_with_prose() {
    let raw = "Here is the result:\n```json\n{\"a\": 1, \"b\": [1,2,],}\n```\nLet me know!";
    assert_eq!(extract_json(raw), r#"{"a": 1, "b": [1,2]}"#);
    assert_eq!(decode_value(raw).unwrap(), json!({"a": 1, "b": [1, 2]}));
}

#[test]
fn test_dialogue_with_trailing_commentary() {
    let raw = "[{\"text\":\"Hi [there]\",\"voice_id\":\"v1\"},{\"text\":\"Bye\",\"voice_id\":\"v2\"}] -- end of transcript";
    let candidate = extract_json(raw);
    assert!(candidate.ends_with("}]"), "got: {candidate}");
    let script: Dialogue = decode_material(raw).unwrap();
    assert_eq!(script.lines()[0].text, "Hi [there]");
}

#[test]
fn test_empty_inputs() {
    assert_eq!(extract_json(""), "");
    assert_eq!(extract_json_opt(None), "");
    assert_eq!(extract_json_opt(Some("  ")), "");
}

#[test]
fn test_plain_prose_falls_through_to_not_found() {
    assert_eq!(extract_json("no json here"), "no json here");
    let err = decode_value("no json here").unwrap_err();
    assert!(matches!(err, ExtractError::NotFound { .. }));
    assert!(err.is_retryable());
}

#[test]
fn test_control_characters_do_not_panic() {
    let raw = "\u{0}\u{1b}[31m{\"a\":\u{7}1}\u{0}";
    // The escape sequence "[31m" comes first, so the root is an array.
    let _ = extract_json(raw);
    let _ = decode_value(raw);
}

// ── Decoding realistic replies ───────────────────────────────────────────────

#[test]
fn test_mind_map_reply_with_preamble() {
    let raw = r#"Sure! Below is the mind map you asked for.

```json
{
  "root": {
    "topic": "Photosynthesis",
    "children": [
      {"topic": "Light reactions", "summary": "Happen in thylakoids {membranes}"},
      {"topic": "Calvin cycle", "children": [{"topic": "Carbon fixation"},]},
    ]
  }
}
```

I hope this helps!"#;
    let map: MindMap = decode_material(raw).unwrap();
    assert_eq!(map.root.topic, "Photosynthesis");
    assert_eq!(map.root.node_count(), 4);
}

#[test]
fn test_quiz_reply_truncated_fence() {
    let raw = "```json\n{\"quiz_type\": \"mcq\", \"questions\": [{\"question\": \"Capital of France?\", \"options\": [\"Paris\", \"Rome\"], \"answer\": \"Paris\"}]}";
    let quiz: Quiz = decode_material(raw).unwrap();
    assert_eq!(quiz.questions[0].answer, "Paris");
}

#[test]
fn test_summary_with_markdown_inside_strings() {
    let raw = r#"{"title": "Rust", "summary": "Use `Vec<T>` and [slices](https://doc.rust-lang.org) {safely}.", "key_points": ["Ownership", "Borrowing",]}"#;
    let summary: Summary = decode_material(raw).unwrap();
    assert!(summary.summary.contains("[slices]"));
    assert_eq!(summary.key_points.len(), 2);
}

#[test]
fn test_summary_quoting_a_code_fence() {
    let raw = r#"Here is your summary:
```json
{
  "title": "Loops",
  "summary": "A loop repeats a block:\n```rust\nfor i in 0..3 {\n    println!(\"{i}\");\n}\n```",
  "key_points": ["`for` iterates", "`while` checks a condition",]
}
```
Happy studying!"#;
    let summary: Summary = decode_material(raw).unwrap();
    assert_eq!(summary.title, "Loops");
    assert!(summary.summary.ends_with("}\n```"), "got: {}", summary.summary);
    assert_eq!(summary.key_points.len(), 2);
}

#[test]
fn test_wrong_root_is_schema_error() {
    let raw = r#"{"dialogue": [{"text": "Hi", "voice_id": "a"}]}"#;
    let err = decode_material::<Dialogue>(raw).unwrap_err();
    assert!(matches!(err, ExtractError::Schema { .. }), "got {err:?}");
}

#[test]
fn test_unrepairable_reply_is_malformed_with_payload() {
    let raw = "Result: {\"a\": 'single quotes'}";
    let err = decode_value(raw).unwrap_err();
    assert!(matches!(err, ExtractError::Malformed { .. }));

    let payload = err.to_payload();
    assert_eq!(payload.kind, "malformed");
    assert_eq!(payload.raw_response.as_deref(), Some(raw));
}

#[test]
fn test_decode_kind_for_every_material() {
    let replies = [
        (MaterialKind::MindMap, r#"{"root": {"topic": "T"}}"#),
        (
            MaterialKind::Quiz,
            r#"{"questions": [{"question": "Q?", "answer": "A"}]}"#,
        ),
        (MaterialKind::Summary, r#"{"summary": "S"}"#),
        (MaterialKind::Infographic, r#"{"title": "I"}"#),
        (MaterialKind::Podcast, r#"[{"text": "Hi", "voice_id": "h"}]"#),
    ];
    for (kind, raw) in replies {
        let v = decode_kind(kind, raw).unwrap_or_else(|e| panic!("{kind}: {e}"));
        assert!(v.is_object() || v.is_array(), "{kind}");
    }
}
