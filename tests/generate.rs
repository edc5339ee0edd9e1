//! Integration tests for generation with the single strict retry.
//!
//! A scripted [`TextGenerator`] replays canned replies and records the
//! prompts it was sent, so the retry policy can be checked without a live
//! provider.

use edgequake_json_extract::{
    generate_material, generate_or_payload, generate_podcast, generate_value_with,
    prompts::STRICT_RETRY_SUFFIX, Dialogue, ExtractError, GenerationConfig, MaterialKind,
    MindMap, Quiz, TextGenerator,
};
use std::collections::VecDeque;
use std::sync::Mutex;

// ── Test helpers ─────────────────────────────────────────────────────────────

struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, ExtractError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn new(replies: Vec<Result<&str, ExtractError>>) -> Self {
        Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string))
                    .collect(),
            ),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn prompt(&self, i: usize) -> String {
        self.prompts.lock().unwrap()[i].clone()
    }
}

impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _system: &str, user: &str) -> Result<String, ExtractError> {
        self.prompts.lock().unwrap().push(user.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ExtractError::Internal("script exhausted".into())))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

const DOC: &str = "Mitochondria are the powerhouse of the cell. They produce ATP.";

// ── First-attempt success ────────────────────────────────────────────────────

#[tokio::test]
async fn test_first_reply_decodes() {
    init_tracing();
    let gen = ScriptedGenerator::new(vec![Ok(
        "```json\n{\"root\": {\"topic\": \"Mitochondria\", \"children\": [{\"topic\": \"ATP\"},]}}\n```",
    )]);
    let config = GenerationConfig::default();

    let map: MindMap = generate_material(&gen, DOC, &config).await.unwrap();
    assert_eq!(map.root.topic, "Mitochondria");
    assert_eq!(gen.calls(), 1);
    assert!(gen.prompt(0).contains(DOC));
}

// ── Strict retry ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_malformed_then_strict_retry_succeeds() {
    init_tracing();
    let gen = ScriptedGenerator::new(vec![
        Ok("{\"root\": {\"topic\": 'oops'}}"),
        Ok("{\"root\": {\"topic\": \"Mitochondria\"}}"),
    ]);
    let config = GenerationConfig::default();

    let map: MindMap = generate_material(&gen, DOC, &config).await.unwrap();
    assert_eq!(map.root.topic, "Mitochondria");
    assert_eq!(gen.calls(), 2);

    let retry = gen.prompt(1);
    assert!(retry.starts_with(&gen.prompt(0)));
    assert!(retry.contains(STRICT_RETRY_SUFFIX.trim()));
    assert!(retry.contains("malformed JSON"));
}

#[tokio::test]
async fn test_exactly_one_retry_then_error() {
    let gen = ScriptedGenerator::new(vec![
        Ok("I cannot help with that."),
        Ok("Still no JSON, sorry."),
        Ok("{\"root\": {\"topic\": \"never reached\"}}"),
    ]);
    let config = GenerationConfig::default();

    let err = generate_material::<MindMap, _>(&gen, DOC, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::NotFound { .. }));
    assert_eq!(gen.calls(), 2);
}

#[tokio::test]
async fn test_strict_retry_can_be_disabled() {
    let gen = ScriptedGenerator::new(vec![Ok("nope"), Ok("{\"root\": {\"topic\": \"x\"}}")]);
    let config = GenerationConfig::builder().strict_retry(false).build().unwrap();

    let res = generate_material::<MindMap, _>(&gen, DOC, &config).await;
    assert!(res.is_err());
    assert_eq!(gen.calls(), 1);
}

#[tokio::test]
async fn test_schema_failure_triggers_retry() {
    let gen = ScriptedGenerator::new(vec![
        Ok(r#"{"questions": [{"question": "Q?", "options": ["a", "b"], "answer": "c"}]}"#),
        Ok(r#"{"questions": [{"question": "Q?", "options": ["a", "b"], "answer": "b"}]}"#),
    ]);
    let config = GenerationConfig::default();

    let quiz: Quiz = generate_material(&gen, DOC, &config).await.unwrap();
    assert_eq!(quiz.questions[0].answer, "b");
    assert_eq!(gen.calls(), 2);
}

#[tokio::test]
async fn test_transport_error_is_not_strict_retried() {
    let gen = ScriptedGenerator::new(vec![Err(ExtractError::LlmApiError {
        retries: 3,
        message: "503 Service Unavailable".into(),
    })]);
    let config = GenerationConfig::default();

    let err = generate_material::<Quiz, _>(&gen, DOC, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::LlmApiError { .. }));
    assert_eq!(gen.calls(), 1);
}

// ── Input handling ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_blank_document_never_calls_generator() {
    let gen = ScriptedGenerator::new(vec![]);
    let err = generate_material::<MindMap, _>(&gen, "  \n", &GenerationConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::EmptyInput));
    assert_eq!(gen.calls(), 0);
}

#[tokio::test]
async fn test_long_document_is_truncated_in_prompt() {
    let gen = ScriptedGenerator::new(vec![Ok("{\"summary\": \"s\"}")]);
    let config = GenerationConfig::builder().max_input_chars(10).build().unwrap();
    let doc = "0123456789ABCDEFGHIJ";

    let _: edgequake_json_extract::Summary = generate_material(&gen, doc, &config).await.unwrap();
    let prompt = gen.prompt(0);
    assert!(prompt.contains("0123456789\n"));
    assert!(!prompt.contains("ABCDEF"));
}

// ── Podcast ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_podcast_wrong_voice_is_retried() {
    let gen = ScriptedGenerator::new(vec![
        Ok(r#"[{"text": "[excited] Welcome!", "voice_id": "host"}, {"text": "Hi", "voice_id": "narrator"}]"#),
        Ok(r#"Here you go: [{"text": "[excited] Welcome!", "voice_id": "host"}, {"text": "Hi", "voice_id": "guest"}] -- end"#),
    ]);
    let config = GenerationConfig::default();

    let script: Dialogue = generate_podcast(&gen, DOC, "host", "guest", &config)
        .await
        .unwrap();
    assert_eq!(script.lines().len(), 2);
    assert_eq!(gen.calls(), 2);
    assert!(gen.prompt(0).contains("\"guest\""));
}

#[tokio::test]
async fn test_podcast_requires_voices() {
    let gen = ScriptedGenerator::new(vec![]);
    let config = GenerationConfig::default();
    let err = generate_value_with(&gen, MaterialKind::Podcast, DOC, None, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::InvalidConfig(_)));
}

// ── Runtime kind dispatch & payloads ─────────────────────────────────────────

#[tokio::test]
async fn test_generate_value_infographic_is_normalised() {
    let gen = ScriptedGenerator::new(vec![Ok(r#"{"title": "Cells", "stats": [
        {"value": 37, "label": "trillion cells"}, {"value": "200", "label": "types"},
        {"value": "1665", "label": "discovered"}, {"value": "x", "label": "extra"}]}"#)]);

    let config = GenerationConfig::default();
    let v = generate_value_with(&gen, MaterialKind::Infographic, DOC, None, &config)
        .await
        .unwrap();
    assert_eq!(v["stats"].as_array().unwrap().len(), 3);
    assert_eq!(v["stats"][0]["value"], "37");
}

#[test]
fn test_failure_becomes_payload() {
    let gen = ScriptedGenerator::new(vec![Ok("no"), Ok("still no")]);
    let config = GenerationConfig::default();

    let payload = tokio_test::block_on(generate_or_payload::<Quiz, _>(&gen, DOC, &config))
        .unwrap_err();
    assert_eq!(payload.kind, "not_found");
    assert_eq!(payload.raw_response.as_deref(), Some("still no"));
}
