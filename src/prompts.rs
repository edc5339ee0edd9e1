//! Prompts for generating learning materials as JSON.
//!
//! Every prompt lives here so a change to the requested shape is a change to
//! exactly one place, and so tests can inspect prompts without a live model.
//! The field names in each prompt must stay in sync with
//! [`crate::materials`].

use crate::config::{GenerationConfig, MaterialKind};

/// Default system prompt for every material.
///
/// Used when `GenerationConfig::system_prompt` is `None`.
pub const JSON_SYSTEM_PROMPT: &str = "You are a precise educational content generator. \
You always answer with a single raw JSON value and nothing else: no prose, \
no markdown, no code fences, no comments, no trailing commas.";

const MIND_MAP_PROMPT: &str = r#"Analyze the following text and generate a structured JSON object for a mind map visualization.
The JSON must follow this structure precisely:
- A single root object with a key named "root".
- The "root" object must contain a "topic" (the central theme) and "children" (an array of nodes).
- Each child node must contain a "topic" (string) and can optionally have a "summary" (string) and its own "children" array for further nesting.
- Ensure the output is only the raw JSON, without any surrounding text, explanations, or markdown formatting."#;

const SUMMARY_PROMPT: &str = r#"Summarize the following text for a student.
Return a single JSON object with exactly these keys:
{
  "title": "short title",
  "summary": "one or two paragraphs (markdown allowed inside the string)",
  "key_points": ["point", "point"],
  "detailed_explanation": "optional longer explanation",
  "example": "optional worked example",
  "conclusion": "optional closing paragraph"
}"#;

const INFOGRAPHIC_PROMPT: &str = r#"Extract infographic content from the following text.
Return a single JSON object with exactly these keys:
{
  "title": "short headline",
  "subtitle": "one-line subtitle",
  "stats": [{"value": "42%", "label": "what the number measures"}],
  "key_points": [{"title": "short title", "description": "one or two sentences"}],
  "conclusion": "one-sentence takeaway"
}
Use at most 3 stats and at most 6 key points. Only use numbers that appear in the text."#;

/// Suffix appended to the original prompt for the one strict retry.
pub const STRICT_RETRY_SUFFIX: &str = r#"

IMPORTANT: your previous answer could not be parsed.
Return ONLY the JSON value. The first character of your answer must be `{` or `[`
and the last character must be the matching `}` or `]`.
Do not use markdown fences. Do not add trailing commas. Escape every double quote
and newline inside string values."#;

/// Build the user prompt for `kind` over `document_text`.
///
/// Podcast prompts need voice ids; use [`podcast_prompt`] for those. Calling
/// this with [`MaterialKind::Podcast`] uses the placeholders `HOST`/`GUEST`.
pub fn material_prompt(
    kind: MaterialKind,
    document_text: &str,
    config: &GenerationConfig,
) -> String {
    match kind {
        MaterialKind::MindMap => with_document(MIND_MAP_PROMPT, document_text),
        MaterialKind::Quiz => quiz_prompt(document_text, &config.quiz_type, config.num_questions),
        MaterialKind::Summary => with_document(SUMMARY_PROMPT, document_text),
        MaterialKind::Infographic => with_document(INFOGRAPHIC_PROMPT, document_text),
        MaterialKind::Podcast => podcast_prompt(document_text, "HOST", "GUEST"),
    }
}

/// Quiz prompt with the requested flavour and question count.
pub fn quiz_prompt(document_text: &str, quiz_type: &str, num_questions: usize) -> String {
    let header = format!(
        r#"You are an AI quiz generator.
Based on the following content, create {num_questions} {quiz_type} questions.

Return the output strictly as JSON with the structure:
{{
  "quiz_type": "{quiz_type}",
  "questions": [
    {{
      "question": "string",
      "options": ["A", "B", "C", "D"],
      "answer": "string"
    }}
  ]
}}
Include "options" only for multiple-choice questions, and make "answer" exactly
equal to the text of the correct option."#
    );
    with_document(&header, document_text)
}

/// Two-speaker podcast prompt; every line must use one of the two voice ids.
pub fn podcast_prompt(document_text: &str, host_voice_id: &str, guest_voice_id: &str) -> String {
    let header = format!(
        r#"You are an expert podcast scriptwriter.
Convert the document below into a dynamic, expressive, two-speaker podcast conversation between:
- HOST -> voice_id: "{host_voice_id}"
- GUEST -> voice_id: "{guest_voice_id}"

Return ONLY a JSON array. Each element MUST match exactly:
{{"text": "dialogue line with expressive cues", "voice_id": "{host_voice_id}" or "{guest_voice_id}"}}

Rules:
1. Every HOST line uses voice_id "{host_voice_id}"; every GUEST line uses "{guest_voice_id}". Never use any other voice.
2. Put short expressive cues in square brackets inside "text" (e.g. [excited], [pauses], [laughs]) in 30-50% of lines.
3. Each line is 1-3 sentences of natural spoken dialogue with no speaker names.
4. Begin with a short host introduction and end with a host outro. Do not add facts that are not in the document."#
    );
    with_document(&header, document_text)
}

/// Append the strict instruction (and the decoder's complaint) to `prompt`.
pub fn strict_retry_prompt(prompt: &str, failure: &str) -> String {
    format!("{prompt}{STRICT_RETRY_SUFFIX}\nThe parser reported: {failure}")
}

fn with_document(header: &str, document_text: &str) -> String {
    format!("{header}\n\nText to Analyze:\n---\n{document_text}\n---\n")
}
