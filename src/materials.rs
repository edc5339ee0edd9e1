//! Typed learning-material payloads.
//!
//! Each struct mirrors the JSON shape the generation prompt asks for and the
//! shape the frontend renders. [`Material::validate`] adds the structural
//! checks `serde` cannot express (non-blank topics, answers that match an
//! option, and so on).

use crate::config::MaterialKind;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A payload that can be generated, decoded and validated.
pub trait Material: Serialize + DeserializeOwned {
    const KIND: MaterialKind;

    /// Check invariants beyond the JSON shape. The error is a human-readable reason.
    fn validate(&self) -> Result<(), String>;
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

// ── Mind map ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindMap {
    pub root: MindMapNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindMapNode {
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MindMapNode>,
}

impl MindMapNode {
    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(MindMapNode::node_count).sum::<usize>()
    }

    fn validate_at(&self, path: &str) -> Result<(), String> {
        if is_blank(&self.topic) {
            return Err(format!("node {path} has an empty topic"));
        }
        for (i, child) in self.children.iter().enumerate() {
            child.validate_at(&format!("{path}.{i}"))?;
        }
        Ok(())
    }
}

impl Material for MindMap {
    const KIND: MaterialKind = MaterialKind::MindMap;

    fn validate(&self) -> Result<(), String> {
        self.root.validate_at("root")
    }
}

// ── Quiz ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(default)]
    pub quiz_type: String,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    /// Empty for open-ended questions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub answer: String,
}

impl Material for Quiz {
    const KIND: MaterialKind = MaterialKind::Quiz;

    fn validate(&self) -> Result<(), String> {
        if self.questions.is_empty() {
            return Err("quiz has no questions".into());
        }
        for (i, q) in self.questions.iter().enumerate() {
            let n = i + 1;
            if is_blank(&q.question) {
                return Err(format!("question {n} is empty"));
            }
            if is_blank(&q.answer) {
                return Err(format!("question {n} has no answer"));
            }
            // The frontend compares the answer to option text verbatim.
            if !q.options.is_empty() && !q.options.iter().any(|o| o.trim() == q.answer.trim()) {
                return Err(format!(
                    "question {n}: answer {:?} is not one of its options",
                    q.answer
                ));
            }
        }
        Ok(())
    }
}

// ── Summary ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,
}

impl Material for Summary {
    const KIND: MaterialKind = MaterialKind::Summary;

    fn validate(&self) -> Result<(), String> {
        if is_blank(&self.summary) {
            return Err("summary text is empty".into());
        }
        Ok(())
    }
}

// ── Infographic ──────────────────────────────────────────────────────────

/// Stats beyond this count are dropped; the layout has three slots.
pub const MAX_INFOGRAPHIC_STATS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Infographic {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub stats: Vec<Stat>,
    #[serde(default)]
    pub key_points: Vec<KeyPoint>,
    #[serde(default)]
    pub conclusion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    /// Models emit `42`, `"42%"` or `"3.5M"` interchangeably.
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPoint {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl Infographic {
    /// Truncate `stats` to [`MAX_INFOGRAPHIC_STATS`].
    pub fn normalized(mut self) -> Self {
        self.stats.truncate(MAX_INFOGRAPHIC_STATS);
        self
    }
}

impl Material for Infographic {
    const KIND: MaterialKind = MaterialKind::Infographic;

    fn validate(&self) -> Result<(), String> {
        if is_blank(&self.title) {
            return Err("infographic title is empty".into());
        }
        if let Some(i) = self.key_points.iter().position(|p| is_blank(&p.title)) {
            return Err(format!("key point {} has an empty title", i + 1));
        }
        Ok(())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

// ── Podcast dialogue ─────────────────────────────────────────────────────

/// A two-speaker podcast script: a bare JSON array of lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dialogue(pub Vec<DialogueLine>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub text: String,
    pub voice_id: String,
}

impl Dialogue {
    pub fn lines(&self) -> &[DialogueLine] {
        &self.0
    }

    /// Reject any line spoken by a voice other than `host` or `guest`.
    pub fn check_voices(&self, host: &str, guest: &str) -> Result<(), String> {
        match self
            .0
            .iter()
            .position(|l| l.voice_id != host && l.voice_id != guest)
        {
            Some(i) => Err(format!(
                "line {} uses unknown voice_id {:?}",
                i + 1,
                self.0[i].voice_id
            )),
            None => Ok(()),
        }
    }
}

impl Material for Dialogue {
    const KIND: MaterialKind = MaterialKind::Podcast;

    fn validate(&self) -> Result<(), String> {
        if self.0.is_empty() {
            return Err("podcast script has no lines".into());
        }
        if let Some(i) = self.0.iter().position(|l| is_blank(&l.text)) {
            return Err(format!("line {} has no text", i + 1));
        }
        Ok(())
    }
}
