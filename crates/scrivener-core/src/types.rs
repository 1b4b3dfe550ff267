//! Request and result types for the four editing operations.
//!
//! Requests arrive from the routing layer; results go back to it for
//! serialisation. Both sides use snake_case JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The editing operation a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Check,
    Polish,
    Translate,
    Rewrite,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Polish => "polish",
            Self::Translate => "translate",
            Self::Rewrite => "rewrite",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    #[default]
    User,
    Assistant,
}

/// One prior message of a conversation, replayed ahead of the new prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

// ── Diff segments ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Equal,
    Insert,
    Delete,
}

/// A maximal run of text sharing one change kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSegment {
    #[serde(rename = "type")]
    pub kind: DiffKind,
    #[serde(rename = "value")]
    pub text: String,
}

impl DiffSegment {
    pub fn equal(text: impl Into<String>) -> Self {
        Self {
            kind: DiffKind::Equal,
            text: text.into(),
        }
    }

    pub fn insert(text: impl Into<String>) -> Self {
        Self {
            kind: DiffKind::Insert,
            text: text.into(),
        }
    }

    pub fn delete(text: impl Into<String>) -> Self {
        Self {
            kind: DiffKind::Delete,
            text: text.into(),
        }
    }
}

// ── Requests ──

fn default_language() -> String {
    "auto".to_string()
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRequest {
    pub text: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "enabled")]
    pub enable_grammar: bool,
    #[serde(default = "enabled")]
    pub enable_style: bool,
    #[serde(default = "enabled")]
    pub enable_terminology: bool,
    #[serde(default = "enabled")]
    pub enable_consistency: bool,
    #[serde(default)]
    pub strict_mode: bool,
}

impl CheckRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: default_language(),
            enable_grammar: true,
            enable_style: true,
            enable_terminology: true,
            enable_consistency: true,
            strict_mode: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolishRequest {
    pub text: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub focus_on: Option<String>,
}

impl PolishRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: default_language(),
            target_audience: None,
            focus_on: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    /// Source language; `"auto"` lets the model detect it.
    #[serde(default = "default_language")]
    pub language: String,
    pub target_language: String,
    #[serde(default = "enabled")]
    pub preserve_terminology: bool,
}

impl TranslateRequest {
    pub fn new(text: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: default_language(),
            target_language: target_language.into(),
            preserve_terminology: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteRequest {
    pub text: String,
    #[serde(default = "default_language")]
    pub language: String,
    pub instruction: String,
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
}

impl RewriteRequest {
    pub fn new(text: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: default_language(),
            instruction: instruction.into(),
            conversation_history: Vec::new(),
        }
    }
}

/// A request for any of the four operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum EditRequest {
    Check(CheckRequest),
    Polish(PolishRequest),
    Translate(TranslateRequest),
    Rewrite(RewriteRequest),
}

impl EditRequest {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Check(_) => Operation::Check,
            Self::Polish(_) => Operation::Polish,
            Self::Translate(_) => Operation::Translate,
            Self::Rewrite(_) => Operation::Rewrite,
        }
    }

    /// The text to be edited.
    pub fn text(&self) -> &str {
        match self {
            Self::Check(r) => &r.text,
            Self::Polish(r) => &r.text,
            Self::Translate(r) => &r.text,
            Self::Rewrite(r) => &r.text,
        }
    }
}

// ── Results ──

/// A problem reported by a check, located by `[start, end]` character offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckIssue {
    pub message: String,
    pub suggestion: String,
    pub range: [usize; 2],
    pub severity: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolishChange {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub original_text: String,
    pub polished_text: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub diffs: Vec<DiffSegment>,
    pub issues: Vec<CheckIssue>,
    pub corrected_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolishResult {
    pub diffs: Vec<DiffSegment>,
    pub polished_text: String,
    pub changes: Vec<PolishChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateResult {
    pub diffs: Vec<DiffSegment>,
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteResult {
    pub diffs: Vec<DiffSegment>,
    pub rewritten_text: String,
    pub conversation_id: String,
}

/// Any of the four operation results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypedResult {
    Check(CheckResult),
    Polish(PolishResult),
    Translate(TranslateResult),
    Rewrite(RewriteResult),
}

impl TypedResult {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Check(_) => Operation::Check,
            Self::Polish(_) => Operation::Polish,
            Self::Translate(_) => Operation::Translate,
            Self::Rewrite(_) => Operation::Rewrite,
        }
    }

    pub fn diffs(&self) -> &[DiffSegment] {
        match self {
            Self::Check(r) => &r.diffs,
            Self::Polish(r) => &r.diffs,
            Self::Translate(r) => &r.diffs,
            Self::Rewrite(r) => &r.diffs,
        }
    }

    /// The text the diff leads to.
    pub fn final_text(&self) -> &str {
        match self {
            Self::Check(r) => &r.corrected_text,
            Self::Polish(r) => &r.polished_text,
            Self::Translate(r) => &r.translated_text,
            Self::Rewrite(r) => &r.rewritten_text,
        }
    }
}
