//! Recover a JSON object from a free-form model reply.
//!
//! Models are asked for bare JSON but often wrap it in prose or a Markdown
//! fence. Strategies, first success wins:
//!
//! 1. the whole (trimmed) reply,
//! 2. the body of the first ```` ```json ```` fence,
//! 3. the span from the first `{` to the last `}`.
//!
//! Only JSON objects count as records. When nothing parses the result is a
//! failed record carrying the raw text; [`extract`] never errors.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

pub const PARSE_FAILED: &str = "parse-failed";

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```json\s*(.*?)\s*```").expect("valid fence pattern"));

/// Field map parsed out of a reply, or the diagnostic for a reply that had none.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRecord {
    ok: bool,
    fields: Map<String, Value>,
}

impl ExtractedRecord {
    pub fn parsed(fields: Map<String, Value>) -> Self {
        Self { ok: true, fields }
    }

    /// Failed extraction: `{"diagnostic": "parse-failed", "raw": <reply>}`.
    pub fn failed(raw: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("diagnostic".into(), Value::String(PARSE_FAILED.into()));
        fields.insert("raw".into(), Value::String(raw.into()));
        Self { ok: false, fields }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The unparsed reply, for failed records.
    pub fn raw(&self) -> Option<&str> {
        if self.ok {
            return None;
        }
        self.fields.get("raw").and_then(Value::as_str)
    }
}

/// Run the fallback chain over `raw`.
pub fn extract(raw: &str) -> ExtractedRecord {
    let strategies: [fn(&str) -> Option<Map<String, Value>>; 3] =
        [whole_reply, fenced_block, brace_span];

    for strategy in strategies {
        if let Some(fields) = strategy(raw) {
            return ExtractedRecord::parsed(fields);
        }
    }

    let preview: String = raw.chars().take(200).collect();
    warn!(response = %preview, "failed to extract JSON from AI response");
    ExtractedRecord::failed(raw)
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn whole_reply(raw: &str) -> Option<Map<String, Value>> {
    parse_object(raw.trim())
}

fn fenced_block(raw: &str) -> Option<Map<String, Value>> {
    let body = JSON_FENCE.captures(raw)?.get(1)?.as_str();
    parse_object(body.trim())
}

fn brace_span(raw: &str) -> Option<Map<String, Value>> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    parse_object(&raw[start..=end])
}
