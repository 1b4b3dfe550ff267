//! Turn an extracted record into an operation's typed result.
//!
//! Every field read goes through an accessor with a default, so a missing key
//! never fails. A key holding the wrong JSON type is an assembly failure; it
//! is logged and degraded exactly like an unparseable reply:
//!
//! | Operation | Final text on failure | Metadata on failure |
//! |-----------|----------------------|---------------------|
//! | check     | original text        | one `system` issue  |
//! | polish    | original text        | one `system` change |
//! | translate | [`TRANSLATION_UNAVAILABLE`] | request languages |
//! | rewrite   | [`REWRITE_UNAVAILABLE`]     | conversation id   |
//!
//! The diff is always computed from the request text to the final text.

use scrivener_core::{
    CheckIssue, CheckResult, Operation, PolishChange, PolishResult, RewriteResult,
    TranslateResult, TypedResult, diff,
};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::error;

use crate::extract::ExtractedRecord;

pub const UNPARSEABLE_MESSAGE: &str =
    "The AI service reply could not be parsed; no changes were applied";
pub const UNPARSEABLE_SUGGESTION: &str =
    "Retry the request, or ask an administrator to check the AI service configuration";
pub const TRANSLATION_UNAVAILABLE: &str =
    "Translation service is temporarily unavailable, please try again later";
pub const REWRITE_UNAVAILABLE: &str =
    "Rewrite service is temporarily unavailable, please try again later";

/// A record field held a value of the wrong JSON type.
#[derive(Debug, Error)]
#[error("field `{field}` is not {expected}")]
pub struct AssemblyError {
    field: String,
    expected: &'static str,
}

impl AssemblyError {
    fn new(field: &str, expected: &'static str) -> Self {
        Self {
            field: field.to_string(),
            expected,
        }
    }
}

/// Request details some operations echo into their result.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestMeta<'a> {
    pub source_language: &'a str,
    pub target_language: &'a str,
    pub user_id: &'a str,
    pub history_len: usize,
}

/// Build the typed result for `operation`.
pub fn assemble(
    operation: Operation,
    record: &ExtractedRecord,
    original: &str,
    meta: &RequestMeta<'_>,
) -> TypedResult {
    match operation {
        Operation::Check => TypedResult::Check(assemble_check(record, original)),
        Operation::Polish => TypedResult::Polish(assemble_polish(record, original)),
        Operation::Translate => TypedResult::Translate(assemble_translate(
            record,
            original,
            meta.source_language,
            meta.target_language,
        )),
        Operation::Rewrite => TypedResult::Rewrite(assemble_rewrite(
            record,
            original,
            meta.user_id,
            meta.history_len,
        )),
    }
}

pub fn assemble_check(record: &ExtractedRecord, original: &str) -> CheckResult {
    let (corrected_text, issues) = mapped_or(
        record,
        Operation::Check,
        || map_check(record, original),
        || (original.to_string(), vec![unparseable_issue(original)]),
    );
    CheckResult {
        diffs: diff(original, &corrected_text),
        issues,
        corrected_text,
    }
}

pub fn assemble_polish(record: &ExtractedRecord, original: &str) -> PolishResult {
    let (polished_text, changes) = mapped_or(
        record,
        Operation::Polish,
        || map_polish(record, original),
        || (original.to_string(), vec![unparseable_change(original)]),
    );
    PolishResult {
        diffs: diff(original, &polished_text),
        polished_text,
        changes,
    }
}

pub fn assemble_translate(
    record: &ExtractedRecord,
    original: &str,
    source_language: &str,
    target_language: &str,
) -> TranslateResult {
    let translated_text = mapped_or(
        record,
        Operation::Translate,
        || required_text(record, "translatedText", TRANSLATION_UNAVAILABLE),
        || TRANSLATION_UNAVAILABLE.to_string(),
    );
    TranslateResult {
        diffs: diff(original, &translated_text),
        translated_text,
        source_language: source_language.to_string(),
        target_language: target_language.to_string(),
    }
}

pub fn assemble_rewrite(
    record: &ExtractedRecord,
    original: &str,
    user_id: &str,
    history_len: usize,
) -> RewriteResult {
    let rewritten_text = mapped_or(
        record,
        Operation::Rewrite,
        || required_text(record, "rewrittenText", REWRITE_UNAVAILABLE),
        || REWRITE_UNAVAILABLE.to_string(),
    );
    RewriteResult {
        diffs: diff(original, &rewritten_text),
        rewritten_text,
        conversation_id: conversation_id(user_id, history_len),
    }
}

/// Same caller and same history length always give the same id.
pub fn conversation_id(user_id: &str, history_len: usize) -> String {
    format!("{user_id}_{history_len}")
}

fn mapped_or<T>(
    record: &ExtractedRecord,
    operation: Operation,
    map: impl FnOnce() -> Result<T, AssemblyError>,
    fallback: impl FnOnce() -> T,
) -> T {
    if !record.is_ok() {
        return fallback();
    }
    match map() {
        Ok(value) => value,
        Err(e) => {
            error!(operation = %operation, error = %e, "failed to parse AI response fields");
            fallback()
        }
    }
}

fn map_check(
    record: &ExtractedRecord,
    original: &str,
) -> Result<(String, Vec<CheckIssue>), AssemblyError> {
    let fields = Fields(record.fields());
    let corrected = fields.text_or("correctedText", original)?;
    let len = char_len(original);

    let issues = fields
        .items("issues")?
        .into_iter()
        .map(|issue| -> Result<CheckIssue, AssemblyError> {
            let category = match issue.text("type")? {
                Some(kind) => kind.to_string(),
                None => issue.text_or("category", "general")?,
            };
            Ok(CheckIssue {
                message: issue.text_or("message", "")?,
                suggestion: issue.text_or("suggestion", "")?,
                range: [issue.position_or("start", 0)?, issue.position_or("end", len)?],
                severity: issue.text_or("severity", "info")?,
                category,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((corrected, issues))
}

fn map_polish(
    record: &ExtractedRecord,
    original: &str,
) -> Result<(String, Vec<PolishChange>), AssemblyError> {
    let fields = Fields(record.fields());
    let polished = fields.text_or("polishedText", original)?;

    let changes = fields
        .items("changes")?
        .into_iter()
        .map(|change| -> Result<PolishChange, AssemblyError> {
            Ok(PolishChange {
                kind: change.text_or("type", "polish")?,
                description: change.text_or("description", "")?,
                original_text: change.text_or("originalText", "")?,
                polished_text: change.text_or("polishedText", "")?,
                reason: change.text_or("reason", "")?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((polished, changes))
}

// A parsed record without the text field gets the same message as an
// unparseable reply; there is no safe default translation or rewrite.
fn required_text(
    record: &ExtractedRecord,
    key: &str,
    unavailable: &str,
) -> Result<String, AssemblyError> {
    Fields(record.fields()).text_or(key, unavailable)
}

fn unparseable_issue(original: &str) -> CheckIssue {
    CheckIssue {
        message: UNPARSEABLE_MESSAGE.to_string(),
        suggestion: UNPARSEABLE_SUGGESTION.to_string(),
        range: [0, char_len(original)],
        severity: "warning".to_string(),
        category: "system".to_string(),
    }
}

fn unparseable_change(original: &str) -> PolishChange {
    PolishChange {
        kind: "system".to_string(),
        description: UNPARSEABLE_MESSAGE.to_string(),
        original_text: original.to_string(),
        polished_text: original.to_string(),
        reason: UNPARSEABLE_SUGGESTION.to_string(),
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Typed, defaulting view over one JSON object. `null` reads as missing.
#[derive(Clone, Copy)]
struct Fields<'a>(&'a Map<String, Value>);

impl<'a> Fields<'a> {
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    fn text(&self, key: &str) -> Result<Option<&'a str>, AssemblyError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(AssemblyError::new(key, "a string")),
        }
    }

    fn text_or(&self, key: &str, default: &str) -> Result<String, AssemblyError> {
        Ok(self.text(key)?.unwrap_or(default).to_string())
    }

    fn position_or(&self, key: &str, default: usize) -> Result<usize, AssemblyError> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => v
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| AssemblyError::new(key, "a non-negative integer")),
        }
    }

    fn items(&self, key: &str) -> Result<Vec<Fields<'a>>, AssemblyError> {
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::Object(map) => Ok(Fields(map)),
                    _ => Err(AssemblyError::new(key, "a list of objects")),
                })
                .collect(),
            Some(_) => Err(AssemblyError::new(key, "a list")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use scrivener_core::{DiffSegment, modified_side, original_side};

    const ORIGINAL: &str = "openeuler is a open source OS.";

    #[test]
    fn check_from_fenced_reply() {
        let record = extract("```json\n{\"correctedText\":\"X\",\"issues\":[]}\n```");
        let result = assemble_check(&record, ORIGINAL);
        assert_eq!(result.corrected_text, "X");
        assert!(result.issues.is_empty());
        assert_eq!(original_side(&result.diffs), ORIGINAL);
        assert_eq!(modified_side(&result.diffs), "X");
    }

    #[test]
    fn check_maps_issues_with_defaults() {
        let reply = r#"{
            "correctedText": "openEuler is an open source OS.",
            "issues": [
                {"type": "terminology", "severity": "error", "message": "Use openEuler",
                 "suggestion": "openEuler", "start": 0, "end": 9},
                {"message": "Article"}
            ]
        }"#;
        let result = assemble_check(&extract(reply), ORIGINAL);

        assert_eq!(result.corrected_text, "openEuler is an open source OS.");
        assert_eq!(result.issues.len(), 2);
        assert_eq!(result.issues[0].category, "terminology");
        assert_eq!(result.issues[0].severity, "error");
        assert_eq!(result.issues[0].range, [0, 9]);

        let defaulted = &result.issues[1];
        assert_eq!(defaulted.message, "Article");
        assert_eq!(defaulted.suggestion, "");
        assert_eq!(defaulted.severity, "info");
        assert_eq!(defaulted.category, "general");
        assert_eq!(defaulted.range, [0, ORIGINAL.chars().count()]);
    }

    #[test]
    fn check_accepts_category_key() {
        let reply = r#"{"issues": [{"category": "style"}]}"#;
        let result = assemble_check(&extract(reply), ORIGINAL);
        assert_eq!(result.issues[0].category, "style");
    }

    #[test]
    fn check_missing_text_keeps_original() {
        let result = assemble_check(&extract(r#"{"issues": []}"#), ORIGINAL);
        assert_eq!(result.corrected_text, ORIGINAL);
        assert_eq!(result.diffs, vec![DiffSegment::equal(ORIGINAL)]);
    }

    #[test]
    fn check_unparseable_reply_degrades() {
        let result = assemble_check(&extract("Sorry, I cannot help with that."), ORIGINAL);
        assert_eq!(result.corrected_text, ORIGINAL);
        assert_eq!(result.issues.len(), 1);

        let issue = &result.issues[0];
        assert_eq!(issue.category, "system");
        assert_eq!(issue.severity, "warning");
        assert_eq!(issue.range, [0, ORIGINAL.chars().count()]);
        assert_eq!(result.diffs, vec![DiffSegment::equal(ORIGINAL)]);
    }

    #[test]
    fn check_wrong_field_type_degrades() {
        let reply = r#"{"correctedText": "changed", "issues": "none"}"#;
        let result = assemble_check(&extract(reply), ORIGINAL);
        assert_eq!(result.corrected_text, ORIGINAL);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].category, "system");
    }

    #[test]
    fn check_negative_position_degrades() {
        let reply = r#"{"correctedText": "changed", "issues": [{"start": -1}]}"#;
        let result = assemble_check(&extract(reply), ORIGINAL);
        assert_eq!(result.corrected_text, ORIGINAL);
        assert_eq!(result.issues[0].category, "system");
    }

    #[test]
    fn null_fields_read_as_missing() {
        let reply = r#"{"correctedText": null, "issues": null}"#;
        let result = assemble_check(&extract(reply), ORIGINAL);
        assert_eq!(result.corrected_text, ORIGINAL);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn check_range_counts_characters() {
        let result = assemble_check(&extract("no json"), "中文文本");
        assert_eq!(result.issues[0].range, [0, 4]);
    }

    #[test]
    fn polish_maps_changes() {
        let reply = r#"{
            "polishedText": "openEuler is an open-source OS.",
            "changes": [
                {"type": "grammar", "description": "article", "originalText": "a open",
                 "polishedText": "an open", "reason": "vowel sound"},
                {}
            ]
        }"#;
        let result = assemble_polish(&extract(reply), ORIGINAL);
        assert_eq!(result.polished_text, "openEuler is an open-source OS.");
        assert_eq!(result.changes.len(), 2);
        assert_eq!(result.changes[0].original_text, "a open");
        assert_eq!(result.changes[1].kind, "polish");
        assert_eq!(result.changes[1].reason, "");
        assert_eq!(modified_side(&result.diffs), result.polished_text);
    }

    #[test]
    fn polish_unparseable_reply_degrades() {
        let result = assemble_polish(&extract("<<garbage>>"), ORIGINAL);
        assert_eq!(result.polished_text, ORIGINAL);
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].kind, "system");
        assert_eq!(result.changes[0].original_text, ORIGINAL);
    }

    #[test]
    fn translate_success() {
        let reply = r#"Here you go: {"translatedText": "开源操作系统", "sourceLanguage": "en"}"#;
        let result = assemble_translate(&extract(reply), "open source OS", "auto", "zh-CN");
        assert_eq!(result.translated_text, "开源操作系统");
        assert_eq!(result.source_language, "auto");
        assert_eq!(result.target_language, "zh-CN");
        assert_eq!(original_side(&result.diffs), "open source OS");
    }

    #[test]
    fn translate_unparseable_never_echoes_original() {
        let result = assemble_translate(&extract("no idea"), "open source OS", "en", "fr");
        assert_eq!(result.translated_text, TRANSLATION_UNAVAILABLE);
        assert_ne!(result.translated_text, "open source OS");
        assert_eq!(result.source_language, "en");
        assert_eq!(result.target_language, "fr");
        assert_eq!(modified_side(&result.diffs), TRANSLATION_UNAVAILABLE);
    }

    #[test]
    fn translate_missing_field_uses_same_message() {
        let result = assemble_translate(&extract(r#"{"summary": "x"}"#), "text", "en", "de");
        assert_eq!(result.translated_text, TRANSLATION_UNAVAILABLE);
    }

    #[test]
    fn rewrite_success_and_conversation_id() {
        let reply = r#"{"rewrittenText": "Formal text.", "summary": "tone"}"#;
        let result = assemble_rewrite(&extract(reply), "casual text", "alice", 4);
        assert_eq!(result.rewritten_text, "Formal text.");
        assert_eq!(result.conversation_id, "alice_4");
    }

    #[test]
    fn rewrite_unparseable_reply_degrades() {
        let result = assemble_rewrite(&extract("plain prose"), "casual text", "bob", 0);
        assert_eq!(result.rewritten_text, REWRITE_UNAVAILABLE);
        assert_eq!(result.conversation_id, "bob_0");
    }

    #[test]
    fn rewrite_wrong_type_degrades() {
        let result = assemble_rewrite(&extract(r#"{"rewrittenText": 7}"#), "text", "bob", 1);
        assert_eq!(result.rewritten_text, REWRITE_UNAVAILABLE);
    }

    #[test]
    fn conversation_id_is_deterministic() {
        assert_eq!(conversation_id("carol", 2), conversation_id("carol", 2));
        assert_ne!(conversation_id("carol", 2), conversation_id("carol", 3));
        assert_ne!(conversation_id("carol", 2), conversation_id("dave", 2));
    }

    #[test]
    fn assemble_dispatches_by_operation() {
        let record = extract(r#"{"translatedText": "Hallo"}"#);
        let meta = RequestMeta {
            source_language: "en",
            target_language: "de",
            ..Default::default()
        };
        let result = assemble(Operation::Translate, &record, "Hello", &meta);
        assert_eq!(result.operation(), Operation::Translate);
        assert_eq!(result.final_text(), "Hallo");

        let rewrite_meta = RequestMeta {
            user_id: "erin",
            history_len: 1,
            ..Default::default()
        };
        match assemble(Operation::Rewrite, &extract("nope"), "Hello", &rewrite_meta) {
            TypedResult::Rewrite(r) => assert_eq!(r.conversation_id, "erin_1"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
