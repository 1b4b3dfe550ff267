//! Plain-text rendering of an editing result.
//!
//! The diff is shown inline with `[-deleted-]` and `{+inserted+}` markers,
//! followed by a card of per-operation metadata.

use std::fmt::Write;

use scrivener_core::{DiffKind, DiffSegment, TypedResult};

const MAX_LIST_ITEMS: usize = 20;

pub fn render(result: &TypedResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===", result.operation());
    out.push_str(&render_diff(result.diffs()));
    out.push_str("\n\n");

    match result {
        TypedResult::Check(check) => {
            let _ = writeln!(out, "Issues ({}):", check.issues.len());
            for issue in check.issues.iter().take(MAX_LIST_ITEMS) {
                let _ = writeln!(
                    out,
                    "  [{}/{}] {}..{} {}",
                    issue.severity, issue.category, issue.range[0], issue.range[1], issue.message
                );
                if !issue.suggestion.is_empty() {
                    let _ = writeln!(out, "      suggestion: {}", issue.suggestion);
                }
            }
            more(&mut out, check.issues.len());
        }
        TypedResult::Polish(polish) => {
            let _ = writeln!(out, "Changes ({}):", polish.changes.len());
            for change in polish.changes.iter().take(MAX_LIST_ITEMS) {
                let _ = writeln!(out, "  [{}] {}", change.kind, change.description);
                if !change.reason.is_empty() {
                    let _ = writeln!(out, "      reason: {}", change.reason);
                }
            }
            more(&mut out, polish.changes.len());
        }
        TypedResult::Translate(translate) => {
            let _ = writeln!(out, "  {:<14} {}", "source", translate.source_language);
            let _ = writeln!(out, "  {:<14} {}", "target", translate.target_language);
        }
        TypedResult::Rewrite(rewrite) => {
            let _ = writeln!(out, "  {:<14} {}", "conversation", rewrite.conversation_id);
        }
    }
    out
}

/// Inline diff: equal text as-is, deletions as `[-x-]`, insertions as `{+x+}`.
pub fn render_diff(segments: &[DiffSegment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment.kind {
            DiffKind::Equal => out.push_str(&segment.text),
            DiffKind::Delete => {
                let _ = write!(out, "[-{}-]", segment.text);
            }
            DiffKind::Insert => {
                let _ = write!(out, "{{+{}+}}", segment.text);
            }
        }
    }
    out
}

fn more(out: &mut String, len: usize) {
    if len > MAX_LIST_ITEMS {
        let _ = writeln!(out, "  ... and {} more", len - MAX_LIST_ITEMS);
    }
}
