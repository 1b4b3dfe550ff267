//! Prompt templates, one per editing operation.
//!
//! Each template embeds the text and asks for a bare JSON object whose keys
//! match what [`crate::assemble`] reads back.

use scrivener_core::CheckRequest;

const JSON_ONLY: &str = "Return only the JSON object, with no other text.";

/// Names of the checks a request enables, in a fixed order.
pub fn check_types(req: &CheckRequest) -> Vec<&'static str> {
    let mut types = Vec::with_capacity(4);
    if req.enable_grammar {
        types.push("grammar");
    }
    if req.enable_style {
        types.push("writing style");
    }
    if req.enable_terminology {
        types.push("terminology");
    }
    if req.enable_consistency {
        types.push("consistency");
    }
    types
}

pub fn check_prompt(text: &str, check_types: &[&str], strict: bool) -> String {
    let scope = if check_types.is_empty() {
        "comprehensive".to_string()
    } else {
        check_types.join(", ")
    };
    let level = if strict { "strict" } else { "standard" };

    format!(
        "Perform a {level}-level {scope} review of the following technical document.\n\
         \n\
         Document:\n\
         {text}\n\
         \n\
         Look for:\n\
         1. Grammar and spelling errors\n\
         2. Terminology usage (in particular correct spelling of product names such as \"openEuler\")\n\
         3. Clarity and accuracy of expression\n\
         4. Logical consistency of the content\n\
         5. Accuracy of technical descriptions\n\
         \n\
         Reply with this JSON structure:\n\
         {{\n\
         \x20 \"correctedText\": \"the complete corrected text\",\n\
         \x20 \"issues\": [\n\
         \x20   {{\n\
         \x20     \"type\": \"grammar|terminology|style|consistency\",\n\
         \x20     \"severity\": \"error|warning|info\",\n\
         \x20     \"message\": \"what is wrong\",\n\
         \x20     \"suggestion\": \"how to fix it\",\n\
         \x20     \"start\": 0,\n\
         \x20     \"end\": 0,\n\
         \x20     \"originalText\": \"offending fragment\",\n\
         \x20     \"suggestedText\": \"replacement fragment\",\n\
         \x20     \"confidence\": 0.95\n\
         \x20   }}\n\
         \x20 ]\n\
         }}\n\
         \n\
         Notes:\n\
         1. {JSON_ONLY}\n\
         2. correctedText must contain the full corrected text.\n\
         3. Positions are character offsets starting at 0.\n\
         4. Confidence ranges from 0.0 to 1.0.\n\
         5. If there are no issues, return an empty issues array but still provide correctedText."
    )
}

fn focus_description(focus: Option<&str>) -> &'static str {
    match focus {
        Some("clarity") => "improving clarity and precision",
        Some("conciseness") => "making the wording more concise",
        Some("tone") => "adjusting tone and phrasing",
        Some("structure") => "improving structure and flow",
        _ => "improving overall quality",
    }
}

fn audience_description(audience: Option<&str>) -> &'static str {
    match audience {
        Some("general") => "general users",
        Some("beginner") => "beginners",
        Some("expert") => "experts",
        _ => "technical staff",
    }
}

pub fn polish_prompt(text: &str, focus: Option<&str>, audience: Option<&str>) -> String {
    let focus = focus_description(focus);
    let audience = audience_description(audience);

    format!(
        "Polish the following technical document, focusing on {focus}. The target readers are {audience}.\n\
         Keep technical terms accurate; do not change domain terminology.\n\
         \n\
         Original:\n\
         {text}\n\
         \n\
         Requirements:\n\
         1. Improve clarity and accuracy\n\
         2. Improve structure and logic\n\
         3. Keep technical descriptions correct\n\
         4. Keep a professional technical writing style\n\
         5. Preserve the core meaning and all important information\n\
         \n\
         Reply with this JSON structure:\n\
         {{\n\
         \x20 \"polishedText\": \"the complete polished text\",\n\
         \x20 \"changes\": [\n\
         \x20   {{\n\
         \x20     \"type\": \"clarity|conciseness|tone|structure|grammar\",\n\
         \x20     \"description\": \"what changed\",\n\
         \x20     \"originalText\": \"original fragment\",\n\
         \x20     \"polishedText\": \"polished fragment\",\n\
         \x20     \"reason\": \"why\"\n\
         \x20   }}\n\
         \x20 ]\n\
         }}\n\
         \n\
         {JSON_ONLY}"
    )
}

/// Display name for a language code; unknown codes are returned unchanged.
pub fn language_name(code: &str) -> &str {
    match code {
        "zh" | "zh-CN" => "Chinese",
        "en" | "en-US" => "English",
        "ja" => "Japanese",
        "ko" => "Korean",
        "fr" => "French",
        "de" => "German",
        "es" => "Spanish",
        "ru" => "Russian",
        "auto" => "the detected source language",
        other => other,
    }
}

pub fn translate_prompt(
    text: &str,
    source_language: &str,
    target_language: &str,
    preserve_terminology: bool,
) -> String {
    let source_name = language_name(source_language);
    let target_name = language_name(target_language);
    let terminology = if preserve_terminology {
        "Keep technical terms unchanged"
    } else {
        "Localise technical terms where appropriate"
    };

    format!(
        "Translate the following technical document from {source_name} to {target_name}.\n\
         \n\
         Original:\n\
         {text}\n\
         \n\
         Requirements:\n\
         1. Keep the document professional and accurate\n\
         2. {terminology}\n\
         3. Make the translation read naturally\n\
         4. Keep the original formatting and structure\n\
         5. Keep product names such as openEuler as they are\n\
         \n\
         Reply with this JSON structure:\n\
         {{\n\
         \x20 \"translatedText\": \"the complete translated text\",\n\
         \x20 \"sourceLanguage\": \"{source_language}\",\n\
         \x20 \"targetLanguage\": \"{target_language}\",\n\
         \x20 \"terminology\": [\n\
         \x20   {{\"original\": \"term\", \"translated\": \"translated term\", \"note\": \"remark\"}}\n\
         \x20 ]\n\
         }}\n\
         \n\
         {JSON_ONLY}"
    )
}

pub fn rewrite_prompt(text: &str, instruction: &str, preserve_terminology: bool) -> String {
    let terminology = if preserve_terminology {
        "\n\nKeep technical terms accurate; do not change domain terminology."
    } else {
        ""
    };

    format!(
        "You are a professional document rewriting assistant. Rewrite the text according to the user's instruction.\n\
         \n\
         Requirements:\n\
         1. Preserve the core meaning and important information\n\
         2. Follow the user's instruction\n\
         3. Make the result fluent, accurate and easy to read\n\
         4. Unless instructed otherwise, keep the original formatting and structure{terminology}\n\
         \n\
         Text to rewrite:\n\
         {text}\n\
         \n\
         User instruction: {instruction}\n\
         \n\
         Reply with this JSON structure:\n\
         {{\n\
         \x20 \"rewrittenText\": \"the complete rewritten text\",\n\
         \x20 \"changes\": [\n\
         \x20   {{\n\
         \x20     \"type\": \"content|structure|style|tone\",\n\
         \x20     \"description\": \"what changed\",\n\
         \x20     \"originalText\": \"original fragment\",\n\
         \x20     \"rewrittenText\": \"rewritten fragment\",\n\
         \x20     \"reason\": \"why\"\n\
         \x20   }}\n\
         \x20 ],\n\
         \x20 \"summary\": \"short summary of the rewrite\"\n\
         }}\n\
         \n\
         {JSON_ONLY}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_types_follow_flags() {
        let mut req = CheckRequest::new("x");
        assert_eq!(
            check_types(&req),
            vec!["grammar", "writing style", "terminology", "consistency"]
        );
        req.enable_style = false;
        req.enable_consistency = false;
        assert_eq!(check_types(&req), vec!["grammar", "terminology"]);
    }

    #[test]
    fn check_prompt_scope_and_level() {
        let prompt = check_prompt("some text", &[], true);
        assert!(prompt.contains("strict-level comprehensive review"));
        assert!(prompt.contains("some text"));
        assert!(prompt.contains("\"correctedText\""));

        let prompt = check_prompt("t", &["grammar", "terminology"], false);
        assert!(prompt.contains("standard-level grammar, terminology review"));
    }

    #[test]
    fn polish_prompt_unknown_values_use_defaults() {
        let prompt = polish_prompt("t", Some("vibes"), Some("aliens"));
        assert!(prompt.contains("improving overall quality"));
        assert!(prompt.contains("technical staff"));

        let prompt = polish_prompt("t", Some("conciseness"), Some("beginner"));
        assert!(prompt.contains("more concise"));
        assert!(prompt.contains("beginners"));
        assert!(prompt.contains("\"polishedText\""));
    }

    #[test]
    fn translate_prompt_names_languages() {
        let prompt = translate_prompt("hello", "en", "zh-CN", true);
        assert!(prompt.contains("from English to Chinese"));
        assert!(prompt.contains("Keep technical terms unchanged"));
        assert!(prompt.contains("\"targetLanguage\": \"zh-CN\""));

        let prompt = translate_prompt("hello", "auto", "tlh", false);
        assert!(prompt.contains("to tlh"));
        assert!(prompt.contains("Localise"));
    }

    #[test]
    fn rewrite_prompt_carries_instruction() {
        let prompt = rewrite_prompt("draft", "make it formal", true);
        assert!(prompt.contains("User instruction: make it formal"));
        assert!(prompt.contains("do not change domain terminology"));
        assert!(prompt.contains("\"rewrittenText\""));
        assert!(!rewrite_prompt("d", "i", false).contains("do not change domain terminology"));
    }

    #[test]
    fn prompts_are_deterministic() {
        assert_eq!(
            translate_prompt("a", "en", "fr", true),
            translate_prompt("a", "en", "fr", true)
        );
    }
}
