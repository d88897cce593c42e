use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{RequirementsError, Result};

fn json_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("static regex is valid"))
}

fn any_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```\s*(.*?)\s*```").expect("static regex is valid"))
}

/// Replace full-width punctuation models like to emit in otherwise valid JSON
pub fn normalize_punctuation(text: &str) -> String {
    text.replace('，', ",").replace('：', ":")
}

/// Pull the first JSON object out of an LLM reply.
///
/// Candidates are tried in order: ```` ```json ```` fences, any fence, then the
/// outermost `{...}` span. Candidates that parse to anything but an object are skipped.
pub fn extract_json(text: &str) -> Result<Value> {
    let text = normalize_punctuation(text);

    let fenced = json_fence()
        .captures_iter(&text)
        .chain(any_fence().captures_iter(&text))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()));

    let outermost = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&text[start..=end]),
        _ => None,
    };

    for candidate in fenced.chain(outermost) {
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) if value.is_object() => return Ok(value),
            Ok(_) => log::debug!("JSON candidate rejected: not an object"),
            Err(e) => log::debug!("JSON candidate rejected: {}", e),
        }
    }

    Err(RequirementsError::NoJson)
}

/// Strip a surrounding Markdown code fence, if the whole reply is one
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if !(trimmed.starts_with("```") && trimmed.ends_with("```") && trimmed.len() >= 6) {
        return trimmed;
    }
    let inner = &trimmed[3..trimmed.len() - 3];
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim()
}
