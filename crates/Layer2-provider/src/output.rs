//! Model output post-processing
//!
//! - reasoning trace (`<think>...</think>`) 제거
//! - strict JSON envelope 파싱 (선택적으로 코드 펜스 한 겹 허용)

use serde::de::DeserializeOwned;
use std::sync::OnceLock;
use thiserror::Error;

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

fn think_block() -> Option<&'static regex::Regex> {
    static RE: OnceLock<Option<regex::Regex>> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"(?s)<think>.*?</think>").ok())
        .as_ref()
}

/// Remove the reasoning trace from raw completion text and trim.
///
/// Only the first `<think>...</think>` block is removed. A dangling closing
/// tag (opening tag cut off by the server) drops everything before it.
pub fn strip_reasoning(raw: &str) -> String {
    let trimmed = raw.trim();

    if trimmed.contains(THINK_OPEN) {
        if let Some(re) = think_block() {
            return re.replacen(trimmed, 1, "").trim().to_string();
        }
    }

    match trimmed.find(THINK_CLOSE) {
        Some(idx) => trimmed[idx + THINK_CLOSE.len()..].trim().to_string(),
        None => trimmed.to_string(),
    }
}

// ============================================================================
// Envelope parsing
// ============================================================================

/// How much wrapping around a JSON envelope is tolerated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FenceTolerance {
    /// The text must be the JSON document itself
    Strict,
    /// One layer of ```` ``` ```` / ```` ```json ```` fencing is peeled off
    #[default]
    SingleFence,
}

/// Envelope parse failure
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid JSON envelope: {reason}")]
pub struct EnvelopeError {
    pub reason: String,
}

/// Peel exactly one fenced-code layer, if present.
pub fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if !(trimmed.starts_with("```") && trimmed.ends_with("```")) || trimmed.len() < 6 {
        return trimmed;
    }

    let inner = &trimmed[3..trimmed.len() - 3];
    // 언어 태그 (```json) 가 있으면 첫 줄 스킵
    match inner.find('\n') {
        Some(newline) if !inner[..newline].trim().contains('{') => inner[newline + 1..].trim(),
        _ => inner.trim_start_matches("json").trim(),
    }
}

/// Parse a model reply as a JSON envelope of type `T`.
pub fn parse_envelope<T: DeserializeOwned>(
    text: &str,
    tolerance: FenceTolerance,
) -> Result<T, EnvelopeError> {
    let body = match tolerance {
        FenceTolerance::Strict => text.trim(),
        FenceTolerance::SingleFence => strip_fence(text),
    };

    serde_json::from_str(body).map_err(|e| EnvelopeError {
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Envelope {
        output: String,
    }

    #[test]
    fn test_strip_reasoning_block() {
        let raw = "  <think>\nuser wants a refund\n</think>\n\nuse skill: refund  ";
        assert_eq!(strip_reasoning(raw), "use skill: refund");
    }

    #[test]
    fn test_strip_reasoning_only_first_block() {
        let raw = "<think>a</think>answer <think>b</think>";
        assert_eq!(strip_reasoning(raw), "answer <think>b</think>");
    }

    #[test]
    fn test_strip_reasoning_dangling_close() {
        assert_eq!(strip_reasoning("thinking...</think>\nno skill"), "no skill");
        assert_eq!(strip_reasoning("plain"), "plain");
    }

    #[test]
    fn test_parse_json_fence() {
        let text = "```json\n{\"output\":\"42\",\"resourcePath\":\"\"}\n```";
        let env: Envelope = parse_envelope(text, FenceTolerance::SingleFence).unwrap();
        assert_eq!(env.output, "42");
    }

    #[test]
    fn test_parse_bare_fence() {
        let text = "```\n{\"output\":\"ok\"}\n```";
        let env: Envelope = parse_envelope(text, FenceTolerance::SingleFence).unwrap();
        assert_eq!(env.output, "ok");
    }

    #[test]
    fn test_strict_rejects_fence() {
        let text = "```json\n{\"output\":\"42\"}\n```";
        assert!(parse_envelope::<Envelope>(text, FenceTolerance::Strict).is_err());
        assert!(parse_envelope::<Envelope>("{\"output\":\"42\"}", FenceTolerance::Strict).is_ok());
    }

    #[test]
    fn test_only_one_fence_layer() {
        let text = "```\n```json\n{\"output\":\"42\"}\n```\n```";
        assert!(parse_envelope::<Envelope>(text, FenceTolerance::SingleFence).is_err());
    }

    #[test]
    fn test_non_json_is_error() {
        let err = parse_envelope::<Envelope>("The answer is 42.", FenceTolerance::SingleFence)
            .unwrap_err();
        assert!(!err.reason.is_empty());
    }
}
