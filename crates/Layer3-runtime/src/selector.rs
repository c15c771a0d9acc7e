//! Skill selector
//!
//! 카탈로그(이름 + 설명)와 사용자 입력으로 최대 한 개의 Skill 을 고릅니다.
//! 모델은 정확히 두 가지 형식 중 하나로만 답해야 합니다:
//!
//! ```text
//! no skill
//! use skill: <name>
//! ```

use skillflow_core::SkillDescriptor;
use skillflow_foundation::{Deadline, Error};
use skillflow_provider::{CompletionClient, CompletionRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Reply marker: nothing in the catalog fits
pub const NO_SKILL_MARKER: &str = "no skill";

/// Reply marker prefix: the named skill fits
pub const USE_SKILL_MARKER: &str = "use skill:";

const SYSTEM_PROMPT: &str = "You are a skill router. Decide whether one of the listed skills \
should handle the user's request. Answer with exactly one line and nothing else: \
either `no skill`, or `use skill: <name>` where <name> is copied verbatim from the list.";

/// Chooses at most one skill for an utterance
pub struct SkillSelector {
    client: Arc<dyn CompletionClient>,
    temperature: f32,
    timeout: Duration,
}

impl SkillSelector {
    pub fn new(client: Arc<dyn CompletionClient>, temperature: f32, timeout: Duration) -> Self {
        Self {
            client,
            temperature,
            timeout,
        }
    }

    /// Select a skill for `input`
    ///
    /// Returns an empty list for an empty catalog (no completion call), for a
    /// failed completion call, and for any reply that is not one of the two
    /// canonical forms.
    pub async fn select(&self, input: &str, catalog: &[SkillDescriptor]) -> Vec<String> {
        if catalog.is_empty() {
            debug!("Empty catalog, skipping selection");
            return Vec::new();
        }

        let request = CompletionRequest::system_user(
            SYSTEM_PROMPT,
            build_prompt(input, catalog),
            self.temperature,
        );
        let deadline = Deadline::after(self.timeout);

        let reply = match self.client.complete_within(request, &deadline).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("{}; using empty selection", Error::SelectionFailure(e.to_string()));
                return Vec::new();
            }
        };

        match parse_selection(&reply, catalog) {
            Some(name) => {
                info!("Selected skill '{}'", name);
                vec![name]
            }
            None => {
                debug!("No skill selected (reply: {:?})", reply);
                Vec::new()
            }
        }
    }
}

/// Enumerated listing of the catalog plus the user's request
pub fn build_prompt(input: &str, catalog: &[SkillDescriptor]) -> String {
    let mut prompt = String::from("Available skills:\n");
    for (idx, skill) in catalog.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. {}: {}\n",
            idx + 1,
            skill.name,
            skill.description
        ));
    }
    prompt.push_str(&format!(
        "\nUser request:\n{}\n\nReply with `{}` or `{} <name>`.",
        input.trim(),
        NO_SKILL_MARKER,
        USE_SKILL_MARKER
    ));
    prompt
}

/// Parse a selector reply against the catalog
///
/// `no skill` wins when both markers appear. The name is the rest of the line
/// after `use skill:`, and must equal a catalog name exactly.
///
/// The markers are plain substrings, so a skill whose name contains
/// `no skill` (e.g. `casino skill-tracker`) can never be selected.
pub fn parse_selection(reply: &str, catalog: &[SkillDescriptor]) -> Option<String> {
    if reply.contains(NO_SKILL_MARKER) {
        return None;
    }

    let start = reply.find(USE_SKILL_MARKER)? + USE_SKILL_MARKER.len();
    let name = reply[start..]
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches(|c| matches!(c, '`' | '"' | '\'' | '<' | '>'))
        .trim();

    catalog
        .iter()
        .find(|skill| skill.name == name)
        .map(|skill| skill.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillflow_provider::{ProviderError, ScriptedClient};
    use std::path::PathBuf;

    fn skill(name: &str, description: &str) -> SkillDescriptor {
        SkillDescriptor {
            name: name.into(),
            description: description.into(),
            location: PathBuf::from(format!("/skills/{}", name)),
        }
    }

    fn selector(client: &Arc<ScriptedClient>) -> SkillSelector {
        SkillSelector::new(client.clone(), 0.1, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_empty_catalog_skips_client() {
        let client = Arc::new(ScriptedClient::with_replies(["use skill: refund"]));
        let picked = selector(&client).select("I want a refund", &[]).await;

        assert!(picked.is_empty());
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_refund_scenario() {
        let client = Arc::new(ScriptedClient::with_replies(["use skill: refund"]));
        let catalog = vec![skill("refund", "handles refund requests")];

        let picked = selector(&client).select("I want a refund", &catalog).await;
        assert_eq!(picked, vec!["refund".to_string()]);

        let requests = client.requests();
        let sent = &requests[0];
        assert_eq!(sent.temperature, 0.1);
        let prompt = sent.user_prompt().unwrap();
        assert!(prompt.contains("1. refund: handles refund requests"));
        assert!(prompt.contains("I want a refund"));
    }

    #[tokio::test]
    async fn test_client_failure_degrades() {
        let client = Arc::new(ScriptedClient::new());
        client.push_error(ProviderError::ServerError("down".into()));
        let catalog = vec![skill("refund", "handles refund requests")];

        assert!(selector(&client).select("refund", &catalog).await.is_empty());
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_reasoning_trace_removed_before_parse() {
        let client = Arc::new(ScriptedClient::with_replies([
            "<think>the user wants money back</think>\nuse skill: refund",
        ]));
        let catalog = vec![skill("refund", "handles refund requests")];
        assert_eq!(
            selector(&client).select("refund", &catalog).await,
            vec!["refund".to_string()]
        );
    }

    #[test]
    fn test_parse_selection_forms() {
        let catalog = vec![skill("refund", "r"), skill("weather", "w")];

        assert_eq!(parse_selection("use skill: weather", &catalog).as_deref(), Some("weather"));
        assert_eq!(parse_selection("use skill: `refund`\nbecause...", &catalog).as_deref(), Some("refund"));
        assert_eq!(parse_selection("no skill", &catalog), None);
        assert_eq!(parse_selection("no skill. use skill: refund", &catalog), None);
    }

    #[test]
    fn test_parse_selection_requires_exact_name() {
        let catalog = vec![skill("refund", "r")];

        assert_eq!(parse_selection("use skill: refunds", &catalog), None);
        assert_eq!(parse_selection("use skill: Refund", &catalog), None);
        assert_eq!(parse_selection("I think refund fits", &catalog), None);
        assert_eq!(parse_selection("", &catalog), None);
    }

    #[test]
    fn test_name_containing_no_skill_marker_is_unselectable() {
        let catalog = vec![skill("casino skill-tracker", "c")];

        assert_eq!(parse_selection("use skill: casino skill-tracker", &catalog), None);
    }
}
