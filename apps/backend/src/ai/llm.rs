//! LLM decision provider over an OpenAI-compatible chat-completions API.
//!
//! Every decision is one request: a system prompt describing the rules and
//! the seat's role, a user prompt with the masked view, and a JSON answer
//! schema. Replies are parsed defensively; anything unparseable becomes an
//! [`AiError::InvalidDecision`] and the caller falls back to a random legal
//! choice.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::trait_def::{AiError, DecisionProvider, NightDecision, VoteDecision};
use crate::config::provider::ProviderConfig;
use crate::domain::player_view::PlayerView;
use crate::domain::roles::TargetOption;
use crate::domain::state::NightActionKind;

pub struct LlmProvider {
    client: reqwest::Client,
    cfg: ProviderConfig,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl LlmProvider {
    pub const NAME: &'static str = "LlmProvider";
    pub const VERSION: &'static str = "1.0.0";

    pub fn new(cfg: ProviderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            cfg,
        }
    }

    /// One chat-completions round trip. `json_mode` requests a JSON object
    /// answer and lowers the temperature.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        json_mode: bool,
    ) -> Result<String, AiError> {
        let mut body = json!({
            "model": self.cfg.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "temperature": if json_mode { 0.3 } else { 0.7 },
            "max_tokens": 500,
        });
        if json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }

        let response = self
            .client
            .post(self.cfg.completions_url())
            .bearer_auth(&self.cfg.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::Internal(format!("provider request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(AiError::Internal(format!(
                "provider returned {}",
                response.status()
            )));
        }
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::Internal(format!("provider response unreadable: {e}")))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AiError::Internal("provider returned no choices".to_string()))?;
        debug!(len = content.len(), "provider reply received");
        Ok(content)
    }

    fn system_prompt(view: &PlayerView) -> String {
        format!(
            "You are playing Werewolf as seat {alias}. Your role is {role:?}. \
             Players are called p1..pN. Stay in character, keep replies short, \
             and never reveal hidden information you should not know.",
            alias = view.alias,
            role = view.role,
        )
    }

    fn context_block(view: &PlayerView) -> String {
        serde_json::to_string_pretty(view).unwrap_or_else(|_| "{}".to_string())
    }
}

#[async_trait]
impl DecisionProvider for LlmProvider {
    async fn night_action(
        &self,
        view: &PlayerView,
        candidates: &[TargetOption],
    ) -> Result<NightDecision, AiError> {
        if candidates.is_empty() {
            return Ok(NightDecision {
                action: NightActionKind::None,
                target: None,
                reason: None,
            });
        }
        let options = serde_json::to_string(candidates).unwrap_or_default();
        let user = format!(
            "Game state:\n{}\n\nYour legal night options:\n{}\n\n\
             Answer as JSON: {{\"action\": \"<action>\", \"target\": \"<player>\", \"reason\": \"<short>\"}}",
            Self::context_block(view),
            options,
        );
        let reply = self.complete(&Self::system_prompt(view), &user, true).await?;
        let value = extract_json(&reply)
            .ok_or_else(|| AiError::InvalidDecision(format!("no JSON in reply: {reply}")))?;

        let action = value
            .get("action")
            .and_then(|v| v.as_str())
            .and_then(|s| serde_json::from_value(json!(s)).ok())
            .unwrap_or(NightActionKind::None);
        let target = value
            .get("target")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let reason = value
            .get("reason")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let legal = target
            .as_deref()
            .is_some_and(|t| candidates.iter().any(|c| c.id == t.trim()));
        if !legal {
            return Err(AiError::InvalidDecision(format!(
                "target {target:?} is not a legal option"
            )));
        }
        Ok(NightDecision {
            action,
            target,
            reason,
        })
    }

    async fn vote(&self, view: &PlayerView, candidates: &[String]) -> Result<VoteDecision, AiError> {
        if candidates.is_empty() {
            return Ok(VoteDecision {
                target: None,
                reason: None,
            });
        }
        let user = format!(
            "Game state:\n{}\n\nIt is time to vote out a suspect. Candidates: {}.\n\
             Answer as JSON: {{\"target\": \"<player>\", \"reason\": \"<short>\"}}",
            Self::context_block(view),
            candidates.join(", "),
        );
        let reply = self.complete(&Self::system_prompt(view), &user, true).await?;
        let value = extract_json(&reply)
            .ok_or_else(|| AiError::InvalidDecision(format!("no JSON in reply: {reply}")))?;
        let target = value
            .get("target")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|t| candidates.contains(t));
        let reason = value
            .get("reason")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        match target {
            Some(target) => Ok(VoteDecision {
                target: Some(target),
                reason,
            }),
            None => Err(AiError::InvalidDecision(
                "vote target is not a candidate".to_string(),
            )),
        }
    }

    async fn hunter_shot(
        &self,
        view: &PlayerView,
        candidates: &[String],
    ) -> Result<Option<String>, AiError> {
        if candidates.is_empty() {
            return Ok(None);
        }
        let user = format!(
            "Game state:\n{}\n\nYou are the hunter and you are dying. You may take one \
             player with you, or decline. Candidates: {}.\n\
             Answer as JSON: {{\"target\": \"<player or null>\"}}",
            Self::context_block(view),
            candidates.join(", "),
        );
        let reply = self.complete(&Self::system_prompt(view), &user, true).await?;
        let value = extract_json(&reply)
            .ok_or_else(|| AiError::InvalidDecision(format!("no JSON in reply: {reply}")))?;
        Ok(value
            .get("target")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|t| candidates.contains(t)))
    }

    async fn speak(&self, view: &PlayerView) -> Result<Vec<String>, AiError> {
        let user = format!(
            "Game state:\n{}\n\nIt is your turn to speak to the village. Give one to \
             three short messages a real player would say, as a JSON array of strings.",
            Self::context_block(view),
        );
        let reply = self.complete(&Self::system_prompt(view), &user, false).await?;
        Ok(parse_speech(&reply))
    }

    async fn wolf_speak(&self, view: &PlayerView) -> Result<Option<String>, AiError> {
        let user = format!(
            "Game state:\n{}\n\nSpeak one short line in the private wolf channel about \
             tonight's target, or reply with an empty string to stay quiet.",
            Self::context_block(view),
        );
        let reply = self.complete(&Self::system_prompt(view), &user, false).await?;
        let line = reply.trim().trim_matches('"').trim();
        Ok((!line.is_empty()).then(|| line.to_string()))
    }
}

/// Parse a whole reply as JSON, or salvage the first `{…}` block out of
/// surrounding prose.
fn extract_json(reply: &str) -> Option<serde_json::Value> {
    if let Ok(value) = serde_json::from_str(reply.trim()) {
        return Some(value);
    }
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&reply[start..=end]).ok()
}

/// Speech replies may be a JSON array, a JSON string, or bare prose. Cap at
/// three messages either way.
fn parse_speech(reply: &str) -> Vec<String> {
    let trimmed = reply.trim();
    if let Ok(serde_json::Value::Array(items)) = serde_json::from_str(trimmed) {
        let lines: Vec<String> = items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .filter(|s| !s.trim().is_empty())
            .take(3)
            .collect();
        if !lines.is_empty() {
            return lines;
        }
    }
    if let Ok(serde_json::Value::String(line)) = serde_json::from_str(trimmed) {
        if !line.trim().is_empty() {
            return vec![line];
        }
    }
    trimmed
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(3)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{extract_json, parse_speech};

    #[test]
    fn extracts_json_out_of_prose() {
        let reply = r#"Sure! Here is my choice: {"action": "kill", "target": "p3"} Good luck."#;
        let value = extract_json(reply).unwrap();
        assert_eq!(value["target"], "p3");
    }

    #[test]
    fn plain_json_parses_directly() {
        let value = extract_json(r#"{"target": "p1", "reason": "quiet"}"#).unwrap();
        assert_eq!(value["reason"], "quiet");
    }

    #[test]
    fn garbage_yields_none() {
        assert!(extract_json("I refuse to answer.").is_none());
        assert!(extract_json("} backwards {").is_none());
    }

    #[test]
    fn speech_accepts_array_string_or_prose() {
        assert_eq!(
            parse_speech(r#"["first", "second"]"#),
            vec!["first".to_string(), "second".to_string()]
        );
        assert_eq!(parse_speech(r#""just one line""#), vec!["just one line"]);
        assert_eq!(
            parse_speech("line a\n\nline b\nline c\nline d"),
            vec!["line a", "line b", "line c"]
        );
    }
}
