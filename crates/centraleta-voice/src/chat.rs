//! Chat-completion client: translates caller speech into assistant replies.

use async_trait::async_trait;
use centraleta_dialog::{Translator, TurnError};
use centraleta_types::Turn;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default chat-completion endpoint base.
const DEFAULT_API_BASE: &str = "https://api.openai.com";

/// Timeout for one chat-completion call. The telephony provider holds the
/// line open while we wait, so this stays well under its webhook timeout.
const CHAT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Extracts the assistant reply text from a chat-completion response.
fn reply_from(response: ChatResponse) -> Result<String, TurnError> {
    let reply = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| TurnError::TranslationFailed("response contained no choices".to_string()))?;

    let reply = reply.trim();
    if reply.is_empty() {
        return Err(TurnError::TranslationFailed(
            "response contained an empty reply".to_string(),
        ));
    }
    Ok(reply.to_string())
}

/// Client for an OpenAI-style chat-completion endpoint.
///
/// Synchronous from the turn's point of view: one request, one reply, no
/// retries. Any transport, HTTP, or parse problem surfaces as
/// [`TurnError::TranslationFailed`] and is handled at the turn boundary.
#[derive(Debug, Clone)]
pub struct ChatTranslator {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl ChatTranslator {
    /// Creates a translator for the given credentials and model.
    ///
    /// `api_base` falls back to the public OpenAI endpoint when empty;
    /// tests point it at a local stub.
    pub fn new(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let api_base = api_base.into();
        let api_base = if api_base.trim().is_empty() {
            DEFAULT_API_BASE.to_string()
        } else {
            api_base.trim_end_matches('/').to_string()
        };

        Self {
            client: reqwest::Client::builder()
                .timeout(CHAT_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            api_base,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Translator for ChatTranslator {
    async fn translate(&self, window: &[Turn]) -> Result<String, TurnError> {
        if self.api_key.trim().is_empty() {
            return Err(TurnError::ConfigurationMissing(
                "chat API key is not configured".to_string(),
            ));
        }

        let request = ChatRequest {
            model: &self.model,
            messages: window
                .iter()
                .map(|turn| ChatMessage {
                    role: turn.role.as_wire_str(),
                    content: &turn.text,
                })
                .collect(),
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| TurnError::TranslationFailed(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TurnError::TranslationFailed(format!(
                "chat endpoint returned {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| TurnError::TranslationFailed(format!("malformed response: {e}")))?;

        reply_from(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_is_extracted_and_trimmed() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  Bon dia!  "}}]}"#,
        )
        .unwrap();
        assert_eq!(reply_from(response).unwrap(), "Bon dia!");
    }

    #[test]
    fn empty_choices_is_a_translation_failure() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            reply_from(response),
            Err(TurnError::TranslationFailed(_))
        ));
    }

    #[test]
    fn blank_reply_is_a_translation_failure() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"   "}}]}"#).unwrap();
        assert!(matches!(
            reply_from(response),
            Err(TurnError::TranslationFailed(_))
        ));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_network_call() {
        // api_base points nowhere routable; the call must fail on the key
        // check, not on the transport.
        let translator = ChatTranslator::new("", "http://127.0.0.1:1", "gpt-4o");
        let result = translator.translate(&[Turn::system("persona")]).await;
        assert!(matches!(result, Err(TurnError::ConfigurationMissing(_))));
    }

    #[test]
    fn request_serializes_wire_roles() {
        let turns = [
            Turn::system("persona"),
            Turn::caller("hola"),
            Turn::assistant("bon dia"),
        ];
        let request = ChatRequest {
            model: "gpt-4o",
            messages: turns
                .iter()
                .map(|t| ChatMessage {
                    role: t.role.as_wire_str(),
                    content: &t.text,
                })
                .collect(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][2]["role"], "assistant");
        assert_eq!(json["model"], "gpt-4o");
    }
}
