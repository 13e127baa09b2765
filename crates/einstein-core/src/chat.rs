//! **Conversation Session** — the ongoing dialogue with the
//! generative-language backend.
//!
//! The session owns the multi-turn history, seeded with the persona prompt
//! and one scripted greeting. `send` is deliberately infallible: any backend
//! failure rolls the half-appended user turn back and degrades to the fixed
//! bilingual apology, so a model outage never aborts a turn.

use crate::error::{CoreError, CoreResult};
use crate::persona::{FALLBACK_REPLY, PERSONA_PROMPT, SCRIPTED_GREETING};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Role in the model-facing history (distinct from the display transcript).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One turn of model-facing context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// Backend that completes an ordered history into the next model reply.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, history: &[ChatTurn]) -> CoreResult<String>;
}

/// Persistent multi-turn conversation over a [`ChatBackend`].
pub struct ConversationSession {
    backend: Box<dyn ChatBackend>,
    history: Vec<ChatTurn>,
}

impl ConversationSession {
    /// Create a session seeded with the persona prompt and the scripted
    /// greeting, so the first real user turn already has context.
    pub fn new(backend: Box<dyn ChatBackend>) -> Self {
        Self {
            backend,
            history: seed_history(),
        }
    }

    /// Send one user turn and return the reply.
    ///
    /// On success both turns are appended so later calls see them. On any
    /// backend failure the user turn is rolled back (the session is never
    /// left partially updated) and the fixed bilingual apology is returned.
    pub async fn send(&mut self, user_text: &str) -> String {
        self.history.push(ChatTurn::user(user_text));
        match self.backend.complete(&self.history).await {
            Ok(reply) => {
                self.history.push(ChatTurn::model(&reply));
                reply
            }
            Err(e) => {
                warn!(error = %e, "chat backend failed; degrading to fallback reply");
                self.history.pop();
                FALLBACK_REPLY.to_string()
            }
        }
    }

    /// Drop all exchanges and reseed with persona + greeting.
    pub fn reset(&mut self) {
        self.history = seed_history();
    }

    /// Model-facing history, including the seed turns. Append-only and
    /// unbounded; the backend sees the full context every call.
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }
}

fn seed_history() -> Vec<ChatTurn> {
    vec![
        ChatTurn::user(PERSONA_PROMPT),
        ChatTurn::model(SCRIPTED_GREETING),
    ]
}

// ---------------------------------------------------------------------------
// Generative-language HTTP backend
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Production chat backend: generative-language API, key passed per-request
/// in a header (never configured process-wide).
#[derive(Debug, Clone)]
pub struct GeminiChat {
    /// Base URL without trailing slash
    /// (e.g. https://generativelanguage.googleapis.com/v1beta).
    pub base_url: String,
    api_key: String,
    /// Model id, e.g. gemini-2.0-flash.
    pub model: String,
    client: reqwest::Client,
}

impl GeminiChat {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> CoreResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(CoreError::Config(
                "generative-language API key is not set".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| CoreError::Chat(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            api_key,
            model: model.into(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl ChatBackend for GeminiChat {
    async fn complete(&self, history: &[ChatTurn]) -> CoreResult<String> {
        let contents = history
            .iter()
            .map(|turn| Content {
                role: match turn.role {
                    ChatRole::User => "user",
                    ChatRole::Model => "model",
                },
                parts: vec![Part { text: &turn.text }],
            })
            .collect();
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let res = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateRequest { contents })
            .send()
            .await
            .map_err(|e| CoreError::Chat(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(CoreError::Chat(format!(
                "generative-language API error {}: {}",
                status, body
            )));
        }

        let parsed: GenerateResponse = res
            .json()
            .await
            .map_err(|e| CoreError::Chat(format!("malformed model response: {}", e)))?;
        let reply = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CoreError::Chat("model returned no candidates".to_string()))?;
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedReply(&'static str);

    #[async_trait::async_trait]
    impl ChatBackend for FixedReply {
        async fn complete(&self, _history: &[ChatTurn]) -> CoreResult<String> {
            Ok(self.0.to_string())
        }
    }

    struct AlwaysFails;

    #[async_trait::async_trait]
    impl ChatBackend for AlwaysFails {
        async fn complete(&self, _history: &[ChatTurn]) -> CoreResult<String> {
            Err(CoreError::Chat("quota exceeded".to_string()))
        }
    }

    #[tokio::test]
    async fn session_is_seeded_with_persona_and_greeting() {
        let session = ConversationSession::new(Box::new(FixedReply("hi")));
        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, ChatRole::User);
        assert_eq!(history[1].role, ChatRole::Model);
        assert_eq!(history[1].text, SCRIPTED_GREETING);
    }

    #[tokio::test]
    async fn send_appends_both_turns() {
        let mut session = ConversationSession::new(Box::new(FixedReply("light scatters!")));
        let reply = session.send("why is the sky blue?").await;
        assert_eq!(reply, "light scatters!");
        let history = session.history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[2], ChatTurn::user("why is the sky blue?"));
        assert_eq!(history[3], ChatTurn::model("light scatters!"));
    }

    #[tokio::test]
    async fn backend_failure_degrades_and_rolls_back() {
        let mut session = ConversationSession::new(Box::new(AlwaysFails));
        let reply = session.send("why is the sky blue?").await;
        assert_eq!(reply, FALLBACK_REPLY);
        // History is exactly the seed again: no partial update.
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn reset_reseeds_history() {
        let mut session = ConversationSession::new(Box::new(FixedReply("ok")));
        session.send("question one").await;
        assert_eq!(session.history().len(), 4);
        session.reset();
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[1].text, SCRIPTED_GREETING);
    }

    #[test]
    fn gemini_requires_key() {
        let err = GeminiChat::new("https://example", " ", "gemini-2.0-flash").unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }
}
