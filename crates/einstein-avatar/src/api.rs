//! Wire types and HTTP transport for the streaming-avatar service.
//!
//! Every call is a POST with a JSON body and a static `x-api-key` header.
//! Responses share one envelope shape: `{code, message, data}` where a
//! `code` of 100 (or `message == "success"`) marks success. The transport
//! only moves envelopes; interpreting them is the controller's job, which
//! keeps this seam mockable for tests.

use crate::error::{AvatarError, AvatarResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// `code` value the service uses for a successful call.
pub const CODE_SUCCESS: i64 = 100;

/// Voice settings inside the session-creation payload.
#[derive(Debug, Clone, Serialize)]
pub struct VoiceSettings {
    pub voice_id: String,
    pub rate: f32,
}

/// Payload for creating a new streaming session.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionRequest {
    pub quality: String,
    pub avatar_id: String,
    pub voice: VoiceSettings,
    pub video_encoding: String,
    pub disable_idle_timeout: bool,
    pub version: String,
}

/// Shared response envelope. All fields optional: malformed or partial
/// envelopes are a real failure mode the controller must classify.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    // No serde(default) here: it would put a `T: Default` bound on the
    // derived impl, and a missing `Option` field is `None` anyway.
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Success per the service contract: `code == 100` or `message == "success"`.
    pub fn is_success(&self) -> bool {
        self.code == Some(CODE_SUCCESS) || self.message.as_deref() == Some("success")
    }
}

/// `data` of a successful session-creation call.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSessionData {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// `data` of a successful speak-task submission.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskData {
    #[serde(default)]
    pub task_id: Option<String>,
}

/// `data` of a task-status poll.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatusData {
    #[serde(default)]
    pub status: Option<String>,
}

/// Transport seam for the streaming-avatar service. The production
/// implementation is [`StreamingHttp`]; tests substitute scripted fakes.
#[async_trait::async_trait]
pub trait StreamingApi: Send + Sync {
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> AvatarResult<Envelope<NewSessionData>>;

    async fn start_session(&self, session_id: &str) -> AvatarResult<Envelope<serde_json::Value>>;

    async fn send_task(&self, session_id: &str, text: &str) -> AvatarResult<Envelope<TaskData>>;

    async fn task_status(
        &self,
        session_id: &str,
        task_id: &str,
    ) -> AvatarResult<Envelope<TaskStatusData>>;

    async fn stop_session(&self, session_id: &str) -> AvatarResult<Envelope<serde_json::Value>>;
}

/// reqwest transport carrying the static API-key header on every call.
#[derive(Debug, Clone)]
pub struct StreamingHttp {
    /// Service root without trailing slash (e.g. https://api.heygen.com).
    pub base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl StreamingHttp {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> AvatarResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AvatarError::Config(
                "avatar service API key is not set".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| AvatarError::ServiceUnavailable(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            api_key,
            client,
        })
    }

    /// Build from environment: `AVATAR_API_URL` (default api.heygen.com) and
    /// `AVATAR_API_KEY` or `HEYGEN_API_KEY`.
    pub fn from_env() -> AvatarResult<Self> {
        let base_url = std::env::var("AVATAR_API_URL")
            .unwrap_or_else(|_| "https://api.heygen.com".to_string());
        let api_key = std::env::var("AVATAR_API_KEY")
            .or_else(|_| std::env::var("HEYGEN_API_KEY"))
            .map_err(|_| AvatarError::Config("AVATAR_API_KEY is not set".to_string()))?;
        Self::new(base_url, api_key)
    }

    async fn post<B, T>(&self, endpoint: &str, body: &B) -> AvatarResult<Envelope<T>>
    where
        B: Serialize + Sync,
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}/v1/{}", self.base_url.trim_end_matches('/'), endpoint);
        let res = self
            .client
            .post(&url)
            .header("accept", "application/json")
            .header("x-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AvatarError::ServiceUnavailable(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            // 4xx means the service rejected the payload or credential.
            if status.is_client_error() {
                return Err(AvatarError::Config(format!("{} {}: {}", endpoint, status, body)));
            }
            return Err(AvatarError::ServiceUnavailable(format!(
                "{} {}: {}",
                endpoint, status, body
            )));
        }
        res.json::<Envelope<T>>()
            .await
            .map_err(|e| AvatarError::Config(format!("{} returned malformed body: {}", endpoint, e)))
    }
}

#[derive(Serialize)]
struct SessionBody<'a> {
    session_id: &'a str,
}

#[derive(Serialize)]
struct TaskBody<'a> {
    session_id: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct TaskStatusBody<'a> {
    session_id: &'a str,
    task_id: &'a str,
}

#[async_trait::async_trait]
impl StreamingApi for StreamingHttp {
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> AvatarResult<Envelope<NewSessionData>> {
        self.post("streaming.new", request).await
    }

    async fn start_session(&self, session_id: &str) -> AvatarResult<Envelope<serde_json::Value>> {
        self.post("streaming.start", &SessionBody { session_id }).await
    }

    async fn send_task(&self, session_id: &str, text: &str) -> AvatarResult<Envelope<TaskData>> {
        self.post("streaming.task", &TaskBody { session_id, text }).await
    }

    async fn task_status(
        &self,
        session_id: &str,
        task_id: &str,
    ) -> AvatarResult<Envelope<TaskStatusData>> {
        self.post("streaming.task_status", &TaskStatusBody { session_id, task_id })
            .await
    }

    async fn stop_session(&self, session_id: &str) -> AvatarResult<Envelope<serde_json::Value>> {
        self.post("streaming.stop", &SessionBody { session_id }).await
    }
}
