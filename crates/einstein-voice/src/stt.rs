//! **Speech-to-Text (STT)** — convert submitted audio bytes into text for the orchestrator.
//!
//! Two interchangeable providers behind `SttBackend`: `RecognizerStt` (generic
//! speech recognizer, locale-hinted, strict about WAV framing) and `WhisperStt`
//! (transcription API, language auto-detected, bearer credential). Audio bytes
//! go straight into the request body; no temp files.

use crate::error::{SttError, SttResult};
use crate::wav;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Locale hint for providers that accept one. `Default` means the provider's
/// own default locale; `Korean` requests `ko-KR` recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanguageHint {
    #[default]
    Default,
    Korean,
}

impl LanguageHint {
    /// BCP-47 tag sent to locale-aware providers.
    pub fn locale(&self) -> &'static str {
        match self {
            LanguageHint::Korean => "ko-KR",
            LanguageHint::Default => "en-US",
        }
    }
}

/// Backend for converting audio bytes to text. Implement for remote
/// recognizers or local models; the orchestrator only sees this seam.
#[async_trait::async_trait]
pub trait SttBackend: Send + Sync {
    /// Transcribe one utterance. The hint is advisory; language-agnostic
    /// backends ignore it.
    async fn transcribe(&self, audio: &[u8], hint: LanguageHint) -> SttResult<String>;
}

/// Generic speech-recognition provider. Requires well-formed single-channel
/// PCM/WAV framing and accepts a locale hint; the recognizer's default locale
/// is used when the hint is `Default`.
#[derive(Debug, Clone)]
pub struct RecognizerStt {
    /// Recognition endpoint without trailing slash.
    pub base_url: String,
    /// Optional service key appended as a query parameter.
    pub api_key: Option<String>,
    client: reqwest::Client,
}

impl RecognizerStt {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> SttResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| SttError::ServiceUnavailable(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            api_key,
            client,
        })
    }

    /// Build from environment: `RECOGNIZER_API_URL` (required) and
    /// `RECOGNIZER_API_KEY` (optional).
    pub fn from_env() -> SttResult<Self> {
        let base_url = std::env::var("RECOGNIZER_API_URL")
            .map_err(|_| SttError::MissingCredential)?;
        let api_key = std::env::var("RECOGNIZER_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty());
        Self::new(base_url, api_key)
    }

    /// Pull the best transcript out of the recognizer's line-delimited JSON.
    /// Empty bodies and bodies with no alternatives mean no speech was found.
    fn extract_transcript(body: &str) -> Option<String> {
        for line in body.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else {
                continue;
            };
            let transcript = value
                .get("result")
                .and_then(|r| r.get(0))
                .and_then(|r| r.get("alternative"))
                .and_then(|a| a.get(0))
                .and_then(|a| a.get("transcript"))
                .and_then(|t| t.as_str());
            if let Some(t) = transcript {
                let t = t.trim();
                if !t.is_empty() {
                    return Some(t.to_string());
                }
            }
        }
        None
    }
}

#[async_trait::async_trait]
impl SttBackend for RecognizerStt {
    async fn transcribe(&self, audio: &[u8], hint: LanguageHint) -> SttResult<String> {
        let spec = wav::validate_mono_pcm(audio)?;

        let mut request = self
            .client
            .post(self.base_url.trim_end_matches('/'))
            .header(
                "content-type",
                format!("audio/l16; rate={}", spec.sample_rate),
            )
            .query(&[("output", "json"), ("lang", hint.locale())])
            .body(audio.to_vec());
        if let Some(ref key) = self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        let res = request
            .send()
            .await
            .map_err(|e| SttError::ServiceUnavailable(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(SttError::ServiceUnavailable(format!(
                "recognizer error {}: {}",
                status, body
            )));
        }
        let body = res
            .text()
            .await
            .map_err(|e| SttError::ServiceUnavailable(e.to_string()))?;
        match Self::extract_transcript(&body) {
            Some(text) => {
                tracing::debug!(bytes = audio.len(), "recognizer transcription complete");
                Ok(text)
            }
            None => {
                tracing::debug!("recognizer returned no alternatives");
                Err(SttError::Unintelligible)
            }
        }
    }
}

/// Transcription-API provider (Whisper-style). Language-agnostic: the backend
/// auto-detects, so the locale hint is ignored. Requires a bearer credential.
#[derive(Debug, Clone)]
pub struct WhisperStt {
    /// Base URL without trailing slash (e.g. https://api.openai.com/v1).
    pub base_url: String,
    /// Bearer API key.
    pub api_key: String,
    /// Model id, e.g. whisper-1.
    pub model: String,
    client: reqwest::Client,
}

impl WhisperStt {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> SttResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SttError::MissingCredential);
        }
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| SttError::ServiceUnavailable(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            api_key,
            model: model.into(),
            client,
        })
    }

    /// Build from environment: `STT_API_URL` (default api.openai.com/v1),
    /// `STT_API_KEY` or `OPENAI_API_KEY`, and `STT_MODEL` (default whisper-1).
    pub fn from_env() -> SttResult<Self> {
        let base_url = std::env::var("STT_API_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let api_key = std::env::var("STT_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .map_err(|_| SttError::MissingCredential)?;
        let model = std::env::var("STT_MODEL").unwrap_or_else(|_| "whisper-1".to_string());
        Self::new(base_url, api_key, model)
    }
}

#[async_trait::async_trait]
impl SttBackend for WhisperStt {
    async fn transcribe(&self, audio: &[u8], _hint: LanguageHint) -> SttResult<String> {
        if audio.is_empty() {
            return Err(SttError::Unintelligible);
        }
        if audio.len() > wav::MAX_AUDIO_BYTES {
            return Err(SttError::InvalidAudio(format!(
                "audio exceeds maximum size: {} bytes (limit: {} bytes)",
                audio.len(),
                wav::MAX_AUDIO_BYTES
            )));
        }
        let url = format!("{}/audio/transcriptions", self.base_url.trim_end_matches('/'));
        let part = reqwest::multipart::Part::bytes(audio.to_vec())
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| SttError::ServiceUnavailable(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SttError::ServiceUnavailable(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(SttError::ServiceUnavailable(format!(
                "transcription API error {}: {}",
                status, body
            )));
        }
        let json: serde_json::Value = res
            .json()
            .await
            .map_err(|e| SttError::ServiceUnavailable(e.to_string()))?;
        let text = json
            .get("text")
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .trim()
            .to_string();
        if text.is_empty() {
            return Err(SttError::Unintelligible);
        }
        tracing::debug!(bytes = audio.len(), model = %self.model, "transcription complete");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_locales() {
        assert_eq!(LanguageHint::Korean.locale(), "ko-KR");
        assert_eq!(LanguageHint::Default.locale(), "en-US");
    }

    #[test]
    fn extract_transcript_takes_first_alternative() {
        let body = r#"{"result":[]}
{"result":[{"alternative":[{"transcript":"why is the sky blue","confidence":0.93}],"final":true}],"result_index":0}"#;
        assert_eq!(
            RecognizerStt::extract_transcript(body).as_deref(),
            Some("why is the sky blue")
        );
    }

    #[test]
    fn extract_transcript_empty_body_is_none() {
        assert!(RecognizerStt::extract_transcript("").is_none());
        assert!(RecognizerStt::extract_transcript("{\"result\":[]}\n").is_none());
    }

    #[test]
    fn whisper_requires_credential() {
        let err = WhisperStt::new("https://api.openai.com/v1", "  ", "whisper-1").unwrap_err();
        assert!(matches!(err, SttError::MissingCredential));
    }

    #[tokio::test]
    async fn recognizer_rejects_bad_framing_without_network() {
        let stt = RecognizerStt::new("http://127.0.0.1:1", None).unwrap();
        let err = stt
            .transcribe(b"not a wav file", LanguageHint::Default)
            .await
            .unwrap_err();
        assert!(matches!(err, SttError::InvalidAudio(_)));
    }
}
