//! Application configuration, built once at startup and threaded into each
//! component constructor. Business logic never reads ambient globals.
//!
//! Sources, in priority order: `einstein.toml` profile file (avatar/voice
//! identity and presentation choices) > environment variables (credentials
//! and endpoints, usually via `.env` loaded by the binary).

use crate::error::{CoreError, CoreResult};
use crate::language::Language;
use einstein_avatar::{AvatarProfile, PollConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Which transcription provider handles audio input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SttProvider {
    /// Generic speech recognizer (locale-hinted, strict WAV framing).
    #[default]
    Recognizer,
    /// Transcription API (language auto-detected, bearer credential).
    Whisper,
}

impl FromStr for SttProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recognizer" | "google" => Ok(SttProvider::Recognizer),
            "whisper" | "transcription" => Ok(SttProvider::Whisper),
            other => Err(format!("unknown STT provider: {}", other)),
        }
    }
}

/// Everything the pipeline needs, resolved at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Generative-language API key (chat replies degrade without it).
    pub gemini_api_key: Option<String>,
    /// Streaming-avatar service API key (avatar controls disabled without it).
    pub avatar_api_key: Option<String>,
    /// Transcription API bearer key (Whisper provider).
    pub stt_api_key: Option<String>,
    /// Generic recognizer endpoint and optional key (Recognizer provider).
    pub recognizer_api_url: Option<String>,
    pub recognizer_api_key: Option<String>,

    pub chat_api_url: String,
    pub chat_model: String,
    pub avatar_api_url: String,
    pub stt_api_url: String,
    pub stt_model: String,

    pub stt_provider: SttProvider,
    /// UI-level language preference; used as the recognizer locale hint.
    pub default_language: Language,
    pub avatar: AvatarProfile,
    pub poll: PollConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            avatar_api_key: None,
            stt_api_key: None,
            recognizer_api_url: None,
            recognizer_api_key: None,
            chat_api_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            chat_model: "gemini-2.0-flash".to_string(),
            avatar_api_url: "https://api.heygen.com".to_string(),
            stt_api_url: "https://api.openai.com/v1".to_string(),
            stt_model: "whisper-1".to_string(),
            stt_provider: SttProvider::default(),
            default_language: Language::default(),
            avatar: AvatarProfile::default(),
            poll: PollConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read configuration from the environment. Unset or invalid values fall
    /// back to defaults (see `Default`).
    pub fn from_env() -> Self {
        let mut config = Self {
            gemini_api_key: env_opt_string("GEMINI_API_KEY"),
            avatar_api_key: env_opt_string("AVATAR_API_KEY")
                .or_else(|| env_opt_string("HEYGEN_API_KEY")),
            stt_api_key: env_opt_string("STT_API_KEY")
                .or_else(|| env_opt_string("OPENAI_API_KEY")),
            recognizer_api_url: env_opt_string("RECOGNIZER_API_URL"),
            recognizer_api_key: env_opt_string("RECOGNIZER_API_KEY"),
            ..Self::default()
        };

        if let Some(url) = env_opt_string("CHAT_API_URL") {
            config.chat_api_url = url;
        }
        if let Some(model) = env_opt_string("CHAT_MODEL") {
            config.chat_model = model;
        }
        if let Some(url) = env_opt_string("AVATAR_API_URL") {
            config.avatar_api_url = url;
        }
        if let Some(url) = env_opt_string("STT_API_URL") {
            config.stt_api_url = url;
        }
        if let Some(model) = env_opt_string("STT_MODEL") {
            config.stt_model = model;
        }
        if let Some(provider) = env_opt_string("STT_PROVIDER") {
            if let Ok(p) = provider.parse() {
                config.stt_provider = p;
            }
        }
        if let Some(lang) = env_opt_string("DEFAULT_LANGUAGE") {
            if let Ok(l) = lang.parse() {
                config.default_language = l;
            }
        }
        if let Some(attempts) = env_parse::<u32>("AVATAR_POLL_MAX_ATTEMPTS") {
            config.poll.max_attempts = attempts.max(1);
        }
        if let Some(secs) = env_parse::<u64>("AVATAR_POLL_INTERVAL_SECS") {
            config.poll.interval = Duration::from_secs(secs);
        }

        config
    }

    /// Environment plus `einstein.toml` overrides (profile file wins).
    /// A missing file is not an error; a malformed one is.
    pub fn load() -> CoreResult<Self> {
        let mut config = Self::from_env();
        let path = env_opt_string("EINSTEIN_PROFILE")
            .unwrap_or_else(|| "einstein.toml".to_string());
        if Path::new(&path).exists() {
            let profile = ProfileConfig::load_from_path(Path::new(&path))?;
            profile.apply(&mut config);
        }
        Ok(config)
    }
}

fn env_opt_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env_opt_string(name).and_then(|s| s.parse().ok())
}

/// User profile stored in `einstein.toml`: the knobs the source exposed as
/// sidebar settings (avatar/voice identity, language, provider choice).
/// Every field is optional; only set fields override the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default)]
    pub avatar_id: Option<String>,
    #[serde(default)]
    pub voice_id: Option<String>,
    #[serde(default)]
    pub voice_rate: Option<f32>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub default_language: Option<Language>,
    #[serde(default)]
    pub stt_provider: Option<SttProvider>,
    #[serde(default)]
    pub chat_model: Option<String>,
}

impl ProfileConfig {
    pub fn load_from_path(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| CoreError::Config(format!("invalid profile {}: {}", path.display(), e)))
    }

    /// Overlay the set fields onto a resolved config.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(ref v) = self.avatar_id {
            config.avatar.avatar_id = v.clone();
        }
        if let Some(ref v) = self.voice_id {
            config.avatar.voice_id = v.clone();
        }
        if let Some(v) = self.voice_rate {
            config.avatar.voice_rate = v;
        }
        if let Some(ref v) = self.quality {
            config.avatar.quality = v.clone();
        }
        if let Some(v) = self.default_language {
            config.default_language = v;
        }
        if let Some(v) = self.stt_provider {
            config.stt_provider = v;
        }
        if let Some(ref v) = self.chat_model {
            config.chat_model = v.clone();
        }
    }
}
