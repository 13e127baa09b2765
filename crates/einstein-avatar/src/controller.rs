//! **Avatar Session Controller** — create, start, drive, and stop one
//! remote streaming-avatar session.
//!
//! The remote speak operation is asynchronous server-side, but turn-taking
//! upstream is strictly sequential, so `speak` synchronizes by polling the
//! task status a bounded number of times. State transitions are checked
//! locally: out-of-state calls never reach the network.

use crate::api::{CreateSessionRequest, StreamingApi, VoiceSettings};
use crate::error::{AvatarError, AvatarResult};
use std::time::Duration;
use tracing::{info, warn};

/// Session lifecycle. At most one session is live per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No session exists (initial state, and after `stop` or `reset`).
    Absent,
    /// Created remotely but not yet started.
    Created,
    /// Started; speak tasks may be issued.
    Started,
}

/// Remote state of one speak task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Processing,
    Complete,
    Failed,
}

impl TaskStatus {
    /// Unknown statuses count as non-terminal and keep the poll going.
    fn from_wire(status: &str) -> Self {
        match status {
            "complete" => TaskStatus::Complete,
            "failed" => TaskStatus::Failed,
            _ => TaskStatus::Processing,
        }
    }
}

/// One speak task as reported back to the caller.
#[derive(Debug, Clone)]
pub struct SpeakTask {
    pub task_id: String,
    pub status: TaskStatus,
}

/// Handle to the live remote session. `stream_url` and `access_token` are
/// what an external video player needs to attach to the stream.
#[derive(Debug, Clone)]
pub struct AvatarSession {
    pub session_id: String,
    pub access_token: String,
    pub stream_url: String,
}

/// Identity and encoding settings sent at session creation. Defaults match
/// the service's public demo avatar; real deployments override via config.
#[derive(Debug, Clone)]
pub struct AvatarProfile {
    pub avatar_id: String,
    pub voice_id: String,
    pub voice_rate: f32,
    pub quality: String,
    pub video_encoding: String,
    pub disable_idle_timeout: bool,
    pub version: String,
}

impl Default for AvatarProfile {
    fn default() -> Self {
        Self {
            avatar_id: "Ann_Therapist_public".to_string(),
            voice_id: "1bd001e7e50f421d891986aad5158bc8".to_string(),
            voice_rate: 1.0,
            quality: "medium".to_string(),
            video_encoding: "VP8".to_string(),
            disable_idle_timeout: false,
            version: "v2".to_string(),
        }
    }
}

/// Bounded-poll settings for `speak`. The interval is injectable so tests
/// can run the full attempt budget instantly.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Status checks before giving up with `Timeout`.
    pub max_attempts: u32,
    /// Sleep between non-terminal status checks.
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_secs(1),
        }
    }
}

/// Drives one streaming-avatar session over a [`StreamingApi`] transport.
pub struct AvatarController {
    api: Box<dyn StreamingApi>,
    profile: AvatarProfile,
    poll: PollConfig,
    status: SessionStatus,
    session: Option<AvatarSession>,
}

impl AvatarController {
    pub fn new(api: Box<dyn StreamingApi>, profile: AvatarProfile, poll: PollConfig) -> Self {
        Self {
            api,
            profile,
            poll,
            status: SessionStatus::Absent,
            session: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// The live session handle, if any.
    pub fn session(&self) -> Option<&AvatarSession> {
        self.session.as_ref()
    }

    /// Whether speak tasks may currently be issued.
    pub fn is_started(&self) -> bool {
        self.status == SessionStatus::Started
    }

    /// Forget the current session without a remote call.
    pub fn reset(&mut self) {
        self.status = SessionStatus::Absent;
        self.session = None;
    }

    /// Create a new remote session. Only valid when no session is live.
    pub async fn create(&mut self) -> AvatarResult<&AvatarSession> {
        if self.status != SessionStatus::Absent {
            return Err(AvatarError::Config(
                "an avatar session already exists; stop it first".to_string(),
            ));
        }

        let request = CreateSessionRequest {
            quality: self.profile.quality.clone(),
            avatar_id: self.profile.avatar_id.clone(),
            voice: VoiceSettings {
                voice_id: self.profile.voice_id.clone(),
                rate: self.profile.voice_rate,
            },
            video_encoding: self.profile.video_encoding.clone(),
            disable_idle_timeout: self.profile.disable_idle_timeout,
            version: self.profile.version.clone(),
        };

        let envelope = self.api.create_session(&request).await?;
        let data = envelope
            .data
            .ok_or_else(|| AvatarError::Config("session creation returned no data".to_string()))?;
        let (Some(session_id), Some(access_token), Some(stream_url)) =
            (data.session_id, data.access_token, data.url)
        else {
            return Err(AvatarError::Config(
                "session creation response is missing session_id, access_token, or url".to_string(),
            ));
        };

        info!(session_id = %session_id, avatar_id = %self.profile.avatar_id, "avatar session created");
        self.status = SessionStatus::Created;
        Ok(self.session.insert(AvatarSession {
            session_id,
            access_token,
            stream_url,
        }))
    }

    /// Start the created session. The remote does not define double-start,
    /// so this is only accepted from `Created`.
    pub async fn start(&mut self) -> AvatarResult<()> {
        if self.status != SessionStatus::Created {
            return Err(AvatarError::NotCreated);
        }
        let session_id = self.session_id()?.to_string();
        let envelope = self.api.start_session(&session_id).await?;
        if !envelope.is_success() {
            return Err(AvatarError::Config(format!(
                "start rejected: code={:?} message={:?}",
                envelope.code, envelope.message
            )));
        }
        info!(session_id = %session_id, "avatar session started");
        self.status = SessionStatus::Started;
        Ok(())
    }

    /// Submit a speak task and poll it to a terminal state.
    ///
    /// Rejected locally (no remote call) unless the session is `Started`.
    /// The poll is bounded: after `max_attempts` non-terminal statuses the
    /// result is `Timeout` and it is the caller's choice whether that turn
    /// still counts (the orchestrator shows the text either way).
    pub async fn speak(&mut self, text: &str) -> AvatarResult<SpeakTask> {
        if self.status != SessionStatus::Started {
            return Err(AvatarError::NotStarted);
        }
        let session_id = self.session_id()?.to_string();

        let envelope = self.api.send_task(&session_id, text).await?;
        if !envelope.is_success() {
            return Err(AvatarError::Config(format!(
                "speak task rejected: code={:?} message={:?}",
                envelope.code, envelope.message
            )));
        }
        let task_id = envelope
            .data
            .and_then(|d| d.task_id)
            .ok_or_else(|| AvatarError::Config("speak task returned no task_id".to_string()))?;

        let mut attempts = 0u32;
        loop {
            let status_envelope = self.api.task_status(&session_id, &task_id).await?;
            let status = status_envelope
                .data
                .ok_or_else(|| AvatarError::Config("task status returned no data".to_string()))?
                .status
                .unwrap_or_default();

            match TaskStatus::from_wire(&status) {
                TaskStatus::Complete => {
                    info!(session_id = %session_id, task_id = %task_id, attempts, "speak task complete");
                    return Ok(SpeakTask {
                        task_id,
                        status: TaskStatus::Complete,
                    });
                }
                TaskStatus::Failed => {
                    warn!(session_id = %session_id, task_id = %task_id, "speak task failed");
                    return Err(AvatarError::TaskFailed);
                }
                TaskStatus::Processing => {
                    attempts += 1;
                    if attempts >= self.poll.max_attempts {
                        return Err(AvatarError::Timeout { attempts });
                    }
                    tokio::time::sleep(self.poll.interval).await;
                }
            }
        }
    }

    /// Stop the session. On success the controller is back to `Absent` and
    /// a new session may be created.
    pub async fn stop(&mut self) -> AvatarResult<()> {
        match self.status {
            SessionStatus::Created | SessionStatus::Started => {}
            _ => return Err(AvatarError::NotCreated),
        }
        let session_id = self.session_id()?.to_string();
        let envelope = self.api.stop_session(&session_id).await?;
        if !envelope.is_success() {
            return Err(AvatarError::Config(format!(
                "stop rejected: code={:?} message={:?}",
                envelope.code, envelope.message
            )));
        }
        info!(session_id = %session_id, "avatar session stopped");
        self.status = SessionStatus::Absent;
        self.session = None;
        Ok(())
    }

    fn session_id(&self) -> AvatarResult<&str> {
        self.session
            .as_ref()
            .map(|s| s.session_id.as_str())
            .ok_or(AvatarError::NotCreated)
    }
}
