//! **Turn Orchestrator** — the single pipeline every user turn flows
//! through: input acquisition, transcription, language bookkeeping, chat,
//! transcript commit, and optional avatar speech.
//!
//! Turns are all-or-nothing for the transcript: the (user, assistant) pair
//! is appended only once a reply exists, so an aborted turn leaves no
//! half-written state. Avatar speech is strictly best-effort; its failures
//! are logged and the turn still completes.

use crate::chat::ConversationSession;
use crate::language::{self, Language};
use crate::transcript::{Role, Transcript};
use einstein_avatar::AvatarController;
use einstein_voice::{LanguageHint, SttBackend, SttError};
use tracing::{debug, warn};

/// One user turn, as typed text or recorded audio bytes.
#[derive(Debug, Clone)]
pub enum TurnInput {
    Text(String),
    Audio(Vec<u8>),
}

/// What a turn produced.
#[derive(Debug)]
pub enum TurnOutcome {
    /// Nothing usable came in; the pipeline did not run and the transcript
    /// is unchanged. The reason says why (blank input, unintelligible
    /// speech, or a transcription service failure).
    NoInput { reason: SttError },
    /// A full exchange: the committed user text, the assistant reply (which
    /// may be the fallback apology), the detected language, and whether the
    /// avatar actually voiced the reply.
    Replied {
        user_text: String,
        reply: String,
        language: Language,
        spoken: bool,
    },
}

/// Owns the conversation state and drives each turn end to end.
pub struct TurnOrchestrator {
    session: ConversationSession,
    stt: Box<dyn SttBackend>,
    avatar: AvatarController,
    transcript: Transcript,
    default_language: Language,
    last_detected: Option<Language>,
}

impl TurnOrchestrator {
    pub fn new(
        session: ConversationSession,
        stt: Box<dyn SttBackend>,
        avatar: AvatarController,
        default_language: Language,
    ) -> Self {
        Self {
            session,
            stt,
            avatar,
            transcript: Transcript::new(),
            default_language,
            last_detected: None,
        }
    }

    /// Run one turn. Never returns an error: degraded paths are expressed
    /// in the outcome (`NoInput`, fallback reply, `spoken: false`).
    pub async fn handle_turn(&mut self, input: TurnInput) -> TurnOutcome {
        let user_text = match input {
            TurnInput::Text(text) => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    return TurnOutcome::NoInput {
                        reason: SttError::Unintelligible,
                    };
                }
                text
            }
            TurnInput::Audio(bytes) => match self.stt.transcribe(&bytes, self.hint()).await {
                Ok(text) => {
                    let text = text.trim().to_string();
                    if text.is_empty() {
                        return TurnOutcome::NoInput {
                            reason: SttError::Unintelligible,
                        };
                    }
                    text
                }
                Err(reason) => {
                    warn!(error = %reason, "transcription produced no usable text");
                    return TurnOutcome::NoInput { reason };
                }
            },
        };

        let detected = language::detect(&user_text);
        self.last_detected = Some(detected);
        debug!(language = %detected, "user turn accepted");

        // `send` is infallible; on backend failure it returns the fixed
        // bilingual apology. Either way the exchange is committed as a pair.
        let reply = self.session.send(&user_text).await;
        self.transcript.push(Role::User, &user_text);
        self.transcript.push(Role::Assistant, &reply);

        let mut spoken = false;
        if self.avatar.is_started() {
            match self.avatar.speak(&reply).await {
                Ok(task) => {
                    debug!(task_id = %task.task_id, "avatar voiced the reply");
                    spoken = true;
                }
                Err(e) => {
                    warn!(error = %e, "avatar speak failed; reply shown without voice");
                }
            }
        }

        TurnOutcome::Replied {
            user_text,
            reply,
            language: detected,
            spoken,
        }
    }

    /// Clear the transcript and reseed the chat session. The avatar session
    /// is independent and untouched.
    pub fn reset_conversation(&mut self) {
        self.session.reset();
        self.transcript = Transcript::new();
        self.last_detected = None;
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Language of the most recent accepted turn, if any.
    pub fn last_detected(&self) -> Option<Language> {
        self.last_detected
    }

    pub fn avatar(&self) -> &AvatarController {
        &self.avatar
    }

    /// Mutable avatar access for lifecycle commands (create/start/stop).
    pub fn avatar_mut(&mut self) -> &mut AvatarController {
        &mut self.avatar
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    fn hint(&self) -> LanguageHint {
        match self.default_language {
            Language::Korean => LanguageHint::Korean,
            Language::English => LanguageHint::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatBackend, ChatTurn};
    use crate::error::CoreResult;
    use einstein_avatar::{
        AvatarProfile, AvatarResult, CreateSessionRequest, Envelope, NewSessionData, PollConfig,
        StreamingApi, TaskData, TaskStatusData,
    };
    use einstein_voice::SttResult;

    struct EchoChat;

    #[async_trait::async_trait]
    impl ChatBackend for EchoChat {
        async fn complete(&self, history: &[ChatTurn]) -> CoreResult<String> {
            Ok(format!("about: {}", history.last().unwrap().text))
        }
    }

    struct FixedStt(&'static str);

    #[async_trait::async_trait]
    impl SttBackend for FixedStt {
        async fn transcribe(&self, _audio: &[u8], _hint: LanguageHint) -> SttResult<String> {
            Ok(self.0.to_string())
        }
    }

    /// Transport that must never be reached (avatar left un-started).
    struct UnreachableApi;

    #[async_trait::async_trait]
    impl StreamingApi for UnreachableApi {
        async fn create_session(
            &self,
            _request: &CreateSessionRequest,
        ) -> AvatarResult<Envelope<NewSessionData>> {
            panic!("unexpected remote call");
        }
        async fn start_session(
            &self,
            _session_id: &str,
        ) -> AvatarResult<Envelope<serde_json::Value>> {
            panic!("unexpected remote call");
        }
        async fn send_task(&self, _session_id: &str, _text: &str) -> AvatarResult<Envelope<TaskData>> {
            panic!("unexpected remote call");
        }
        async fn task_status(
            &self,
            _session_id: &str,
            _task_id: &str,
        ) -> AvatarResult<Envelope<TaskStatusData>> {
            panic!("unexpected remote call");
        }
        async fn stop_session(
            &self,
            _session_id: &str,
        ) -> AvatarResult<Envelope<serde_json::Value>> {
            panic!("unexpected remote call");
        }
    }

    fn orchestrator(stt: Box<dyn SttBackend>) -> TurnOrchestrator {
        TurnOrchestrator::new(
            ConversationSession::new(Box::new(EchoChat)),
            stt,
            AvatarController::new(
                Box::new(UnreachableApi),
                AvatarProfile::default(),
                PollConfig::default(),
            ),
            Language::English,
        )
    }

    #[tokio::test]
    async fn text_turn_commits_exactly_one_pair() {
        let mut orch = orchestrator(Box::new(FixedStt("unused")));
        let outcome = orch.handle_turn(TurnInput::Text("why is ice slippery?".into())).await;
        let TurnOutcome::Replied { user_text, reply, language, spoken } = outcome else {
            panic!("expected a reply");
        };
        assert_eq!(user_text, "why is ice slippery?");
        assert_eq!(reply, "about: why is ice slippery?");
        assert_eq!(language, Language::English);
        assert!(!spoken);
        assert_eq!(orch.transcript().len(), 2);
        assert_eq!(orch.transcript().entries()[0].role, Role::User);
        assert_eq!(orch.transcript().entries()[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn blank_text_is_a_no_op() {
        let mut orch = orchestrator(Box::new(FixedStt("unused")));
        let outcome = orch.handle_turn(TurnInput::Text("   ".into())).await;
        assert!(matches!(
            outcome,
            TurnOutcome::NoInput {
                reason: SttError::Unintelligible
            }
        ));
        assert!(orch.transcript().is_empty());
        assert_eq!(orch.last_detected(), None);
    }

    #[tokio::test]
    async fn audio_turn_goes_through_transcription() {
        let mut orch = orchestrator(Box::new(FixedStt("하늘은 왜 파란가요?")));
        let outcome = orch.handle_turn(TurnInput::Audio(vec![0u8; 16])).await;
        let TurnOutcome::Replied { user_text, language, .. } = outcome else {
            panic!("expected a reply");
        };
        assert_eq!(user_text, "하늘은 왜 파란가요?");
        assert_eq!(language, Language::Korean);
        assert_eq!(orch.last_detected(), Some(Language::Korean));
    }

    #[tokio::test]
    async fn reset_clears_transcript_and_reseeds_session() {
        let mut orch = orchestrator(Box::new(FixedStt("unused")));
        orch.handle_turn(TurnInput::Text("what is gravity?".into())).await;
        assert_eq!(orch.transcript().len(), 2);
        assert_eq!(orch.session().history().len(), 4);
        orch.reset_conversation();
        assert!(orch.transcript().is_empty());
        assert_eq!(orch.session().history().len(), 2);
        assert_eq!(orch.last_detected(), None);
    }
}
