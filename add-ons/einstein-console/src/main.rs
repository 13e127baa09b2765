//! Einstein Console
//!
//! Interactive terminal front-end for the science tutor: type a question
//! and get a persona reply; feed a WAV file through `/audio` to exercise
//! the transcription path; drive the streaming avatar with `/avatar`.

use einstein_avatar::{
    AvatarController, AvatarError, AvatarResult, CreateSessionRequest, Envelope, NewSessionData,
    SessionStatus, StreamingApi, StreamingHttp, TaskData, TaskStatusData,
};
use einstein_core::{
    AppConfig, ConversationSession, GeminiChat, SttProvider, TurnInput, TurnOrchestrator,
    TurnOutcome,
};
use einstein_voice::{LanguageHint, RecognizerStt, SttBackend, SttError, SttResult, WhisperStt};
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// STT stand-in used when the configured provider has no credentials.
/// Audio turns degrade to a no-op with a clear reason instead of crashing.
struct UnconfiguredStt;

#[async_trait::async_trait]
impl SttBackend for UnconfiguredStt {
    async fn transcribe(&self, _audio: &[u8], _hint: LanguageHint) -> SttResult<String> {
        Err(SttError::MissingCredential)
    }
}

/// Avatar transport stand-in used when no avatar API key is configured.
/// Lifecycle commands fail locally with a configuration error.
struct UnconfiguredAvatar;

#[async_trait::async_trait]
impl StreamingApi for UnconfiguredAvatar {
    async fn create_session(
        &self,
        _request: &CreateSessionRequest,
    ) -> AvatarResult<Envelope<NewSessionData>> {
        Err(AvatarError::Config(
            "avatar service API key is not set".to_string(),
        ))
    }
    async fn start_session(&self, _session_id: &str) -> AvatarResult<Envelope<serde_json::Value>> {
        Err(AvatarError::Config(
            "avatar service API key is not set".to_string(),
        ))
    }
    async fn send_task(&self, _session_id: &str, _text: &str) -> AvatarResult<Envelope<TaskData>> {
        Err(AvatarError::Config(
            "avatar service API key is not set".to_string(),
        ))
    }
    async fn task_status(
        &self,
        _session_id: &str,
        _task_id: &str,
    ) -> AvatarResult<Envelope<TaskStatusData>> {
        Err(AvatarError::Config(
            "avatar service API key is not set".to_string(),
        ))
    }
    async fn stop_session(&self, _session_id: &str) -> AvatarResult<Envelope<serde_json::Value>> {
        Err(AvatarError::Config(
            "avatar service API key is not set".to_string(),
        ))
    }
}

fn build_stt(config: &AppConfig) -> Box<dyn SttBackend> {
    match config.stt_provider {
        SttProvider::Recognizer => match config.recognizer_api_url.as_deref() {
            Some(url) => match RecognizerStt::new(url, config.recognizer_api_key.clone()) {
                Ok(stt) => return Box::new(stt),
                Err(e) => tracing::warn!(error = %e, "recognizer STT unavailable"),
            },
            None => tracing::warn!("RECOGNIZER_API_URL not set; audio input disabled"),
        },
        SttProvider::Whisper => match config.stt_api_key.as_deref() {
            Some(key) => {
                match WhisperStt::new(&config.stt_api_url, key, &config.stt_model) {
                    Ok(stt) => return Box::new(stt),
                    Err(e) => tracing::warn!(error = %e, "whisper STT unavailable"),
                }
            }
            None => tracing::warn!("STT_API_KEY not set; audio input disabled"),
        },
    }
    Box::new(UnconfiguredStt)
}

fn build_avatar(config: &AppConfig) -> AvatarController {
    let api: Box<dyn StreamingApi> = match config.avatar_api_key.as_deref() {
        Some(key) => match StreamingHttp::new(&config.avatar_api_url, key) {
            Ok(http) => Box::new(http),
            Err(e) => {
                tracing::warn!(error = %e, "avatar transport unavailable");
                Box::new(UnconfiguredAvatar)
            }
        },
        None => {
            tracing::warn!("AVATAR_API_KEY not set; avatar commands disabled");
            Box::new(UnconfiguredAvatar)
        }
    };
    AvatarController::new(api, config.avatar.clone(), config.poll)
}

const HELP: &str = "\
commands:
  /avatar start   create and start a streaming-avatar session
  /avatar stop    stop the current avatar session
  /audio <path>   transcribe a WAV file and run it as a turn
  /reset          clear the conversation and start fresh
  /help           this text
  /quit           exit
anything else is sent to Einstein as a question";

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[einstein-console] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().expect("load configuration");

    let Some(ref gemini_key) = config.gemini_api_key else {
        eprintln!("GEMINI_API_KEY is not set; the tutor cannot answer without it");
        std::process::exit(1);
    };
    let chat = GeminiChat::new(&config.chat_api_url, gemini_key, &config.chat_model)
        .expect("build chat backend");

    let mut orchestrator = TurnOrchestrator::new(
        ConversationSession::new(Box::new(chat)),
        build_stt(&config),
        build_avatar(&config),
        config.default_language,
    );

    tracing::info!(
        chat_model = %config.chat_model,
        stt_provider = ?config.stt_provider,
        default_language = %config.default_language,
        "einstein console started"
    );

    println!("einstein> Greetings! Ask me anything about science. (/help for commands)");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if !dispatch(&mut orchestrator, line.trim()).await {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "stdin read failed");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("CTRL-C received; shutting down");
                break;
            }
        }
    }

    // Best-effort remote cleanup so the session does not idle on the server.
    if matches!(
        orchestrator.avatar().status(),
        SessionStatus::Created | SessionStatus::Started
    ) {
        if let Err(e) = orchestrator.avatar_mut().stop().await {
            tracing::warn!(error = %e, "could not stop avatar session on exit");
        }
    }
}

/// Handle one input line. Returns false when the loop should exit.
async fn dispatch(orchestrator: &mut TurnOrchestrator, line: &str) -> bool {
    match line {
        "" => {}
        "/quit" | "/exit" => return false,
        "/help" => println!("{}", HELP),
        "/reset" => {
            orchestrator.reset_conversation();
            println!("einstein> Fresh start! What shall we explore?");
        }
        "/avatar start" => {
            let avatar = orchestrator.avatar_mut();
            match avatar.create().await {
                Ok(session) => {
                    println!("avatar session: {}", session.session_id);
                    println!("stream url:    {}", session.stream_url);
                    println!("access token:  {}", session.access_token);
                }
                Err(e) => {
                    println!("avatar error: {}", e);
                    return true;
                }
            }
            match avatar.start().await {
                Ok(()) => println!("avatar is live; replies will be spoken"),
                Err(e) => println!("avatar error: {}", e),
            }
        }
        "/avatar stop" => match orchestrator.avatar_mut().stop().await {
            Ok(()) => println!("avatar stopped"),
            Err(e) => println!("avatar error: {}", e),
        },
        _ => {
            let input = if let Some(path) = line.strip_prefix("/audio ") {
                match tokio::fs::read(path.trim()).await {
                    Ok(bytes) => TurnInput::Audio(bytes),
                    Err(e) => {
                        println!("cannot read {}: {}", path.trim(), e);
                        return true;
                    }
                }
            } else if line.starts_with('/') {
                println!("unknown command: {} (/help for commands)", line);
                return true;
            } else {
                TurnInput::Text(line.to_string())
            };

            match orchestrator.handle_turn(input).await {
                TurnOutcome::Replied {
                    user_text,
                    reply,
                    language,
                    spoken,
                } => {
                    tracing::debug!(language = %language, "turn language recorded");
                    println!("you>      {}", user_text);
                    println!(
                        "einstein> {}{}",
                        reply,
                        if spoken { "  [spoken]" } else { "" }
                    );
                }
                TurnOutcome::NoInput { reason } => {
                    println!("(no usable input: {})", reason);
                }
            }
        }
    }
    true
}
