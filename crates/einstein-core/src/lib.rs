//! # Einstein Core - Conversational Science Tutor Pipeline
//!
//! The heart of the tutor: a persona-seeded conversation session over a
//! generative-language backend, a turn orchestrator that runs every user
//! turn (typed or spoken) through transcription, language bookkeeping,
//! chat, and optional avatar speech, and the application configuration
//! that wires the concrete providers together.
//!
//! Provider crates plug in at trait seams: [`einstein_voice::SttBackend`]
//! for transcription and [`einstein_avatar::StreamingApi`] for the
//! streaming avatar. The pipeline itself never touches HTTP directly.

pub mod chat;
pub mod config;
pub mod error;
pub mod language;
pub mod orchestrator;
pub mod persona;
pub mod transcript;

pub use chat::{ChatBackend, ChatRole, ChatTurn, ConversationSession, GeminiChat};
pub use config::{AppConfig, ProfileConfig, SttProvider};
pub use error::{CoreError, CoreResult};
pub use language::{detect, Language};
pub use orchestrator::{TurnInput, TurnOrchestrator, TurnOutcome};
pub use persona::{FALLBACK_REPLY, PERSONA_PROMPT, SCRIPTED_GREETING};
pub use transcript::{Role, Transcript, TranscriptEntry};
