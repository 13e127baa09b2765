//! Error types for the transcription adapter.

use thiserror::Error;

/// Result type alias for transcription operations
pub type SttResult<T> = Result<T, SttError>;

/// Errors that can occur while turning audio into text.
///
/// These are tagged variants, never sentinel strings: the orchestrator
/// matches on the variant to decide whether a turn is a no-op.
#[derive(Error, Debug)]
pub enum SttError {
    /// No API credential was configured for the selected provider.
    #[error("no API credential configured for transcription")]
    MissingCredential,

    /// The backend parsed the audio but could not recognize any speech.
    #[error("speech could not be understood")]
    Unintelligible,

    /// The network call itself failed, or the service answered non-2xx.
    #[error("transcription service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The audio payload does not meet the provider's framing requirements.
    #[error("invalid audio payload: {0}")]
    InvalidAudio(String),
}
