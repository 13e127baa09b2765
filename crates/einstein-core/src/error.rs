//! Error types for the core pipeline.
//!
//! Transcription and avatar errors stay in their own crates' types; the
//! orchestrator handles them at the seam (no-op turn, unvoiced reply)
//! instead of funneling them through here.

use thiserror::Error;

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in the conversation pipeline.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Missing or invalid configuration (credential, profile file, field value).
    #[error("configuration error: {0}")]
    Config(String),

    /// The generative-language backend failed (network, quota, malformed
    /// response). The conversation session degrades instead of propagating
    /// this to the user.
    #[error("chat backend error: {0}")]
    Chat(String),
}
