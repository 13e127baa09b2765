//! Error types for the avatar session controller.

use thiserror::Error;

/// Result type alias for avatar operations
pub type AvatarResult<T> = Result<T, AvatarError>;

/// Errors from the streaming-avatar service and its local state machine.
#[derive(Error, Debug)]
pub enum AvatarError {
    /// Missing/invalid credential or the remote rejected the payload shape.
    /// Fatal to the attempted operation; never retried automatically.
    #[error("avatar configuration error: {0}")]
    Config(String),

    /// Transport-level failure or a non-success response from the service.
    #[error("avatar service unavailable: {0}")]
    ServiceUnavailable(String),

    /// A session must be created before it can be started or stopped.
    #[error("no avatar session has been created")]
    NotCreated,

    /// Speak tasks require a started session; no remote call is made.
    #[error("avatar session is not started")]
    NotStarted,

    /// The remote speak task reported terminal failure.
    #[error("avatar speak task failed")]
    TaskFailed,

    /// The speak task never reached a terminal state within the poll budget.
    #[error("avatar speak task still pending after {attempts} status checks")]
    Timeout { attempts: u32 },
}
