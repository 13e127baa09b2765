//! # Einstein Avatar - Streaming Avatar Session Controller
//!
//! Owns the lifecycle of one remote streaming-avatar session
//! (`Absent → Created → Started`, back to `Absent` on stop) and synchronizes "speak this
//! text" commands with the remote task's completion via a bounded status
//! poll. The HTTP transport lives behind the [`StreamingApi`] seam so the
//! state machine is testable without a network.

pub mod api;
pub mod controller;
pub mod error;

pub use api::{
    CreateSessionRequest, Envelope, NewSessionData, StreamingApi, StreamingHttp, TaskData,
    TaskStatusData, VoiceSettings, CODE_SUCCESS,
};
pub use controller::{
    AvatarController, AvatarProfile, AvatarSession, PollConfig, SessionStatus, SpeakTask,
    TaskStatus,
};
pub use error::{AvatarError, AvatarResult};
