//! # Einstein Voice - Transcription Adapter
//!
//! Converts raw audio bytes into text via one of two interchangeable
//! providers:
//!
//! - [`RecognizerStt`] — generic speech recognizer; needs well-formed
//!   single-channel PCM/WAV and honors a locale hint.
//! - [`WhisperStt`] — transcription API; language auto-detected, bearer
//!   credential required.
//!
//! Both sit behind the [`SttBackend`] seam so the turn orchestrator (and
//! tests) never care which provider produced the text.

pub mod error;
pub mod stt;
pub mod wav;

pub use error::{SttError, SttResult};
pub use stt::{LanguageHint, RecognizerStt, SttBackend, WhisperStt};
pub use wav::{encode_mono_wav, validate_mono_pcm, WavSpec, MAX_AUDIO_BYTES};
