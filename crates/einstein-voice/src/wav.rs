//! WAV framing checks and encoding for the generic recognizer.
//!
//! The recognizer provider only accepts well-formed single-channel PCM, so
//! uploads are validated up front instead of letting the backend reject them
//! with an opaque error. `encode_mono_wav` is the inverse: it wraps raw PCM
//! captured elsewhere into the 44-byte-header layout the providers expect.

use crate::error::{SttError, SttResult};

/// Maximum audio input size (10 MiB). Prevents OOM from oversized payloads.
pub const MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;

/// Parsed `fmt ` chunk fields we care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

fn read_u16(bytes: &[u8], at: usize) -> Option<u16> {
    bytes.get(at..at + 2).map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Parse the RIFF/WAVE header and return the format fields.
///
/// Walks the chunk list rather than assuming the `fmt ` chunk sits at byte 12,
/// since some encoders insert LIST/INFO chunks first.
pub fn parse_header(bytes: &[u8]) -> SttResult<WavSpec> {
    if bytes.len() > MAX_AUDIO_BYTES {
        return Err(SttError::InvalidAudio(format!(
            "audio exceeds maximum size: {} bytes (limit: {} bytes)",
            bytes.len(),
            MAX_AUDIO_BYTES
        )));
    }
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(SttError::InvalidAudio(
            "not a RIFF/WAVE container".to_string(),
        ));
    }

    let mut pos = 12usize;
    while pos + 8 <= bytes.len() {
        let chunk_id = &bytes[pos..pos + 4];
        let chunk_len = read_u32(bytes, pos + 4).unwrap_or(0) as usize;
        if chunk_id == b"fmt " {
            let audio_format = read_u16(bytes, pos + 8)
                .ok_or_else(|| SttError::InvalidAudio("truncated fmt chunk".to_string()))?;
            if audio_format != 1 {
                return Err(SttError::InvalidAudio(format!(
                    "unsupported audio format {} (expected PCM)",
                    audio_format
                )));
            }
            let channels = read_u16(bytes, pos + 10)
                .ok_or_else(|| SttError::InvalidAudio("truncated fmt chunk".to_string()))?;
            let sample_rate = read_u32(bytes, pos + 12)
                .ok_or_else(|| SttError::InvalidAudio("truncated fmt chunk".to_string()))?;
            let bits_per_sample = read_u16(bytes, pos + 22)
                .ok_or_else(|| SttError::InvalidAudio("truncated fmt chunk".to_string()))?;
            return Ok(WavSpec {
                channels,
                sample_rate,
                bits_per_sample,
            });
        }
        // Chunks are word-aligned; odd lengths carry a pad byte.
        pos += 8 + chunk_len + (chunk_len & 1);
    }

    Err(SttError::InvalidAudio("no fmt chunk found".to_string()))
}

/// Validate the single-channel PCM precondition for the recognizer provider.
pub fn validate_mono_pcm(bytes: &[u8]) -> SttResult<WavSpec> {
    let spec = parse_header(bytes)?;
    if spec.channels != 1 {
        return Err(SttError::InvalidAudio(format!(
            "expected mono audio, got {} channels",
            spec.channels
        )));
    }
    Ok(spec)
}

/// Encode 16-bit mono PCM samples to WAV bytes for API upload.
pub fn encode_mono_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let data_len = samples.len() * 2;
    let file_len = 44 + data_len as u32;

    let mut buf = Vec::with_capacity(44 + data_len);
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(file_len - 8).to_le_bytes());
    buf.extend_from_slice(b"WAVE");
    // fmt subchunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&1u16.to_le_bytes()); // mono
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&(sample_rate * 2).to_le_bytes()); // byte rate
    buf.extend_from_slice(&2u16.to_le_bytes()); // block align
    buf.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    // data subchunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&(data_len as u32).to_le_bytes());
    for &s in samples {
        buf.extend_from_slice(&s.to_le_bytes());
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_parse_is_mono_pcm() {
        let wav = encode_mono_wav(&[0i16; 1600], 16000);
        let spec = validate_mono_pcm(&wav).unwrap();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.bits_per_sample, 16);
    }

    #[test]
    fn rejects_non_riff() {
        let err = parse_header(b"OggS\x00\x00\x00\x00garbage!").unwrap_err();
        assert!(matches!(err, SttError::InvalidAudio(_)));
    }

    #[test]
    fn rejects_stereo() {
        let mut wav = encode_mono_wav(&[0i16; 16], 16000);
        wav[22] = 2; // channel count field
        let err = validate_mono_pcm(&wav).unwrap_err();
        assert!(matches!(err, SttError::InvalidAudio(_)));
    }

    #[test]
    fn rejects_oversized_payload() {
        // A fake header claiming a huge file is fine; only actual size matters.
        let wav = vec![0u8; MAX_AUDIO_BYTES + 1];
        let err = parse_header(&wav).unwrap_err();
        assert!(matches!(err, SttError::InvalidAudio(_)));
    }
}
