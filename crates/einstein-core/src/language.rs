//! Language classification for display/voice bookkeeping.
//!
//! A pure function over the text's script: Hangul codepoints mean Korean,
//! everything else (including empty or mixed-ambiguous input) defaults to
//! English. The result never selects the persona — the persona prompt
//! already instructs the model to mirror the user's language — and never
//! changes which model is called.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed language set: the tutored target language vs the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Korean,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => write!(f, "English"),
            Language::Korean => write!(f, "Korean"),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "korean" | "ko" => Ok(Language::Korean),
            other => Err(format!("unknown language: {}", other)),
        }
    }
}

fn is_hangul(c: char) -> bool {
    matches!(c,
        '\u{1100}'..='\u{11FF}'   // Hangul Jamo
        | '\u{3130}'..='\u{318F}' // Hangul Compatibility Jamo
        | '\u{A960}'..='\u{A97F}' // Hangul Jamo Extended-A
        | '\u{AC00}'..='\u{D7A3}' // Hangul Syllables
        | '\u{D7B0}'..='\u{D7FF}' // Hangul Jamo Extended-B
    )
}

/// Classify a text string. Deterministic and side-effect free: the same
/// input always yields the same answer.
pub fn detect(text: &str) -> Language {
    if text.chars().any(is_hangul) {
        Language::Korean
    } else {
        Language::English
    }
}
