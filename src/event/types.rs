//! Core event type definitions.
//!
//! Defines [`SourceType`] (where a capture came from) and [`Event`] (one row
//! of the `events` relation).

use serde::{Deserialize, Serialize};

/// Where an event's text came from.
///
/// The store treats this as an opaque tag; the known variants exist so
/// capture collaborators and the CLI agree on spelling. Unknown tags survive
/// a round-trip through [`SourceType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceType {
    /// Text extracted from a screenshot.
    Ocr,
    /// Text transcribed from an audio segment.
    Transcription,
    /// LLM-generated summary of a capture window.
    Summary,
    /// Caller-defined kind, stored verbatim.
    Other(String),
}

impl SourceType {
    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ocr => "ocr",
            Self::Transcription => "transcription",
            Self::Summary => "summary",
            Self::Other(tag) => tag,
        }
    }
}

impl From<&str> for SourceType {
    fn from(s: &str) -> Self {
        match s {
            "ocr" => Self::Ocr,
            "transcription" => Self::Transcription,
            "summary" => Self::Summary,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for SourceType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<SourceType> for String {
    fn from(s: SourceType) -> Self {
        s.as_str().to_string()
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A captured event, matching the `events` table schema.
///
/// Created once at capture time; `vectorized` is the only field that is ever
/// mutated, flipped to `true` after an embedding has been durably stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Store-assigned id, monotonically increasing, never reused.
    pub id: i64,
    /// Capture time in seconds since the epoch, assigned by the caller.
    pub timestamp: i64,
    /// Origin of the text.
    pub source_type: SourceType,
    /// Extracted text. `None` or empty for non-text media, or an upstream
    /// error message.
    pub content: Option<String>,
    /// True once an embedding has been stored for this event.
    pub vectorized: bool,
    /// Path to the screenshot or audio file this event came from, if any.
    /// Not interpreted by the store.
    pub media_path: Option<String>,
}
