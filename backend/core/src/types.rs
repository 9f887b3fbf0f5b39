use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user-selected image that has not been validated yet.
#[derive(Debug, Clone)]
pub struct ImageCandidate {
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
    pub byte_len: u64,
}

impl ImageCandidate {
    pub fn new(path: impl Into<PathBuf>, mime_type: impl Into<String>, byte_len: u64) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();
        Self {
            path,
            file_name,
            mime_type: mime_type.into(),
            byte_len,
        }
    }
}

/// Transport-ready image payload: bare base64 text, no data-URI prefix.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: String,
    pub mime_type: String,
}

/// Contract error code surfaced to the UI collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput,
    #[serde(rename = "API_ERROR")]
    ApiError,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

/// Result of one analysis attempt. Success and failure are mutually
/// exclusive; consumed once by the orchestrator, then immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Success {
        content: String,
        timestamp: DateTime<Utc>,
    },
    Failure {
        message: String,
        code: ErrorCode,
    },
}

impl AnalysisOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Lifecycle of one analysis session, as visible to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    #[default]
    Idle,
    Uploading,
    Analyzing,
    Complete,
    Error,
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Uploading => "uploading",
            Self::Analyzing => "analyzing",
            Self::Complete => "complete",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Playback state of the speech controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpeechStatus {
    #[default]
    Idle,
    Speaking,
    Paused,
}

/// One voice offered by the speech engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub name: String,
    /// BCP-47 language tag, e.g. "en-US".
    pub language: String,
}

/// One narration request handed to the speech engine.
#[derive(Debug, Clone)]
pub struct UtteranceRequest {
    /// Session token; engine events carry it back so the controller can
    /// drop events from superseded utterances.
    pub id: Uuid,
    pub text: String,
    pub voice: Option<Voice>,
    pub rate: f32,
}

impl UtteranceRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            voice: None,
            rate: 1.0,
        }
    }
}

/// Event reported by the speech engine for a specific utterance.
#[derive(Debug, Clone)]
pub struct EngineEvent {
    pub utterance: Uuid,
    pub kind: EngineEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEventKind {
    Started,
    Ended,
    Error(String),
    Paused,
    Resumed,
}

/// File-extension based MIME guess for building a candidate from a path.
pub fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        _ => "application/octet-stream",
    }
}
