use thiserror::Error;

use crate::types::ErrorCode;

/// Every way one analysis attempt can fail, from local validation through
/// the provider round trip. All variants are terminal for the attempt;
/// nothing is retried automatically.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("unsupported image format: {0} (JPEG, PNG, WebP, GIF only)")]
    UnsupportedFormat(String),

    #[error("file too large: {actual} bytes (maximum {max})")]
    FileTooLarge { actual: u64, max: u64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to read image data: {0}")]
    EncodingFailed(String),

    #[error("provider authentication failed; check the configured API key")]
    Auth,

    #[error("provider usage limit reached; wait before retrying")]
    QuotaExceeded,

    #[error("the image could not be analyzed; try a different image")]
    ContentRejected,

    #[error("the provider returned an empty response")]
    EmptyResponse,

    #[error("provider error: {0}")]
    UnknownProvider(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AnalysisError {
    /// Contract error code for the UI-facing failure payload.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedFormat(_) | Self::FileTooLarge { .. } | Self::InvalidInput(_) => {
                ErrorCode::InvalidInput
            }
            Self::Auth
            | Self::QuotaExceeded
            | Self::ContentRejected
            | Self::EmptyResponse
            | Self::UnknownProvider(_) => ErrorCode::ApiError,
            Self::EncodingFailed(_) | Self::Other(_) => ErrorCode::Unknown,
        }
    }
}

/// Raw failure from the vision provider, before classification.
///
/// Structured fields are filled when the provider surfaced them; otherwise
/// only `message` carries the opaque error text.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProviderError {
    /// HTTP status of the failed round trip, if one completed.
    pub http_status: Option<u16>,
    /// Provider API status string (e.g. "RESOURCE_EXHAUSTED"), if present.
    pub api_status: Option<String>,
    /// Whether the provider reported a safety block for this content.
    pub safety_block: bool,
    pub message: String,
}

impl ProviderError {
    /// An error with no structured signal, only free text.
    pub fn opaque(message: impl Into<String>) -> Self {
        Self {
            http_status: None,
            api_status: None,
            safety_block: false,
            message: message.into(),
        }
    }
}

/// Failures of the speech side. Never propagated into the analysis
/// pipeline; the controller reports them and returns to idle.
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech is not supported in this runtime")]
    Unsupported,

    #[error("speech engine error: {0}")]
    Engine(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
