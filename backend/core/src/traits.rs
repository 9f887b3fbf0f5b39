use anyhow::Result;
use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{UtteranceRequest, Voice};

/// Request to a multimodal vision provider: one image plus one prompt.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    /// Bare base64 payload, no data-URI prefix.
    pub image_base64: String,
    pub mime_type: String,
    pub prompt: String,
}

/// Trait for multimodal providers that explain an image.
///
/// Implementations perform exactly one request/response exchange per call
/// and never retry; classification of failures happens in the caller.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Provider name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Send the image and prompt, returning the raw explanation text.
    async fn describe(&self, request: &VisionRequest) -> Result<String, ProviderError>;
}

/// Boundary to the external text-to-speech engine.
///
/// The engine is constructed with an event sender; every event it emits
/// carries the utterance id from the originating request so a controller
/// can discard events from superseded utterances.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Whether speech output is available in this runtime at all.
    fn is_supported(&self) -> bool;

    /// Voices the engine can narrate with. May be queried repeatedly; the
    /// list can change after engine startup.
    async fn voices(&self) -> Result<Vec<Voice>>;

    /// Begin narrating. Playback start is confirmed asynchronously via a
    /// `Started` event, not by this call returning.
    async fn speak(&self, request: UtteranceRequest) -> Result<()>;

    /// Pause the active utterance, if any.
    fn pause(&self);

    /// Resume the paused utterance, if any.
    fn resume(&self);

    /// Cancel the active utterance, if any. Safe to call when idle.
    fn cancel(&self);
}
