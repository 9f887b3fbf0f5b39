//! HTTP speech synthesis: text in, audio bytes out.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use pagevoice_core::Voice;

/// One synthesis request.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_id: Option<String>,
    pub speed: f32,
}

/// Converts text to audio bytes. The playback engine narrates whatever
/// this produces; the synthesizer knows nothing about playback state.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Bytes>;

    /// Voices this synthesizer can use.
    fn voices(&self) -> Vec<Voice>;
}

// ---------------------------------------------------------------------------
// OpenAI speech endpoint
// ---------------------------------------------------------------------------

pub struct OpenAiSynthesizer {
    api_key: String,
    model: String,
    default_voice: String,
    client: Client,
}

impl OpenAiSynthesizer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "tts-1".to_string(),
            default_voice: "nova".to_string(),
            client: Client::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.default_voice = voice.into();
        self
    }
}

#[derive(Serialize)]
struct SpeechBody {
    model: String,
    input: String,
    voice: String,
    response_format: String,
    speed: f32,
}

#[async_trait]
impl Synthesizer for OpenAiSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Bytes> {
        let body = SpeechBody {
            model: self.model.clone(),
            input: request.text.clone(),
            voice: request
                .voice_id
                .clone()
                .unwrap_or_else(|| self.default_voice.clone()),
            response_format: "mp3".to_string(),
            speed: request.speed,
        };
        info!(model = %body.model, voice = %body.voice, "synthesizing narration audio");
        let bytes = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes)
    }

    fn voices(&self) -> Vec<Voice> {
        // The endpoint exposes a fixed voice set rather than a query API.
        ["alloy", "echo", "fable", "onyx", "nova", "shimmer"]
            .into_iter()
            .map(|id| Voice {
                id: id.to_string(),
                name: id.to_string(),
                language: "en-US".to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_list_is_nonempty_and_tagged() {
        let synth = OpenAiSynthesizer::new("test-key");
        let voices = synth.voices();
        assert!(!voices.is_empty());
        assert!(voices.iter().all(|v| v.language.starts_with("en")));
    }
}
