//! Gemini vision provider: one generateContent exchange per call.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use pagevoice_core::{ProviderError, VisionProvider, VisionRequest};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl VisionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn describe(&self, request: &VisionRequest) -> Result<String, ProviderError> {
        info!(model = %self.model, mime = %request.mime_type, "sending page image to Gemini");

        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [
                { "text": request.prompt },
                { "inlineData": {
                    "mimeType": request.mime_type,
                    "data": request.image_base64,
                }}
            ]}]
        });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::opaque(e.to_string()))?;

        let http_status = resp.status().as_u16();
        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ProviderError::opaque(e.to_string()))?;

        if !(200..300).contains(&http_status) {
            return Err(error_from_body(http_status, &json));
        }

        // A 200 can still be a safety block: the candidate is present but
        // carries no text and a SAFETY finish reason.
        let candidate = &json["candidates"][0];
        let finish_reason = candidate["finishReason"].as_str().unwrap_or("");
        let block_reason = json["promptFeedback"]["blockReason"].as_str().unwrap_or("");
        if finish_reason == "SAFETY" || block_reason == "SAFETY" {
            return Err(ProviderError {
                http_status: Some(http_status),
                api_status: None,
                safety_block: true,
                message: "response blocked by safety filter".to_string(),
            });
        }

        let text = candidate["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or("")
            .to_string();
        debug!(len = text.len(), "received Gemini response text");
        Ok(text)
    }
}

/// Extract the structured error fields Gemini returns in its error body.
fn error_from_body(http_status: u16, json: &serde_json::Value) -> ProviderError {
    let api_status = json["error"]["status"].as_str().map(str::to_string);
    let message = json["error"]["message"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| format!("provider returned HTTP {http_status}"));
    ProviderError {
        http_status: Some(http_status),
        api_status,
        safety_block: false,
        message,
    }
}
