//! The analysis client: one image in, one normalized outcome out.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use pagevoice_core::{
    AnalysisError, AnalysisOutcome, EncodedImage, VisionProvider, VisionRequest,
};
use pagevoice_media::is_allowed_mime;

use crate::classify::classify_provider_error;
use crate::prompt::build_prompt;

/// Sends one encoded image to the vision provider and maps the result —
/// success, empty response, or any provider failure — onto the tagged
/// outcome the orchestrator consumes.
///
/// The provider is injected so tests (and alternate providers) plug in at
/// the trait seam.
pub struct AnalysisClient {
    provider: Arc<dyn VisionProvider>,
    output_language: String,
}

impl AnalysisClient {
    pub fn new(provider: Arc<dyn VisionProvider>) -> Self {
        Self {
            provider,
            output_language: "English".to_string(),
        }
    }

    pub fn with_output_language(mut self, language: impl Into<String>) -> Self {
        self.output_language = language.into();
        self
    }

    /// Analyze one encoded image. Exactly one provider call; no retries.
    pub async fn analyze(&self, image: &EncodedImage, file_name: &str) -> AnalysisOutcome {
        // Defense in depth: the validator already enforced this, but a
        // malformed request must never reach the provider.
        if let Err(e) = check_input(image, file_name) {
            warn!(error = %e, "rejected analysis input before provider call");
            return failure(e);
        }

        let request = VisionRequest {
            image_base64: image.data.clone(),
            mime_type: image.mime_type.clone(),
            prompt: build_prompt(&self.output_language),
        };

        match self.provider.describe(&request).await {
            Ok(text) if text.trim().is_empty() => failure(AnalysisError::EmptyResponse),
            Ok(text) => {
                info!(provider = self.provider.name(), len = text.len(), "analysis complete");
                AnalysisOutcome::Success {
                    content: text,
                    timestamp: Utc::now(),
                }
            }
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "provider call failed");
                failure(classify_provider_error(e))
            }
        }
    }
}

fn check_input(image: &EncodedImage, file_name: &str) -> Result<(), AnalysisError> {
    if image.data.is_empty() {
        return Err(AnalysisError::InvalidInput("image payload is empty".into()));
    }
    if !is_allowed_mime(&image.mime_type) {
        return Err(AnalysisError::InvalidInput(format!(
            "unrecognized MIME type: {}",
            image.mime_type
        )));
    }
    if file_name.is_empty() {
        return Err(AnalysisError::InvalidInput("file name is required".into()));
    }
    Ok(())
}

fn failure(err: AnalysisError) -> AnalysisOutcome {
    AnalysisOutcome::Failure {
        code: err.code(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pagevoice_core::{ErrorCode, ProviderError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedProvider {
        calls: AtomicUsize,
        reply: Result<String, ProviderError>,
    }

    impl ScriptedProvider {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                reply: Ok(text.to_string()),
            })
        }

        fn err(e: ProviderError) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                reply: Err(e),
            })
        }
    }

    #[async_trait]
    impl VisionProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn describe(&self, _request: &VisionRequest) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(t) => Ok(t.clone()),
                Err(e) => Err(ProviderError {
                    http_status: e.http_status,
                    api_status: e.api_status.clone(),
                    safety_block: e.safety_block,
                    message: e.message.clone(),
                }),
            }
        }
    }

    fn image() -> EncodedImage {
        EncodedImage {
            data: "aGVsbG8=".into(),
            mime_type: "image/jpeg".into(),
        }
    }

    #[tokio::test]
    async fn success_returns_content_verbatim_with_timestamp() {
        let provider = ScriptedProvider::ok("## Overview\nPhotosynthesis basics.");
        let client = AnalysisClient::new(provider.clone());

        let outcome = client.analyze(&image(), "page.jpg").await;
        match outcome {
            AnalysisOutcome::Success { content, timestamp } => {
                assert_eq!(content, "## Overview\nPhotosynthesis basics.");
                // RFC 3339 / ISO-8601 representable.
                assert!(!timestamp.to_rfc3339().is_empty());
            }
            other => panic!("expected success, got {other:?}"),
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_payload_never_reaches_provider() {
        let provider = ScriptedProvider::ok("text");
        let client = AnalysisClient::new(provider.clone());

        let empty = EncodedImage {
            data: String::new(),
            mime_type: "image/jpeg".into(),
        };
        let outcome = client.analyze(&empty, "page.jpg").await;
        match outcome {
            AnalysisOutcome::Failure { code, .. } => assert_eq!(code, ErrorCode::InvalidInput),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unrecognized_mime_is_invalid_input() {
        let provider = ScriptedProvider::ok("text");
        let client = AnalysisClient::new(provider.clone());

        let bad = EncodedImage {
            data: "aGVsbG8=".into(),
            mime_type: "application/pdf".into(),
        };
        let outcome = client.analyze(&bad, "page.pdf").await;
        assert!(matches!(
            outcome,
            AnalysisOutcome::Failure { code: ErrorCode::InvalidInput, .. }
        ));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn whitespace_only_response_is_api_error() {
        let provider = ScriptedProvider::ok("   \n\t  ");
        let client = AnalysisClient::new(provider);

        let outcome = client.analyze(&image(), "page.jpg").await;
        match outcome {
            AnalysisOutcome::Failure { code, message } => {
                assert_eq!(code, ErrorCode::ApiError);
                assert!(message.contains("empty response"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn quota_error_maps_to_api_error_with_quota_message() {
        let provider = ScriptedProvider::err(ProviderError::opaque(
            "generation failed: quota exceeded for project",
        ));
        let client = AnalysisClient::new(provider);

        let outcome = client.analyze(&image(), "page.jpg").await;
        match outcome {
            AnalysisOutcome::Failure { code, message } => {
                assert_eq!(code, ErrorCode::ApiError);
                assert!(message.contains("usage limit"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
