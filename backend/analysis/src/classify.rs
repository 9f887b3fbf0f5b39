//! Provider failure classification.
//!
//! Structured signals (HTTP status, API status string, safety flag) are
//! checked first; the substring heuristics only apply to errors that
//! arrived as opaque text. The mapping is best-effort, not exhaustive:
//! anything unrecognized keeps its original message.

use pagevoice_core::{AnalysisError, ProviderError};

/// Map one raw provider failure onto the error taxonomy.
pub fn classify_provider_error(err: ProviderError) -> AnalysisError {
    if err.safety_block {
        return AnalysisError::ContentRejected;
    }

    if let Some(status) = err.api_status.as_deref() {
        match status {
            "UNAUTHENTICATED" | "PERMISSION_DENIED" => return AnalysisError::Auth,
            "RESOURCE_EXHAUSTED" => return AnalysisError::QuotaExceeded,
            _ => {}
        }
    }

    match err.http_status {
        Some(401) | Some(403) => return AnalysisError::Auth,
        Some(429) => return AnalysisError::QuotaExceeded,
        _ => {}
    }

    // Opaque-text fallback tier.
    if err.message.contains("API_KEY") {
        AnalysisError::Auth
    } else if err.message.contains("quota") {
        AnalysisError::QuotaExceeded
    } else if err.message.contains("SAFETY") {
        AnalysisError::ContentRejected
    } else {
        AnalysisError::UnknownProvider(err.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque(msg: &str) -> ProviderError {
        ProviderError::opaque(msg)
    }

    #[test]
    fn safety_block_wins_over_everything() {
        let err = ProviderError {
            http_status: Some(429),
            api_status: Some("RESOURCE_EXHAUSTED".into()),
            safety_block: true,
            message: "blocked".into(),
        };
        assert!(matches!(classify_provider_error(err), AnalysisError::ContentRejected));
    }

    #[test]
    fn structured_api_status_maps_before_substrings() {
        let err = ProviderError {
            http_status: None,
            api_status: Some("PERMISSION_DENIED".into()),
            safety_block: false,
            // Message mentions quota, but the structured signal decides.
            message: "quota something".into(),
        };
        assert!(matches!(classify_provider_error(err), AnalysisError::Auth));
    }

    #[test]
    fn http_429_is_quota() {
        let err = ProviderError {
            http_status: Some(429),
            api_status: None,
            safety_block: false,
            message: "too many requests".into(),
        };
        assert!(matches!(classify_provider_error(err), AnalysisError::QuotaExceeded));
    }

    #[test]
    fn opaque_api_key_substring_is_auth() {
        let e = classify_provider_error(opaque("API_KEY_INVALID: the key is malformed"));
        assert!(matches!(e, AnalysisError::Auth));
    }

    #[test]
    fn opaque_quota_substring_is_quota() {
        let e = classify_provider_error(opaque("you have exceeded your quota for today"));
        assert!(matches!(e, AnalysisError::QuotaExceeded));
    }

    #[test]
    fn opaque_safety_substring_is_rejection() {
        let e = classify_provider_error(opaque("candidate blocked due to SAFETY"));
        assert!(matches!(e, AnalysisError::ContentRejected));
    }

    #[test]
    fn unrecognized_error_preserves_message() {
        let e = classify_provider_error(opaque("connection reset by peer"));
        match e {
            AnalysisError::UnknownProvider(msg) => {
                assert_eq!(msg, "connection reset by peer");
            }
            other => panic!("expected UnknownProvider, got {other:?}"),
        }
    }
}
