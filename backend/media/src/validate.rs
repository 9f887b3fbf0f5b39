//! Image acceptance policy.
//!
//! These constants are the contract surface shared with any pre-flight UI
//! check; the validator itself is a pure function of candidate metadata.

use pagevoice_core::{AnalysisError, ImageCandidate};

/// MIME types accepted for analysis.
pub const ALLOWED_IMAGE_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Maximum accepted file size: 10 MB.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Whether a MIME type is on the allow-list.
pub fn is_allowed_mime(mime: &str) -> bool {
    ALLOWED_IMAGE_TYPES.contains(&mime)
}

/// Check a candidate against format and size policy, format first.
///
/// No side effects; rejection happens before any byte of the file is read.
pub fn validate_candidate(candidate: &ImageCandidate) -> Result<(), AnalysisError> {
    if !is_allowed_mime(&candidate.mime_type) {
        return Err(AnalysisError::UnsupportedFormat(candidate.mime_type.clone()));
    }
    if candidate.byte_len > MAX_FILE_SIZE {
        return Err(AnalysisError::FileTooLarge {
            actual: candidate.byte_len,
            max: MAX_FILE_SIZE,
        });
    }
    Ok(())
}
