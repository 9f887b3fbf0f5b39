//! Transport encoding: raw image bytes to a bare base64 payload, plus a
//! transient on-disk preview copy released when the handle drops.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, warn};
use uuid::Uuid;

use pagevoice_core::{AnalysisError, EncodedImage, ImageCandidate};

/// Transient preview copy of a selected image.
///
/// The underlying file is deleted when the handle is dropped, so replacing
/// or discarding a candidate cannot leak preview storage.
#[derive(Debug)]
pub struct PreviewHandle {
    path: PathBuf,
}

impl PreviewHandle {
    fn create(bytes: &[u8], file_name: &str) -> std::io::Result<Self> {
        let dir = std::env::temp_dir().join("pagevoice-previews");
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}-{}", Uuid::new_v4(), file_name));
        fs::write(&path, bytes)?;
        debug!(path = %path.display(), "created preview");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            // Nothing to do about it beyond noting it; the path is in tmp.
            warn!(path = %self.path.display(), error = %e, "failed to remove preview");
        }
    }
}

/// Read the candidate's bytes and produce the base64 payload and preview.
///
/// The read is the suspension point of this stage. On I/O failure the
/// caller gets an error and no preview exists to release.
pub async fn encode_candidate(
    candidate: &ImageCandidate,
) -> Result<(EncodedImage, PreviewHandle), AnalysisError> {
    let bytes = tokio::fs::read(&candidate.path)
        .await
        .map_err(|e| AnalysisError::EncodingFailed(e.to_string()))?;

    // Encode before touching the filesystem for the preview so a preview
    // never exists for a payload that was not produced.
    let data = STANDARD.encode(&bytes);
    let preview = PreviewHandle::create(&bytes, &candidate.file_name)
        .map_err(|e| AnalysisError::EncodingFailed(e.to_string()))?;

    debug!(
        file = %candidate.file_name,
        raw_len = bytes.len(),
        encoded_len = data.len(),
        "encoded image candidate"
    );

    Ok((
        EncodedImage {
            data,
            mime_type: candidate.mime_type.clone(),
        },
        preview,
    ))
}
