pub mod error;
pub mod traits;
pub mod types;

pub use error::{AnalysisError, ProviderError, SpeechError};
pub use traits::{SpeechEngine, VisionProvider, VisionRequest};
pub use types::{
    guess_mime_type, AnalysisOutcome, AnalysisStatus, EncodedImage, EngineEvent, EngineEventKind,
    ErrorCode, ImageCandidate, SpeechStatus, UtteranceRequest, Voice,
};
