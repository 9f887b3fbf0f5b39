pub mod encode;
pub mod validate;

pub use encode::{encode_candidate, PreviewHandle};
pub use validate::{is_allowed_mime, validate_candidate, ALLOWED_IMAGE_TYPES, MAX_FILE_SIZE};
