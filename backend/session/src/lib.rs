pub mod orchestrator;

pub use orchestrator::{RequestOrchestrator, SessionSnapshot};
