pub mod classify;
pub mod client;
pub mod prompt;
pub mod provider;

pub use classify::classify_provider_error;
pub use client::AnalysisClient;
pub use prompt::build_prompt;
pub use provider::GeminiProvider;
