/// Pagevoice runtime configuration, sourced from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key for image analysis
    pub gemini_api_key: Option<String>,
    /// OpenAI API key for speech synthesis
    pub openai_api_key: Option<String>,
    /// Language the explanation is written (and narrated) in
    pub output_language: String,
    /// Preferred voice language tag prefix (e.g. "en", "ja")
    pub voice_language: String,
    /// Narration rate
    pub speech_rate: f32,
    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            openai_api_key: None,
            output_language: "English".to_string(),
            voice_language: "en".to_string(),
            speech_rate: 1.0,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok().filter(|v| !v.is_empty()),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok().filter(|v| !v.is_empty()),
            output_language: std::env::var("PAGEVOICE_LANGUAGE")
                .unwrap_or(defaults.output_language),
            voice_language: std::env::var("PAGEVOICE_VOICE_LANG")
                .unwrap_or(defaults.voice_language),
            speech_rate: std::env::var("PAGEVOICE_RATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.speech_rate),
            log_level: std::env::var("PAGEVOICE_LOG").unwrap_or(defaults.log_level),
        }
    }
}
