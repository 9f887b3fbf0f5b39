pub mod controller;
pub mod engine;
pub mod preprocess;

pub use controller::SpeechController;
pub use engine::playback::PlaybackEngine;
pub use engine::synth::{OpenAiSynthesizer, SynthesisRequest, Synthesizer};
pub use preprocess::speakable_text;
