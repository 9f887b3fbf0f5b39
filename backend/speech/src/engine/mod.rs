pub mod playback;
pub mod synth;
