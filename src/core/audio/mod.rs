pub mod audio_service;
pub mod sound_library;
pub mod tts_text;

pub use audio_service::{AudioError, SpeechSynthesizer, TtsService};
pub use sound_library::SoundLibrary;
