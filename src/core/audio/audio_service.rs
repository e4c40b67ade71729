use super::tts_text::{chunk_tts_text, TTS_CHUNK_LIMIT, TTS_MAX_CHARS};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No sound named '{0}'")]
    UnknownSound(String),

    #[error("Nothing to say")]
    EmptyText,

    #[error("Text is longer than {0} characters")]
    TextTooLong(usize),

    #[error("Speech service error: {0}")]
    Synthesis(String),
}

impl AudioError {
    pub fn user_message(&self) -> String {
        match self {
            AudioError::Io(_) | AudioError::Synthesis(_) => {
                "⚠️ Couldn't produce audio right now.".to_string()
            }
            other => format!("⚠️ {}", other),
        }
    }
}

/// Port for text-to-speech engines. Returns encoded audio (MP3) for one chunk.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, lang: &str) -> Result<Vec<u8>, AudioError>;
}

pub struct TtsService<S: SpeechSynthesizer> {
    synthesizer: S,
}

impl<S: SpeechSynthesizer> TtsService<S> {
    pub fn new(synthesizer: S) -> Self {
        Self { synthesizer }
    }

    /// Synthesizes `text` chunk by chunk and concatenates the MP3 frames, which
    /// decoders play back as one stream.
    pub async fn speak(&self, text: &str, lang: &str) -> Result<Vec<u8>, AudioError> {
        if text.chars().count() > TTS_MAX_CHARS {
            return Err(AudioError::TextTooLong(TTS_MAX_CHARS));
        }
        let chunks = chunk_tts_text(text, TTS_CHUNK_LIMIT);
        if chunks.is_empty() {
            return Err(AudioError::EmptyText);
        }

        let lang = normalize_lang(lang);
        let mut audio = Vec::new();
        for chunk in &chunks {
            audio.extend(self.synthesizer.synthesize(chunk, &lang).await?);
        }

        tracing::debug!(chunks = chunks.len(), bytes = audio.len(), "Synthesized speech");
        Ok(audio)
    }
}

/// Language tags like `en`, `pt-BR`; anything else falls back to English.
pub fn normalize_lang(lang: &str) -> String {
    let lang = lang.trim();
    let valid = !lang.is_empty()
        && lang.len() <= 8
        && lang.chars().all(|c| c.is_ascii_alphabetic() || c == '-');
    if valid {
        lang.to_string()
    } else {
        "en".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct EchoSynth {
        requests: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl SpeechSynthesizer for EchoSynth {
        async fn synthesize(&self, text: &str, lang: &str) -> Result<Vec<u8>, AudioError> {
            self.requests
                .lock()
                .unwrap()
                .push((text.to_string(), lang.to_string()));
            Ok(text.as_bytes().to_vec())
        }
    }

    #[tokio::test]
    async fn test_long_text_is_chunked() {
        let service = TtsService::new(EchoSynth::default());
        let text = "This is a sentence. ".repeat(12);
        let audio = service.speak(&text, "en").await.unwrap();

        let requests = service.synthesizer.requests.lock().unwrap();
        assert!(requests.len() > 1);
        assert!(requests.iter().all(|(t, _)| t.chars().count() <= TTS_CHUNK_LIMIT));
        assert_eq!(audio.len(), requests.iter().map(|(t, _)| t.len()).sum::<usize>());
    }

    #[tokio::test]
    async fn test_empty_and_oversized_rejected() {
        let service = TtsService::new(EchoSynth::default());
        assert!(matches!(service.speak("  ", "en").await, Err(AudioError::EmptyText)));
        let huge = "a ".repeat(TTS_MAX_CHARS);
        assert!(matches!(
            service.speak(&huge, "en").await,
            Err(AudioError::TextTooLong(_))
        ));
    }

    #[test]
    fn test_normalize_lang() {
        assert_eq!(normalize_lang("pt-BR"), "pt-BR");
        assert_eq!(normalize_lang(""), "en");
        assert_eq!(normalize_lang("en&q=x"), "en");
    }
}
