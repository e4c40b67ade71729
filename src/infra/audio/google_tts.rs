use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::core::audio::{AudioError, SpeechSynthesizer};

const TRANSLATE_TTS: &str = "https://translate.google.com/translate_tts";

/// Google Translate's speech endpoint. Free, no key, MP3 out, but only ~100
/// characters per request (the service layer chunks for us).
pub struct GoogleTts {
    client: Client,
    endpoint: String,
}

impl GoogleTts {
    pub fn new() -> Result<Self, AudioError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent("Mozilla/5.0")
            .build()
            .map_err(|e| AudioError::Synthesis(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: TRANSLATE_TTS.to_string(),
        })
    }
}

fn query<'a>(text: &'a str, lang: &'a str) -> [(&'static str, &'a str); 4] {
    [
        ("ie", "UTF-8"),
        ("q", text),
        ("tl", lang),
        ("client", "tw-ob"),
    ]
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str, lang: &str) -> Result<Vec<u8>, AudioError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&query(text, lang))
            .send()
            .await
            .map_err(|e| AudioError::Synthesis(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AudioError::Synthesis(format!(
                "speech endpoint returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AudioError::Synthesis(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_parameters() {
        let params = query("hello there", "en");
        assert!(params.contains(&("q", "hello there")));
        assert!(params.contains(&("tl", "en")));
        assert!(params.contains(&("client", "tw-ob")));
    }
}
