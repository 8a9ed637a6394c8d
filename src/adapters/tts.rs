//! Speech output: HTTP synthesis with printed-text fallback
//!
//! Synthesizes MP3 via the OpenAI speech API and plays it on the default
//! output device. Every spoken line is also printed, and synthesis or
//! playback failure degrades to print-only rather than erroring.

use async_trait::async_trait;

use super::SpeechOutput;
use super::audio::play_mp3;
use crate::{Error, Result};

/// Speech output backed by an HTTP TTS service
pub struct TtsSpeech {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    voice: String,
    speed: f64,
}

impl TtsSpeech {
    /// Create a speech output; without an API key it prints text only
    #[must_use]
    pub fn new(api_key: Option<String>, model: String, voice: String, speed: f64) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.is_empty()),
            model,
            voice,
            speed,
        }
    }

    /// Synthesize text to MP3 bytes
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct SpeechRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f64,
        }

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Synthesis("no TTS API key configured".to_string()))?;

        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Synthesis(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!("TTS error {status}: {body}")));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| Error::Synthesis(e.to_string()))?;
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl SpeechOutput for TtsSpeech {
    async fn speak(&mut self, text: &str, language: &str) -> Result<()> {
        println!("murmur: {text}");

        if self.api_key.is_none() {
            return Ok(());
        }

        match self.synthesize(text).await {
            Ok(audio) => {
                if let Err(e) = play_mp3(&audio).await {
                    tracing::warn!(error = %e, "playback failed, text was printed");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, language, "synthesis failed, text was printed");
            }
        }

        Ok(())
    }
}
