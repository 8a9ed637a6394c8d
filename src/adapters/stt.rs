//! Speech input: microphone capture fused with transcription
//!
//! The session loop only sees [`SpeechInput::capture`]; underneath, a
//! phrase is recorded from the microphone and shipped to the Whisper
//! transcription API as WAV.

use std::time::Duration;

use async_trait::async_trait;

use super::audio::{Microphone, SAMPLE_RATE, samples_to_wav};
use super::SpeechInput;
use crate::{Error, Result};

/// Response from the Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Transcribes WAV audio via the OpenAI Whisper API
pub struct WhisperClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl WhisperClient {
    /// Create a transcription client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for transcription".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        })
    }

    /// Transcribe WAV audio to text
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transcription`] on transport or API failure
    pub async fn transcribe(&self, wav: Vec<u8>) -> Result<String> {
        tracing::debug!(audio_bytes = wav.len(), "starting transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(wav)
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Transcription(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Transcription(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transcription(format!("API error {status}: {body}")));
        }

        let result: WhisperResponse = response
            .json()
            .await
            .map_err(|e| Error::Transcription(e.to_string()))?;

        tracing::debug!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }
}

/// Speech input backed by the default microphone and Whisper
pub struct MicrophoneInput {
    microphone: Microphone,
    transcriber: WhisperClient,
}

impl MicrophoneInput {
    /// Open the microphone and wrap it with a transcription client
    ///
    /// # Errors
    ///
    /// Returns error if no input device exists or the API key is missing
    pub fn new(transcriber: WhisperClient) -> Result<Self> {
        Ok(Self {
            microphone: Microphone::new()?,
            transcriber,
        })
    }
}

#[async_trait(?Send)]
impl SpeechInput for MicrophoneInput {
    async fn capture(&mut self, timeout: Duration) -> Result<Option<String>> {
        let Some(samples) = self.microphone.record_phrase(timeout).await? else {
            return Ok(None);
        };

        let wav = samples_to_wav(&samples, SAMPLE_RATE)?;
        let text = self.transcriber.transcribe(wav).await?;
        let text = text.trim().to_lowercase();

        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(text))
    }
}
