//! External service adapters
//!
//! Every side effect the assistant performs goes through one of the
//! traits defined here, so the session loop and dispatcher can be tested
//! with in-memory fakes. Concrete implementations are thin wrappers over
//! audio hardware, HTTP services, and process spawning.

pub mod actions;
pub mod audio;
pub mod lookup;
pub mod stt;
pub mod translate;
pub mod tts;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

pub use actions::{ProcessActions, SystemAction};
pub use audio::{Microphone, SAMPLE_RATE, play_mp3, play_samples, samples_to_wav};
pub use lookup::{AiClient, StockClient, WeatherClient, WikipediaClient};
pub use stt::{MicrophoneInput, WhisperClient};
pub use translate::GoogleTranslator;
pub use tts::TtsSpeech;

/// Captures one utterance of speech as text
///
/// Implementations fuse audio capture and transcription. Not `Send`:
/// audio streams are pinned to the thread that created them, so the
/// session loop runs on the main task, as the daemon arranges.
#[async_trait(?Send)]
pub trait SpeechInput {
    /// Capture and transcribe one utterance
    ///
    /// Returns `Ok(None)` on timeout or unrecognized speech (benign).
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Transcription`] for transport-level
    /// failures; the caller logs these and treats them as empty.
    async fn capture(&mut self, timeout: Duration) -> Result<Option<String>>;
}

/// Speaks text aloud
#[async_trait]
pub trait SpeechOutput: Send {
    /// Synthesize and play text, best-effort
    ///
    /// # Errors
    ///
    /// Returns error only when both synthesis and the print fallback are
    /// impossible; implementations prefer degrading to printed text.
    async fn speak(&mut self, text: &str, language: &str) -> Result<()>;
}

/// Detects and translates spoken language
#[async_trait]
pub trait Translator: Send + Sync {
    /// Detect the language of a text, returning a code like "en"
    async fn detect(&self, text: &str) -> Result<String>;

    /// Translate text to the target language
    async fn translate(&self, text: &str, target: &str) -> Result<String>;
}

/// Weather lookups
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    /// Current conditions for a city
    async fn current(&self, city: &str) -> Result<String>;
}

/// Stock quote lookups
#[async_trait]
pub trait StockLookup: Send + Sync {
    /// Latest price for a ticker symbol
    async fn quote(&self, symbol: &str) -> Result<String>;
}

/// Encyclopedia lookups
#[async_trait]
pub trait EncyclopediaLookup: Send + Sync {
    /// Short summary of a topic
    async fn summary(&self, topic: &str) -> Result<String>;
}

/// Free-form AI chat
#[async_trait]
pub trait AiChat: Send + Sync {
    /// Answer a free-form query
    async fn answer(&self, query: &str) -> Result<String>;
}

/// Runs fire-and-forget system actions
pub trait ActionRunner: Send + Sync {
    /// Perform the action, returning whether it was launched
    fn run(&self, action: &SystemAction) -> bool;
}

/// Serialized access to the single speech-output resource
///
/// Reminders fire concurrently with the session loop; routing all speech
/// through this handle guarantees playback never overlaps.
#[derive(Clone)]
pub struct Speaker {
    output: Arc<tokio::sync::Mutex<Box<dyn SpeechOutput>>>,
    translator: Option<Arc<dyn Translator>>,
    default_language: String,
}

impl Speaker {
    /// Wrap a speech output, optionally translating non-default languages
    #[must_use]
    pub fn new(
        output: Box<dyn SpeechOutput>,
        translator: Option<Arc<dyn Translator>>,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            output: Arc::new(tokio::sync::Mutex::new(output)),
            translator,
            default_language: default_language.into(),
        }
    }

    /// Speak text in the given language, holding the output lock for the
    /// duration of playback
    ///
    /// Translation failures fall back to the untranslated text; playback
    /// failures are logged, never propagated.
    pub async fn say(&self, text: &str, language: &str) {
        let spoken = if language == self.default_language {
            text.to_string()
        } else if let Some(translator) = &self.translator {
            match translator.translate(text, language).await {
                Ok(translated) => translated,
                Err(e) => {
                    tracing::warn!(error = %e, language, "translation failed, speaking untranslated");
                    text.to_string()
                }
            }
        } else {
            text.to_string()
        };

        let mut output = self.output.lock().await;
        if let Err(e) = output.speak(&spoken, language).await {
            tracing::error!(error = %e, "speech output failed");
        }
    }

    /// Speak in the default language
    pub async fn say_default(&self, text: &str) {
        let language = self.default_language.clone();
        self.say(text, &language).await;
    }
}
