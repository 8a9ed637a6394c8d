//! Daemon - the background assistant service
//!
//! Wires adapters to the session loop and runs it until interrupted.
//! The loop drives one capture→classify→dispatch cycle at a time; no two
//! utterances are ever in flight together. Reminders run as independent
//! tasks and share the speaker with the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::adapters::{
    GoogleTranslator, MicrophoneInput, ProcessActions, Speaker, SpeechInput, StockClient,
    TtsSpeech, Translator, WeatherClient, WhisperClient, WikipediaClient,
};
use crate::config::{AWAKE_CAPTURE_SECS, IDLE_CAPTURE_SECS};
use crate::dispatch::{Dispatcher, ResponseKind};
use crate::intent::{classify, contains_wake_phrase, strip_wake_phrase};
use crate::registry::{Capability, ServiceRegistry};
use crate::reminder::ReminderScheduler;
use crate::session::Session;
use crate::{Config, Error, Result};

/// Poll interval while paused
const PAUSE_POLL: Duration = Duration::from_secs(1);

/// Cooldown after a failed cycle, to avoid a tight error-retry loop
const ERROR_COOLDOWN: Duration = Duration::from_secs(1);

/// Prompt spoken when the wake phrase is heard
const WAKE_ACK: &str = "Yes, how can I help you?";

/// What one loop cycle did; drives tests and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Listening is paused; the cycle slept
    Paused,
    /// Nothing intelligible was heard
    Silent,
    /// Wake phrase detected; now awaiting a command
    Woke,
    /// A command was dispatched and answered
    Dispatched(ResponseKind),
}

/// The session loop: capture, classify, dispatch, speak
pub struct SessionLoop {
    dispatcher: Dispatcher,
    speaker: Speaker,
    session: Session,
    registry: ServiceRegistry,
    wake_phrases: Vec<String>,
    translator: Option<Arc<dyn Translator>>,
    default_language: String,
}

impl SessionLoop {
    /// Assemble a session loop
    #[must_use]
    pub fn new(
        dispatcher: Dispatcher,
        speaker: Speaker,
        session: Session,
        registry: ServiceRegistry,
        wake_phrases: Vec<String>,
        translator: Option<Arc<dyn Translator>>,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            dispatcher,
            speaker,
            session,
            registry,
            wake_phrases,
            translator,
            default_language: default_language.into(),
        }
    }

    /// Run cycles until the session stops or a shutdown signal arrives
    ///
    /// A failed cycle is logged and the loop continues after a cooldown;
    /// nothing in a cycle can terminate the loop.
    pub async fn run<I: SpeechInput>(
        &self,
        input: &mut I,
        shutdown_rx: &mut mpsc::Receiver<()>,
    ) {
        tracing::info!(wake_phrases = ?self.wake_phrases, "session loop started");

        while self.session.is_running() {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("shutdown requested");
                    self.session.stop();
                    break;
                }
                outcome = self.cycle(input) => {
                    match outcome {
                        Ok(CycleOutcome::Dispatched(kind)) => {
                            tracing::debug!(?kind, "cycle dispatched");
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::error!(error = %e, "cycle failed");
                            tokio::time::sleep(ERROR_COOLDOWN).await;
                        }
                    }
                }
            }
        }

        tracing::info!("session loop stopped");
    }

    /// Run exactly one cycle of the state machine
    ///
    /// # Errors
    ///
    /// Returns error only for failures outside the dispatch boundary
    /// (the capture stream itself); dispatch failures become spoken
    /// apologies inside [`Dispatcher::dispatch`].
    pub async fn cycle<I: SpeechInput>(&self, input: &mut I) -> Result<CycleOutcome> {
        if self.session.is_paused() {
            tokio::time::sleep(PAUSE_POLL).await;
            return Ok(CycleOutcome::Paused);
        }

        if !self.session.is_awake() {
            let heard = self
                .capture_text(input, Duration::from_secs(IDLE_CAPTURE_SECS))
                .await;
            let Some(text) = heard else {
                return Ok(CycleOutcome::Silent);
            };

            if contains_wake_phrase(&text, &self.wake_phrases) && self.session.wake() {
                let language = self.session.language();
                self.speaker.say(WAKE_ACK, &language).await;
                return Ok(CycleOutcome::Woke);
            }
            return Ok(CycleOutcome::Silent);
        }

        // Awake: capture one command, bounded by the longer timeout
        let heard = self
            .capture_text(input, Duration::from_secs(AWAKE_CAPTURE_SECS))
            .await;

        let outcome = if let Some(command) = heard {
            let command = self.to_default_language(command).await;
            let stripped = strip_wake_phrase(&command, &self.wake_phrases);
            let intent = classify(&stripped, &self.registry);
            tracing::info!(command = %stripped, ?intent, "command received");

            let response = self.dispatcher.dispatch(intent).await;
            let language = self.session.language();
            self.speaker.say(&response.text, &language).await;
            CycleOutcome::Dispatched(response.kind)
        } else {
            // Timed out without a command; return to idle silently
            CycleOutcome::Silent
        };

        self.session.reset_to_idle();
        Ok(outcome)
    }

    /// Capture text, treating transport errors as an empty capture
    async fn capture_text<I: SpeechInput>(
        &self,
        input: &mut I,
        timeout: Duration,
    ) -> Option<String> {
        match input.capture(timeout).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "capture failed, treating as empty");
                None
            }
        }
    }

    /// Detect the spoken language and translate the command to the
    /// default language, recording the detected language for the reply
    ///
    /// Best-effort: any detection or translation failure leaves the
    /// command as heard.
    async fn to_default_language(&self, command: String) -> String {
        let Some(translator) = &self.translator else {
            return command;
        };

        match translator.detect(&command).await {
            Ok(code) if code != self.default_language => {
                tracing::debug!(language = %code, "non-default language detected");
                match translator.translate(&command, &self.default_language).await {
                    Ok(translated) => {
                        self.session.set_language(code);
                        translated.to_lowercase()
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "translation to default language failed");
                        command
                    }
                }
            }
            Ok(_) => command,
            Err(e) => {
                tracing::warn!(error = %e, "language detection failed");
                command
            }
        }
    }
}

/// The Murmur daemon - owns startup, the session loop, and shutdown
pub struct Daemon {
    config: Config,
}

impl Daemon {
    /// Create a daemon from loaded configuration
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the daemon until interrupted
    ///
    /// # Errors
    ///
    /// Returns error for unrecoverable startup failures: no input
    /// device, or a missing transcription API key.
    #[allow(clippy::future_not_send)] // audio streams pin the loop to this thread
    pub async fn run(self) -> Result<()> {
        let registry = ServiceRegistry::from_config(&self.config);
        let session = Session::new(self.config.system.default_language.clone());
        let wake_phrases = self.config.normalized_wake_phrases();

        if wake_phrases.is_empty() {
            return Err(Error::Config("at least one wake phrase is required".to_string()));
        }

        let translator: Option<Arc<dyn Translator>> =
            if registry.is_enabled(Capability::Translation) {
                Some(Arc::new(GoogleTranslator::new()))
            } else {
                None
            };

        let output = TtsSpeech::new(
            self.config.api_keys.openai.clone(),
            self.config.voice_settings.tts_model.clone(),
            self.config.voice_settings.tts_voice.clone(),
            self.config.voice_settings.tts_speed,
        );
        let speaker = Speaker::new(
            Box::new(output),
            translator.clone(),
            self.config.system.default_language.clone(),
        );

        let reminders = ReminderScheduler::new(session.clone(), speaker.clone());
        let mut dispatcher = Dispatcher::new(
            registry.clone(),
            session.clone(),
            reminders,
            Box::new(ProcessActions::new()),
        );

        if registry.is_enabled(Capability::Weather) {
            if let Some(key) = self.config.api_keys.openweather.clone() {
                dispatcher = dispatcher.weather(Arc::new(WeatherClient::new(key)?));
            }
        }
        if registry.is_enabled(Capability::Stocks) {
            dispatcher = dispatcher.stocks(Arc::new(StockClient::new()));
        }
        if registry.is_enabled(Capability::Encyclopedia) {
            dispatcher = dispatcher.encyclopedia(Arc::new(WikipediaClient::new()));
        }
        if let Some(translator) = translator.clone() {
            dispatcher = dispatcher.translator(translator);
        }
        if registry.is_enabled(Capability::Ai) {
            if let Some(key) = self.config.api_keys.openai.clone() {
                dispatcher =
                    dispatcher.ai(Arc::new(crate::adapters::AiClient::new(key, "gpt-4o-mini".to_string())?));
            }
        }

        let stt_key = self.config.api_keys.openai.clone().ok_or_else(|| {
            Error::Config("an OpenAI API key is required for speech recognition".to_string())
        })?;
        let transcriber = WhisperClient::new(stt_key, self.config.voice_settings.stt_model.clone())?;
        let mut input = MicrophoneInput::new(transcriber)?;

        // Shutdown on ctrl-c
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown_tx.send(()).await;
            }
        });

        let wake_hint = wake_phrases.last().cloned().unwrap_or_default();
        speaker
            .say_default(&format!(
                "Hello! I'm Murmur, your voice assistant. I'm now running in the background. \
                 Say '{wake_hint}' to wake me up."
            ))
            .await;

        let session_loop = SessionLoop::new(
            dispatcher,
            speaker,
            session,
            registry,
            wake_phrases,
            translator,
            self.config.system.default_language.clone(),
        );
        session_loop.run(&mut input, &mut shutdown_rx).await;

        tracing::info!("daemon stopped");
        Ok(())
    }
}
