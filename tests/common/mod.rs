//! Shared test utilities
//!
//! In-memory fakes for every adapter trait, plus a harness that wires a
//! fully mocked session loop together.

#![allow(dead_code)] // each integration test binary uses a subset

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use murmur_assistant::adapters::{
    ActionRunner, AiChat, EncyclopediaLookup, Speaker, SpeechInput, SpeechOutput, StockLookup,
    SystemAction, Translator, WeatherLookup,
};
use murmur_assistant::dispatch::Dispatcher;
use murmur_assistant::reminder::ReminderScheduler;
use murmur_assistant::{Error, Result, ServiceRegistry, Session, SessionLoop};

/// Speech input that replays a scripted sequence of captures
///
/// Each `capture` call pops the front entry; once the script is
/// exhausted every capture times out silently.
pub struct ScriptedInput {
    script: VecDeque<Option<String>>,
    pub capture_count: usize,
}

impl ScriptedInput {
    pub fn new(entries: impl IntoIterator<Item = Option<&'static str>>) -> Self {
        Self {
            script: entries
                .into_iter()
                .map(|e| e.map(ToString::to_string))
                .collect(),
            capture_count: 0,
        }
    }
}

#[async_trait(?Send)]
impl SpeechInput for ScriptedInput {
    async fn capture(&mut self, _timeout: Duration) -> Result<Option<String>> {
        self.capture_count += 1;
        Ok(self.script.pop_front().flatten())
    }
}

/// Speech input whose transport always fails
pub struct FailingInput;

#[async_trait(?Send)]
impl SpeechInput for FailingInput {
    async fn capture(&mut self, _timeout: Duration) -> Result<Option<String>> {
        Err(Error::Transcription("service unreachable".to_string()))
    }
}

/// Speech output that records every spoken (text, language) pair
pub struct RecordingSpeech {
    spoken: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingSpeech {
    pub fn new() -> (Self, Arc<Mutex<Vec<(String, String)>>>) {
        let spoken = Arc::new(Mutex::new(Vec::new()));
        (Self { spoken: Arc::clone(&spoken) }, spoken)
    }
}

#[async_trait]
impl SpeechOutput for RecordingSpeech {
    async fn speak(&mut self, text: &str, language: &str) -> Result<()> {
        self.spoken.lock().unwrap().push((text.to_string(), language.to_string()));
        Ok(())
    }
}

/// Action runner that records requested actions without side effects
pub struct RecordingActions {
    pub actions: Arc<Mutex<Vec<SystemAction>>>,
}

impl RecordingActions {
    pub fn new() -> (Self, Arc<Mutex<Vec<SystemAction>>>) {
        let actions = Arc::new(Mutex::new(Vec::new()));
        (Self { actions: Arc::clone(&actions) }, actions)
    }
}

impl ActionRunner for RecordingActions {
    fn run(&self, action: &SystemAction) -> bool {
        self.actions.lock().unwrap().push(action.clone());
        true
    }
}

/// Weather lookup returning a fixed report
pub struct FixedWeather;

#[async_trait]
impl WeatherLookup for FixedWeather {
    async fn current(&self, city: &str) -> Result<String> {
        Ok(format!("Weather in {city}: clear sky, 18 degrees Celsius"))
    }
}

/// Weather lookup that always fails transiently
pub struct FailingWeather;

#[async_trait]
impl WeatherLookup for FailingWeather {
    async fn current(&self, _city: &str) -> Result<String> {
        Err(Error::Lookup { capability: "weather", message: "timeout".to_string() })
    }
}

/// Stock lookup returning a fixed quote
pub struct FixedStocks;

#[async_trait]
impl StockLookup for FixedStocks {
    async fn quote(&self, symbol: &str) -> Result<String> {
        Ok(format!("{symbol} stock price is 123.45 dollars"))
    }
}

/// Encyclopedia lookup returning a fixed summary
pub struct FixedEncyclopedia;

#[async_trait]
impl EncyclopediaLookup for FixedEncyclopedia {
    async fn summary(&self, topic: &str) -> Result<String> {
        Ok(format!("According to Wikipedia: {topic} is a thing."))
    }
}

/// AI chat echoing a recognizable answer
pub struct FixedAi;

#[async_trait]
impl AiChat for FixedAi {
    async fn answer(&self, query: &str) -> Result<String> {
        Ok(format!("AI says: {query}"))
    }
}

/// Translator that reports a fixed detected language and translates by
/// identity, so classification still sees the original text
pub struct FixedLanguageTranslator {
    pub detected: &'static str,
}

#[async_trait]
impl Translator for FixedLanguageTranslator {
    async fn detect(&self, _text: &str) -> Result<String> {
        Ok(self.detected.to_string())
    }

    async fn translate(&self, text: &str, _target: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

/// A fully mocked session loop plus the handles tests assert against
pub struct Harness {
    pub session_loop: SessionLoop,
    pub session: Session,
    pub spoken: Arc<Mutex<Vec<(String, String)>>>,
    pub actions: Arc<Mutex<Vec<SystemAction>>>,
}

/// Wake phrases used across the integration tests
pub fn wake_phrases() -> Vec<String> {
    vec!["hey murmur".to_string(), "murmur".to_string()]
}

/// Build a session loop with recording mocks and every lookup attached
pub fn harness(registry: ServiceRegistry) -> Harness {
    harness_with_translator(registry, None)
}

/// Like [`harness`], with a translator attached to the loop
pub fn harness_with_translator(
    registry: ServiceRegistry,
    translator: Option<Arc<dyn Translator>>,
) -> Harness {
    let session = Session::new("en");
    let (output, spoken) = RecordingSpeech::new();
    let speaker = Speaker::new(Box::new(output), None, "en");
    let (action_runner, actions) = RecordingActions::new();

    let reminders = ReminderScheduler::new(session.clone(), speaker.clone());
    let mut dispatcher = Dispatcher::new(
        registry.clone(),
        session.clone(),
        reminders,
        Box::new(action_runner),
    )
    .weather(Arc::new(FixedWeather))
    .stocks(Arc::new(FixedStocks))
    .encyclopedia(Arc::new(FixedEncyclopedia))
    .ai(Arc::new(FixedAi));

    if let Some(translator) = translator.clone() {
        dispatcher = dispatcher.translator(translator);
    }

    let session_loop = SessionLoop::new(
        dispatcher,
        speaker,
        session.clone(),
        registry,
        wake_phrases(),
        translator,
        "en",
    );

    Harness { session_loop, session, spoken, actions }
}

/// Texts spoken so far
pub fn spoken_lines(spoken: &Arc<Mutex<Vec<(String, String)>>>) -> Vec<String> {
    spoken.lock().unwrap().iter().map(|(text, _)| text.clone()).collect()
}
