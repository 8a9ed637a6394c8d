//! Command dispatch
//!
//! Routes a classified intent to exactly one adapter call and formats
//! the outcome as a spoken response. Adapter failures never propagate:
//! they become apologies naming the failed capability. The response kind
//! is typed so the session loop never sniffs response text.

use std::sync::Arc;

use crate::adapters::{
    ActionRunner, AiChat, EncyclopediaLookup, StockLookup, SystemAction, Translator,
    WeatherLookup, actions::web_search_url,
};
use crate::intent::{Intent, mathexpr};
use crate::registry::{Capability, ServiceRegistry};
use crate::reminder::ReminderScheduler;
use crate::session::Session;
use crate::Error;

/// Fixed reply when nothing matched and AI could not help
const DIDNT_UNDERSTAND: &str = "I didn't understand that command. Say 'help' to see what I can do.";

/// How a response should be interpreted by the session loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Plain spoken response
    Normal,
    /// Listening was just suppressed
    PauseAck,
    /// Listening was just resumed
    ResumeAck,
    /// The exchange ended; reset to idle
    ExitAck,
}

/// One spoken response per dispatched utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Typed response category
    pub kind: ResponseKind,
    /// Text to speak
    pub text: String,
}

impl Response {
    fn normal(text: impl Into<String>) -> Self {
        Self { kind: ResponseKind::Normal, text: text.into() }
    }

    const fn with_kind(kind: ResponseKind, text: String) -> Self {
        Self { kind, text }
    }
}

/// Routes intents to adapters
pub struct Dispatcher {
    registry: ServiceRegistry,
    session: Session,
    reminders: ReminderScheduler,
    actions: Box<dyn ActionRunner>,
    weather: Option<Arc<dyn WeatherLookup>>,
    stocks: Option<Arc<dyn StockLookup>>,
    encyclopedia: Option<Arc<dyn EncyclopediaLookup>>,
    translator: Option<Arc<dyn Translator>>,
    ai: Option<Arc<dyn AiChat>>,
}

impl Dispatcher {
    /// Create a dispatcher with no lookup adapters attached
    #[must_use]
    pub fn new(
        registry: ServiceRegistry,
        session: Session,
        reminders: ReminderScheduler,
        actions: Box<dyn ActionRunner>,
    ) -> Self {
        Self {
            registry,
            session,
            reminders,
            actions,
            weather: None,
            stocks: None,
            encyclopedia: None,
            translator: None,
            ai: None,
        }
    }

    /// Attach a weather adapter
    #[must_use]
    pub fn weather(mut self, adapter: Arc<dyn WeatherLookup>) -> Self {
        self.weather = Some(adapter);
        self
    }

    /// Attach a stock quote adapter
    #[must_use]
    pub fn stocks(mut self, adapter: Arc<dyn StockLookup>) -> Self {
        self.stocks = Some(adapter);
        self
    }

    /// Attach an encyclopedia adapter
    #[must_use]
    pub fn encyclopedia(mut self, adapter: Arc<dyn EncyclopediaLookup>) -> Self {
        self.encyclopedia = Some(adapter);
        self
    }

    /// Attach a translation adapter
    #[must_use]
    pub fn translator(mut self, adapter: Arc<dyn Translator>) -> Self {
        self.translator = Some(adapter);
        self
    }

    /// Attach an AI chat adapter
    #[must_use]
    pub fn ai(mut self, adapter: Arc<dyn AiChat>) -> Self {
        self.ai = Some(adapter);
        self
    }

    /// Dispatch one intent, producing exactly one response
    #[allow(clippy::too_many_lines)]
    pub async fn dispatch(&self, intent: Intent) -> Response {
        match intent {
            Intent::AiQuery { query } => self.ask_ai(&query).await.map_or_else(
                || unavailable(Capability::Ai),
                Response::normal,
            ),

            Intent::Weather { city } => match &self.weather {
                Some(adapter) if self.registry.is_enabled(Capability::Weather) => {
                    Response::normal(adapter.current(&city).await.unwrap_or_else(|e| apology(&e)))
                }
                _ => unavailable(Capability::Weather),
            },

            Intent::Calculate { expression } => Response::normal(calculate(&expression)),

            Intent::InvalidExpression => {
                Response::normal("That doesn't look like a valid mathematical expression")
            }

            Intent::StockPrice { symbol } => match &self.stocks {
                Some(adapter) if self.registry.is_enabled(Capability::Stocks) => {
                    Response::normal(adapter.quote(&symbol).await.unwrap_or_else(|e| apology(&e)))
                }
                _ => unavailable(Capability::Stocks),
            },

            Intent::Encyclopedia { topic } => match &self.encyclopedia {
                Some(adapter) if self.registry.is_enabled(Capability::Encyclopedia) => {
                    Response::normal(adapter.summary(&topic).await.unwrap_or_else(|e| apology(&e)))
                }
                _ => unavailable(Capability::Encyclopedia),
            },

            Intent::Translate { text, target } => match &self.translator {
                Some(adapter) if self.registry.is_enabled(Capability::Translation) => {
                    Response::normal(
                        adapter
                            .translate(&text, &target)
                            .await
                            .map_or_else(|e| apology(&e), |t| format!("Translation: {t}")),
                    )
                }
                _ => unavailable(Capability::Translation),
            },

            Intent::TranslateUsage => {
                Response::normal("Please say: translate some text to a language")
            }

            Intent::Reminder { message, minutes } => {
                Response::normal(self.reminders.schedule(&message, minutes))
            }

            Intent::ReminderUsage => {
                Response::normal("Please say: remind me about something in a number of minutes")
            }

            Intent::Pause => {
                self.session.set_paused(true);
                Response::with_kind(
                    ResponseKind::PauseAck,
                    "I'm paused. Say resume when you need me.".to_string(),
                )
            }

            Intent::Resume => {
                self.session.set_paused(false);
                Response::with_kind(ResponseKind::ResumeAck, "I'm listening again!".to_string())
            }

            Intent::Status => Response::normal(self.status_report().await),

            Intent::OpenApp { name } => {
                if self.actions.run(&SystemAction::OpenApp(name.clone())) {
                    Response::normal(format!("Opening {name}"))
                } else {
                    Response::normal(format!("Sorry, I couldn't open {name}"))
                }
            }

            Intent::VolumeUp => {
                if self.actions.run(&SystemAction::VolumeUp) {
                    Response::normal("Volume increased")
                } else {
                    Response::normal("Volume control not available")
                }
            }

            Intent::VolumeDown => {
                if self.actions.run(&SystemAction::VolumeDown) {
                    Response::normal("Volume decreased")
                } else {
                    Response::normal("Volume control not available")
                }
            }

            Intent::SystemInfo => Response::normal(system_report().await),

            Intent::Time => {
                let now = chrono::Local::now();
                Response::normal(format!("The current time is {}", now.format("%I:%M %p")))
            }

            Intent::Date => {
                let today = chrono::Local::now();
                Response::normal(format!("Today's date is {}", today.format("%B %d, %Y")))
            }

            Intent::WebSearch { term } => {
                if self.actions.run(&SystemAction::OpenUrl(web_search_url(&term))) {
                    Response::normal(format!("Searching for {term}"))
                } else {
                    Response::normal("Sorry, I couldn't open the browser")
                }
            }

            Intent::WebSearchUsage => Response::normal("What would you like me to search for?"),

            Intent::Shutdown => {
                if self.actions.run(&SystemAction::Shutdown) {
                    Response::normal("Shutting down the computer")
                } else {
                    Response::normal("Sorry, I couldn't shut down the computer")
                }
            }

            Intent::Restart => {
                if self.actions.run(&SystemAction::Restart) {
                    Response::normal("Restarting the computer")
                } else {
                    Response::normal("Sorry, I couldn't restart the computer")
                }
            }

            Intent::Lock => {
                if self.actions.run(&SystemAction::Lock) {
                    Response::normal("Locking the computer")
                } else {
                    Response::normal("Sorry, I couldn't lock the computer")
                }
            }

            Intent::Help => Response::normal(self.help_text()),

            Intent::Exit => Response::with_kind(
                ResponseKind::ExitAck,
                "Goodbye! I'll keep listening in the background.".to_string(),
            ),

            Intent::Unknown { text } => self.fallback(&text).await,
        }
    }

    /// Ask the AI adapter, returning None when unavailable or failing
    async fn ask_ai(&self, query: &str) -> Option<String> {
        if !self.registry.is_enabled(Capability::Ai) {
            return None;
        }
        let adapter = self.ai.as_ref()?;
        match adapter.answer(query).await {
            Ok(answer) if !answer.is_empty() => Some(answer),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "AI answer failed");
                None
            }
        }
    }

    /// Fallback chain for unmatched utterances: AI retry, then the fixed
    /// message
    async fn fallback(&self, text: &str) -> Response {
        if !text.is_empty() {
            if let Some(answer) = self.ask_ai(text).await {
                return Response::normal(answer);
            }
        }
        Response::normal(DIDNT_UNDERSTAND)
    }

    /// Status line: enabled services plus current CPU usage
    async fn status_report(&self) -> String {
        let services = self.registry.enabled_count();
        let (cpu, memory, _disk) = probe_system().await;
        format!(
            "I'm running in background mode with {services} services enabled. \
             CPU usage: {cpu:.1} percent, memory {memory:.1} percent"
        )
    }

    /// Help text enumerating what is actually enabled
    fn help_text(&self) -> String {
        let extras = self.registry.enabled_names();
        let features = if extras.is_empty() {
            "basic system controls".to_string()
        } else {
            extras.join(", ")
        };

        format!(
            "I can open applications, control volume, report system status, tell the time \
             and date, search the web, do math, and set reminders. Also available: {features}. \
             Say pause, resume, or status to control me."
        )
    }
}

/// Apology for a disabled or unconfigured capability
fn unavailable(capability: Capability) -> Response {
    Response::normal(format!("Sorry, I can't help with {capability} right now"))
}

/// Convert an adapter error into a spoken apology
fn apology(error: &Error) -> String {
    tracing::warn!(error = %error, "adapter call failed");
    match error {
        Error::Lookup { capability, .. } => {
            format!("Sorry, I couldn't reach the {capability} service just now")
        }
        Error::CapabilityUnavailable(name) => {
            format!("Sorry, {name} is not available right now")
        }
        Error::Translation(_) => "Sorry, I couldn't translate that".to_string(),
        _ => "Sorry, something went wrong with that request".to_string(),
    }
}

/// Evaluate a calculate intent's expression
fn calculate(expression: &str) -> String {
    match mathexpr::evaluate(expression) {
        Ok(value) => format!("The result is {}", mathexpr::format_result(value)),
        Err(mathexpr::EvalError::DivideByZero) => "Cannot divide by zero".to_string(),
        Err(mathexpr::EvalError::DisallowedCharacter(_)) => {
            "That doesn't look like a valid mathematical expression".to_string()
        }
        Err(mathexpr::EvalError::Malformed(_)) => "I couldn't calculate that".to_string(),
    }
}

/// Sample CPU, memory, and disk usage percentages
async fn probe_system() -> (f32, f32, f32) {
    use sysinfo::System;

    let mut system = System::new();
    system.refresh_cpu();
    // CPU usage needs two samples spaced apart
    tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
    system.refresh_cpu();
    system.refresh_memory();

    let cpus = system.cpus();
    #[allow(clippy::cast_precision_loss)]
    let cpu = if cpus.is_empty() {
        0.0
    } else {
        cpus.iter().map(sysinfo::Cpu::cpu_usage).sum::<f32>() / cpus.len() as f32
    };

    #[allow(clippy::cast_precision_loss)]
    let memory = if system.total_memory() == 0 {
        0.0
    } else {
        (system.used_memory() as f32 / system.total_memory() as f32) * 100.0
    };

    let disks = sysinfo::Disks::new_with_refreshed_list();
    #[allow(clippy::cast_precision_loss)]
    let disk = disks
        .list()
        .first()
        .map(|d| {
            let total = d.total_space();
            if total == 0 {
                0.0
            } else {
                ((total - d.available_space()) as f32 / total as f32) * 100.0
            }
        })
        .unwrap_or(0.0);

    (cpu, memory, disk)
}

/// Full system report for the system-info intent
async fn system_report() -> String {
    let (cpu, memory, disk) = probe_system().await;
    format!(
        "System status: CPU {cpu:.1} percent, memory {memory:.1} percent, disk {disk:.1} percent"
    )
}
