//! The ordered intent rule table
//!
//! Each rule pairs a predicate with an extractor. [`RULES`] is evaluated
//! top to bottom and the first match wins, so table order IS the priority
//! order: the AI cue short-circuit first, then domain rules, then basic
//! system rules. Reordering entries changes classification behavior.

use std::sync::LazyLock;

use regex::Regex;

use super::{Intent, mathexpr};
use crate::registry::{Capability, ServiceRegistry};

/// Default city when a weather request names none
pub const DEFAULT_CITY: &str = "London";

/// Default ticker when a stock request names none
pub const DEFAULT_SYMBOL: &str = "AAPL";

/// Question-style cue words that route to the AI capability
const AI_CUES: [&str; 8] = [
    "how", "why", "what", "explain", "tell me", "advice", "help me", "should i",
];

/// One entry in the ordered rule table
pub struct Rule {
    /// Stable rule identifier, used in logs
    pub name: &'static str,
    /// Whether this rule matches the command under the given registry
    pub applies: fn(&str, &ServiceRegistry) -> bool,
    /// Build the intent, extracting parameters from the command
    pub extract: fn(&str) -> Intent,
}

static WEATHER_CITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"weather (?:in |for )?([a-z][a-z\s]*)").expect("valid regex"));

static MATH_STRIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*(?:calculate|math|compute|solve)\s*").expect("valid regex"));

static STOCK_SYMBOL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"stock\s+(?:price\s+)?(?:of\s+|for\s+)?([a-z]{1,5})\b").expect("valid regex")
});

static ENCYCLOPEDIA_STRIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*(?:wikipedia|tell me about|what is|who is)\s*").expect("valid regex")
});

static TRANSLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"translate (.+?) to (\w+)").expect("valid regex"));

static REMINDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"remind me (?:to |about )?(.+?) in (\d+) minutes?").expect("valid regex")
});

static SEARCH_STRIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*(?:search for|google|look up)\s*").expect("valid regex"));

fn contains_any(command: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| command.contains(k))
}

fn extract_weather(command: &str) -> Intent {
    let city = WEATHER_CITY
        .captures(command)
        .and_then(|c| c.get(1))
        .map_or(DEFAULT_CITY, |m| m.as_str().trim())
        .to_string();
    let city = if city.is_empty() { DEFAULT_CITY.to_string() } else { city };
    Intent::Weather { city }
}

fn extract_calculate(command: &str) -> Intent {
    let raw = MATH_STRIP.replace(command, "");
    let expression = mathexpr::normalize(raw.trim());
    if mathexpr::has_only_allowed_chars(&expression) {
        Intent::Calculate { expression }
    } else {
        Intent::InvalidExpression
    }
}

fn extract_stock(command: &str) -> Intent {
    let symbol = STOCK_SYMBOL
        .captures(command)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|s| !matches!(*s, "price" | "of" | "for"))
        .map_or_else(|| DEFAULT_SYMBOL.to_string(), str::to_uppercase);
    Intent::StockPrice { symbol }
}

fn extract_encyclopedia(command: &str) -> Intent {
    let topic = ENCYCLOPEDIA_STRIP.replace(command, "").trim().to_string();
    if topic.is_empty() {
        Intent::Unknown { text: command.to_string() }
    } else {
        Intent::Encyclopedia { topic }
    }
}

fn extract_translate(command: &str) -> Intent {
    TRANSLATE.captures(command).map_or(Intent::TranslateUsage, |c| Intent::Translate {
        text: c[1].trim().to_string(),
        target: c[2].to_string(),
    })
}

fn extract_reminder(command: &str) -> Intent {
    REMINDER
        .captures(command)
        .and_then(|c| {
            let minutes = c[2].parse::<u64>().ok()?;
            Some(Intent::Reminder {
                message: c[1].trim().to_string(),
                minutes,
            })
        })
        .unwrap_or(Intent::ReminderUsage)
}

fn extract_open_app(command: &str) -> Intent {
    let name = command.strip_prefix("open ").unwrap_or(command).trim().to_string();
    Intent::OpenApp { name }
}

fn extract_web_search(command: &str) -> Intent {
    let term = SEARCH_STRIP.replace(command, "").trim().to_string();
    if term.is_empty() {
        Intent::WebSearchUsage
    } else {
        Intent::WebSearch { term }
    }
}

/// The ordered rule table; first match wins
pub static RULES: &[Rule] = &[
    Rule {
        name: "ai-query",
        applies: |command, registry| {
            registry.is_enabled(Capability::Ai) && contains_any(command, &AI_CUES)
        },
        extract: |command| Intent::AiQuery { query: command.to_string() },
    },
    Rule {
        name: "weather",
        applies: |command, _| contains_any(command, &["weather", "temperature", "forecast"]),
        extract: extract_weather,
    },
    Rule {
        name: "calculate",
        applies: |command, _| contains_any(command, &["calculate", "math", "compute", "solve"]),
        extract: extract_calculate,
    },
    Rule {
        name: "stock-price",
        applies: |command, _| command.contains("stock") && command.contains("price"),
        extract: extract_stock,
    },
    Rule {
        name: "encyclopedia",
        applies: |command, _| {
            contains_any(command, &["wikipedia", "tell me about", "what is", "who is"])
        },
        extract: extract_encyclopedia,
    },
    Rule {
        name: "translate",
        applies: |command, registry| {
            command.contains("translate") && registry.is_enabled(Capability::Translation)
        },
        extract: extract_translate,
    },
    Rule {
        name: "reminder",
        applies: |command, _| command.contains("remind me") || command.contains("set reminder"),
        extract: extract_reminder,
    },
    Rule {
        name: "pause",
        applies: |command, _| command.contains("pause") || command.contains("stop listening"),
        extract: |_| Intent::Pause,
    },
    Rule {
        name: "resume",
        applies: |command, _| command.contains("resume") || command.contains("start listening"),
        extract: |_| Intent::Resume,
    },
    Rule {
        name: "status",
        applies: |command, _| command.contains("status") || command.contains("how are you"),
        extract: |_| Intent::Status,
    },
    Rule {
        name: "open-app",
        applies: |command, _| command.starts_with("open "),
        extract: extract_open_app,
    },
    Rule {
        name: "volume-up",
        applies: |command, _| contains_any(command, &["volume up", "increase volume"]),
        extract: |_| Intent::VolumeUp,
    },
    Rule {
        name: "volume-down",
        applies: |command, _| contains_any(command, &["volume down", "decrease volume"]),
        extract: |_| Intent::VolumeDown,
    },
    Rule {
        name: "system-info",
        applies: |command, _| contains_any(command, &["system info", "performance"]),
        extract: |_| Intent::SystemInfo,
    },
    Rule {
        name: "time",
        applies: |command, _| command.contains("time"),
        extract: |_| Intent::Time,
    },
    Rule {
        name: "date",
        applies: |command, _| command.contains("date"),
        extract: |_| Intent::Date,
    },
    Rule {
        name: "web-search",
        applies: |command, _| contains_any(command, &["search for", "google", "look up"]),
        extract: extract_web_search,
    },
    Rule {
        name: "shutdown",
        applies: |command, _| command.contains("shutdown"),
        extract: |_| Intent::Shutdown,
    },
    Rule {
        name: "restart",
        applies: |command, _| contains_any(command, &["restart", "reboot"]),
        extract: |_| Intent::Restart,
    },
    Rule {
        name: "lock",
        applies: |command, _| command.contains("lock"),
        extract: |_| Intent::Lock,
    },
    Rule {
        name: "help",
        applies: |command, _| command.contains("help") || command.contains("what can you do"),
        extract: |_| Intent::Help,
    },
    Rule {
        name: "exit",
        applies: |command, _| contains_any(command, &["goodbye", "exit", "quit", "stop"]),
        extract: |_| Intent::Exit,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::classify;
    use crate::registry::ServiceRegistry;

    fn no_ai() -> ServiceRegistry {
        ServiceRegistry::all_disabled()
    }

    #[test]
    fn ai_cue_short_circuits_when_enabled() {
        let registry = ServiceRegistry::all_enabled();
        // "what" is an AI cue AND "weather" is a domain keyword; AI wins
        let intent = classify("what is the weather like", &registry);
        assert_eq!(
            intent,
            Intent::AiQuery { query: "what is the weather like".to_string() }
        );
    }

    #[test]
    fn ai_cue_ignored_when_disabled() {
        let intent = classify("what is the weather like", &no_ai());
        assert_eq!(intent, Intent::Weather { city: "like".to_string() });
    }

    #[test]
    fn weather_city_defaults_to_london() {
        assert_eq!(
            classify("weather", &no_ai()),
            Intent::Weather { city: DEFAULT_CITY.to_string() }
        );
        assert_eq!(
            classify("temperature please", &no_ai()),
            Intent::Weather { city: DEFAULT_CITY.to_string() }
        );
    }

    #[test]
    fn weather_city_extracted_from_phrase() {
        assert_eq!(
            classify("weather in paris", &no_ai()),
            Intent::Weather { city: "paris".to_string() }
        );
        assert_eq!(
            classify("weather for new york", &no_ai()),
            Intent::Weather { city: "new york".to_string() }
        );
    }

    #[test]
    fn calculate_extracts_normalized_expression() {
        assert_eq!(
            classify("calculate 2 + 2", &no_ai()),
            Intent::Calculate { expression: "2 + 2".to_string() }
        );
        assert_eq!(
            classify("please compute 3 x 4", &no_ai()),
            Intent::Calculate { expression: "3 * 4".to_string() }
        );
    }

    #[test]
    fn calculate_rejects_disallowed_characters() {
        assert_eq!(classify("calculate rm -rf /tmp; echo", &no_ai()), Intent::InvalidExpression);
        assert_eq!(classify("calculate two plus two", &no_ai()), Intent::InvalidExpression);
    }

    #[test]
    fn stock_symbol_defaults_to_aapl() {
        assert_eq!(
            classify("stock price", &no_ai()),
            Intent::StockPrice { symbol: DEFAULT_SYMBOL.to_string() }
        );
    }

    #[test]
    fn stock_symbol_extracted_and_uppercased() {
        assert_eq!(
            classify("stock price of tsla", &no_ai()),
            Intent::StockPrice { symbol: "TSLA".to_string() }
        );
        assert_eq!(
            classify("stock price for msft", &no_ai()),
            Intent::StockPrice { symbol: "MSFT".to_string() }
        );
    }

    #[test]
    fn encyclopedia_topic_extracted() {
        assert_eq!(
            classify("who is marie curie", &no_ai()),
            Intent::Encyclopedia { topic: "marie curie".to_string() }
        );
        assert_eq!(
            classify("wikipedia rust programming", &no_ai()),
            Intent::Encyclopedia { topic: "rust programming".to_string() }
        );
    }

    #[test]
    fn encyclopedia_cues_lose_to_ai_when_enabled() {
        let registry = ServiceRegistry::all_enabled();
        assert!(matches!(
            classify("tell me about black holes", &registry),
            Intent::AiQuery { .. }
        ));
    }

    #[test]
    fn translate_extracts_text_and_target() {
        let registry = ServiceRegistry::all_enabled();
        // No AI cue words here, so the translate rule is reached
        assert_eq!(
            classify("translate good morning to spanish", &registry),
            Intent::Translate {
                text: "good morning".to_string(),
                target: "spanish".to_string(),
            }
        );
    }

    #[test]
    fn translate_without_target_yields_usage_hint() {
        let registry = ServiceRegistry::all_enabled();
        assert_eq!(classify("translate good morning", &registry), Intent::TranslateUsage);
    }

    #[test]
    fn translate_unreachable_when_capability_disabled() {
        assert_eq!(
            classify("translate good morning to spanish", &no_ai()),
            Intent::Unknown { text: "translate good morning to spanish".to_string() }
        );
    }

    #[test]
    fn reminder_extracts_message_and_minutes() {
        assert_eq!(
            classify("remind me to stretch in 15 minutes", &no_ai()),
            Intent::Reminder { message: "stretch".to_string(), minutes: 15 }
        );
        assert_eq!(
            classify("remind me about the oven in 1 minute", &no_ai()),
            Intent::Reminder { message: "the oven".to_string(), minutes: 1 }
        );
    }

    #[test]
    fn reminder_without_delay_yields_usage_hint() {
        assert_eq!(classify("set reminder for tomorrow", &no_ai()), Intent::ReminderUsage);
    }

    #[test]
    fn session_control_rules() {
        assert_eq!(classify("pause", &no_ai()), Intent::Pause);
        assert_eq!(classify("stop listening", &no_ai()), Intent::Pause);
        assert_eq!(classify("resume", &no_ai()), Intent::Resume);
        assert_eq!(classify("status", &no_ai()), Intent::Status);
        // "system status" hits the status rule first, as ordered
        assert_eq!(classify("system status", &no_ai()), Intent::Status);
    }

    #[test]
    fn basic_system_rules() {
        assert_eq!(
            classify("open notepad", &no_ai()),
            Intent::OpenApp { name: "notepad".to_string() }
        );
        assert_eq!(classify("volume up", &no_ai()), Intent::VolumeUp);
        assert_eq!(classify("decrease volume", &no_ai()), Intent::VolumeDown);
        assert_eq!(classify("system info", &no_ai()), Intent::SystemInfo);
        assert_eq!(classify("current time", &no_ai()), Intent::Time);
        assert_eq!(classify("today's date", &no_ai()), Intent::Date);
        assert_eq!(classify("shutdown", &no_ai()), Intent::Shutdown);
        assert_eq!(classify("reboot", &no_ai()), Intent::Restart);
        assert_eq!(classify("lock", &no_ai()), Intent::Lock);
        assert_eq!(classify("goodbye", &no_ai()), Intent::Exit);
    }

    #[test]
    fn web_search_extracts_term() {
        assert_eq!(
            classify("search for rust tutorials", &no_ai()),
            Intent::WebSearch { term: "rust tutorials".to_string() }
        );
        assert_eq!(classify("search for", &no_ai()), Intent::WebSearchUsage);
    }

    #[test]
    fn help_rule_without_ai() {
        assert_eq!(classify("help", &no_ai()), Intent::Help);
        // With AI enabled, "help me" is a cue and routes to AI instead
        let registry = ServiceRegistry::all_enabled();
        assert!(matches!(classify("help me", &registry), Intent::AiQuery { .. }));
    }

    #[test]
    fn unmatched_text_is_unknown() {
        assert_eq!(
            classify("fiddlesticks", &no_ai()),
            Intent::Unknown { text: "fiddlesticks".to_string() }
        );
    }

    #[test]
    fn rule_names_are_unique() {
        let mut names: Vec<&str> = RULES.iter().map(|r| r.name).collect();
        names.sort_unstable();
        let len = names.len();
        names.dedup();
        assert_eq!(names.len(), len);
    }
}
