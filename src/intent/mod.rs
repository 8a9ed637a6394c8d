//! Intent classification
//!
//! Maps normalized command text to an intent with extracted parameters.
//! Rules live in an explicit ordered table (`rules::RULES`); the first
//! matching rule wins and later rules are never consulted. Classification
//! is pure: identical input and registry state always produce the same
//! intent.

pub mod mathexpr;
pub mod rules;

use crate::registry::ServiceRegistry;

/// A classified utterance with extracted parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Free-form question routed to the AI capability
    AiQuery {
        /// The full utterance
        query: String,
    },
    /// Weather report for a city
    Weather {
        /// City name, defaulting to "London"
        city: String,
    },
    /// Arithmetic over a normalized expression
    Calculate {
        /// Normalized expression text
        expression: String,
    },
    /// Calculation request containing characters outside the allowed set
    InvalidExpression,
    /// Stock quote for a ticker symbol
    StockPrice {
        /// Uppercase ticker, defaulting to "AAPL"
        symbol: String,
    },
    /// Encyclopedia summary lookup
    Encyclopedia {
        /// Lookup topic
        topic: String,
    },
    /// Translate text to a target language
    Translate {
        /// Text to translate
        text: String,
        /// Target language name or code
        target: String,
    },
    /// Translation request missing text or target
    TranslateUsage,
    /// Schedule a one-shot reminder
    Reminder {
        /// Reminder message
        message: String,
        /// Delay before firing
        minutes: u64,
    },
    /// Reminder request missing message or delay
    ReminderUsage,
    /// Suppress listening until resumed
    Pause,
    /// Resume listening
    Resume,
    /// Report assistant status
    Status,
    /// Launch an application
    OpenApp {
        /// Spoken application name
        name: String,
    },
    /// Raise system volume
    VolumeUp,
    /// Lower system volume
    VolumeDown,
    /// Report CPU/memory/disk usage
    SystemInfo,
    /// Report the current time
    Time,
    /// Report today's date
    Date,
    /// Open a web search for a term
    WebSearch {
        /// Search term
        term: String,
    },
    /// Search request with no term
    WebSearchUsage,
    /// Shut the machine down
    Shutdown,
    /// Restart the machine
    Restart,
    /// Lock the workstation
    Lock,
    /// Enumerate available capabilities
    Help,
    /// End the exchange
    Exit,
    /// No rule matched
    Unknown {
        /// The unmatched utterance
        text: String,
    },
}

/// Classify normalized command text against the ordered rule table
///
/// The text should already have its wake phrase stripped via
/// [`strip_wake_phrase`]; classification lowercases and trims defensively
/// so the result is identical either way.
#[must_use]
pub fn classify(text: &str, registry: &ServiceRegistry) -> Intent {
    let command = text.trim().to_lowercase();
    if command.is_empty() {
        return Intent::Unknown { text: command };
    }

    for rule in rules::RULES {
        if (rule.applies)(&command, registry) {
            let intent = (rule.extract)(&command);
            tracing::debug!(rule = rule.name, ?intent, "rule matched");
            return intent;
        }
    }

    Intent::Unknown { text: command }
}

/// Remove the longest matching wake phrase prefix from a transcript
///
/// `phrases` must be lowercase and sorted longest first (see
/// [`crate::Config::normalized_wake_phrases`]). Leading separators after
/// the phrase are trimmed along with it.
#[must_use]
pub fn strip_wake_phrase(text: &str, phrases: &[String]) -> String {
    let command = text.trim().to_lowercase();

    for phrase in phrases {
        if command == *phrase {
            return String::new();
        }
        if let Some(rest) = command.strip_prefix(phrase.as_str()) {
            if rest.starts_with([' ', ',', '.']) {
                return rest
                    .trim_start_matches(|c: char| c.is_whitespace() || c == ',' || c == '.')
                    .to_string();
            }
        }
    }

    command
}

/// Whether a transcript contains any wake phrase
#[must_use]
pub fn contains_wake_phrase(text: &str, phrases: &[String]) -> bool {
    let normalized = text.to_lowercase();
    phrases.iter().any(|p| normalized.contains(p.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ServiceRegistry;

    fn wake_phrases() -> Vec<String> {
        vec!["hey murmur".to_string(), "murmur".to_string()]
    }

    #[test]
    fn strips_longest_matching_wake_phrase() {
        let phrases = wake_phrases();
        assert_eq!(
            strip_wake_phrase("hey murmur, what time is it", &phrases),
            "what time is it"
        );
        assert_eq!(strip_wake_phrase("Murmur open notepad", &phrases), "open notepad");
        assert_eq!(strip_wake_phrase("hey murmur", &phrases), "");
    }

    #[test]
    fn stripping_requires_a_word_boundary() {
        let phrases = wake_phrases();
        // "murmuring" must not lose its prefix
        assert_eq!(strip_wake_phrase("murmuring brooks", &phrases), "murmuring brooks");
    }

    #[test]
    fn stripped_text_classifies_like_bare_command() {
        let registry = ServiceRegistry::all_disabled();
        let phrases = wake_phrases();

        for command in ["what time is it", "open calculator", "volume up"] {
            let with_wake = format!("hey murmur {command}");
            let stripped = strip_wake_phrase(&with_wake, &phrases);
            assert_eq!(
                classify(&stripped, &registry),
                classify(command, &registry),
                "wake-stripped '{with_wake}' should classify like '{command}'"
            );
        }
    }

    #[test]
    fn detects_wake_phrase_anywhere_in_transcript() {
        let phrases = wake_phrases();
        assert!(contains_wake_phrase("okay Hey Murmur are you there", &phrases));
        assert!(!contains_wake_phrase("nothing to see here", &phrases));
    }

    #[test]
    fn empty_input_is_unknown() {
        let registry = ServiceRegistry::all_enabled();
        assert_eq!(
            classify("   ", &registry),
            Intent::Unknown { text: String::new() }
        );
    }

    #[test]
    fn classification_is_idempotent() {
        let registry = ServiceRegistry::all_enabled();
        let first = classify("weather in oslo", &registry);
        let second = classify("weather in oslo", &registry);
        assert_eq!(first, second);
    }
}
