//! Configuration management for the Murmur assistant
//!
//! Loads `~/.config/murmur/config.toml`. On first run the file is created
//! with documented defaults. API keys may be overridden via environment
//! variables (`MURMUR_OPENAI_API_KEY`, `MURMUR_OPENWEATHER_API_KEY`).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default polling timeout while waiting for a wake phrase, in seconds
pub const IDLE_CAPTURE_SECS: u64 = 1;

/// Capture timeout while awake and waiting for a command, in seconds
pub const AWAKE_CAPTURE_SECS: u64 = 5;

/// Murmur configuration, one section per concern
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// Voice input/output settings
    #[serde(default)]
    pub voice_settings: VoiceSettings,

    /// Optional capability toggles
    #[serde(default)]
    pub features: Features,

    /// Session and wake-phrase settings
    #[serde(default)]
    pub system: SystemSettings,
}

/// API keys for external services
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeys {
    /// OpenAI key, used for AI chat and Whisper transcription
    pub openai: Option<String>,

    /// OpenWeather key for the weather capability
    pub openweather: Option<String>,
}

/// Voice input/output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// STT model identifier (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model identifier (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier (e.g. "alloy")
    pub tts_voice: String,

    /// TTS speed multiplier
    pub tts_speed: f64,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stt_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
        }
    }
}

/// Optional capability toggles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Features {
    /// Weather lookups (requires an OpenWeather key)
    pub weather: bool,

    /// Stock price lookups
    pub stocks: bool,

    /// Encyclopedia lookups
    pub encyclopedia: bool,

    /// Translation and spoken-language detection
    pub translation: bool,

    /// AI chat fallback (requires an OpenAI key)
    pub ai: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            weather: true,
            stocks: true,
            encyclopedia: true,
            translation: true,
            ai: true,
        }
    }
}

/// Session and wake-phrase settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSettings {
    /// Wake phrases, matched case-insensitively against transcripts
    pub wake_phrases: Vec<String>,

    /// Default spoken-response language code
    pub default_language: String,

    /// Idle session timeout in seconds
    pub session_timeout_secs: u64,

    /// Start minimized without console interaction
    pub background_mode: bool,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            wake_phrases: vec!["hey murmur".to_string(), "murmur".to_string()],
            default_language: "en".to_string(),
            session_timeout_secs: 300,
            background_mode: true,
        }
    }
}

impl Config {
    /// Load configuration from the standard path, creating it with
    /// defaults on first run
    ///
    /// # Errors
    ///
    /// Returns error if the config directory cannot be determined or the
    /// default file cannot be written
    pub fn load() -> Result<Self> {
        let path = config_file_path()
            .ok_or_else(|| Error::Config("could not determine config directory".to_string()))?;
        Self::load_from(&path)
    }

    /// Load configuration from an explicit path
    ///
    /// # Errors
    ///
    /// Returns error if a missing file cannot be created with defaults
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.write_to(path)?;
            tracing::info!(path = %path.display(), "created default config file");
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        match toml::from_str::<Self>(&content) {
            Ok(mut config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config.apply_env_overrides();
                Ok(config)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                let mut config = Self::default();
                config.apply_env_overrides();
                Ok(config)
            }
        }
    }

    /// Write this configuration to disk
    ///
    /// # Errors
    ///
    /// Returns error if the file or its parent directory cannot be written
    pub fn write_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Environment variables take precedence over file-sourced keys
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("MURMUR_OPENAI_API_KEY") {
            if !key.is_empty() {
                self.api_keys.openai = Some(key);
            }
        }
        if let Ok(key) = std::env::var("MURMUR_OPENWEATHER_API_KEY") {
            if !key.is_empty() {
                self.api_keys.openweather = Some(key);
            }
        }
    }

    /// Wake phrases normalized to lowercase, longest first so prefix
    /// stripping always removes the longest match
    #[must_use]
    pub fn normalized_wake_phrases(&self) -> Vec<String> {
        let mut phrases: Vec<String> = self
            .system
            .wake_phrases
            .iter()
            .map(|p| p.to_lowercase().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        phrases.sort_by_key(|p| std::cmp::Reverse(p.len()));
        phrases
    }
}

/// Return the config file path: `~/.config/murmur/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("murmur").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();

        assert_eq!(parsed.system.wake_phrases, config.system.wake_phrases);
        assert_eq!(parsed.system.session_timeout_secs, 300);
        assert!(parsed.features.ai);
    }

    #[test]
    fn partial_file_overlays_defaults() {
        let config: Config = toml::from_str(
            r#"
            [system]
            wake_phrases = ["hey assistant"]
            default_language = "en"
            session_timeout_secs = 60
            background_mode = false
            "#,
        )
        .unwrap();

        assert_eq!(config.system.wake_phrases, vec!["hey assistant"]);
        assert_eq!(config.system.session_timeout_secs, 60);
        // Untouched sections fall back to defaults
        assert!(config.features.weather);
        assert_eq!(config.voice_settings.tts_voice, "alloy");
    }

    #[test]
    fn wake_phrases_normalized_longest_first() {
        let mut config = Config::default();
        config.system.wake_phrases = vec![
            "  Murmur ".to_string(),
            "HEY MURMUR".to_string(),
            String::new(),
        ];

        let phrases = config.normalized_wake_phrases();
        assert_eq!(phrases, vec!["hey murmur", "murmur"]);
    }
}
