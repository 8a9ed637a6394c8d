//! Capability availability, computed once at startup
//!
//! The classifier and dispatcher consult the registry to decide whether
//! capability-gated rules are reachable; it is never mutated after startup.

use std::fmt;

use crate::Config;

/// Optional external capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Weather lookups (OpenWeather)
    Weather,
    /// Stock price lookups
    Stocks,
    /// Encyclopedia lookups
    Encyclopedia,
    /// Translation and language detection
    Translation,
    /// AI chat
    Ai,
}

impl Capability {
    /// All capabilities, in display order
    pub const ALL: [Self; 5] = [
        Self::Weather,
        Self::Stocks,
        Self::Encyclopedia,
        Self::Translation,
        Self::Ai,
    ];

    /// Human-readable capability name, used in apologies and help text
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::Stocks => "stock prices",
            Self::Encyclopedia => "encyclopedia lookups",
            Self::Translation => "translations",
            Self::Ai => "AI-powered conversations",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Availability of a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityState {
    /// Ready to use
    Enabled,
    /// Turned off in the config
    Disabled,
    /// Turned on but missing a required API key
    NotConfigured,
}

/// Read-only map from capability to availability
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    weather: CapabilityState,
    stocks: CapabilityState,
    encyclopedia: CapabilityState,
    translation: CapabilityState,
    ai: CapabilityState,
}

impl ServiceRegistry {
    /// Compute availability from configuration and present API keys
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let keyed = |enabled: bool, key: Option<&String>| match (enabled, key) {
            (false, _) => CapabilityState::Disabled,
            (true, Some(k)) if !k.trim().is_empty() => CapabilityState::Enabled,
            (true, _) => CapabilityState::NotConfigured,
        };
        let toggled = |enabled: bool| {
            if enabled {
                CapabilityState::Enabled
            } else {
                CapabilityState::Disabled
            }
        };

        let registry = Self {
            weather: keyed(config.features.weather, config.api_keys.openweather.as_ref()),
            stocks: toggled(config.features.stocks),
            encyclopedia: toggled(config.features.encyclopedia),
            translation: toggled(config.features.translation),
            ai: keyed(config.features.ai, config.api_keys.openai.as_ref()),
        };

        tracing::info!(
            weather = ?registry.weather,
            stocks = ?registry.stocks,
            encyclopedia = ?registry.encyclopedia,
            translation = ?registry.translation,
            ai = ?registry.ai,
            "service registry computed"
        );

        registry
    }

    /// A registry with every capability enabled
    #[must_use]
    pub const fn all_enabled() -> Self {
        Self {
            weather: CapabilityState::Enabled,
            stocks: CapabilityState::Enabled,
            encyclopedia: CapabilityState::Enabled,
            translation: CapabilityState::Enabled,
            ai: CapabilityState::Enabled,
        }
    }

    /// A registry with every capability disabled
    #[must_use]
    pub const fn all_disabled() -> Self {
        Self {
            weather: CapabilityState::Disabled,
            stocks: CapabilityState::Disabled,
            encyclopedia: CapabilityState::Disabled,
            translation: CapabilityState::Disabled,
            ai: CapabilityState::Disabled,
        }
    }

    /// Availability of one capability
    #[must_use]
    pub const fn state(&self, capability: Capability) -> CapabilityState {
        match capability {
            Capability::Weather => self.weather,
            Capability::Stocks => self.stocks,
            Capability::Encyclopedia => self.encyclopedia,
            Capability::Translation => self.translation,
            Capability::Ai => self.ai,
        }
    }

    /// Whether a capability is ready to use
    #[must_use]
    pub const fn is_enabled(&self, capability: Capability) -> bool {
        matches!(self.state(capability), CapabilityState::Enabled)
    }

    /// Number of enabled capabilities, reported by the status intent
    #[must_use]
    pub fn enabled_count(&self) -> usize {
        Capability::ALL
            .iter()
            .filter(|c| self.is_enabled(**c))
            .count()
    }

    /// Names of enabled capabilities, in display order
    #[must_use]
    pub fn enabled_names(&self) -> Vec<&'static str> {
        Capability::ALL
            .iter()
            .filter(|c| self.is_enabled(**c))
            .map(|c| c.name())
            .collect()
    }
}
