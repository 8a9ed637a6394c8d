//! Translation and language detection
//!
//! Uses the free Google translate web endpoint. Spoken target languages
//! arrive as names ("spanish"), which are mapped to codes before the
//! request; unknown names are passed through unchanged.

use async_trait::async_trait;

use super::Translator;
use crate::{Error, Result};

/// Spoken language names to ISO codes
const LANGUAGE_CODES: [(&str, &str); 16] = [
    ("english", "en"),
    ("spanish", "es"),
    ("french", "fr"),
    ("german", "de"),
    ("italian", "it"),
    ("portuguese", "pt"),
    ("dutch", "nl"),
    ("russian", "ru"),
    ("japanese", "ja"),
    ("korean", "ko"),
    ("chinese", "zh"),
    ("arabic", "ar"),
    ("hindi", "hi"),
    ("turkish", "tr"),
    ("polish", "pl"),
    ("swedish", "sv"),
];

/// Resolve a spoken language name to a code
#[must_use]
pub fn language_code(name: &str) -> &str {
    let lowered = name.trim();
    LANGUAGE_CODES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(lowered))
        .map_or(lowered, |(_, code)| code)
}

/// Translator backed by the Google translate web endpoint
pub struct GoogleTranslator {
    client: reqwest::Client,
}

impl GoogleTranslator {
    /// Create a translator
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn request(&self, text: &str, target: &str) -> Result<serde_json::Value> {
        let url = format!(
            "https://translate.googleapis.com/translate_a/single?client=gtx&sl=auto&tl={}&dt=t&q={}",
            language_code(target),
            urlencoding::encode(text)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Translation(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Translation(format!(
                "translate endpoint returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Translation(e.to_string()))
    }
}

impl Default for GoogleTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn detect(&self, text: &str) -> Result<String> {
        // Detection rides along with a no-op translation to English
        let body = self.request(text, "en").await?;
        body.get(2)
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| Error::Translation("no detected language in response".to_string()))
    }

    async fn translate(&self, text: &str, target: &str) -> Result<String> {
        let body = self.request(text, target).await?;

        // Segments live at body[0][i][0]; concatenate them
        let segments = body
            .get(0)
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| Error::Translation("unexpected response shape".to_string()))?;

        let translated: String = segments
            .iter()
            .filter_map(|seg| seg.get(0).and_then(serde_json::Value::as_str))
            .collect();

        if translated.is_empty() {
            return Err(Error::Translation("empty translation".to_string()));
        }
        Ok(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_spoken_names_to_codes() {
        assert_eq!(language_code("spanish"), "es");
        assert_eq!(language_code("Japanese"), "ja");
        assert_eq!(language_code(" german "), "de");
    }

    #[test]
    fn unknown_names_pass_through() {
        assert_eq!(language_code("eo"), "eo");
        assert_eq!(language_code("klingon"), "klingon");
    }
}
