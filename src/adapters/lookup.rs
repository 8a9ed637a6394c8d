//! HTTP lookup clients: weather, stock quotes, encyclopedia, AI chat
//!
//! Each client makes one request per query and formats the result as a
//! single spoken sentence. Transport and API failures surface as
//! [`Error::Lookup`]; the dispatcher turns those into apologies.

use async_trait::async_trait;

use super::{AiChat, EncyclopediaLookup, StockLookup, WeatherLookup};
use crate::{Error, Result};

/// System prompt for the AI chat capability
const AI_SYSTEM_PROMPT: &str = "You are Murmur, a helpful voice assistant running in the \
background. Provide concise, helpful responses. Keep responses under 50 words unless \
specifically asked for more detail.";

/// Max tokens for AI chat answers
const AI_MAX_TOKENS: u32 = 150;

#[derive(serde::Deserialize)]
struct WeatherResponse {
    main: WeatherMain,
    weather: Vec<WeatherCondition>,
}

#[derive(serde::Deserialize)]
struct WeatherMain {
    temp: f64,
    humidity: f64,
}

#[derive(serde::Deserialize)]
struct WeatherCondition {
    description: String,
}

/// OpenWeather current-conditions client
pub struct WeatherClient {
    client: reqwest::Client,
    api_key: String,
}

impl WeatherClient {
    /// Create a weather client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::Config("OpenWeather API key required".to_string()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
        })
    }
}

#[async_trait]
impl WeatherLookup for WeatherClient {
    async fn current(&self, city: &str) -> Result<String> {
        let url = format!(
            "https://api.openweathermap.org/data/2.5/weather?q={}&units=metric&appid={}",
            urlencoding::encode(city),
            self.api_key
        );

        let response = self.client.get(&url).send().await.map_err(|e| Error::Lookup {
            capability: "weather",
            message: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(Error::Lookup {
                capability: "weather",
                message: format!("no conditions for {city} ({})", response.status()),
            });
        }

        let report: WeatherResponse = response.json().await.map_err(|e| Error::Lookup {
            capability: "weather",
            message: e.to_string(),
        })?;

        let description = report
            .weather
            .first()
            .map_or("unknown conditions", |c| c.description.as_str());

        Ok(format!(
            "Weather in {city}: {description}, {:.0} degrees Celsius, humidity {:.0} percent",
            report.main.temp, report.main.humidity
        ))
    }
}

#[derive(serde::Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(serde::Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(serde::Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(serde::Deserialize)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(rename = "shortName")]
    short_name: Option<String>,
}

/// Stock quote client over the public chart endpoint
pub struct StockClient {
    client: reqwest::Client,
}

impl StockClient {
    /// Create a stock quote client
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for StockClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StockLookup for StockClient {
    async fn quote(&self, symbol: &str) -> Result<String> {
        let url = format!(
            "https://query1.finance.yahoo.com/v8/finance/chart/{}",
            urlencoding::encode(symbol)
        );

        let response = self.client.get(&url).send().await.map_err(|e| Error::Lookup {
            capability: "stock prices",
            message: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(Error::Lookup {
                capability: "stock prices",
                message: format!("no quote for {symbol} ({})", response.status()),
            });
        }

        let chart: ChartResponse = response.json().await.map_err(|e| Error::Lookup {
            capability: "stock prices",
            message: e.to_string(),
        })?;

        let meta = chart
            .chart
            .result
            .as_deref()
            .and_then(<[ChartResult]>::first)
            .map(|r| &r.meta)
            .ok_or_else(|| Error::Lookup {
                capability: "stock prices",
                message: format!("empty chart for {symbol}"),
            })?;

        let price = meta.regular_market_price.ok_or_else(|| Error::Lookup {
            capability: "stock prices",
            message: format!("no current price for {symbol}"),
        })?;
        let name = meta.short_name.as_deref().unwrap_or(symbol);

        Ok(format!("{name} stock price is {price:.2} dollars"))
    }
}

#[derive(serde::Deserialize)]
struct SummaryResponse {
    extract: String,
}

/// Wikipedia page-summary client
pub struct WikipediaClient {
    client: reqwest::Client,
}

impl WikipediaClient {
    /// Create an encyclopedia client
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for WikipediaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EncyclopediaLookup for WikipediaClient {
    async fn summary(&self, topic: &str) -> Result<String> {
        let title = topic.trim().replace(' ', "_");
        let url = format!(
            "https://en.wikipedia.org/api/rest_v1/page/summary/{}",
            urlencoding::encode(&title)
        );

        let response = self.client.get(&url).send().await.map_err(|e| Error::Lookup {
            capability: "encyclopedia lookups",
            message: e.to_string(),
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(format!("No encyclopedia page found for {topic}"));
        }
        if !response.status().is_success() {
            return Err(Error::Lookup {
                capability: "encyclopedia lookups",
                message: format!("summary request failed ({})", response.status()),
            });
        }

        let summary: SummaryResponse = response.json().await.map_err(|e| Error::Lookup {
            capability: "encyclopedia lookups",
            message: e.to_string(),
        })?;

        Ok(format!("According to Wikipedia: {}", summary.extract))
    }
}

#[derive(serde::Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(serde::Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// AI chat client over the OpenAI completions API
pub struct AiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl AiClient {
    /// Create an AI chat client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, model: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::Config("OpenAI API key required for AI chat".to_string()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        })
    }
}

#[async_trait]
impl AiChat for AiClient {
    async fn answer(&self, query: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: AI_SYSTEM_PROMPT },
                ChatMessage { role: "user", content: query },
            ],
            max_tokens: AI_MAX_TOKENS,
            temperature: 0.7,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Lookup {
                capability: "AI-powered conversations",
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Lookup {
                capability: "AI-powered conversations",
                message: format!("chat error {status}: {body}"),
            });
        }

        let chat: ChatResponse = response.json().await.map_err(|e| Error::Lookup {
            capability: "AI-powered conversations",
            message: e.to_string(),
        })?;

        let answer = chat
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .unwrap_or_default();

        if answer.is_empty() {
            return Err(Error::Lookup {
                capability: "AI-powered conversations",
                message: "empty completion".to_string(),
            });
        }
        Ok(answer.to_string())
    }
}
