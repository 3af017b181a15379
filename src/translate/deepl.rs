use async_trait::async_trait;
use log::warn;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use super::{Language, TranslateError, Translator};

pub const DEEPL_FREE_API: &str = "https://api-free.deepl.com/v2";
pub const DEEPL_PRO_API: &str = "https://api.deepl.com/v2";
pub const DEFAULT_CHARACTER_LIMIT: u64 = 500_000;

#[derive(Debug, Clone)]
pub struct DeepLConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    /// Multiplied by the attempt number after a 429.
    pub rate_limit_backoff: Duration,
    /// Wait after a timeout or transport error.
    pub retry_delay: Duration,
    /// Pause after every translated text.
    pub request_delay: Duration,
}

impl DeepLConfig {
    /// Free-tier keys end in `:fx` and use their own endpoint.
    pub fn new(api_key: &str) -> Self {
        let api_key = api_key.trim().to_string();
        let base_url = if api_key.ends_with(":fx") {
            DEEPL_FREE_API
        } else {
            DEEPL_PRO_API
        };
        Self {
            api_key,
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            rate_limit_backoff: Duration::from_secs(2),
            retry_delay: Duration::from_secs(2),
            request_delay: Duration::from_millis(400),
        }
    }

    pub fn from_env() -> Result<Self, TranslateError> {
        match std::env::var("DEEPL_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(&key)),
            _ => Err(TranslateError::MissingApiKey),
        }
    }

    pub fn is_free(&self) -> bool {
        self.api_key.ends_with(":fx")
    }

    /// Same key against another server, without any waiting. Used by tests.
    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(2),
            rate_limit_backoff: Duration::ZERO,
            retry_delay: Duration::ZERO,
            request_delay: Duration::ZERO,
            ..Self::new(api_key)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaLevel {
    Ok,
    Half,
    Warning,
    Critical,
}

impl QuotaLevel {
    pub fn from_percent(percent: f64) -> Self {
        if percent >= 95.0 {
            QuotaLevel::Critical
        } else if percent >= 80.0 {
            QuotaLevel::Warning
        } else if percent >= 50.0 {
            QuotaLevel::Half
        } else {
            QuotaLevel::Ok
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Usage {
    pub used: u64,
    pub limit: u64,
    pub available: u64,
    pub percent: f64,
    pub level: QuotaLevel,
}

impl Usage {
    pub fn new(used: u64, limit: u64) -> Self {
        let percent = if limit > 0 {
            used as f64 / limit as f64 * 100.0
        } else {
            0.0
        };
        Self {
            used,
            limit,
            available: limit.saturating_sub(used),
            percent,
            level: QuotaLevel::from_percent(percent),
        }
    }
}

#[derive(Deserialize)]
struct UsageResponse {
    #[serde(default)]
    character_count: u64,
    character_limit: Option<u64>,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
struct Translation {
    text: String,
}

#[derive(Debug, Clone)]
pub struct DeepLClient {
    client: reqwest::Client,
    config: DeepLConfig,
}

impl DeepLClient {
    pub fn new(config: DeepLConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    pub fn config(&self) -> &DeepLConfig {
        &self.config
    }

    fn auth_header(&self) -> String {
        format!("DeepL-Auth-Key {}", self.config.api_key)
    }

    pub async fn usage(&self) -> Result<Usage, TranslateError> {
        let response = self
            .client
            .get(format!("{}/usage", self.config.base_url))
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let data: UsageResponse = response.json().await?;
                Ok(Usage::new(
                    data.character_count,
                    data.character_limit.unwrap_or(DEFAULT_CHARACTER_LIMIT),
                ))
            }
            StatusCode::FORBIDDEN => Err(TranslateError::Unauthorized),
            status => Err(TranslateError::Status(status.as_u16())),
        }
    }

    async fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Translator for DeepLClient {
    /// Falls back to the untranslated text on anything but an exhausted quota.
    async fn translate(&self, text: &str, target: &Language) -> Result<String, TranslateError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let body = json!({
            "text": [text],
            "target_lang": target.deepl_code(),
            "source_lang": "DE",
        });

        let mut attempt = 0;
        while attempt < self.config.max_attempts {
            let result = self
                .client
                .post(format!("{}/translate", self.config.base_url))
                .header("Authorization", self.auth_header())
                .json(&body)
                .send()
                .await;

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    attempt += 1;
                    warn!(
                        "DeepL request failed ({}), attempt {}/{}",
                        e, attempt, self.config.max_attempts
                    );
                    if attempt < self.config.max_attempts {
                        self.pause(self.config.retry_delay).await;
                    }
                    continue;
                }
            };

            match response.status() {
                StatusCode::OK => {
                    let translated = match response.json::<TranslateResponse>().await {
                        Ok(data) => data.translations.into_iter().next().map(|t| t.text),
                        Err(e) => {
                            warn!("DeepL response could not be read: {}", e);
                            None
                        }
                    };
                    self.pause(self.config.request_delay).await;
                    return Ok(translated.unwrap_or_else(|| text.to_string()));
                }
                status if status.as_u16() == 456 => return Err(TranslateError::QuotaExceeded),
                StatusCode::TOO_MANY_REQUESTS => {
                    attempt += 1;
                    let wait = self.config.rate_limit_backoff * attempt;
                    warn!("DeepL rate limit reached, waiting {:?}", wait);
                    if attempt < self.config.max_attempts {
                        self.pause(wait).await;
                    }
                }
                status => {
                    warn!("DeepL error {}, keeping original text", status.as_u16());
                    return Ok(text.to_string());
                }
            }
        }

        warn!("DeepL gave up after {} attempts, keeping original text", self.config.max_attempts);
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_key() {
        let free = DeepLConfig::new("abc:fx");
        assert!(free.is_free());
        assert_eq!(free.base_url, DEEPL_FREE_API);

        let pro = DeepLConfig::new("abc");
        assert!(!pro.is_free());
        assert_eq!(pro.base_url, DEEPL_PRO_API);
    }

    #[test]
    fn test_usage_levels() {
        assert_eq!(Usage::new(100, 1000).level, QuotaLevel::Ok);
        assert_eq!(Usage::new(500, 1000).level, QuotaLevel::Half);
        assert_eq!(Usage::new(800, 1000).level, QuotaLevel::Warning);
        assert_eq!(Usage::new(950, 1000).level, QuotaLevel::Critical);

        let usage = Usage::new(1200, 1000);
        assert_eq!(usage.available, 0);

        let unlimited = Usage::new(10, 0);
        assert_eq!(unlimited.percent, 0.0);
    }

    #[tokio::test]
    async fn test_blank_text_needs_no_request() {
        let client = DeepLClient::new(DeepLConfig::with_base_url("key", "http://127.0.0.1:9"));
        let result = client.translate("   ", &Language::new("en")).await.unwrap();
        assert_eq!(result, "   ");
    }
}
