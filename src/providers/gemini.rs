use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::providers::traits::CompletionProvider;

pub const GEMINI_API: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Tried in order until one answers.
pub const GEMINI_MODELS: &[&str] = &[
    "gemini-2.0-flash",
    "gemini-1.5-flash-latest",
    "gemini-1.5-flash",
    "gemini-1.5-pro-latest",
    "gemini-1.5-pro",
];

#[derive(Clone)]
pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    client: Client,
    last_model: Arc<RwLock<Option<String>>>,
}

impl GeminiProvider {
    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            last_model: Arc::new(RwLock::new(None)),
        }
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, model))
            .header("X-goog-api-key", &self.api_key)
            .json(&json!({
                "contents": [{
                    "parts": [{ "text": prompt }]
                }]
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("{}: HTTP {}", model, status.as_u16()));
        }

        let response_json: Value = response.json().await?;
        response_json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| anyhow!("{}: no candidates in response", model))
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    async fn new(api_key: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(anyhow!("Gemini API key is empty"));
        }
        Ok(Self::with_base_url(api_key, GEMINI_API))
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let mut last_error = None;

        for model in GEMINI_MODELS {
            match self.generate(model, prompt).await {
                Ok(text) => {
                    info!("Gemini answered with {}", model);
                    if let Ok(mut guard) = self.last_model.write() {
                        *guard = Some(model.to_string());
                    }
                    return Ok(text);
                }
                Err(e) => {
                    warn!("Gemini model failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(anyhow!(
            "All Gemini models failed, last error: {}",
            last_error.map(|e| e.to_string()).unwrap_or_default()
        ))
    }

    async fn get_model_info(&self) -> Result<String> {
        let guard = self
            .last_model
            .read()
            .map_err(|e| anyhow!("Lock error: {}", e))?;
        Ok(guard.clone().unwrap_or_else(|| GEMINI_MODELS[0].to_string()))
    }

    fn get_api_key(&self) -> &String {
        &self.api_key
    }

    fn clone_box(&self) -> Box<dyn CompletionProvider + Send + Sync> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_key_is_rejected() {
        assert!(GeminiProvider::new("  ".to_string()).await.is_err());
    }

    #[tokio::test]
    async fn test_model_info_defaults_to_first_model() {
        let provider = GeminiProvider::new("key".to_string()).await.unwrap();
        assert_eq!(provider.get_model_info().await.unwrap(), "gemini-2.0-flash");
        assert_eq!(provider.get_api_key(), "key");
    }
}
