pub mod openfoodfacts;
pub mod swiss;
pub mod usda;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub use openfoodfacts::OpenFoodFactsClient;
pub use swiss::SwissFoodClient;
pub use usda::UsdaClient;

#[derive(Error, Debug)]
pub enum FoodError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected response: {0}")]
    Parse(String),
}

/// Nutrient values per 100 g.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NutrientProfile {
    pub kcal: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
}

impl NutrientProfile {
    pub const fn new(kcal: f64, protein: f64, carbs: f64, fat: f64, fiber: f64) -> Self {
        Self {
            kcal,
            protein,
            carbs,
            fat,
            fiber,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionMatch {
    pub profile: NutrientProfile,
    pub matched_name: String,
    pub source: String,
}

/// A remote food database that can be asked for the nutrients of one
/// ingredient. `Ok(None)` means the database had no usable entry.
#[async_trait]
pub trait NutritionSource: Send + Sync {
    fn name(&self) -> &str;

    async fn lookup(&self, ingredient: &str) -> Result<Option<NutritionMatch>, FoodError>;
}

pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// Numbers arrive as JSON numbers or as strings, sometimes with a decimal comma.
pub(crate) fn number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().replace(',', ".").parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number() {
        assert_eq!(number(Some(&json!(12.5))), 12.5);
        assert_eq!(number(Some(&json!("3,2"))), 3.2);
        assert_eq!(number(Some(&json!("n/a"))), 0.0);
        assert_eq!(number(None), 0.0);
    }
}
