use async_trait::async_trait;
use serde_json::Value;

use super::{http_client, number, FoodError, NutrientProfile, NutritionMatch, NutritionSource};
use crate::food::config::FoodConfig;

#[derive(Debug, Clone)]
pub struct OpenFoodFactsClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenFoodFactsClient {
    pub fn new(config: &FoodConfig) -> Self {
        Self {
            client: http_client(config.timeout),
            base_url: config.off_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl NutritionSource for OpenFoodFactsClient {
    fn name(&self) -> &str {
        "Open Food Facts"
    }

    async fn lookup(&self, ingredient: &str) -> Result<Option<NutritionMatch>, FoodError> {
        let response = self
            .client
            .get(format!("{}/cgi/search.pl", self.base_url))
            .query(&[
                ("search_terms", ingredient),
                ("search_simple", "1"),
                ("action", "process"),
                ("json", "1"),
                ("page_size", "3"),
                ("fields", "product_name,nutriments"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let data: Value = response.json().await?;
        let product = match data.get("products").and_then(|p| p.get(0)) {
            Some(product) => product,
            None => return Ok(None),
        };

        let nutriments = product.get("nutriments");
        let field = |key: &str| number(nutriments.and_then(|n| n.get(key)));
        let profile = NutrientProfile {
            kcal: field("energy-kcal_100g"),
            protein: field("proteins_100g"),
            carbs: field("carbohydrates_100g"),
            fat: field("fat_100g"),
            fiber: field("fiber_100g"),
        };

        if profile.kcal <= 0.0 {
            return Ok(None);
        }

        let matched_name = product
            .get("product_name")
            .and_then(|n| n.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(ingredient)
            .to_string();

        Ok(Some(NutritionMatch {
            profile,
            matched_name,
            source: self.name().to_string(),
        }))
    }
}
