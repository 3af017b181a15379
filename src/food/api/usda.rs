use async_trait::async_trait;
use serde_json::Value;

use super::{http_client, number, FoodError, NutrientProfile, NutritionMatch, NutritionSource};
use crate::food::config::FoodConfig;

/// USDA FoodData Central.
#[derive(Debug, Clone)]
pub struct UsdaClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl UsdaClient {
    pub fn new(config: &FoodConfig) -> Self {
        Self {
            client: http_client(config.timeout),
            api_key: config.usda_api_key.clone(),
            base_url: config.usda_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl NutritionSource for UsdaClient {
    fn name(&self) -> &str {
        "USDA FoodData"
    }

    async fn lookup(&self, ingredient: &str) -> Result<Option<NutritionMatch>, FoodError> {
        let response = self
            .client
            .get(format!("{}/foods/search", self.base_url))
            .query(&[
                ("query", ingredient),
                ("pageSize", "3"),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let data: Value = response.json().await?;
        let foods = match data.get("foods").and_then(|f| f.as_array()) {
            Some(foods) if !foods.is_empty() => foods,
            _ => return Ok(None),
        };

        // Keep the first candidate unless a later one matches the query better.
        let mut best: Option<(&str, &Value)> = None;
        for food in foods {
            let description = food.get("description").and_then(|d| d.as_str()).unwrap_or_default();
            let is_better_match = match best {
                None => true,
                Some((current, _)) => {
                    string_similarity(description, ingredient) > string_similarity(current, ingredient)
                }
            };
            if is_better_match {
                best = Some((description, food));
            }
        }

        let (description, food) = match best {
            Some(best) => best,
            None => return Ok(None),
        };

        let mut profile = NutrientProfile::default();
        if let Some(nutrients) = food.get("foodNutrients").and_then(|n| n.as_array()) {
            for nutrient in nutrients {
                let amount = number(nutrient.get("value"));
                match nutrient.get("nutrientId").and_then(|id| id.as_i64()) {
                    Some(1008) => profile.kcal = amount,
                    Some(1003) => profile.protein = amount,
                    Some(1005) => profile.carbs = amount,
                    Some(1004) => profile.fat = amount,
                    Some(1079) => profile.fiber = amount,
                    _ => {}
                }
            }
        }

        if profile.kcal <= 0.0 {
            return Ok(None);
        }

        Ok(Some(NutritionMatch {
            profile,
            matched_name: if description.is_empty() {
                ingredient.to_string()
            } else {
                description.to_string()
            },
            source: self.name().to_string(),
        }))
    }
}

/// Share of words the two strings have in common.
fn string_similarity(s1: &str, s2: &str) -> f64 {
    let s1_lower = s1.to_lowercase();
    let s2_lower = s2.to_lowercase();

    let s1_words: Vec<&str> = s1_lower.split_whitespace().collect();
    let s2_words: Vec<&str> = s2_lower.split_whitespace().collect();

    let longest = s1_words.len().max(s2_words.len());
    if longest == 0 {
        return 0.0;
    }

    let matches = s1_words.iter().filter(|w| s2_words.contains(w)).count();
    matches as f64 / longest as f64
}
