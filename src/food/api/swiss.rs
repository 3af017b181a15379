use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use super::{http_client, number, FoodError, NutrientProfile, NutritionMatch, NutritionSource};
use crate::food::config::FoodConfig;

/// Swiss food composition database (BLV).
#[derive(Debug, Clone)]
pub struct SwissFoodClient {
    client: reqwest::Client,
    base_url: String,
}

impl SwissFoodClient {
    pub fn new(config: &FoodConfig) -> Self {
        Self {
            client: http_client(config.timeout),
            base_url: config.swiss_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Option<Value>, FoodError> {
        let response = self.client.get(url).query(query).send().await?;
        if !response.status().is_success() {
            debug!("Swiss Food DB answered {} for {}", response.status(), url);
            return Ok(None);
        }
        Ok(Some(response.json().await?))
    }
}

#[async_trait]
impl NutritionSource for SwissFoodClient {
    fn name(&self) -> &str {
        "Swiss Food DB"
    }

    async fn lookup(&self, ingredient: &str) -> Result<Option<NutritionMatch>, FoodError> {
        let foods = match self
            .get_json(
                &format!("{}/foods", self.base_url),
                &[("search", ingredient), ("lang", "de"), ("limit", "3")],
            )
            .await?
        {
            Some(Value::Array(foods)) if !foods.is_empty() => foods,
            _ => return Ok(None),
        };

        let food = &foods[0];
        let food_id = match food.get("id") {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => return Ok(None),
        };

        let dbid = match self
            .get_json(&format!("{}/fooddbid/{}", self.base_url, food_id), &[])
            .await?
        {
            Some(Value::Array(ids)) if !ids.is_empty() => match &ids[0] {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
            _ => return Ok(None),
        };

        let values = match self
            .get_json(
                &format!("{}/values", self.base_url),
                &[("DBID", dbid.as_str()), ("componentsetid", "1"), ("lang", "de")],
            )
            .await?
        {
            Some(Value::Array(values)) => values,
            Some(_) => return Err(FoodError::Parse("values is not a list".to_string())),
            None => return Ok(None),
        };

        let mut profile = NutrientProfile::default();
        for value in &values {
            let code = value
                .get("component")
                .and_then(|c| c.get("code"))
                .and_then(|c| c.as_str())
                .unwrap_or_default();
            let amount = number(value.get("value"));
            match code {
                "ENER1" => profile.kcal = amount,
                "PROT" => profile.protein = amount,
                "CHO" => profile.carbs = amount,
                "FAT" => profile.fat = amount,
                "FIBC" => profile.fiber = amount,
                _ => {}
            }
        }

        let matched_name = food
            .get("names")
            .and_then(|n| n.get(0))
            .and_then(|n| n.get("term"))
            .and_then(|t| t.as_str())
            .unwrap_or(ingredient)
            .to_string();

        Ok(Some(NutritionMatch {
            profile,
            matched_name,
            source: self.name().to_string(),
        }))
    }
}
