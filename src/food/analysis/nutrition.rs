use log::{debug, info, warn};
use serde::Serialize;

use crate::food::api::{
    NutrientProfile, NutritionSource, OpenFoodFactsClient, SwissFoodClient, UsdaClient,
};
use crate::food::config::FoodConfig;
use crate::food::local_db::{LocalNutritionTable, DEFAULT_ESTIMATE};
use crate::food::units::{grams_for, parse_amount};
use crate::recipe::{IngredientGroup, Nutrition};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum LineSource {
    Api(String),
    Local,
    Estimate,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngredientLine {
    pub group: String,
    pub name: String,
    pub amount: String,
    pub unit: String,
    /// `None` when the amount could not be parsed and the line was skipped.
    pub quantity: Option<f64>,
    pub source: Option<LineSource>,
    pub matched_name: Option<String>,
    pub grams: Option<f64>,
    pub added: Nutrition,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NutritionReport {
    pub portions: u32,
    pub total: Nutrition,
    /// Equal to `total` for a single portion.
    pub per_portion: Nutrition,
    pub lines: Vec<IngredientLine>,
}

impl NutritionReport {
    pub fn estimated_lines(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| l.source == Some(LineSource::Estimate))
            .count()
    }
}

/// Walks the fallback chain for every ingredient: remote sources in order,
/// then the local table, then a flat estimate.
pub struct NutritionCalculator {
    sources: Vec<Box<dyn NutritionSource>>,
    local: LocalNutritionTable,
}

impl NutritionCalculator {
    pub fn new(sources: Vec<Box<dyn NutritionSource>>) -> Self {
        Self {
            sources,
            local: LocalNutritionTable,
        }
    }

    /// Swiss Food DB, then Open Food Facts, then USDA.
    pub fn from_config(config: &FoodConfig) -> Self {
        Self::new(vec![
            Box::new(SwissFoodClient::new(config)),
            Box::new(OpenFoodFactsClient::new(config)),
            Box::new(UsdaClient::new(config)),
        ])
    }

    /// Local table and estimates only.
    pub fn offline() -> Self {
        Self::new(Vec::new())
    }

    pub async fn compute(&self, groups: &[IngredientGroup], portions: u32) -> NutritionReport {
        let mut total = Nutrition::default();
        let mut lines = Vec::new();

        for group in groups {
            for item in &group.items {
                let name = item.name.trim();
                if name.is_empty() || item.amount.trim().is_empty() {
                    continue;
                }

                let mut line = IngredientLine {
                    group: group.group.clone(),
                    name: name.to_string(),
                    amount: item.amount.clone(),
                    unit: item.unit.clone(),
                    quantity: None,
                    source: None,
                    matched_name: None,
                    grams: None,
                    added: Nutrition::default(),
                    notes: Vec::new(),
                };

                let quantity = match parse_amount(&item.amount) {
                    Some(quantity) => quantity,
                    None => {
                        line.notes.push(format!("invalid amount '{}', skipped", item.amount));
                        lines.push(line);
                        continue;
                    }
                };
                line.quantity = Some(quantity);

                match self.find_profile(name).await {
                    Some((source, matched_name, profile)) => {
                        let conversion = grams_for(quantity, &item.unit, name);
                        line.added = scale(&profile, conversion.grams / 100.0);
                        line.grams = Some(conversion.grams);
                        line.notes.extend(conversion.note);
                        line.source = Some(source);
                        line.matched_name = Some(matched_name);
                    }
                    None => {
                        line.added = scale(&DEFAULT_ESTIMATE, quantity / 100.0);
                        line.source = Some(LineSource::Estimate);
                        line.notes.push("no nutrition data found, using estimate".to_string());
                    }
                }

                add(&mut total, &line.added);
                lines.push(line);
            }
        }

        let per_portion = if portions > 1 {
            divide(&total, portions)
        } else {
            total
        };

        info!(
            "Nutrition computed for {} ingredient lines: {} kcal total, {} kcal per portion",
            lines.len(),
            total.kcal,
            per_portion.kcal
        );

        NutritionReport {
            portions: portions.max(1),
            total,
            per_portion,
            lines,
        }
    }

    async fn find_profile(&self, name: &str) -> Option<(LineSource, String, NutrientProfile)> {
        for source in &self.sources {
            match source.lookup(name).await {
                Ok(Some(found)) => {
                    debug!("{}: {} -> {}", found.source, name, found.matched_name);
                    return Some((LineSource::Api(found.source), found.matched_name, found.profile));
                }
                Ok(None) => {}
                Err(e) => warn!("{} lookup for '{}' failed: {}", source.name(), name, e),
            }
        }

        self.local
            .lookup(name)
            .map(|(key, profile)| (LineSource::Local, key.to_string(), profile))
    }
}

fn scale(profile: &NutrientProfile, factor: f64) -> Nutrition {
    Nutrition {
        kcal: (profile.kcal * factor) as i64,
        protein: (profile.protein * factor) as i64,
        carbs: (profile.carbs * factor) as i64,
        fat: (profile.fat * factor) as i64,
        fiber: (profile.fiber * factor) as i64,
    }
}

fn add(total: &mut Nutrition, added: &Nutrition) {
    total.kcal += added.kcal;
    total.protein += added.protein;
    total.carbs += added.carbs;
    total.fat += added.fat;
    total.fiber += added.fiber;
}

fn divide(total: &Nutrition, portions: u32) -> Nutrition {
    let portions = portions as f64;
    Nutrition {
        kcal: (total.kcal as f64 / portions) as i64,
        protein: (total.protein as f64 / portions) as i64,
        carbs: (total.carbs as f64 / portions) as i64,
        fat: (total.fat as f64 / portions) as i64,
        fiber: (total.fiber as f64 / portions) as i64,
    }
}
