use serde::Serialize;
use serde_json::{json, Value};

use super::model::Recipe;

const MAX_DESCRIPTION: usize = 160;
const MAX_KEYWORDS: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct SeoMetadata {
    pub meta_description: String,
    pub keywords: Vec<String>,
    pub schema_org: Value,
}

/// A blank title is described as "Rezept" so the page never gets an empty
/// schema.org `name`.
pub fn seo_metadata(recipe: &Recipe) -> SeoMetadata {
    let title = match recipe.title.trim() {
        "" => "Rezept",
        title => title,
    };

    let mut parts = vec![title.to_string()];
    if !recipe.subtitle.is_empty() {
        parts.push(recipe.subtitle.clone());
    }
    if !recipe.category.is_empty() {
        parts.push(format!("({})", recipe.category));
    }
    let meta_description = truncate_description(&parts.join(" - "));

    SeoMetadata {
        keywords: keywords(recipe, title),
        schema_org: schema_org(recipe, title, &meta_description),
        meta_description,
    }
}

fn truncate_description(text: &str) -> String {
    if text.chars().count() > MAX_DESCRIPTION {
        let head: String = text.chars().take(MAX_DESCRIPTION - 3).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn keywords(recipe: &Recipe, title: &str) -> Vec<String> {
    let mut candidates = vec![title.to_lowercase()];
    if !recipe.category.is_empty() {
        candidates.push(recipe.category.to_lowercase());
    }
    candidates.extend(recipe.tags.iter().cloned());

    // Only the first group: it usually carries the main ingredients.
    if let Some(group) = recipe.ingredients.first() {
        candidates.extend(
            group
                .items
                .iter()
                .take(5)
                .map(|item| item.name.trim().to_lowercase())
                .filter(|name| !name.is_empty()),
        );
    }

    let mut keywords: Vec<String> = Vec::new();
    for keyword in candidates {
        if !keywords.contains(&keyword) {
            keywords.push(keyword);
        }
    }
    keywords.truncate(MAX_KEYWORDS);
    keywords
}

fn schema_org(recipe: &Recipe, title: &str, description: &str) -> Value {
    let ingredients: Vec<String> = recipe
        .all_ingredients()
        .filter(|item| !item.name.is_empty())
        .map(|item| format!("{} {} {}", item.amount, item.unit, item.name).trim().to_string())
        .collect();

    let instructions: Vec<Value> = recipe
        .steps
        .iter()
        .flat_map(|step| step.substeps.iter())
        .map(|text| json!({"@type": "HowToStep", "text": text}))
        .collect();

    let mut schema = json!({
        "@context": "https://schema.org/",
        "@type": "Recipe",
        "name": title,
        "description": description,
        "recipeCategory": recipe.category,
        "recipeCuisine": "Vegan",
        "recipeYield": format!("{} Portionen", recipe.portion),
        "prepTime": recipe.preparation_time,
        "cookTime": recipe.cook_time,
        "recipeIngredient": ingredients,
        "recipeInstructions": instructions,
    });

    if let Some(nutrition) = recipe.nutrition {
        schema["nutrition"] = json!({
            "@type": "NutritionInformation",
            "calories": format!("{} kcal", nutrition.kcal),
            "proteinContent": format!("{}g", nutrition.protein),
            "carbohydrateContent": format!("{}g", nutrition.carbs),
            "fatContent": format!("{}g", nutrition.fat),
            "fiberContent": format!("{}g", nutrition.fiber),
        });
    }

    schema
}
