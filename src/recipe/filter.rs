use serde::Deserialize;

use super::model::Recipe;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
}

impl RecipeFilter {
    pub fn matches(&self, recipe: &Recipe) -> bool {
        if let Some(search) = active(&self.search) {
            let needle = search.to_lowercase();
            let hit = recipe.title.to_lowercase().contains(&needle)
                || recipe.subtitle.to_lowercase().contains(&needle)
                || recipe
                    .all_ingredients()
                    .any(|item| item.name.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        if let Some(category) = active(&self.category) {
            if recipe.category != category {
                return false;
            }
        }

        if let Some(difficulty) = active(&self.difficulty) {
            if recipe.difficulty != difficulty {
                return false;
            }
        }

        true
    }

    /// Returns `(index, recipe)` pairs so callers can address matches in the store.
    pub fn apply<'a>(&self, recipes: &'a [Recipe]) -> Vec<(usize, &'a Recipe)> {
        recipes
            .iter()
            .enumerate()
            .filter(|(_, recipe)| self.matches(recipe))
            .collect()
    }
}

fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::model::{Ingredient, IngredientGroup};

    fn recipes() -> Vec<Recipe> {
        vec![
            Recipe {
                title: "Tofu Scramble".to_string(),
                category: "Frühstück".to_string(),
                difficulty: "Einfach".to_string(),
                ..Default::default()
            },
            Recipe {
                title: "Linsen-Dal".to_string(),
                category: "Hauptgerichte".to_string(),
                difficulty: "Mittel".to_string(),
                ingredients: vec![IngredientGroup {
                    group: "Basis".to_string(),
                    items: vec![Ingredient::new("150", "g", "Rote Linsen"), Ingredient::new("1", "", "Tofu")],
                }],
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_search_covers_ingredients() {
        let all = recipes();
        let filter = RecipeFilter {
            search: Some("  TOFU ".to_string()),
            ..Default::default()
        };
        let hits: Vec<usize> = filter.apply(&all).into_iter().map(|(i, _)| i).collect();
        assert_eq!(hits, vec![0, 1]);
    }

    #[test]
    fn test_category_and_difficulty_narrow() {
        let all = recipes();
        let filter = RecipeFilter {
            search: Some("tofu".to_string()),
            category: Some("Hauptgerichte".to_string()),
            difficulty: Some("Mittel".to_string()),
        };
        let hits = filter.apply(&all);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].1.title, "Linsen-Dal");
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let all = recipes();
        assert_eq!(RecipeFilter::default().apply(&all).len(), 2);
        let blank = RecipeFilter {
            category: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(blank.apply(&all).len(), 2);
    }
}
