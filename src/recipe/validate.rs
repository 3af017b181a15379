use serde::Serialize;
use std::fmt;

use super::model::Recipe;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationIssue {
    MissingTitle,
    NoIngredientGroups,
    NoNamedIngredient,
    NoSteps,
    NoImage,
    NoCategory,
    NoNutrition,
    NoTimes,
    NoTips,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ValidationIssue::MissingTitle => "No title given",
            ValidationIssue::NoIngredientGroups => "No ingredients present",
            ValidationIssue::NoNamedIngredient => "No named ingredients found",
            ValidationIssue::NoSteps => "No preparation steps present",
            ValidationIssue::NoImage => "No image attached",
            ValidationIssue::NoCategory => "No category given",
            ValidationIssue::NoNutrition => "No nutrition values given",
            ValidationIssue::NoTimes => "No preparation or cooking time",
            ValidationIssue::NoTips => "No tips or variations given",
        };
        write!(f, "{}", text)
    }
}

/// Errors block a save; warnings are advisory.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn validate(recipe: &Recipe) -> ValidationReport {
    let mut report = ValidationReport::default();

    if recipe.title.trim().is_empty() {
        report.errors.push(ValidationIssue::MissingTitle);
    }

    if recipe.ingredients.is_empty() {
        report.errors.push(ValidationIssue::NoIngredientGroups);
    } else if !recipe.all_ingredients().any(|item| !item.name.trim().is_empty()) {
        report.errors.push(ValidationIssue::NoNamedIngredient);
    }

    if recipe.steps.is_empty() {
        report.errors.push(ValidationIssue::NoSteps);
    }

    if !recipe.has_image() {
        report.warnings.push(ValidationIssue::NoImage);
    }
    if recipe.category.trim().is_empty() {
        report.warnings.push(ValidationIssue::NoCategory);
    }
    if recipe.nutrition.map_or(true, |n| n.is_empty()) {
        report.warnings.push(ValidationIssue::NoNutrition);
    }
    if recipe.preparation_time.is_empty() && recipe.cook_time.is_empty() {
        report.warnings.push(ValidationIssue::NoTimes);
    }
    if recipe.tips.is_blank() {
        report.warnings.push(ValidationIssue::NoTips);
    }

    report
}
