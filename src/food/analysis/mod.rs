pub mod nutrition;

pub use nutrition::{IngredientLine, LineSource, NutritionCalculator, NutritionReport};
