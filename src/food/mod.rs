pub mod analysis;
pub mod api;
pub mod config;
pub mod local_db;
pub mod units;

pub use analysis::{NutritionCalculator, NutritionReport};
pub use api::{FoodError, NutrientProfile, NutritionMatch, NutritionSource};
pub use config::FoodConfig;
