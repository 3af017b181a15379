pub mod api;
pub mod assistant;
pub mod commands;
pub mod config;
pub mod extract;
pub mod food;
pub mod git;
pub mod images;
pub mod providers;
pub mod recipe;
pub mod sitemap;
pub mod translate;

// Re-export commonly used items
pub use config::AdminConfig;
pub use recipe::{Recipe, RecipeStore};
