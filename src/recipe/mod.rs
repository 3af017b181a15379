pub mod filter;
pub mod model;
pub mod seo;
pub mod slug;
pub mod store;
pub mod templates;
pub mod validate;

pub use filter::RecipeFilter;
pub use model::{FeaturedSlot, Ingredient, IngredientGroup, Nutrition, Recipe, Step, Tips};
pub use seo::{seo_metadata, SeoMetadata};
pub use slug::slugify;
pub use store::{BulkOutcome, RecipeStore, StoreError, StoreOptions};
pub use templates::CatalogStore;
pub use validate::{validate, ValidationIssue, ValidationReport};
