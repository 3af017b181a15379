use chrono::Local;
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::model::{FeaturedSlot, Nutrition, Recipe};
use super::templates::write_pretty;
use crate::git::GitCommitter;
use crate::sitemap::SitemapGenerator;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Recipe {0} does not exist")]
    NotFound(usize),
    #[error("Verification failed: wrote {expected} recipes but read back {found}")]
    Verification { expected: usize, found: usize },
}

/// What happens around a save besides writing the file.
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    pub history_dir: Option<PathBuf>,
    pub keep_backups: usize,
    pub git: Option<GitCommitter>,
    pub sitemap: Option<SitemapGenerator>,
}

/// What a bulk change touched; indices past the end are reported, not fatal.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkOutcome {
    pub affected: usize,
    pub invalid: Vec<usize>,
}

/// The recipe list backed by `recipes.json`.
///
/// Every mutation is written through immediately; the in-memory list only
/// changes once the file on disk has been written and verified.
#[derive(Debug)]
pub struct RecipeStore {
    path: PathBuf,
    options: StoreOptions,
    recipes: Vec<Recipe>,
}

impl RecipeStore {
    pub async fn open<P: AsRef<Path>>(path: P, options: StoreOptions) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let recipes = load_recipes(&path).await?;
        info!("Loaded {} recipes from {}", recipes.len(), path.display());
        Ok(Self { path, options, recipes })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Recipe, StoreError> {
        self.recipes.get(index).ok_or(StoreError::NotFound(index))
    }

    pub async fn create(&mut self, mut recipe: Recipe) -> Result<usize, StoreError> {
        let now = now_iso();
        recipe.created_at = Some(now.clone());
        recipe.updated_at = Some(now);
        recipe.version = Some(1);

        let mut next = self.recipes.clone();
        next.push(recipe);
        let index = next.len() - 1;
        self.commit(next).await?;
        Ok(index)
    }

    pub async fn update(&mut self, index: usize, mut recipe: Recipe) -> Result<(), StoreError> {
        let previous = self.get(index)?;
        if previous.created_at.is_some() {
            recipe.created_at = previous.created_at.clone();
        }
        recipe.updated_at = Some(now_iso());
        recipe.version = Some(previous.version.unwrap_or(1) + 1);

        let mut next = self.recipes.clone();
        next[index] = recipe;
        self.commit(next).await
    }

    pub async fn delete(&mut self, index: usize) -> Result<Recipe, StoreError> {
        self.get(index)?;
        let mut next = self.recipes.clone();
        let removed = next.remove(index);
        self.commit(next).await?;
        Ok(removed)
    }

    /// Appends a copy titled "<title> (Kopie)" without creation metadata.
    pub async fn duplicate(&mut self, index: usize) -> Result<usize, StoreError> {
        let mut copy = self.get(index)?.clone();
        let title = if copy.title.is_empty() { "Rezept".to_string() } else { copy.title.clone() };
        copy.title = format!("{} (Kopie)", title);
        copy.created_at = None;
        copy.updated_at = None;
        copy.version = None;

        let mut next = self.recipes.clone();
        next.push(copy);
        let new_index = next.len() - 1;
        self.commit(next).await?;
        Ok(new_index)
    }

    /// Removes every listed recipe in one save. Duplicate indices count once.
    pub async fn bulk_delete(&mut self, indices: &[usize]) -> Result<BulkOutcome, StoreError> {
        let (valid, invalid) = self.split_indices(indices);
        if !valid.is_empty() {
            let mut next = self.recipes.clone();
            for &index in valid.iter().rev() {
                next.remove(index);
            }
            self.commit(next).await?;
            info!("Bulk-deleted {} recipes", valid.len());
        }
        Ok(BulkOutcome {
            affected: valid.len(),
            invalid,
        })
    }

    pub async fn bulk_set_category(&mut self, indices: &[usize], category: &str) -> Result<BulkOutcome, StoreError> {
        let (valid, invalid) = self.split_indices(indices);
        if !valid.is_empty() {
            let now = now_iso();
            let mut next = self.recipes.clone();
            for &index in &valid {
                next[index].category = category.to_string();
                next[index].updated_at = Some(now.clone());
            }
            self.commit(next).await?;
            info!("Moved {} recipes to '{}'", valid.len(), category);
        }
        Ok(BulkOutcome {
            affected: valid.len(),
            invalid,
        })
    }

    /// Existing indices ascending and deduplicated, plus the unknown ones.
    fn split_indices(&self, indices: &[usize]) -> (Vec<usize>, Vec<usize>) {
        let (mut valid, mut invalid): (Vec<usize>, Vec<usize>) =
            indices.iter().partition(|&&i| i < self.recipes.len());
        valid.sort_unstable();
        valid.dedup();
        invalid.sort_unstable();
        invalid.dedup();
        (valid, invalid)
    }

    /// Replaces the whole list, e.g. from an uploaded export.
    pub async fn import(&mut self, recipes: Vec<Recipe>) -> Result<(), StoreError> {
        self.commit(recipes).await
    }

    /// Promotes one recipe into a homepage slot and removes every other
    /// recipe from it.
    pub async fn set_featured(&mut self, slot: FeaturedSlot, index: usize, text: &str) -> Result<(), StoreError> {
        self.get(index)?;
        let mut next = self.recipes.clone();
        for (i, recipe) in next.iter_mut().enumerate() {
            let (flag, slot_text) = slot.fields(recipe);
            if i == index {
                *flag = true;
                *slot_text = text.to_string();
            } else {
                *flag = false;
            }
        }
        self.commit(next).await
    }

    pub async fn clear_featured(&mut self, slot: FeaturedSlot) -> Result<(), StoreError> {
        let mut next = self.recipes.clone();
        for recipe in next.iter_mut() {
            let (flag, slot_text) = slot.fields(recipe);
            if *flag {
                *flag = false;
                slot_text.clear();
            }
        }
        self.commit(next).await
    }

    pub async fn set_nutrition(&mut self, index: usize, nutrition: Nutrition) -> Result<(), StoreError> {
        let mut recipe = self.get(index)?.clone();
        recipe.nutrition = Some(nutrition);
        self.update(index, recipe).await
    }

    pub async fn save(&self) -> Result<(), StoreError> {
        self.write_all(&self.recipes).await
    }

    async fn commit(&mut self, next: Vec<Recipe>) -> Result<(), StoreError> {
        self.write_all(&next).await?;
        self.recipes = next;
        Ok(())
    }

    async fn write_all(&self, recipes: &[Recipe]) -> Result<(), StoreError> {
        if let Some(history_dir) = &self.options.history_dir {
            if self.path.exists() {
                backup(&self.path, history_dir, self.options.keep_backups).await?;
            }
        }

        write_pretty(&self.path, recipes).await?;

        let saved = load_recipes(&self.path).await?;
        if saved.len() != recipes.len() {
            return Err(StoreError::Verification {
                expected: recipes.len(),
                found: saved.len(),
            });
        }

        if let Some(git) = &self.options.git {
            git.commit(&format!("Admin: Rezepte aktualisiert ({} Rezepte)", recipes.len()))
                .await;
        }

        if let Some(sitemap) = &self.options.sitemap {
            if let Err(e) = sitemap.write(recipes).await {
                warn!("Sitemap regeneration failed: {}", e);
            }
        }

        Ok(())
    }
}

pub async fn load_recipes(path: &Path) -> Result<Vec<Recipe>, StoreError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Copies the current file into the history folder and prunes old copies.
async fn backup(path: &Path, history_dir: &Path, keep: usize) -> Result<(), StoreError> {
    tokio::fs::create_dir_all(history_dir).await?;
    let name = format!("recipes_{}.json", Local::now().format("%Y%m%d_%H%M%S"));
    tokio::fs::copy(path, history_dir.join(name)).await?;

    let mut backups = Vec::new();
    let mut entries = tokio::fs::read_dir(history_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with("recipes_") {
            backups.push(name);
        }
    }
    backups.sort();

    if backups.len() > keep {
        for old in &backups[..backups.len() - keep] {
            if let Err(e) = tokio::fs::remove_file(history_dir.join(old)).await {
                warn!("Could not remove old backup {}: {}", old, e);
            }
        }
    }
    Ok(())
}

/// Local time in the `YYYY-MM-DDTHH:MM:SS.ffffff` form existing files use.
pub fn now_iso() -> String {
    Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}
