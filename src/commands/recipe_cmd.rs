use colored::Colorize;

use super::confirm;
use crate::config::AdminConfig;
use crate::recipe::{seo_metadata, validate as validate_recipe, Recipe, RecipeFilter, ValidationReport};

pub async fn list(config: &AdminConfig, filter: &RecipeFilter) -> anyhow::Result<()> {
    let store = config.open_store().await?;
    let matches = filter.apply(store.recipes());

    println!("\n📚 {} of {} recipes", matches.len().to_string().cyan(), store.len());
    for (index, recipe) in matches {
        println!("  {:>3}  {}", index.to_string().dimmed(), describe(recipe));
    }
    println!();
    Ok(())
}

fn describe(recipe: &Recipe) -> String {
    let title = if recipe.title.is_empty() {
        "(ohne Titel)".italic().to_string()
    } else {
        recipe.title.bold().to_string()
    };
    let mut line = format!("{} [{}]", title, recipe.category);
    if !recipe.published {
        line.push_str(&format!(" {}", "draft".yellow()));
    }
    if recipe.nutrition.map_or(true, |n| n.is_empty()) {
        line.push_str(&format!(" {}", "no nutrition".dimmed()));
    }
    line
}

pub async fn validate(config: &AdminConfig, index: Option<usize>) -> anyhow::Result<()> {
    let store = config.open_store().await?;

    let selected: Vec<(usize, &Recipe)> = match index {
        Some(index) => vec![(index, store.get(index)?)],
        None => store.recipes().iter().enumerate().collect(),
    };

    let mut invalid = 0;
    for (index, recipe) in selected {
        let report = validate_recipe(recipe);
        if !report.is_valid() {
            invalid += 1;
        }
        print_report(index, recipe, &report);
    }

    if invalid > 0 {
        println!("\n❌ {} recipe(s) with errors", invalid.to_string().red());
    } else {
        println!("\n✅ {}", "No blocking errors".green());
    }
    Ok(())
}

fn print_report(index: usize, recipe: &Recipe, report: &ValidationReport) {
    if report.errors.is_empty() && report.warnings.is_empty() {
        println!("  {:>3}  {} {}", index, recipe.title, "ok".green());
        return;
    }
    println!("  {:>3}  {}", index, recipe.title.bold());
    for error in &report.errors {
        println!("         {} {}", "error".red(), error);
    }
    for warning in &report.warnings {
        println!("         {} {}", "warning".yellow(), warning);
    }
}

pub async fn seo(config: &AdminConfig, index: usize) -> anyhow::Result<()> {
    let store = config.open_store().await?;
    let metadata = seo_metadata(store.get(index)?);

    println!("\n🔍 {}", "Meta description".bold());
    println!("  {}", metadata.meta_description);
    println!("\n🏷️  {}", "Keywords".bold());
    println!("  {}", metadata.keywords.join(", "));
    println!("\n🧩 {}", "schema.org".bold());
    println!("{}", serde_json::to_string_pretty(&metadata.schema_org)?);
    Ok(())
}

pub async fn duplicate(config: &AdminConfig, index: usize) -> anyhow::Result<()> {
    let mut store = config.open_store().await?;
    let copy = store.duplicate(index).await?;
    println!("📄 Copied to index {}: {}", copy.to_string().cyan(), store.get(copy)?.title);
    Ok(())
}

pub async fn delete(config: &AdminConfig, index: usize) -> anyhow::Result<()> {
    let mut store = config.open_store().await?;
    let removed = store.delete(index).await?;
    println!("🗑️  Deleted '{}', {} recipes left", removed.title.bold(), store.len());
    Ok(())
}

pub async fn bulk_delete(config: &AdminConfig, indices: &[usize], yes: bool) -> anyhow::Result<()> {
    let mut store = config.open_store().await?;
    for &index in indices {
        if let Ok(recipe) = store.get(index) {
            println!("  {:>3}  {}", index.to_string().dimmed(), describe(recipe));
        }
    }
    if !yes && !confirm(&format!("Delete {} recipe(s)?", indices.len()))? {
        println!("Aborted.");
        return Ok(());
    }

    let outcome = store.bulk_delete(indices).await?;
    println!("🗑️  Deleted {} recipes, {} left", outcome.affected.to_string().cyan(), store.len());
    print_invalid(&outcome.invalid);
    Ok(())
}

pub async fn bulk_category(config: &AdminConfig, indices: &[usize], category: &str) -> anyhow::Result<()> {
    if category.is_empty() {
        anyhow::bail!("The category must not be empty");
    }
    let mut store = config.open_store().await?;
    let outcome = store.bulk_set_category(indices, category).await?;
    println!("✏️  {} recipes moved to {}", outcome.affected.to_string().cyan(), category.bold());
    print_invalid(&outcome.invalid);
    Ok(())
}

fn print_invalid(invalid: &[usize]) {
    if !invalid.is_empty() {
        let list: Vec<String> = invalid.iter().map(|i| i.to_string()).collect();
        println!("⚠️  No recipe at index {}", list.join(", ").yellow());
    }
}
