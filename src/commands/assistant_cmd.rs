use anyhow::anyhow;
use colored::Colorize;

use crate::assistant::RecipeAssistant;
use crate::config::AdminConfig;
use crate::providers::{CompletionProvider, GeminiProvider};

async fn assistant(config: &AdminConfig) -> anyhow::Result<RecipeAssistant> {
    let key = config
        .gemini_api_key
        .clone()
        .ok_or_else(|| anyhow!("The assistant needs GOOGLE_API_KEY or GEMINI_API_KEY"))?;
    Ok(RecipeAssistant::new(Box::new(GeminiProvider::new(key).await?)))
}

pub async fn generate(config: &AdminConfig, description: &str, save: bool) -> anyhow::Result<()> {
    let assistant = assistant(config).await?;
    println!("🎲 Generating a recipe for \"{}\"", description.cyan());
    let recipe = assistant.generate(description).await?;
    println!("🤖 Answer from {}", assistant.model().await.dimmed());
    println!("{}", serde_json::to_string_pretty(&recipe)?);

    if save {
        let mut store = config.open_store().await?;
        let index = store.create(recipe).await?;
        println!("\n✅ Saved as recipe {}", index.to_string().green());
    }
    Ok(())
}

pub async fn seo(config: &AdminConfig, index: usize, apply: bool) -> anyhow::Result<()> {
    let assistant = assistant(config).await?;
    let mut store = config.open_store().await?;
    let mut recipe = store.get(index)?.clone();

    let suggestion = assistant.improve_seo(&recipe).await?;
    let show = |label: &str, value: &Option<String>| {
        println!("  {:<11} {}", label.bold(), value.as_deref().unwrap_or("-"));
    };
    println!("\n✨ SEO suggestions for {}", recipe.title.bold());
    show("Title", &suggestion.title);
    show("Subtitle", &suggestion.subtitle);
    show("Meta", &suggestion.meta_description);

    if apply {
        suggestion.apply_to(&mut recipe);
        store.update(index, recipe).await?;
        println!("\n✅ {}", "Title and subtitle saved".green());
    }
    Ok(())
}

pub async fn tags(config: &AdminConfig, index: usize, apply: bool) -> anyhow::Result<()> {
    let assistant = assistant(config).await?;
    let mut store = config.open_store().await?;
    let mut recipe = store.get(index)?.clone();

    let tags = assistant.suggest_tags(&recipe).await?;
    println!("\n🏷️  {}", tags.join(", ").cyan());

    if apply {
        let before = recipe.tags.len();
        for tag in tags {
            if !recipe.tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
                recipe.tags.push(tag);
            }
        }
        let added = recipe.tags.len() - before;
        store.update(index, recipe).await?;
        println!("✅ {} new tag(s) saved", added.to_string().green());
    }
    Ok(())
}

pub async fn nutrition(config: &AdminConfig, index: usize, apply: bool) -> anyhow::Result<()> {
    let assistant = assistant(config).await?;
    let mut store = config.open_store().await?;
    let recipe = store.get(index)?.clone();

    let estimate = assistant.estimate_nutrition(&recipe).await?;
    println!(
        "\n🔢 Estimated per portion: {} kcal | {} g protein | {} g carbs | {} g fat | {} g fiber",
        estimate.kcal.to_string().cyan(),
        estimate.protein,
        estimate.carbs,
        estimate.fat,
        estimate.fiber
    );
    println!("   {}", "Model estimate, `nutrition` computes from food databases".dimmed());

    if apply {
        store.set_nutrition(index, estimate).await?;
        println!("✅ {}", "Estimate saved".green());
    }
    Ok(())
}

pub async fn variant(config: &AdminConfig, index: usize, kind: &str, save: bool) -> anyhow::Result<()> {
    let assistant = assistant(config).await?;
    let mut store = config.open_store().await?;
    let recipe = store.get(index)?.clone();

    println!("🔄 Creating a {} variant of {}", kind.cyan(), recipe.title.bold());
    let variant = assistant.variant(&recipe, kind).await?;
    println!("{}", serde_json::to_string_pretty(&variant.recipe)?);
    if !variant.changes.is_empty() {
        println!("\n📝 {}", "Changes".bold());
        for change in &variant.changes {
            println!("  - {}", change);
        }
    }

    if save {
        let title = variant.recipe.title.clone();
        let new_index = store.create(variant.recipe).await?;
        println!("\n✅ '{}' saved as recipe {}", title, new_index.to_string().green());
    }
    Ok(())
}
