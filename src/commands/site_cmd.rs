use anyhow::{anyhow, Context};
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::AdminConfig;
use crate::extract::{fetch_url_text, ExtractionMethod, RecipeExtractor};
use crate::images::{EmbeddedKind, ImageLibrary};
use crate::providers::{CompletionProvider, GeminiProvider};
use crate::recipe::store::load_recipes;

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

pub async fn sitemap(config: &AdminConfig) -> anyhow::Result<()> {
    let recipes = load_recipes(&config.recipes_path()).await?;
    let generator = config.sitemap_generator()?;
    let stats = generator.write(&recipes).await?;
    println!(
        "🗺️  {} written: {} static pages, {} recipes",
        generator.output().display(),
        stats.static_pages,
        stats.recipes.to_string().cyan()
    );
    Ok(())
}

pub async fn images(config: &AdminConfig) -> anyhow::Result<()> {
    let files = config.image_library().list().await?;
    println!("\n🖼️  {} image files", files.len().to_string().cyan());
    for image in &files {
        println!(
            "  {:<40} {:>8} KB  {}  {}",
            image.filename,
            image.size / 1024,
            image.modified.format("%Y-%m-%d %H:%M"),
            image.source.dimmed()
        );
    }

    let recipes = load_recipes(&config.recipes_path()).await?;
    let embedded = ImageLibrary::embedded_images(&recipes);
    if !embedded.is_empty() {
        println!("\n📎 {} images referenced inside recipes.json", embedded.len().to_string().yellow());
        for image in &embedded {
            let what = match image.kind {
                EmbeddedKind::Base64 => format!("base64, ~{} KB", image.size / 1024),
                EmbeddedKind::File => image.filename.clone().unwrap_or_default(),
            };
            println!("  {:<40} {}", image.title, what.dimmed());
        }
    }
    Ok(())
}

pub async fn extract(
    config: &AdminConfig,
    url: Option<String>,
    file: Option<PathBuf>,
    save: bool,
) -> anyhow::Result<()> {
    let text = match (url, file) {
        (Some(url), _) => {
            println!("🌐 Fetching {}", url);
            fetch_url_text(&url, FETCH_TIMEOUT).await?
        }
        (None, Some(file)) => tokio::fs::read_to_string(&file)
            .await
            .with_context(|| format!("Could not read {}", file.display()))?,
        (None, None) => return Err(anyhow!("Give either --url or --file")),
    };

    let provider: Option<Box<dyn CompletionProvider + Send + Sync>> = match &config.gemini_api_key {
        Some(key) => Some(Box::new(GeminiProvider::new(key.clone()).await?)),
        None => None,
    };
    let extractor = RecipeExtractor::new(provider);

    let extraction = extractor
        .extract(&text)
        .await
        .ok_or_else(|| anyhow!("Not enough text to extract a recipe"))?;

    match &extraction.method {
        ExtractionMethod::Llm(model) => println!("🤖 Extracted with {}", model.cyan()),
        ExtractionMethod::Regex => println!("🔎 Extracted with patterns, please review the draft"),
    }
    println!("{}", serde_json::to_string_pretty(&extraction.recipe)?);

    if save {
        let mut store = config.open_store().await?;
        let index = store.create(extraction.recipe).await?;
        println!("\n✅ Saved as recipe {}", index.to_string().green());
    }
    Ok(())
}
