use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

use crate::config::AdminConfig;
use crate::recipe::RecipeFilter;

mod assistant_cmd;
mod food_cmd;
mod recipe_cmd;
mod site_cmd;
mod system;
mod translate_cmd;

#[derive(Parser, Debug)]
#[command(author, version, about = "Back office for the recipe website", long_about = None)]
pub struct Cli {
    /// Load environment variables from this file instead of `.env`
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the admin HTTP API
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// List recipes, optionally filtered
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        difficulty: Option<String>,
    },
    /// Check one recipe, or all of them
    Validate { index: Option<usize> },
    /// Show meta description, keywords and schema.org data
    Seo { index: usize },
    Duplicate { index: usize },
    Delete { index: usize },
    /// Delete several recipes in one save
    BulkDelete {
        #[arg(required = true)]
        indices: Vec<usize>,
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Move several recipes into one category
    BulkCategory {
        #[arg(long)]
        category: String,
        #[arg(required = true)]
        indices: Vec<usize>,
    },
    /// Compute nutrition values through the food APIs
    Nutrition {
        index: usize,
        /// Store the per-portion values in the recipe
        #[arg(long)]
        apply: bool,
        /// Use only the built-in table
        #[arg(long)]
        offline: bool,
    },
    /// Translate recipes.json into every target language
    TranslateRecipes {
        /// Skip the confirmation when the quota is nearly used up
        #[arg(long)]
        yes: bool,
        #[arg(long)]
        lang: Option<String>,
    },
    /// Translate the website UI strings
    TranslateUi {
        /// Re-translate everything instead of only missing strings
        #[arg(long)]
        full: bool,
        #[arg(long)]
        lang: Option<String>,
        /// Translate and store single strings, e.g. --set nav.home=Startseite
        #[arg(long = "set", value_parser = parse_key_value)]
        set: Vec<(String, String)>,
    },
    /// Check that every language file exists and matches the German strings
    VerifyUi {
        #[arg(long)]
        lang: Option<String>,
    },
    /// Show the DeepL character quota
    Quota,
    /// Regenerate public/sitemap.xml
    Sitemap,
    /// Build a recipe draft from a web page or a text file
    Extract {
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        url: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        /// Append the draft to recipes.json
        #[arg(long)]
        save: bool,
    },
    /// List recipe images and images embedded in recipes.json
    Images,
    /// Generate a new recipe from a short description with Gemini
    AiGenerate {
        description: String,
        /// Append the recipe to recipes.json
        #[arg(long)]
        save: bool,
    },
    /// Suggest a better title, subtitle and meta description
    AiSeo {
        index: usize,
        /// Store title and subtitle in the recipe
        #[arg(long)]
        apply: bool,
    },
    /// Suggest tags for a recipe
    AiTags {
        index: usize,
        /// Add the new tags to the recipe
        #[arg(long)]
        apply: bool,
    },
    /// Let the model estimate nutrition values per portion
    AiNutrition {
        index: usize,
        #[arg(long)]
        apply: bool,
    },
    /// Create a variant such as "Glutenfrei" or "High-Protein"
    AiVariant {
        index: usize,
        #[arg(long)]
        kind: String,
        /// Append the variant to recipes.json
        #[arg(long)]
        save: bool,
    },
}

/// Asks on stdin; only "j", "ja", "y" and "yes" count as consent.
fn confirm(question: &str) -> anyhow::Result<bool> {
    print!("{} [j/N] ", question);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "j" | "ja" | "y" | "yes"))
}

fn parse_key_value(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, text)) if !key.trim().is_empty() && !text.trim().is_empty() => {
            Ok((key.trim().to_string(), text.trim().to_string()))
        }
        _ => Err(format!("expected KEY=TEXT, got '{}'", value)),
    }
}

pub async fn run(command: Command, config: AdminConfig) -> anyhow::Result<()> {
    match command {
        Command::Serve { port } => system::serve(&config, port).await,
        Command::List {
            search,
            category,
            difficulty,
        } => {
            let filter = RecipeFilter {
                search,
                category,
                difficulty,
            };
            recipe_cmd::list(&config, &filter).await
        }
        Command::Validate { index } => recipe_cmd::validate(&config, index).await,
        Command::Seo { index } => recipe_cmd::seo(&config, index).await,
        Command::Duplicate { index } => recipe_cmd::duplicate(&config, index).await,
        Command::Delete { index } => recipe_cmd::delete(&config, index).await,
        Command::BulkDelete { indices, yes } => recipe_cmd::bulk_delete(&config, &indices, yes).await,
        Command::BulkCategory { category, indices } => {
            recipe_cmd::bulk_category(&config, &indices, category.trim()).await
        }
        Command::Nutrition { index, apply, offline } => {
            food_cmd::nutrition(&config, index, apply, offline).await
        }
        Command::TranslateRecipes { yes, lang } => {
            translate_cmd::translate_recipes(&config, yes, lang.as_deref()).await
        }
        Command::TranslateUi { full, lang, set } => {
            translate_cmd::translate_ui(&config, full, lang.as_deref(), &set).await
        }
        Command::VerifyUi { lang } => translate_cmd::verify_ui(&config, lang.as_deref()).await,
        Command::Quota => translate_cmd::quota(&config).await,
        Command::Sitemap => site_cmd::sitemap(&config).await,
        Command::Extract { url, file, save } => site_cmd::extract(&config, url, file, save).await,
        Command::Images => site_cmd::images(&config).await,
        Command::AiGenerate { description, save } => {
            assistant_cmd::generate(&config, &description, save).await
        }
        Command::AiSeo { index, apply } => assistant_cmd::seo(&config, index, apply).await,
        Command::AiTags { index, apply } => assistant_cmd::tags(&config, index, apply).await,
        Command::AiNutrition { index, apply } => assistant_cmd::nutrition(&config, index, apply).await,
        Command::AiVariant { index, kind, save } => {
            assistant_cmd::variant(&config, index, &kind, save).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("recipe-admin").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = parse(&["--env-file", "prod.env", "nutrition", "3", "--apply"]).unwrap();
        assert_eq!(cli.env_file, Some(PathBuf::from("prod.env")));
        assert_eq!(
            cli.command,
            Command::Nutrition {
                index: 3,
                apply: true,
                offline: false
            }
        );

        let cli = parse(&["translate-ui", "--set", "nav.home=Startseite", "--lang", "en"]).unwrap();
        assert_eq!(
            cli.command,
            Command::TranslateUi {
                full: false,
                lang: Some("en".to_string()),
                set: vec![("nav.home".to_string(), "Startseite".to_string())],
            }
        );
    }

    #[test]
    fn test_parse_bulk_and_assistant() {
        let cli = parse(&["bulk-delete", "4", "1", "--yes"]).unwrap();
        assert_eq!(cli.command, Command::BulkDelete { indices: vec![4, 1], yes: true });

        let cli = parse(&["bulk-category", "--category", "Suppen", "0", "2"]).unwrap();
        assert_eq!(
            cli.command,
            Command::BulkCategory {
                category: "Suppen".to_string(),
                indices: vec![0, 2]
            }
        );

        let cli = parse(&["ai-variant", "3", "--kind", "Low-Carb", "--save"]).unwrap();
        assert_eq!(
            cli.command,
            Command::AiVariant {
                index: 3,
                kind: "Low-Carb".to_string(),
                save: true
            }
        );

        let cli = parse(&["ai-generate", "Schnelles Curry mit Kichererbsen"]).unwrap();
        assert!(matches!(cli.command, Command::AiGenerate { save: false, .. }));
        assert_eq!(parse(&["verify-ui"]).unwrap().command, Command::VerifyUi { lang: None });

        assert!(parse(&["bulk-delete"]).is_err());
        assert!(parse(&["ai-variant", "3"]).is_err());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse(&["translate-ui", "--set", "ohne-gleich"]).is_err());
        assert!(parse(&["extract"]).is_err());
        assert!(parse(&["extract", "--url", "https://x.de", "--file", "a.txt"]).is_err());
        assert!(parse(&["seo"]).is_err());
    }
}
