pub mod parse;
pub mod web;

use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::providers::CompletionProvider;
use crate::recipe::Recipe;

pub use parse::{extract_with_regex, parse_llm_json};
pub use web::{fetch_url_text, html_to_recipe_text};

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Page answered with status {0}")]
    Status(u16),
}

const MIN_TEXT_CHARS: usize = 20;
const MAX_PROMPT_TEXT_CHARS: usize = 4000;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "model", rename_all = "snake_case")]
pub enum ExtractionMethod {
    Llm(String),
    Regex,
}

#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub recipe: Recipe,
    pub method: ExtractionMethod,
}

/// Turns free text into a recipe draft, through the language model when one
/// is configured and through pattern matching otherwise.
pub struct RecipeExtractor {
    provider: Option<Box<dyn CompletionProvider + Send + Sync>>,
}

impl RecipeExtractor {
    pub fn new(provider: Option<Box<dyn CompletionProvider + Send + Sync>>) -> Self {
        Self { provider }
    }

    pub fn has_llm(&self) -> bool {
        self.provider.is_some()
    }

    /// `None` when there is too little text to work with.
    pub async fn extract(&self, text: &str) -> Option<Extraction> {
        if text.trim().chars().count() < MIN_TEXT_CHARS {
            warn!("Not enough text to extract a recipe from");
            return None;
        }

        if let Some(provider) = &self.provider {
            match self.extract_with_llm(provider.as_ref(), text).await {
                Ok(Some(extraction)) => return Some(extraction),
                Ok(None) => warn!("Model returned no usable recipe, using pattern extraction"),
                Err(e) => warn!("Model extraction failed ({}), using pattern extraction", e),
            }
        }

        info!("Extracting recipe with patterns");
        Some(Extraction {
            recipe: extract_with_regex(text),
            method: ExtractionMethod::Regex,
        })
    }

    async fn extract_with_llm(
        &self,
        provider: &(dyn CompletionProvider + Send + Sync),
        text: &str,
    ) -> anyhow::Result<Option<Extraction>> {
        let answer = provider.complete(&build_prompt(text)).await?;
        let value = match parse_llm_json(&answer) {
            Some(value) => value,
            None => return Ok(None),
        };

        let has_title = value
            .get("title")
            .and_then(|t| t.as_str())
            .map_or(false, |t| !t.trim().is_empty());
        if !has_title {
            return Ok(None);
        }

        let recipe: Recipe = serde_json::from_value(value)?;
        let model = provider.get_model_info().await?;
        info!("Recipe '{}' extracted with {}", recipe.title, model);
        Ok(Some(Extraction {
            recipe,
            method: ExtractionMethod::Llm(model),
        }))
    }
}

fn build_prompt(text: &str) -> String {
    let excerpt: String = text.chars().take(MAX_PROMPT_TEXT_CHARS).collect();
    format!(
        r#"Extrahiere aus folgendem Text ein vollständiges veganes Rezept im JSON-Format.

Text:
{excerpt}

Erstelle ein JSON-Objekt mit folgender Struktur:
{{
  "title": "Rezeptname",
  "subtitle": "Kurze Beschreibung",
  "category": "Hauptgerichte|Salate|Dessert",
  "preparationTime": "X Min",
  "cookTime": "Y Min",
  "portion": 2,
  "difficulty": "Einfach|Mittel|Schwer",
  "ingredients": [
    {{
      "group": "Gruppenname",
      "items": [
        {{"amount": "200", "unit": "g", "name": "Kichererbsen"}},
        {{"amount": "2", "unit": "EL", "name": "Olivenöl"}}
      ]
    }}
  ],
  "steps": [
    {{
      "time": "10 Min",
      "needed": [
        {{"amount": "200", "unit": "g", "name": "Kichererbsen"}}
      ],
      "substeps": ["Kichererbsen abtropfen lassen", "Mit Olivenöl pürieren"]
    }}
  ],
  "tips": "Tipps und Varianten"
}}

Regeln:
- Jeder Schritt braucht ein "needed"-Array mit allen Zutaten, die darin verwendet werden (amount, unit, name).
- Jeder substep nennt mindestens eine Zutat mit Menge.
- Extrahiere nur vegane Rezepte.
- Wenn kein vollständiges Rezept gefunden wird, gib {{"title": "", "ingredients": [], "steps": []}} zurück.
- Gib nur valides JSON zurück, keine Erklärungen.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::ScriptedProvider;

    fn extractor(answer: Option<&str>) -> RecipeExtractor {
        let provider = match answer {
            Some(answer) => ScriptedProvider::answering(answer),
            None => ScriptedProvider::failing(),
        };
        RecipeExtractor::new(Some(provider.boxed()))
    }

    const TEXT: &str = "Rezept: Hummus\nZutaten:\n200 g Kichererbsen\n2 EL Tahin\n";

    #[tokio::test]
    async fn test_short_text_is_rejected() {
        assert!(RecipeExtractor::new(None).extract("zu kurz").await.is_none());
    }

    #[tokio::test]
    async fn test_llm_answer_is_used() {
        let answer = "```json\n{\"title\": \"Hummus\", \"portion\": \"4\", \"ingredients\": [], \"steps\": []}\n```";
        let extraction = extractor(Some(answer)).extract(TEXT).await.unwrap();
        assert_eq!(extraction.method, ExtractionMethod::Llm("scripted".to_string()));
        assert_eq!(extraction.recipe.title, "Hummus");
        assert_eq!(extraction.recipe.portion, 4);
    }

    #[tokio::test]
    async fn test_falls_back_to_patterns() {
        let empty_title = extractor(Some(r#"{"title": "", "ingredients": [], "steps": []}"#));
        let extraction = empty_title.extract(TEXT).await.unwrap();
        assert_eq!(extraction.method, ExtractionMethod::Regex);
        assert_eq!(extraction.recipe.title, "Hummus");
        assert_eq!(extraction.recipe.ingredients[0].items.len(), 2);

        let failing = extractor(None);
        assert_eq!(failing.extract(TEXT).await.unwrap().method, ExtractionMethod::Regex);
    }

    #[test]
    fn test_prompt_truncates_text() {
        let long = "x".repeat(5000);
        let prompt = build_prompt(&long);
        assert!(prompt.contains(&"x".repeat(4000)));
        assert!(!prompt.contains(&"x".repeat(4001)));
    }
}
