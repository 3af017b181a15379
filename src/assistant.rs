use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::extract::parse::{parse_ingredient_line, parse_steps};
use crate::extract::parse_llm_json;
use crate::providers::CompletionProvider;
use crate::recipe::{IngredientGroup, Nutrition, Recipe};

lazy_static! {
    static ref NUMBER: Regex = Regex::new(r"\d+(?:[.,]\d+)?").unwrap();
}

/// Variants offered in the editor; any other description works as well.
pub const VARIANT_KINDS: [&str; 8] = [
    "Glutenfrei",
    "High-Protein",
    "Low-Carb",
    "Budget-Version",
    "Schnellversion (< 30 Min)",
    "Gourmet-Version",
    "Meal-Prep optimiert",
    "Kinder-freundlich",
];

const MAX_TAGS: usize = 10;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Missing input: {0}")]
    EmptyInput(&'static str),
    #[error("Model request failed: {0}")]
    Provider(#[from] anyhow::Error),
    #[error("Model answer could not be used: {0}")]
    Unusable(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeoSuggestion {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub meta_description: Option<String>,
}

impl SeoSuggestion {
    /// Takes over title and subtitle. The meta text stays a suggestion
    /// because the description is derived from them on the website.
    pub fn apply_to(&self, recipe: &mut Recipe) {
        if let Some(title) = &self.title {
            recipe.title = title.clone();
        }
        if let Some(subtitle) = &self.subtitle {
            recipe.subtitle = subtitle.clone();
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Variant {
    pub recipe: Recipe,
    /// The model's notes on what it changed.
    pub changes: Vec<String>,
}

/// Editing helpers backed by the language model: new recipes from a short
/// description, SEO texts, tags, nutrition estimates and variants.
pub struct RecipeAssistant {
    provider: Box<dyn CompletionProvider + Send + Sync>,
}

impl RecipeAssistant {
    pub fn new(provider: Box<dyn CompletionProvider + Send + Sync>) -> Self {
        Self { provider }
    }

    pub async fn model(&self) -> String {
        self.provider.get_model_info().await.unwrap_or_default()
    }

    pub async fn generate(&self, description: &str) -> Result<Recipe, AssistantError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(AssistantError::EmptyInput("describe the recipe to generate"));
        }

        let answer = self.provider.complete(&generate_prompt(description)).await?;
        let value = parse_llm_json(&answer)
            .ok_or_else(|| AssistantError::Unusable("no JSON object in the answer".to_string()))?;
        let recipe: Recipe =
            serde_json::from_value(value).map_err(|e| AssistantError::Unusable(e.to_string()))?;
        if recipe.title.trim().is_empty() {
            return Err(AssistantError::Unusable("the generated recipe has no title".to_string()));
        }

        info!("Generated recipe '{}'", recipe.title);
        Ok(recipe)
    }

    pub async fn improve_seo(&self, recipe: &Recipe) -> Result<SeoSuggestion, AssistantError> {
        let answer = self.provider.complete(&seo_prompt(recipe)).await?;
        let suggestion = parse_seo_answer(&answer);
        if suggestion == SeoSuggestion::default() {
            return Err(AssistantError::Unusable(
                "expected TITEL, UNTERTITEL and META lines".to_string(),
            ));
        }
        Ok(suggestion)
    }

    pub async fn suggest_tags(&self, recipe: &Recipe) -> Result<Vec<String>, AssistantError> {
        let answer = self.provider.complete(&tags_prompt(recipe)).await?;
        let tags = parse_tags(&answer);
        if tags.is_empty() {
            return Err(AssistantError::Unusable("no tags in the answer".to_string()));
        }
        Ok(tags)
    }

    /// Per-portion values as the model estimates them.
    pub async fn estimate_nutrition(&self, recipe: &Recipe) -> Result<Nutrition, AssistantError> {
        if recipe.all_ingredients().next().is_none() {
            return Err(AssistantError::EmptyInput("the recipe has no ingredients"));
        }
        let answer = self.provider.complete(&nutrition_prompt(recipe)).await?;
        parse_nutrition_answer(&answer)
            .ok_or_else(|| AssistantError::Unusable("no KCAL value in the answer".to_string()))
    }

    /// A new, unsaved recipe derived from `recipe`, e.g. "Glutenfrei".
    pub async fn variant(&self, recipe: &Recipe, kind: &str) -> Result<Variant, AssistantError> {
        let kind = kind.trim();
        if kind.is_empty() {
            return Err(AssistantError::EmptyInput("name the kind of variant"));
        }
        let answer = self.provider.complete(&variant_prompt(recipe, kind)).await?;
        parse_variant(recipe, &answer)
    }
}

fn ingredient_names(recipe: &Recipe) -> String {
    recipe
        .all_ingredients()
        .map(|item| item.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn ingredient_lines(recipe: &Recipe, bullet: &str) -> String {
    recipe
        .all_ingredients()
        .map(|item| format!("{}{} {} {}", bullet, item.amount, item.unit, item.name))
        .collect::<Vec<_>>()
        .join("\n")
}

fn generate_prompt(description: &str) -> String {
    format!(
        r#"Erstelle ein VOLLSTÄNDIGES veganes Rezept basierend auf dieser Beschreibung:
{description}

Gib das Rezept im folgenden JSON-Format zurück:

{{
  "title": "Rezeptname",
  "subtitle": "Kurze Beschreibung",
  "category": "Hauptgerichte",
  "preparationTime": "15 Min",
  "cookTime": "30 Min",
  "portion": 4,
  "difficulty": "Mittel",
  "ingredients": [
    {{
      "group": "Für den Hauptteil",
      "items": [
        {{"amount": "200", "unit": "g", "name": "Kichererbsen"}},
        {{"amount": "2", "unit": "EL", "name": "Olivenöl"}}
      ]
    }}
  ],
  "steps": [
    {{
      "time": "5 Min",
      "needed": [
        {{"amount": "200", "unit": "g", "name": "Kichererbsen"}}
      ],
      "substeps": ["Kichererbsen abspülen", "Mit Olivenöl glatt pürieren"]
    }}
  ],
  "tips": "Kann auch mit Tahini verfeinert werden"
}}

Regeln:
- Jeder Schritt braucht ein nicht leeres "needed"-Array mit den verwendeten Zutaten und Mengen.
- Erstelle 5 bis 8 detaillierte Schritte.
- Gib nur valides JSON zurück, keine Erklärungen und kein Markdown.
"#
    )
}

fn seo_prompt(recipe: &Recipe) -> String {
    format!(
        "Du bist SEO-Experte für vegane Rezept-Websites.\n\n\
         Aktuelles Rezept:\n\
         Titel: {}\n\
         Untertitel: {}\n\
         Kategorie: {}\n\
         Zutaten: {}\n\n\
         Aufgabe:\n\
         1. Verbessere den Titel (max 60 Zeichen, SEO-optimiert, appetitlich)\n\
         2. Verbessere den Untertitel (max 120 Zeichen, verkaufsfördernd)\n\
         3. Generiere eine Meta-Description (max 155 Zeichen, mit Keywords)\n\n\
         Format GENAU so:\n\
         TITEL: [neuer Titel]\n\
         UNTERTITEL: [neuer Untertitel]\n\
         META: [Meta-Description]",
        recipe.title,
        recipe.subtitle,
        recipe.category,
        ingredient_names(recipe)
    )
}

fn tags_prompt(recipe: &Recipe) -> String {
    format!(
        "Analysiere dieses vegane Rezept und schlage passende Tags vor.\n\n\
         Rezept: {}\n\
         Zutaten: {}\n\
         Schwierigkeit: {}\n\
         Zeit: {} + {}\n\n\
         Schlage 5-10 passende Tags vor aus diesen Kategorien:\n\
         - Zeitaufwand: schnell, mittel, zeitintensiv\n\
         - Ernährung: proteinreich, kalorienarm, glutenfrei, sojafrei, nussfrei\n\
         - Anlass: Meal-Prep, Party, Festtag, Alltag\n\
         - Stil: comfort food, healthy, herzhaft, süß\n\
         - Jahreszeit: Sommer, Winter, Herbst, Frühling\n\n\
         Format: Kommagetrennte Liste ohne Anführungszeichen.",
        recipe.title,
        ingredient_names(recipe),
        recipe.difficulty,
        recipe.preparation_time,
        recipe.cook_time
    )
}

fn nutrition_prompt(recipe: &Recipe) -> String {
    format!(
        "Schätze die Nährwerte pro Portion für dieses vegane Rezept.\n\n\
         Portionen: {}\n\
         Zutaten:\n{}\n\n\
         Berechne die Nährwerte PRO PORTION und antworte NUR mit Zahlen im Format:\n\
         KCAL: [Zahl]\n\
         PROTEIN: [Zahl]\n\
         CARBS: [Zahl]\n\
         FAT: [Zahl]\n\
         FIBER: [Zahl]",
        recipe.portion.max(1),
        ingredient_lines(recipe, "")
    )
}

fn variant_prompt(recipe: &Recipe, kind: &str) -> String {
    let steps = recipe
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step.substeps.join(" ")))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Erstelle eine {kind}-Variante von diesem veganen Rezept.\n\n\
         ORIGINAL-REZEPT:\n\
         Titel: {title}\n\
         Zutaten:\n{ingredients}\n\n\
         Zubereitung:\n{steps}\n\n\
         AUFGABE:\n\
         Erstelle eine {kind}-Version dieses Rezepts. Passe Zutaten UND Zubereitung an!\n\n\
         FORMAT (GENAU einhalten):\n\
         TITEL: [Neuer Titel inkl. '{kind}']\n\
         ZUTATEN:\n\
         - [Menge] [Einheit] [Name]\n\n\
         ZUBEREITUNG:\n\
         1. [Schritt 1]\n\
         2. [Schritt 2]\n\n\
         ÄNDERUNGEN:\n\
         - [Was wurde geändert und warum]",
        kind = kind,
        title = recipe.title,
        ingredients = ingredient_lines(recipe, "- "),
        steps = steps
    )
}

/// `"**TITEL:** Text"` and `"TITEL: Text"` both give `Some("Text")`.
fn labeled<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let line = line.trim().trim_start_matches(['*', '-', ' ']);
    let rest = line.strip_prefix(label)?;
    let rest = rest.strip_prefix(':').or_else(|| rest.strip_prefix("**:"))?;
    Some(rest.trim().trim_start_matches('*').trim())
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_seo_answer(answer: &str) -> SeoSuggestion {
    let mut suggestion = SeoSuggestion::default();
    for line in answer.lines() {
        if let Some(title) = labeled(line, "TITEL") {
            suggestion.title = non_empty(title);
        } else if let Some(subtitle) = labeled(line, "UNTERTITEL") {
            suggestion.subtitle = non_empty(subtitle);
        } else if let Some(meta) = labeled(line, "META") {
            suggestion.meta_description = non_empty(meta);
        }
    }
    suggestion
}

fn parse_tags(answer: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for raw in answer.split([',', '\n']) {
        let tag = raw
            .trim()
            .trim_start_matches(['-', '*', '•'])
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c.is_whitespace());
        if tag.is_empty() || tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            continue;
        }
        tags.push(tag.to_string());
    }
    tags.truncate(MAX_TAGS);
    tags
}

fn parse_nutrition_answer(answer: &str) -> Option<Nutrition> {
    let mut nutrition = Nutrition::default();
    let mut has_kcal = false;

    for line in answer.lines() {
        let upper = line.to_uppercase();
        let (key, rest) = match upper.split_once(':') {
            Some((key, rest)) => (key.trim().trim_matches('*').trim().to_string(), rest.to_string()),
            None => continue,
        };
        let value = match NUMBER.find(&rest) {
            Some(m) => m.as_str().replace(',', ".").parse::<f64>().ok()?.round() as i64,
            None => continue,
        };
        match key.as_str() {
            "KCAL" => {
                nutrition.kcal = value;
                has_kcal = value > 0;
            }
            "PROTEIN" => nutrition.protein = value,
            "CARBS" => nutrition.carbs = value,
            "FAT" => nutrition.fat = value,
            "FIBER" => nutrition.fiber = value,
            _ => {}
        }
    }

    has_kcal.then_some(nutrition)
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Preamble,
    Ingredients,
    Steps,
    Changes,
}

fn parse_variant(original: &Recipe, answer: &str) -> Result<Variant, AssistantError> {
    let mut title = None;
    let mut section = Section::Preamble;
    let mut ingredient_text = Vec::new();
    let mut step_text = Vec::new();
    let mut changes = Vec::new();

    for line in answer.lines() {
        if let Some(value) = labeled(line, "TITEL") {
            title = non_empty(value);
            continue;
        }
        let header = line.trim().trim_matches('*').trim_end_matches(':').trim().to_uppercase();
        match header.as_str() {
            "ZUTATEN" => section = Section::Ingredients,
            "ZUBEREITUNG" => section = Section::Steps,
            "ÄNDERUNGEN" => section = Section::Changes,
            _ => match section {
                Section::Ingredients => ingredient_text.push(line),
                Section::Steps => step_text.push(line),
                Section::Changes => {
                    let change = line.trim().trim_start_matches(['-', '*', '•']).trim();
                    if !change.is_empty() {
                        changes.push(change.to_string());
                    }
                }
                Section::Preamble => {}
            },
        }
    }

    let items: Vec<_> = ingredient_text
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .filter_map(parse_ingredient_line)
        .collect();
    let steps = parse_steps(&step_text.join("\n"));
    if items.is_empty() && steps.is_empty() {
        return Err(AssistantError::Unusable(
            "the variant has neither ingredients nor steps".to_string(),
        ));
    }

    let mut recipe = original.clone();
    recipe.title = title.unwrap_or_else(|| format!("{} (Variante)", original.title));
    if !items.is_empty() {
        let group = original
            .ingredients
            .first()
            .map(|g| g.group.clone())
            .filter(|g| !g.is_empty())
            .unwrap_or_else(|| "Basis".to_string());
        recipe.ingredients = vec![IngredientGroup { group, items }];
        // values of the original no longer match
        recipe.nutrition = None;
    }
    if !steps.is_empty() {
        recipe.steps = steps;
    }

    recipe.created_at = None;
    recipe.updated_at = None;
    recipe.version = None;
    recipe.featured_week = false;
    recipe.featured_week_text.clear();
    recipe.featured_month = false;
    recipe.featured_month_text.clear();
    recipe.featured_season = false;
    recipe.featured_season_text.clear();

    Ok(Variant { recipe, changes })
}
