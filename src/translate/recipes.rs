use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::{Language, TranslateError, Translator};
use crate::recipe::store::now_iso;
use crate::recipe::templates::write_pretty;
use crate::recipe::{Recipe, Tips};

#[derive(Debug, Clone, Default)]
pub struct TranslationOutcome {
    pub recipes: Vec<Recipe>,
    pub translated: usize,
    pub reused: usize,
}

/// `recipes_<lang>.json` inside the admin directory.
pub fn translations_path(admin_dir: &Path, lang: &Language) -> PathBuf {
    admin_dir.join(format!("recipes_{}.json", lang.code()))
}

/// Previously written translations; a missing or unreadable file counts as none.
pub async fn load_translations(path: &Path) -> Vec<Recipe> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(_) => return Vec::new(),
    };
    serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!("Ignoring unreadable translations in {}: {}", path.display(), e);
        Vec::new()
    })
}

pub async fn save_translations(path: &Path, recipes: &[Recipe]) -> Result<(), TranslateError> {
    write_pretty(path, recipes)
        .await
        .map_err(|e| TranslateError::Format(e.to_string()))
}

/// Translates the German recipe list, reusing entries that were already
/// translated for an unchanged (or barely changed) title.
pub struct RecipeTranslator<'a> {
    translator: &'a dyn Translator,
    show_progress: bool,
}

impl<'a> RecipeTranslator<'a> {
    pub fn new(translator: &'a dyn Translator) -> Self {
        Self {
            translator,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub async fn translate_all(
        &self,
        source: &[Recipe],
        existing: Vec<Recipe>,
        lang: &Language,
    ) -> Result<TranslationOutcome, TranslateError> {
        let by_title: HashMap<String, usize> = existing
            .iter()
            .enumerate()
            .map(|(idx, recipe)| {
                let original = recipe.original_title.as_deref().unwrap_or(&recipe.title);
                (original.trim().to_string(), idx)
            })
            .collect();

        let progress = if self.show_progress {
            let bar = ProgressBar::new(source.len() as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("  [{bar:30}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("█░ "),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let mut outcome = TranslationOutcome::default();
        for (idx, recipe) in source.iter().enumerate() {
            let title = recipe.title.trim();
            progress.set_message(title.chars().take(30).collect::<String>());

            let reuse = by_title
                .get(title)
                .copied()
                .or_else(|| {
                    existing.get(idx).and_then(|candidate| {
                        let old_title = candidate.original_title.as_deref().unwrap_or_default().trim();
                        titles_match(title, old_title).then_some(idx)
                    })
                });

            match reuse {
                Some(existing_idx) => {
                    let mut reused = existing[existing_idx].clone();
                    reused.original_title = Some(recipe.title.clone());
                    outcome.recipes.push(reused);
                    outcome.reused += 1;
                }
                None => {
                    outcome.recipes.push(self.translate_recipe(recipe, lang).await?);
                    outcome.translated += 1;
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        info!(
            "{}: {} recipes translated, {} reused",
            lang, outcome.translated, outcome.reused
        );
        Ok(outcome)
    }

    pub async fn translate_recipe(&self, recipe: &Recipe, lang: &Language) -> Result<Recipe, TranslateError> {
        let mut translated = recipe.clone();

        translated.title = self.text(&recipe.title, lang).await?;
        translated.subtitle = self.text(&recipe.subtitle, lang).await?;

        for group in translated.ingredients.iter_mut() {
            group.group = self.text(&group.group, lang).await?;
            for item in group.items.iter_mut() {
                item.name = self.text(&item.name, lang).await?;
            }
        }

        for step in translated.steps.iter_mut() {
            for substep in step.substeps.iter_mut() {
                *substep = self.text(substep, lang).await?;
            }
        }

        translated.tips = match &recipe.tips {
            Tips::Text(text) => Tips::Text(self.text(text, lang).await?),
            Tips::List(tips) => {
                let mut out = Vec::with_capacity(tips.len());
                for tip in tips {
                    out.push(self.text(tip, lang).await?);
                }
                Tips::List(out)
            }
        };

        translated.language = Some(lang.code().to_string());
        translated.original_title = Some(recipe.title.clone());
        translated.translation_source = Some("deepl".to_string());
        translated.translated_at = Some(now_iso());
        Ok(translated)
    }

    async fn text(&self, text: &str, lang: &Language) -> Result<String, TranslateError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }
        self.translator.translate(text, lang).await
    }
}

/// Same recipe at the same position when the lowercase character sets
/// overlap by more than 80 %, or the lengths differ by fewer than three
/// characters.
fn titles_match(title: &str, old_title: &str) -> bool {
    let title_chars: HashSet<char> = title.to_lowercase().chars().collect();
    let old_chars: HashSet<char> = old_title.to_lowercase().chars().collect();
    let all = title_chars.union(&old_chars).count();
    if all == 0 {
        return false;
    }
    let common = title_chars.intersection(&old_chars).count();
    let similarity = common as f64 / all as f64;

    let length_difference = (title.chars().count() as i64 - old_title.chars().count() as i64).abs();
    similarity > 0.8 || length_difference < 3
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::{Ingredient, IngredientGroup, Step};
    use crate::translate::testing::FakeTranslator;

    fn recipe(title: &str) -> Recipe {
        Recipe {
            title: title.to_string(),
            subtitle: "Schnell gemacht".to_string(),
            ingredients: vec![IngredientGroup {
                group: "Basis".to_string(),
                items: vec![Ingredient::new("200", "g", "Linsen")],
            }],
            steps: vec![Step {
                time: "10 Min".to_string(),
                needed: Vec::new(),
                substeps: vec!["Linsen kochen".to_string()],
            }],
            tips: Tips::List(vec!["Mit Zitrone servieren".to_string()]),
            ..Default::default()
        }
    }

    fn translated(original: &str, title: &str) -> Recipe {
        Recipe {
            title: title.to_string(),
            original_title: Some(original.to_string()),
            language: Some("en".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_titles_match() {
        assert!(titles_match("Linsensuppe", "Linsen-Suppe"));
        assert!(titles_match("Dal", "Curry"));
        assert!(!titles_match("Schokoladenkuchen", "Gurkensalat mit Dill"));
        assert!(!titles_match("", ""));
    }

    #[tokio::test]
    async fn test_translate_recipe_fields() {
        let fake = FakeTranslator::default();
        let translator = RecipeTranslator::new(&fake);
        let lang = Language::new("EN");

        let result = translator.translate_recipe(&recipe("Linsensuppe"), &lang).await.unwrap();
        assert_eq!(result.title, "[en] Linsensuppe");
        assert_eq!(result.subtitle, "[en] Schnell gemacht");
        assert_eq!(result.ingredients[0].group, "[en] Basis");
        assert_eq!(result.ingredients[0].items[0].name, "[en] Linsen");
        assert_eq!(result.ingredients[0].items[0].amount, "200");
        assert_eq!(result.steps[0].substeps[0], "[en] Linsen kochen");
        assert_eq!(result.tips, Tips::List(vec!["[en] Mit Zitrone servieren".to_string()]));
        assert_eq!(result.language.as_deref(), Some("en"));
        assert_eq!(result.original_title.as_deref(), Some("Linsensuppe"));
        assert_eq!(result.translation_source.as_deref(), Some("deepl"));
        assert!(result.translated_at.is_some());
        assert_eq!(fake.calls(), 6);
    }

    #[tokio::test]
    async fn test_incremental_reuse() {
        let fake = FakeTranslator::default();
        let translator = RecipeTranslator::new(&fake);
        let lang = Language::new("en");

        let source = vec![
            recipe("Linsensuppe"),
            recipe("Gemüsecurry!"),
            recipe("Schokoladenkuchen"),
        ];
        let existing = vec![
            translated(" Linsensuppe ", "Lentil soup"),
            translated("Gemüsecurry", "Vegetable curry"),
            translated("Gurkensalat mit Dill", "Cucumber salad"),
        ];

        let outcome = translator.translate_all(&source, existing, &lang).await.unwrap();
        assert_eq!(outcome.reused, 2);
        assert_eq!(outcome.translated, 1);
        assert_eq!(outcome.recipes[0].title, "Lentil soup");
        assert_eq!(outcome.recipes[1].title, "Vegetable curry");
        assert_eq!(outcome.recipes[1].original_title.as_deref(), Some("Gemüsecurry!"));
        assert_eq!(outcome.recipes[2].title, "[en] Schokoladenkuchen");
    }

    #[tokio::test]
    async fn test_translation_files() {
        let dir = tempfile::tempdir().unwrap();
        let lang = Language::new("fr");
        let path = translations_path(dir.path(), &lang);
        assert!(path.ends_with("recipes_fr.json"));
        assert!(load_translations(&path).await.is_empty());

        save_translations(&path, &[translated("Brot", "Pain")]).await.unwrap();
        let loaded = load_translations(&path).await;
        assert_eq!(loaded[0].title, "Pain");
    }
}
