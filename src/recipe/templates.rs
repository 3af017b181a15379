use log::warn;
use serde_json::Value;
use std::path::PathBuf;

use super::model::Step;
use super::store::StoreError;
use crate::git::GitCommitter;

/// Built-in starting point for a category, also used to guess the category of
/// free text during extraction.
#[derive(Debug, Clone)]
pub struct CategoryTemplate {
    pub category: &'static str,
    pub preparation_time: &'static str,
    pub cook_time: &'static str,
    pub portion: u32,
    pub difficulty: &'static str,
    pub groups: &'static [&'static str],
    pub steps: &'static [(&'static str, &'static [&'static str])],
    pub keywords: &'static [&'static str],
}

impl CategoryTemplate {
    pub fn base_steps(&self) -> Vec<Step> {
        self.steps
            .iter()
            .map(|(time, substeps)| Step {
                time: time.to_string(),
                needed: Vec::new(),
                substeps: substeps.iter().map(|s| s.to_string()).collect(),
            })
            .collect()
    }
}

pub const TEMPLATES: &[CategoryTemplate] = &[
    CategoryTemplate {
        category: "Hauptgerichte",
        preparation_time: "20 Min",
        cook_time: "30 Min",
        portion: 2,
        difficulty: "Mittel",
        groups: &["Basis", "Gewürze & Zusätze"],
        steps: &[
            ("5 Min", &["Alle Zutaten vorbereiten"]),
            ("15 Min", &[]),
            ("30 Min", &["Fertig anrichten"]),
        ],
        keywords: &["kochen", "braten", "backen", "dampfgaren", "hauptspeise", "mittag", "abend"],
    },
    CategoryTemplate {
        category: "Salate",
        preparation_time: "15 Min",
        cook_time: "0 Min",
        portion: 2,
        difficulty: "Einfach",
        groups: &["Salat", "Dressing"],
        steps: &[
            ("10 Min", &["Salatzutaten vorbereiten"]),
            ("5 Min", &["Dressing zubereiten", "Alles vermengen"]),
        ],
        keywords: &["salat", "dressing", "rohkost", "frisch"],
    },
    CategoryTemplate {
        category: "Dessert",
        preparation_time: "20 Min",
        cook_time: "0 Min",
        portion: 4,
        difficulty: "Einfach",
        groups: &["Basis", "Topping"],
        steps: &[
            ("15 Min", &["Zutaten vorbereiten"]),
            ("5 Min", &["Dessert anrichten"]),
        ],
        keywords: &["dessert", "nachspeise", "süß", "süssspeise"],
    },
];

/// First template whose keywords occur in the text; main dishes otherwise.
pub fn detect_template(text: &str) -> &'static CategoryTemplate {
    let lower = text.to_lowercase();
    TEMPLATES
        .iter()
        .find(|t| t.keywords.iter().any(|kw| lower.contains(kw)))
        .unwrap_or(&TEMPLATES[0])
}

pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Hauptgerichte",
    "Vorspeisen",
    "Desserts",
    "Salate & Vorspeisen",
    "Suppen & Eintöpfe",
    "Snacks & Fingerfood",
    "Getränke",
];

/// `categories.json` and `templates.json` next to the recipes.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    categories_path: PathBuf,
    templates_path: PathBuf,
    git: Option<GitCommitter>,
}

impl CatalogStore {
    pub fn new(categories_path: PathBuf, templates_path: PathBuf, git: Option<GitCommitter>) -> Self {
        Self {
            categories_path,
            templates_path,
            git,
        }
    }

    pub async fn categories(&self) -> Vec<String> {
        let defaults = || -> Vec<String> { DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect() };
        match tokio::fs::read_to_string(&self.categories_path).await {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("{} is not a category list ({}), using defaults", self.categories_path.display(), e);
                defaults()
            }),
            Err(_) => defaults(),
        }
    }

    pub async fn save_categories(&self, categories: &[String]) -> Result<(), StoreError> {
        write_pretty(&self.categories_path, &categories).await?;
        self.commit(&format!("Admin: Kategorien aktualisiert ({} Kategorien)", categories.len()))
            .await;
        Ok(())
    }

    /// User-defined templates are free-form recipe skeletons.
    pub async fn templates(&self) -> Vec<Value> {
        match tokio::fs::read_to_string(&self.templates_path).await {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    pub async fn save_templates(&self, templates: &[Value]) -> Result<(), StoreError> {
        write_pretty(&self.templates_path, &templates).await?;
        self.commit(&format!("Admin: Vorlagen aktualisiert ({} Vorlagen)", templates.len()))
            .await;
        Ok(())
    }

    async fn commit(&self, message: &str) {
        if let Some(git) = &self.git {
            git.commit(message).await;
        }
    }
}

pub(crate) async fn write_pretty<T: serde::Serialize + ?Sized>(
    path: &std::path::Path,
    value: &T,
) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}
