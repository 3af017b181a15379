use std::env;
use std::path::PathBuf;

use crate::food::FoodConfig;
use crate::git::GitCommitter;
use crate::images::ImageLibrary;
use crate::recipe::{CatalogStore, RecipeStore, StoreOptions};
use crate::sitemap::{SitemapError, SitemapGenerator};
use crate::translate::{DeepLConfig, Language, TranslateError};

pub const DEFAULT_BASE_URL: &str = "https://vegantalia.de";
pub const DEFAULT_LANGUAGES: &str = "en,es,fr,zh,uk,ar";

/// Where the admin data lives and what happens around a save.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub admin_dir: PathBuf,
    pub site_root: PathBuf,
    pub site_base_url: String,
    pub backup_keep: usize,
    pub git_auto_commit: bool,
    pub regenerate_sitemap: bool,
    pub port: u16,
    pub deepl_api_key: Option<String>,
    pub target_languages: Vec<Language>,
    pub gemini_api_key: Option<String>,
    pub food: FoodConfig,
}

impl AdminConfig {
    /// Defaults for an admin folder inside the site, with no side effects on
    /// save.
    pub fn new(admin_dir: impl Into<PathBuf>, site_root: impl Into<PathBuf>) -> Self {
        Self {
            admin_dir: admin_dir.into(),
            site_root: site_root.into(),
            site_base_url: DEFAULT_BASE_URL.to_string(),
            backup_keep: 10,
            git_auto_commit: false,
            regenerate_sitemap: false,
            port: 3000,
            deepl_api_key: None,
            target_languages: Language::parse_list(DEFAULT_LANGUAGES),
            gemini_api_key: None,
            food: FoodConfig::default(),
        }
    }

    pub fn from_env() -> Result<Self, String> {
        let admin_dir = env::var("ADMIN_DIR").unwrap_or_else(|_| ".".to_string());
        let site_root = env::var("SITE_ROOT").unwrap_or_else(|_| "..".to_string());

        let site_base_url = env::var("SITE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        url::Url::parse(&site_base_url)
            .map_err(|e| format!("SITE_BASE_URL '{}' is not a valid URL: {}", site_base_url, e))?;

        let backup_keep = match env::var("BACKUP_KEEP") {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|_| format!("BACKUP_KEEP must be a number, got '{}'", value))?,
            Err(_) => 10,
        };
        let port = match env::var("ADMIN_PORT") {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|_| format!("ADMIN_PORT must be a port number, got '{}'", value))?,
            Err(_) => 3000,
        };

        let target_languages = Language::parse_list(
            &env::var("TARGET_LANGUAGES").unwrap_or_else(|_| DEFAULT_LANGUAGES.to_string()),
        );
        if target_languages.is_empty() {
            return Err("TARGET_LANGUAGES does not name any language".to_string());
        }

        Ok(Self {
            admin_dir: PathBuf::from(admin_dir),
            site_root: PathBuf::from(site_root),
            site_base_url,
            backup_keep,
            git_auto_commit: flag("GIT_AUTO_COMMIT", true),
            regenerate_sitemap: flag("REGENERATE_SITEMAP", true),
            port,
            deepl_api_key: non_empty("DEEPL_API_KEY"),
            target_languages,
            gemini_api_key: non_empty("GOOGLE_API_KEY").or_else(|| non_empty("GEMINI_API_KEY")),
            food: FoodConfig::from_env()?,
        })
    }

    pub fn recipes_path(&self) -> PathBuf {
        self.admin_dir.join("recipes.json")
    }

    pub fn history_dir(&self) -> PathBuf {
        self.admin_dir.join("recipes_history")
    }

    pub fn templates_path(&self) -> PathBuf {
        self.admin_dir.join("templates.json")
    }

    pub fn categories_path(&self) -> PathBuf {
        self.admin_dir.join("categories.json")
    }

    pub fn sitemap_path(&self) -> PathBuf {
        self.site_root.join("public").join("sitemap.xml")
    }

    /// Folder holding `ui-translations*.json`.
    pub fn ui_lib_dir(&self) -> PathBuf {
        self.site_root.join("src").join("lib")
    }

    pub fn git_committer(&self) -> Option<GitCommitter> {
        self.git_auto_commit.then(|| {
            GitCommitter::new(
                &self.site_root,
                vec![self.recipes_path(), self.templates_path(), self.categories_path()],
            )
        })
    }

    pub fn sitemap_generator(&self) -> Result<SitemapGenerator, SitemapError> {
        SitemapGenerator::new(&self.site_base_url, self.sitemap_path())
    }

    pub fn store_options(&self) -> Result<StoreOptions, SitemapError> {
        let sitemap = if self.regenerate_sitemap {
            Some(self.sitemap_generator()?)
        } else {
            None
        };
        Ok(StoreOptions {
            history_dir: Some(self.history_dir()),
            keep_backups: self.backup_keep,
            git: self.git_committer(),
            sitemap,
        })
    }

    pub async fn open_store(&self) -> anyhow::Result<RecipeStore> {
        let options = self.store_options()?;
        Ok(RecipeStore::open(self.recipes_path(), options).await?)
    }

    pub fn catalog(&self) -> CatalogStore {
        CatalogStore::new(self.categories_path(), self.templates_path(), self.git_committer())
    }

    pub fn image_library(&self) -> ImageLibrary {
        ImageLibrary::new(&self.site_root)
    }

    pub fn deepl_config(&self) -> Result<DeepLConfig, TranslateError> {
        self.deepl_api_key
            .as_deref()
            .map(DeepLConfig::new)
            .ok_or(TranslateError::MissingApiKey)
    }
}

fn flag(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_paths() {
        let config = AdminConfig::new("/site/admin", "/site");
        assert_eq!(config.recipes_path(), PathBuf::from("/site/admin/recipes.json"));
        assert_eq!(config.history_dir(), PathBuf::from("/site/admin/recipes_history"));
        assert_eq!(config.sitemap_path(), PathBuf::from("/site/public/sitemap.xml"));
        assert_eq!(config.ui_lib_dir(), PathBuf::from("/site/src/lib"));
        assert_eq!(config.target_languages.len(), 6);
    }

    #[test]
    fn test_side_effects_follow_flags() {
        let mut config = AdminConfig::new("/site/admin", "/site");
        let options = config.store_options().unwrap();
        assert!(options.git.is_none() && options.sitemap.is_none());
        assert_eq!(options.keep_backups, 10);

        config.git_auto_commit = true;
        config.regenerate_sitemap = true;
        let options = config.store_options().unwrap();
        assert!(options.git.is_some() && options.sitemap.is_some());

        config.site_base_url = "kein url".to_string();
        assert!(config.store_options().is_err());
    }

    #[test]
    fn test_deepl_config_requires_key() {
        let mut config = AdminConfig::new(".", "..");
        assert!(matches!(config.deepl_config(), Err(TranslateError::MissingApiKey)));
        config.deepl_api_key = Some("abc:fx".to_string());
        assert!(config.deepl_config().unwrap().is_free());
    }
}
