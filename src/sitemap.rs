use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use log::info;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

use crate::recipe::{slugify, Recipe};

#[derive(Error, Debug)]
pub enum SitemapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid base URL '{0}': {1}")]
    InvalidBaseUrl(String, url::ParseError),
}

struct StaticPage {
    loc: &'static str,
    priority: &'static str,
    changefreq: &'static str,
}

const STATIC_PAGES: &[StaticPage] = &[
    StaticPage { loc: "/", priority: "1.0", changefreq: "daily" },
    StaticPage { loc: "/rezepte", priority: "0.9", changefreq: "daily" },
    StaticPage { loc: "/ueber-mich", priority: "0.7", changefreq: "monthly" },
    StaticPage { loc: "/kontakt", priority: "0.6", changefreq: "monthly" },
    StaticPage { loc: "/impressum", priority: "0.5", changefreq: "yearly" },
];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SitemapStats {
    pub static_pages: usize,
    pub recipes: usize,
}

impl SitemapStats {
    pub fn total(&self) -> usize {
        self.static_pages + self.recipes
    }
}

#[derive(Debug, Clone)]
pub struct SitemapGenerator {
    base_url: String,
    output: PathBuf,
}

impl SitemapGenerator {
    pub fn new(base_url: &str, output: impl Into<PathBuf>) -> Result<Self, SitemapError> {
        Url::parse(base_url).map_err(|e| SitemapError::InvalidBaseUrl(base_url.to_string(), e))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            output: output.into(),
        })
    }

    pub fn output(&self) -> &PathBuf {
        &self.output
    }

    pub fn render(&self, recipes: &[Recipe], today: NaiveDate) -> (String, SitemapStats) {
        let mut lines = vec![
            r#"<?xml version="1.0" encoding="UTF-8"?>"#.to_string(),
            r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#.to_string(),
        ];

        for page in STATIC_PAGES {
            lines.push("  <url>".to_string());
            lines.push(format!("    <loc>{}{}</loc>", escape(&self.base_url), page.loc));
            lines.push(format!("    <changefreq>{}</changefreq>", page.changefreq));
            lines.push(format!("    <priority>{}</priority>", page.priority));
            lines.push("  </url>".to_string());
        }

        let mut recipe_count = 0;
        for recipe in recipes.iter().filter(|r| !r.title.is_empty()) {
            lines.push("  <url>".to_string());
            lines.push(format!(
                "    <loc>{}/rezept/{}</loc>",
                escape(&self.base_url),
                escape(&slugify(&recipe.title))
            ));
            lines.push(format!("    <lastmod>{}</lastmod>", lastmod(recipe, today)));
            lines.push("    <changefreq>weekly</changefreq>".to_string());
            lines.push("    <priority>0.8</priority>".to_string());
            lines.push("  </url>".to_string());
            recipe_count += 1;
        }

        lines.push("</urlset>".to_string());

        let stats = SitemapStats {
            static_pages: STATIC_PAGES.len(),
            recipes: recipe_count,
        };
        (lines.join("\n"), stats)
    }

    pub async fn write(&self, recipes: &[Recipe]) -> Result<SitemapStats, SitemapError> {
        let (xml, stats) = self.render(recipes, Local::now().date_naive());
        if let Some(parent) = self.output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.output, xml).await?;
        info!(
            "Sitemap written to {} ({} static pages + {} recipes)",
            self.output.display(),
            stats.static_pages,
            stats.recipes
        );
        Ok(stats)
    }
}

fn lastmod(recipe: &Recipe, today: NaiveDate) -> String {
    recipe
        .updated_at
        .as_deref()
        .or(recipe.created_at.as_deref())
        .and_then(parse_date)
        .unwrap_or(today)
        .format("%Y-%m-%d")
        .to_string()
}

/// Accepts RFC 3339 (including a trailing `Z`), naive timestamps and bare dates.
fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
