use log::debug;
use scraper::{ElementRef, Html, Node, Selector};
use std::time::Duration;

use super::ExtractError;

const USER_AGENT: &str = "vegantalia-bot/1.0";

/// Tried in order; the first one present in the page is the content root.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "[itemtype*='Recipe']",
    ".recipe",
    "#recipe",
    ".ingredients",
    ".instructions",
    "main",
    ".content",
    "#content",
];

const STEP_CLASS_WORDS: &[&str] = &["step", "instruction", "preparation", "method"];

pub async fn fetch_url_text(url: &str, timeout: Duration) -> Result<String, ExtractError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;

    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(ExtractError::Status(response.status().as_u16()));
    }
    let html = response.text().await?;
    debug!("Fetched {} bytes from {}", html.len(), url);
    Ok(html_to_recipe_text(&html))
}

/// Reduces a page to the text blocks that matter for a recipe: title,
/// description, then ingredient and step blocks (or plain paragraphs when
/// the page has no such markup).
pub fn html_to_recipe_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines: Vec<String> = Vec::new();

    if let Some(title) = select_first(&document, "title") {
        lines.push(clean(&visible_text(title)));
    }

    let description = ["meta[name='description']", "meta[property='og:description']"]
        .iter()
        .filter_map(|s| select_first(&document, s))
        .find_map(|meta| meta.value().attr("content"));
    if let Some(description) = description {
        lines.push(clean(description));
    }

    let content = CONTENT_SELECTORS
        .iter()
        .find_map(|s| select_first(&document, s))
        .or_else(|| select_first(&document, "body"));

    if let Some(content) = content {
        let classed = |words: &[&str]| -> Vec<String> {
            content
                .descendants()
                .filter_map(ElementRef::wrap)
                .filter(|el| {
                    el.value()
                        .classes()
                        .any(|class| words.iter().any(|w| class.to_lowercase().contains(w)))
                })
                .map(|el| clean(&visible_text(el)))
                .collect()
        };

        let ingredients = classed(&["ingredient"]);
        let steps = classed(STEP_CLASS_WORDS);

        if !ingredients.is_empty() {
            lines.push("Zutaten:".to_string());
            lines.extend(ingredients.iter().cloned());
        }
        if !steps.is_empty() {
            lines.push("Zubereitung:".to_string());
            lines.extend(steps.iter().cloned());
        }

        if ingredients.is_empty() && steps.is_empty() {
            if let Ok(selector) = Selector::parse("p, li") {
                for el in content.select(&selector) {
                    let text = clean(&visible_text(el));
                    if text.chars().count() > 20 {
                        lines.push(text);
                    }
                }
            }
        }
    }

    lines
        .into_iter()
        .filter(|l| !l.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn select_first<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

/// Text of the element without anything inside `<script>` or `<style>`.
fn visible_text(element: ElementRef) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        if let Node::Text(text) = node.value() {
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .map_or(false, |e| matches!(e.name(), "script" | "style"))
            });
            if !hidden {
                out.push_str(text);
                out.push(' ');
            }
        }
    }
    out
}

fn clean(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
