use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::recipe::templates::detect_template;
use crate::recipe::{Ingredient, IngredientGroup, Recipe, Step, Tips};

lazy_static! {
    static ref FENCED_JSON: Regex = Regex::new(r"```json\s*(\{[\s\S]*?\})\s*```").unwrap();
    static ref BRACED_JSON: Regex = Regex::new(r"(\{[\s\S]*\})").unwrap();

    static ref TITLE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)rezept[:\s]+([^\n.]+)").unwrap(),
        Regex::new(r"(?i)([^\n.]+)\s*rezept").unwrap(),
        Regex::new(r"(?i)^([^\n.]+)\s*(?:zutaten|zubereitung)").unwrap(),
    ];
    static ref PREPARATION_TIME: Vec<Regex> = vec![
        Regex::new(r"(?i)vorbereit\w+\s*(?:zeit)?[:;\s]*(\d+[\s-]*(?:min|minute|stunde|std|h))").unwrap(),
        Regex::new(r"(?i)prep\s*time\s*[:;\s]*(\d+[\s-]*(?:min|minute|hour|h))").unwrap(),
    ];
    static ref COOK_TIME: Vec<Regex> = vec![
        Regex::new(r"(?i)(?:koch|back|gar)\w*\s*(?:zeit)?[:;\s]*(\d+[\s-]*(?:min|minute|stunde|std|h))").unwrap(),
        Regex::new(r"(?i)cook\s*time\s*[:;\s]*(\d+[\s-]*(?:min|minute|hour|h))").unwrap(),
    ];
    static ref INGREDIENTS_HEADER: Regex =
        Regex::new(r"(?i)(?:^|\n)\s*(?:zutaten|ingredients)[:;\s]*\n").unwrap();
    static ref STEPS_HEADER: Regex =
        Regex::new(r"(?i)(?:^|\n)\s*(?:zubereitung|anleitung|steps|instructions)[:;\s]*\n").unwrap();
    static ref INGREDIENT_LINE: Regex =
        Regex::new(r"^\s*(?:[-•*]\s*)?(\d+[\d.,/]*(?:\s+\d+/\d+)?)?\s*(.+)$").unwrap();
    static ref STEP_NUMBER: Regex = Regex::new(r"\d+\.").unwrap();
}

/// Units recognised as the first word after an amount.
const KNOWN_UNITS: &[&str] = &[
    "g", "gr", "gramm", "kg", "mg", "ml", "l", "cl", "dl", "el", "tl", "msp", "prise", "prisen",
    "stück", "stk", "st", "dose", "dosen", "glas", "packung", "pck", "bund", "scheibe",
    "scheiben", "würfel", "tasse", "tassen", "becher", "handvoll", "zehe", "zehen", "stange",
    "stangen", "knolle", "kopf", "blatt", "cup", "cups", "tbsp", "tsp", "oz", "lb",
];

const DEFAULT_STEP_TIME: &str = "10 Min";

/// Model answers come as bare JSON, as a fenced ```json block, or with
/// prose around the object.
pub fn parse_llm_json(answer: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(answer.trim()) {
        return Some(value);
    }
    if let Some(value) = FENCED_JSON
        .captures(answer)
        .and_then(|c| serde_json::from_str(&c[1]).ok())
    {
        return Some(value);
    }
    BRACED_JSON
        .captures(answer)
        .and_then(|c| serde_json::from_str(&c[1]).ok())
}

/// Best-effort recipe from unstructured German (or English) text. Missing
/// fields come from the template of the detected category.
pub fn extract_with_regex(text: &str) -> Recipe {
    let template = detect_template(text);

    let title = TITLE_PATTERNS
        .iter()
        .find_map(|re| re.captures(text))
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();

    let find_time = |patterns: &[Regex]| {
        patterns
            .iter()
            .find_map(|re| re.captures(text))
            .map(|c| c[1].trim().to_string())
    };

    let ingredients_section = INGREDIENTS_HEADER
        .find(text)
        .map(|m| text[m.end()..].split("\n\n").next().unwrap_or_default())
        .unwrap_or_default();
    let steps_section = STEPS_HEADER
        .find(text)
        .map(|m| &text[m.end()..])
        .unwrap_or_default();

    let mut ingredients = parse_ingredients(ingredients_section);
    if ingredients.is_empty() {
        ingredients.push(IngredientGroup {
            group: "Basis".to_string(),
            items: Vec::new(),
        });
    }

    let mut steps = parse_steps(steps_section);
    if steps.is_empty() {
        steps = template.base_steps();
    }

    Recipe {
        title,
        category: template.category.to_string(),
        preparation_time: find_time(&PREPARATION_TIME).unwrap_or_else(|| template.preparation_time.to_string()),
        cook_time: find_time(&COOK_TIME).unwrap_or_else(|| template.cook_time.to_string()),
        portion: template.portion,
        difficulty: template.difficulty.to_string(),
        ingredients,
        steps,
        tips: Tips::Text(String::new()),
        ..Default::default()
    }
}

fn parse_ingredients(section: &str) -> Vec<IngredientGroup> {
    let mut groups = Vec::new();
    let mut current = IngredientGroup {
        group: "Basis".to_string(),
        items: Vec::new(),
    };

    for line in section.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.contains(':') || is_upper(line) {
            let finished = std::mem::replace(
                &mut current,
                IngredientGroup {
                    group: line.trim_end_matches(':').trim().to_string(),
                    items: Vec::new(),
                },
            );
            if !finished.items.is_empty() {
                groups.push(finished);
            }
            continue;
        }

        if let Some(item) = parse_ingredient_line(line) {
            current.items.push(item);
        }
    }

    if !current.items.is_empty() {
        groups.push(current);
    }
    groups
}

/// `"200 g Linsen"`, `"- 2 Zwiebeln"`, `"1 1/2 EL Öl"`, `"Salz"`.
pub fn parse_ingredient_line(line: &str) -> Option<Ingredient> {
    let caps = INGREDIENT_LINE.captures(line)?;
    let amount = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
    let rest = caps.get(2)?.as_str().trim();

    if amount.is_empty() {
        return Some(Ingredient::new("", "", rest));
    }

    let (first, remainder) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let is_unit = KNOWN_UNITS.contains(&first.trim_end_matches('.').to_lowercase().as_str());
    if is_unit && !remainder.trim().is_empty() {
        Some(Ingredient::new(amount, first.trim_end_matches('.'), remainder.trim()))
    } else {
        Some(Ingredient::new(amount, "", rest))
    }
}

pub(crate) fn parse_steps(section: &str) -> Vec<Step> {
    STEP_NUMBER
        .split(section)
        .filter_map(|chunk| {
            let substeps: Vec<String> = chunk
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect();
            (!substeps.is_empty()).then(|| Step {
                time: DEFAULT_STEP_TIME.to_string(),
                needed: Vec::new(),
                substeps,
            })
        })
        .collect()
}

/// At least one cased letter and no lowercase ones.
fn is_upper(line: &str) -> bool {
    let mut has_cased = false;
    for c in line.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}
