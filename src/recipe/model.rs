use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A recipe as stored in `recipes.json`.
///
/// Keys the admin does not know about are kept in `extra` so a load/save cycle
/// never drops data written by the website or older tooling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipe {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "preparationTime", default)]
    pub preparation_time: String,
    #[serde(rename = "cookTime", default)]
    pub cook_time: String,
    #[serde(default = "default_portion", deserialize_with = "lenient_u32")]
    pub portion: u32,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_published")]
    pub published: bool,

    #[serde(rename = "featuredWeek", default)]
    pub featured_week: bool,
    #[serde(rename = "featuredWeekText", default)]
    pub featured_week_text: String,
    #[serde(rename = "featuredMonth", default)]
    pub featured_month: bool,
    #[serde(rename = "featuredMonthText", default)]
    pub featured_month_text: String,
    #[serde(rename = "featuredSeason", default)]
    pub featured_season: bool,
    #[serde(rename = "featuredSeasonText", default)]
    pub featured_season_text: String,

    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub image_filename: String,
    #[serde(default)]
    pub image_url: String,

    #[serde(default)]
    pub ingredients: Vec<IngredientGroup>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub tips: Tips,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<Nutrition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,

    // Set on entries of recipes_<lang>.json only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_at: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Recipe {
    fn default() -> Self {
        Self {
            title: String::new(),
            subtitle: String::new(),
            category: String::new(),
            preparation_time: String::new(),
            cook_time: String::new(),
            portion: default_portion(),
            difficulty: String::new(),
            tags: Vec::new(),
            published: default_published(),
            featured_week: false,
            featured_week_text: String::new(),
            featured_month: false,
            featured_month_text: String::new(),
            featured_season: false,
            featured_season_text: String::new(),
            image: String::new(),
            image_filename: String::new(),
            image_url: String::new(),
            ingredients: Vec::new(),
            steps: Vec::new(),
            tips: Tips::default(),
            nutrition: None,
            created_at: None,
            updated_at: None,
            version: None,
            language: None,
            original_title: None,
            translation_source: None,
            translated_at: None,
            extra: Map::new(),
        }
    }
}

impl Recipe {
    /// Iterates every ingredient of every group.
    pub fn all_ingredients(&self) -> impl Iterator<Item = &Ingredient> {
        self.ingredients.iter().flat_map(|g| g.items.iter())
    }

    pub fn has_image(&self) -> bool {
        !self.image.is_empty() || !self.image_filename.is_empty() || !self.image_url.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IngredientGroup {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub items: Vec<Ingredient>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    /// Kept as text: "200", "1-2" and "1,5" all occur.
    #[serde(default, deserialize_with = "string_or_number")]
    pub amount: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub unit: String,
    #[serde(default)]
    pub name: String,
}

impl Ingredient {
    pub fn new(amount: &str, unit: &str, name: &str) -> Self {
        Self {
            amount: amount.to_string(),
            unit: unit.to_string(),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Step {
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub needed: Vec<Ingredient>,
    #[serde(default)]
    pub substeps: Vec<String>,
}

/// Tips are a free text in the admin form but a list in some translated files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Tips {
    Text(String),
    List(Vec<String>),
}

impl Default for Tips {
    fn default() -> Self {
        Tips::Text(String::new())
    }
}

impl Tips {
    pub fn is_blank(&self) -> bool {
        match self {
            Tips::Text(text) => text.trim().is_empty(),
            Tips::List(items) => items.iter().all(|t| t.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Nutrition {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub kcal: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub protein: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub carbs: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub fat: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub fiber: i64,
}

impl Nutrition {
    pub fn is_empty(&self) -> bool {
        self.kcal == 0 && self.protein == 0 && self.carbs == 0 && self.fat == 0 && self.fiber == 0
    }
}

/// Homepage slots a single recipe can be promoted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeaturedSlot {
    Week,
    Month,
    Season,
}

impl FeaturedSlot {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "week" => Some(FeaturedSlot::Week),
            "month" => Some(FeaturedSlot::Month),
            "season" => Some(FeaturedSlot::Season),
            _ => None,
        }
    }

    pub(crate) fn fields(self, recipe: &mut Recipe) -> (&mut bool, &mut String) {
        match self {
            FeaturedSlot::Week => (&mut recipe.featured_week, &mut recipe.featured_week_text),
            FeaturedSlot::Month => (&mut recipe.featured_month, &mut recipe.featured_month_text),
            FeaturedSlot::Season => (&mut recipe.featured_season, &mut recipe.featured_season_text),
        }
    }
}

fn default_portion() -> u32 {
    1
}

fn default_published() -> bool {
    true
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().map(|f| f as i64).unwrap_or(0),
        _ => 0,
    })
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(1.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(1.0),
        _ => 1.0,
    };
    Ok(if value >= 1.0 { value as u32 } else { 1 })
}
