use std::time::Duration;

pub const SWISS_FOOD_API: &str =
    "https://api.webapp.prod.blv.foodcase-services.com/BLV_WebApp_WS/webresources/BLV-api";
pub const OPEN_FOOD_FACTS_API: &str = "https://world.openfoodfacts.org";
pub const USDA_API: &str = "https://api.nal.usda.gov/fdc/v1";

#[derive(Debug, Clone)]
pub struct FoodConfig {
    pub usda_api_key: String,
    pub timeout: Duration,
    pub swiss_base_url: String,
    pub off_base_url: String,
    pub usda_base_url: String,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            usda_api_key: "DEMO_KEY".to_string(),
            timeout: Duration::from_secs(8),
            swiss_base_url: SWISS_FOOD_API.to_string(),
            off_base_url: OPEN_FOOD_FACTS_API.to_string(),
            usda_base_url: USDA_API.to_string(),
        }
    }
}

impl FoodConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();
        let timeout = match std::env::var("FOOD_API_TIMEOUT_SECS") {
            Ok(value) => Duration::from_secs(
                value
                    .trim()
                    .parse()
                    .map_err(|_| format!("FOOD_API_TIMEOUT_SECS must be a number of seconds, got '{}'", value))?,
            ),
            Err(_) => defaults.timeout,
        };

        Ok(Self {
            usda_api_key: std::env::var("USDA_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty())
                .unwrap_or(defaults.usda_api_key),
            timeout,
            ..defaults
        })
    }

    /// Points every client at one server, used by tests.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            swiss_base_url: format!("{}/swiss", base_url),
            off_base_url: format!("{}/off", base_url),
            usda_base_url: format!("{}/usda", base_url),
            timeout: Duration::from_secs(2),
            ..Self::default()
        }
    }
}
