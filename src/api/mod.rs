use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use validator::Validate;

use crate::assistant::{AssistantError, RecipeAssistant, SeoSuggestion, Variant};
use crate::config::AdminConfig;
use crate::extract::{fetch_url_text, Extraction, RecipeExtractor};
use crate::food::NutritionCalculator;
use crate::food::NutritionReport;
use crate::images::{image_url, EmbeddedImage, ImageError, ImageInfo, ImageLibrary};
use crate::providers::{CompletionProvider, GeminiProvider};
use crate::recipe::{
    seo_metadata, slugify, validate, BulkOutcome, CatalogStore, FeaturedSlot, IngredientGroup,
    Nutrition, Recipe, RecipeFilter, RecipeStore, SeoMetadata, StoreError, ValidationIssue,
    ValidationReport,
};
use crate::sitemap::{SitemapGenerator, SitemapStats};

mod extractors;

pub use extractors::{ApiJson, ApiPath, ApiQuery};

const UPLOAD_LIMIT: usize = 20 * 1024 * 1024;
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<RecipeStore>>,
    catalog: Arc<CatalogStore>,
    images: Arc<ImageLibrary>,
    sitemap: Arc<SitemapGenerator>,
    extractor: Arc<RecipeExtractor>,
    calculator: Arc<NutritionCalculator>,
    assistant: Option<Arc<RecipeAssistant>>,
}

impl AppState {
    pub fn new(
        store: RecipeStore,
        catalog: CatalogStore,
        images: ImageLibrary,
        sitemap: SitemapGenerator,
        extractor: RecipeExtractor,
        calculator: NutritionCalculator,
        assistant: Option<RecipeAssistant>,
    ) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            catalog: Arc::new(catalog),
            images: Arc::new(images),
            sitemap: Arc::new(sitemap),
            extractor: Arc::new(extractor),
            calculator: Arc::new(calculator),
            assistant: assistant.map(Arc::new),
        }
    }

    /// Wires everything from the environment; the model-backed extractor and
    /// the assistant are only enabled when a Gemini key is configured.
    pub async fn from_config(config: &AdminConfig) -> anyhow::Result<Self> {
        let provider: Option<Box<dyn CompletionProvider + Send + Sync>> = match &config.gemini_api_key {
            Some(key) => Some(Box::new(GeminiProvider::new(key.clone()).await?)),
            None => None,
        };

        Ok(Self::new(
            config.open_store().await?,
            config.catalog(),
            config.image_library(),
            config.sitemap_generator()?,
            RecipeExtractor::new(provider.clone()),
            NutritionCalculator::from_config(&config.food),
            provider.map(RecipeAssistant::new),
        ))
    }
}

#[derive(Serialize)]
pub struct ApiResponse {
    status: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}

type ApiError = (StatusCode, Json<ApiResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn failure(code: StatusCode, status: impl Into<String>) -> ApiError {
    (
        code,
        Json(ApiResponse {
            status: status.into(),
            details: Vec::new(),
        }),
    )
}

fn ok(status: impl Into<String>) -> Json<ApiResponse> {
    Json(ApiResponse {
        status: status.into(),
        details: Vec::new(),
    })
}

fn store_failure(e: StoreError) -> ApiError {
    match e {
        StoreError::NotFound(_) => failure(StatusCode::NOT_FOUND, e.to_string()),
        other => {
            error!("Recipe store error: {}", other);
            failure(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

fn check<T: Validate>(body: &T) -> Result<(), ApiError> {
    body.validate()
        .map_err(|e| failure(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
}

/// Blocking validation errors stop a save unless it is forced.
fn reject_invalid(recipe: &Recipe, force: bool) -> Result<ValidationReport, ApiError> {
    let report = validate(recipe);
    if report.is_valid() || force {
        return Ok(report);
    }
    Err((
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse {
            status: "Recipe is not valid".to_string(),
            details: report.errors.iter().map(|e| e.to_string()).collect(),
        }),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct SaveQuery {
    #[serde(default)]
    force: bool,
}

/// `?apply=true` stores a computed or suggested value in the recipe.
#[derive(Debug, Default, Deserialize)]
pub struct ApplyQuery {
    #[serde(default)]
    apply: bool,
}

fn one() -> u32 {
    1
}

#[derive(Deserialize, Validate)]
pub struct NutritionRequest {
    ingredients: Vec<IngredientGroup>,
    #[serde(default = "one")]
    #[validate(range(min = 1, max = 100))]
    portions: u32,
}

#[derive(Deserialize, Validate)]
pub struct FeaturedRequest {
    index: usize,
    #[serde(default)]
    #[validate(length(max = 300))]
    text: String,
}

#[derive(Deserialize, Validate)]
pub struct ExtractRequest {
    #[validate(length(min = 1, max = 100000))]
    text: Option<String>,
    #[validate(url)]
    url: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct BulkDeleteRequest {
    #[validate(length(min = 1))]
    indices: Vec<usize>,
}

#[derive(Deserialize, Validate)]
pub struct BulkCategoryRequest {
    #[validate(length(min = 1))]
    indices: Vec<usize>,
    #[validate(length(min = 1, max = 100))]
    category: String,
}

#[derive(Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 3, max = 2000))]
    description: String,
}

#[derive(Deserialize, Validate)]
pub struct VariantRequest {
    #[validate(length(min = 1, max = 100))]
    kind: String,
    /// Append the variant to the recipe list right away
    #[serde(default)]
    save: bool,
}

#[derive(Serialize)]
pub struct VariantResponse {
    /// Index of the saved variant, when `save` was set.
    index: Option<usize>,
    #[serde(flatten)]
    variant: Variant,
}

#[derive(Serialize)]
pub struct RecipeSummary {
    index: usize,
    title: String,
    category: String,
    difficulty: String,
    published: bool,
    has_image: bool,
    has_nutrition: bool,
    updated_at: Option<String>,
}

#[derive(Serialize)]
pub struct Saved {
    index: usize,
    warnings: Vec<ValidationIssue>,
}

#[derive(Serialize)]
pub struct ImagesResponse {
    files: Vec<ImageInfo>,
    embedded: Vec<EmbeddedImage>,
}

#[derive(Serialize)]
pub struct Uploaded {
    filename: String,
    url: String,
}

/// Create and configure the admin API router
pub fn create_api(state: AppState) -> Router {
    info!("Setting up admin API with permissive CORS");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_check))
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/:index",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        .route("/recipes/:index/duplicate", post(duplicate_recipe))
        .route("/recipes/:index/validate", get(validate_recipe))
        .route("/recipes/:index/seo", get(recipe_seo))
        .route("/recipes/:index/nutrition", post(recipe_nutrition))
        .route("/recipes/:index/assistant/seo", post(assistant_seo))
        .route("/recipes/:index/assistant/tags", post(assistant_tags))
        .route("/recipes/:index/assistant/nutrition", post(assistant_nutrition))
        .route("/recipes/:index/assistant/variant", post(assistant_variant))
        .route("/assistant/generate", post(assistant_generate))
        .route("/bulk/delete", post(bulk_delete))
        .route("/bulk/category", post(bulk_category))
        .route("/nutrition", post(compute_nutrition))
        .route("/featured/:slot", put(set_featured).delete(clear_featured))
        .route("/import", post(import_recipes))
        .route("/export", get(export_recipes))
        .route("/categories", get(get_categories).put(put_categories))
        .route("/templates", get(get_templates).put(put_templates))
        .route("/extract", post(extract_recipe))
        .route("/images", get(list_images))
        .route(
            "/images/:slug",
            post(upload_image).layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
        )
        .route("/sitemap", post(regenerate_sitemap))
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> Json<ApiResponse> {
    ok("Server is running and healthy")
}

async fn list_recipes(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<RecipeFilter>,
) -> Json<Vec<RecipeSummary>> {
    let store = state.store.lock().await;
    let summaries = filter
        .apply(store.recipes())
        .into_iter()
        .map(|(index, recipe)| RecipeSummary {
            index,
            title: recipe.title.clone(),
            category: recipe.category.clone(),
            difficulty: recipe.difficulty.clone(),
            published: recipe.published,
            has_image: recipe.has_image(),
            has_nutrition: recipe.nutrition.as_ref().map_or(false, |n| !n.is_empty()),
            updated_at: recipe.updated_at.clone(),
        })
        .collect();
    Json(summaries)
}

async fn create_recipe(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SaveQuery>,
    ApiJson(recipe): ApiJson<Recipe>,
) -> Result<(StatusCode, Json<Saved>), ApiError> {
    let report = reject_invalid(&recipe, query.force)?;
    let title = recipe.title.clone();
    let index = state.store.lock().await.create(recipe).await.map_err(store_failure)?;
    info!("Created recipe {} '{}'", index, title);
    Ok((
        StatusCode::CREATED,
        Json(Saved {
            index,
            warnings: report.warnings,
        }),
    ))
}

async fn get_recipe(State(state): State<AppState>, ApiPath(index): ApiPath<usize>) -> ApiResult<Recipe> {
    let store = state.store.lock().await;
    store.get(index).cloned().map(Json).map_err(store_failure)
}

async fn update_recipe(
    State(state): State<AppState>,
    ApiPath(index): ApiPath<usize>,
    ApiQuery(query): ApiQuery<SaveQuery>,
    ApiJson(recipe): ApiJson<Recipe>,
) -> ApiResult<Saved> {
    let report = reject_invalid(&recipe, query.force)?;
    state
        .store
        .lock()
        .await
        .update(index, recipe)
        .await
        .map_err(store_failure)?;
    Ok(Json(Saved {
        index,
        warnings: report.warnings,
    }))
}

async fn delete_recipe(State(state): State<AppState>, ApiPath(index): ApiPath<usize>) -> ApiResult<ApiResponse> {
    let removed = state.store.lock().await.delete(index).await.map_err(store_failure)?;
    info!("Deleted recipe '{}'", removed.title);
    Ok(ok(format!("Deleted '{}'", removed.title)))
}

async fn duplicate_recipe(
    State(state): State<AppState>,
    ApiPath(index): ApiPath<usize>,
) -> Result<(StatusCode, Json<Saved>), ApiError> {
    let copy = state.store.lock().await.duplicate(index).await.map_err(store_failure)?;
    Ok((
        StatusCode::CREATED,
        Json(Saved {
            index: copy,
            warnings: Vec::new(),
        }),
    ))
}

async fn validate_recipe(
    State(state): State<AppState>,
    ApiPath(index): ApiPath<usize>,
) -> ApiResult<ValidationReport> {
    let store = state.store.lock().await;
    store.get(index).map(|r| Json(validate(r))).map_err(store_failure)
}

async fn recipe_seo(State(state): State<AppState>, ApiPath(index): ApiPath<usize>) -> ApiResult<SeoMetadata> {
    let store = state.store.lock().await;
    store.get(index).map(|r| Json(seo_metadata(r))).map_err(store_failure)
}

async fn recipe_nutrition(
    State(state): State<AppState>,
    ApiPath(index): ApiPath<usize>,
    ApiQuery(query): ApiQuery<ApplyQuery>,
) -> ApiResult<NutritionReport> {
    let (ingredients, portions) = {
        let store = state.store.lock().await;
        let recipe = store.get(index).map_err(store_failure)?;
        (recipe.ingredients.clone(), recipe.portion.max(1))
    };

    // lookups can take a while, so the store is not held meanwhile
    let report = state.calculator.compute(&ingredients, portions).await;

    if query.apply {
        state
            .store
            .lock()
            .await
            .set_nutrition(index, report.per_portion)
            .await
            .map_err(store_failure)?;
    }
    Ok(Json(report))
}

async fn compute_nutrition(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<NutritionRequest>,
) -> ApiResult<NutritionReport> {
    check(&request)?;
    Ok(Json(state.calculator.compute(&request.ingredients, request.portions).await))
}

fn parse_slot(slot: &str) -> Result<FeaturedSlot, ApiError> {
    FeaturedSlot::parse(slot).ok_or_else(|| {
        failure(
            StatusCode::BAD_REQUEST,
            format!("Unknown featured slot '{}', use week, month or season", slot),
        )
    })
}

async fn set_featured(
    State(state): State<AppState>,
    ApiPath(slot): ApiPath<String>,
    ApiJson(request): ApiJson<FeaturedRequest>,
) -> ApiResult<ApiResponse> {
    check(&request)?;
    let slot = parse_slot(&slot)?;
    state
        .store
        .lock()
        .await
        .set_featured(slot, request.index, &request.text)
        .await
        .map_err(store_failure)?;
    Ok(ok(format!("Recipe {} is now featured", request.index)))
}

async fn clear_featured(State(state): State<AppState>, ApiPath(slot): ApiPath<String>) -> ApiResult<ApiResponse> {
    let slot = parse_slot(&slot)?;
    state
        .store
        .lock()
        .await
        .clear_featured(slot)
        .await
        .map_err(store_failure)?;
    Ok(ok("Featured slot cleared"))
}

async fn import_recipes(
    State(state): State<AppState>,
    ApiJson(recipes): ApiJson<Vec<Recipe>>,
) -> ApiResult<ApiResponse> {
    let count = recipes.len();
    state.store.lock().await.import(recipes).await.map_err(store_failure)?;
    Ok(ok(format!("Imported {} recipes", count)))
}

async fn export_recipes(State(state): State<AppState>) -> Json<Vec<Recipe>> {
    Json(state.store.lock().await.recipes().to_vec())
}

async fn get_categories(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.catalog.categories().await)
}

async fn put_categories(
    State(state): State<AppState>,
    ApiJson(categories): ApiJson<Vec<String>>,
) -> ApiResult<ApiResponse> {
    state.catalog.save_categories(&categories).await.map_err(store_failure)?;
    Ok(ok(format!("Saved {} categories", categories.len())))
}

async fn get_templates(State(state): State<AppState>) -> Json<Vec<Value>> {
    Json(state.catalog.templates().await)
}

async fn put_templates(
    State(state): State<AppState>,
    ApiJson(templates): ApiJson<Vec<Value>>,
) -> ApiResult<ApiResponse> {
    state.catalog.save_templates(&templates).await.map_err(store_failure)?;
    Ok(ok(format!("Saved {} templates", templates.len())))
}

async fn extract_recipe(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ExtractRequest>,
) -> ApiResult<Extraction> {
    check(&request)?;
    let text = match (&request.url, &request.text) {
        (Some(url), _) => fetch_url_text(url, FETCH_TIMEOUT).await.map_err(|e| {
            warn!("Could not fetch {}: {}", url, e);
            failure(StatusCode::BAD_GATEWAY, format!("Could not fetch {}: {}", url, e))
        })?,
        (None, Some(text)) => text.clone(),
        (None, None) => return Err(failure(StatusCode::BAD_REQUEST, "Provide either text or url")),
    };

    state
        .extractor
        .extract(&text)
        .await
        .map(Json)
        .ok_or_else(|| failure(StatusCode::UNPROCESSABLE_ENTITY, "Not enough text to extract a recipe"))
}

async fn list_images(State(state): State<AppState>) -> ApiResult<ImagesResponse> {
    let files = state.images.list().await.map_err(|e| {
        error!("Listing images failed: {}", e);
        failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    let embedded = ImageLibrary::embedded_images(state.store.lock().await.recipes());
    Ok(Json(ImagesResponse { files, embedded }))
}

async fn upload_image(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Uploaded>), ApiError> {
    let slug = slugify(&slug);
    if slug.is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, "Image name is empty"));
    }
    if body.is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, "No image data received"));
    }

    let filename = state
        .images
        .save_upload(body.to_vec(), &slug)
        .await
        .map_err(|e| match e {
            ImageError::Image(_) => failure(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            other => {
                error!("Saving image failed: {}", other);
                failure(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        })?;

    Ok((
        StatusCode::CREATED,
        Json(Uploaded {
            url: image_url(&filename),
            filename,
        }),
    ))
}

async fn regenerate_sitemap(State(state): State<AppState>) -> ApiResult<SitemapStats> {
    let recipes = state.store.lock().await.recipes().to_vec();
    state.sitemap.write(&recipes).await.map(Json).map_err(|e| {
        error!("Sitemap generation failed: {}", e);
        failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

async fn bulk_delete(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BulkDeleteRequest>,
) -> ApiResult<BulkOutcome> {
    check(&request)?;
    let outcome = state
        .store
        .lock()
        .await
        .bulk_delete(&request.indices)
        .await
        .map_err(store_failure)?;
    if !outcome.invalid.is_empty() {
        warn!("Bulk delete skipped unknown indices {:?}", outcome.invalid);
    }
    Ok(Json(outcome))
}

async fn bulk_category(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BulkCategoryRequest>,
) -> ApiResult<BulkOutcome> {
    check(&request)?;
    let outcome = state
        .store
        .lock()
        .await
        .bulk_set_category(&request.indices, request.category.trim())
        .await
        .map_err(store_failure)?;
    Ok(Json(outcome))
}

fn assistant(state: &AppState) -> Result<Arc<RecipeAssistant>, ApiError> {
    state.assistant.clone().ok_or_else(|| {
        failure(
            StatusCode::SERVICE_UNAVAILABLE,
            "The assistant needs GOOGLE_API_KEY or GEMINI_API_KEY",
        )
    })
}

fn assistant_failure(e: AssistantError) -> ApiError {
    match e {
        AssistantError::EmptyInput(_) => failure(StatusCode::BAD_REQUEST, e.to_string()),
        other => {
            warn!("Assistant failed: {}", other);
            failure(StatusCode::BAD_GATEWAY, other.to_string())
        }
    }
}

async fn recipe_at(state: &AppState, index: usize) -> Result<Recipe, ApiError> {
    state.store.lock().await.get(index).cloned().map_err(store_failure)
}

async fn assistant_generate(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerateRequest>,
) -> ApiResult<Recipe> {
    check(&request)?;
    let assistant = assistant(&state)?;
    let recipe = assistant
        .generate(&request.description)
        .await
        .map_err(assistant_failure)?;
    Ok(Json(recipe))
}

async fn assistant_seo(
    State(state): State<AppState>,
    ApiPath(index): ApiPath<usize>,
    ApiQuery(query): ApiQuery<ApplyQuery>,
) -> ApiResult<SeoSuggestion> {
    let assistant = assistant(&state)?;
    let recipe = recipe_at(&state, index).await?;
    let suggestion = assistant.improve_seo(&recipe).await.map_err(assistant_failure)?;

    if query.apply {
        let mut store = state.store.lock().await;
        let mut current = store.get(index).cloned().map_err(store_failure)?;
        suggestion.apply_to(&mut current);
        store.update(index, current).await.map_err(store_failure)?;
    }
    Ok(Json(suggestion))
}

async fn assistant_tags(
    State(state): State<AppState>,
    ApiPath(index): ApiPath<usize>,
    ApiQuery(query): ApiQuery<ApplyQuery>,
) -> ApiResult<Vec<String>> {
    let assistant = assistant(&state)?;
    let recipe = recipe_at(&state, index).await?;
    let tags = assistant.suggest_tags(&recipe).await.map_err(assistant_failure)?;

    if query.apply {
        let mut store = state.store.lock().await;
        let mut current = store.get(index).cloned().map_err(store_failure)?;
        for tag in &tags {
            if !current.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                current.tags.push(tag.clone());
            }
        }
        store.update(index, current).await.map_err(store_failure)?;
    }
    Ok(Json(tags))
}

async fn assistant_nutrition(
    State(state): State<AppState>,
    ApiPath(index): ApiPath<usize>,
    ApiQuery(query): ApiQuery<ApplyQuery>,
) -> ApiResult<Nutrition> {
    let assistant = assistant(&state)?;
    let recipe = recipe_at(&state, index).await?;
    let nutrition = assistant
        .estimate_nutrition(&recipe)
        .await
        .map_err(assistant_failure)?;

    if query.apply {
        state
            .store
            .lock()
            .await
            .set_nutrition(index, nutrition)
            .await
            .map_err(store_failure)?;
    }
    Ok(Json(nutrition))
}

async fn assistant_variant(
    State(state): State<AppState>,
    ApiPath(index): ApiPath<usize>,
    ApiJson(request): ApiJson<VariantRequest>,
) -> Result<(StatusCode, Json<VariantResponse>), ApiError> {
    check(&request)?;
    let assistant = assistant(&state)?;
    let recipe = recipe_at(&state, index).await?;
    let variant = assistant
        .variant(&recipe, &request.kind)
        .await
        .map_err(assistant_failure)?;

    if !request.save {
        return Ok((StatusCode::OK, Json(VariantResponse { index: None, variant })));
    }
    let saved = state
        .store
        .lock()
        .await
        .create(variant.recipe.clone())
        .await
        .map_err(store_failure)?;
    info!("Saved variant '{}' as recipe {}", variant.recipe.title, saved);
    Ok((
        StatusCode::CREATED,
        Json(VariantResponse {
            index: Some(saved),
            variant,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::json;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::providers::testing::ScriptedProvider;
    use crate::recipe::StoreOptions;

    async fn app(dir: &TempDir) -> Router {
        app_with_assistant(dir, None).await
    }

    async fn app_with_assistant(dir: &TempDir, provider: Option<ScriptedProvider>) -> Router {
        let root = dir.path();
        let store = RecipeStore::open(root.join("recipes.json"), StoreOptions::default())
            .await
            .unwrap();
        let state = AppState::new(
            store,
            CatalogStore::new(root.join("categories.json"), root.join("templates.json"), None),
            ImageLibrary::new(root),
            SitemapGenerator::new("https://example.org", root.join("public/sitemap.xml")).unwrap(),
            RecipeExtractor::new(None),
            NutritionCalculator::offline(),
            provider.map(|p| RecipeAssistant::new(p.boxed())),
        );
        create_api(state)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn dal() -> Value {
        json!({
            "title": "Linsen-Dal",
            "category": "Hauptgerichte",
            "portion": 2,
            "ingredients": [{"group": "Basis", "items": [{"amount": "200", "unit": "g", "name": "Linsen"}]}],
            "steps": [{"time": "20 Min", "needed": [], "substeps": ["Linsen kochen"]}]
        })
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = call(&app(&dir).await, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "Server is running and healthy");
    }

    #[tokio::test]
    async fn test_recipe_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;

        let (status, body) = call(&app, "POST", "/recipes", Some(json!({"title": ""}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!body["details"].as_array().unwrap().is_empty());

        let (status, body) = call(&app, "POST", "/recipes", Some(dal())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["index"], 0);

        let (status, _) = call(&app, "POST", "/recipes?force=true", Some(json!({"title": ""}))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, body) = call(&app, "GET", "/recipes?search=linsen", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["title"], "Linsen-Dal");

        let (status, body) = call(&app, "GET", "/recipes/0", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], 1);

        let mut changed = dal();
        changed["subtitle"] = json!("Cremig");
        let (status, _) = call(&app, "PUT", "/recipes/0", Some(changed)).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = call(&app, "GET", "/recipes/0", None).await;
        assert_eq!(body["version"], 2);

        let (status, body) = call(&app, "POST", "/recipes/0/duplicate", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["index"], 2);

        let (status, _) = call(&app, "DELETE", "/recipes/1", None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = call(&app, "GET", "/export", None).await;
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (status, body) = call(&app, "GET", "/recipes/9", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["status"].as_str().unwrap().contains("9"));
    }

    #[tokio::test]
    async fn test_validate_and_seo() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;
        call(&app, "POST", "/recipes", Some(dal())).await;

        let (_, body) = call(&app, "GET", "/recipes/0/validate", None).await;
        assert!(body["errors"].as_array().unwrap().is_empty());
        assert!(body["warnings"].as_array().unwrap().contains(&json!("no_image")));

        let (_, body) = call(&app, "GET", "/recipes/0/seo", None).await;
        assert_eq!(body["schema_org"]["@type"], "Recipe");
    }

    #[tokio::test]
    async fn test_nutrition_apply() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;
        call(&app, "POST", "/recipes", Some(dal())).await;

        let (status, body) = call(&app, "POST", "/recipes/0/nutrition", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["total"]["kcal"].as_i64().unwrap() > 0);
        let (_, recipe) = call(&app, "GET", "/recipes/0", None).await;
        assert!(recipe["nutrition"].is_null());

        let (_, body) = call(&app, "POST", "/recipes/0/nutrition?apply=true", None).await;
        let (_, recipe) = call(&app, "GET", "/recipes/0", None).await;
        assert_eq!(recipe["nutrition"]["kcal"], body["per_portion"]["kcal"]);

        let (status, _) = call(
            &app,
            "POST",
            "/nutrition",
            Some(json!({"ingredients": [], "portions": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_featured_slots() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;
        call(&app, "POST", "/recipes", Some(dal())).await;

        let (status, _) = call(&app, "PUT", "/featured/week", Some(json!({"index": 0, "text": "Lecker"}))).await;
        assert_eq!(status, StatusCode::OK);
        let (_, recipe) = call(&app, "GET", "/recipes/0", None).await;
        assert_eq!(recipe["featuredWeek"], true);

        let (status, _) = call(&app, "DELETE", "/featured/year", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, "DELETE", "/featured/week", None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, recipe) = call(&app, "GET", "/recipes/0", None).await;
        assert_eq!(recipe["featuredWeek"], false);
    }

    #[tokio::test]
    async fn test_catalog_and_import() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;

        let (_, body) = call(&app, "GET", "/categories", None).await;
        assert!(body.as_array().unwrap().contains(&json!("Hauptgerichte")));
        call(&app, "PUT", "/categories", Some(json!(["Suppen"]))).await;
        let (_, body) = call(&app, "GET", "/categories", None).await;
        assert_eq!(body, json!(["Suppen"]));

        call(&app, "PUT", "/templates", Some(json!([{"name": "Bowl"}]))).await;
        let (_, body) = call(&app, "GET", "/templates", None).await;
        assert_eq!(body[0]["name"], "Bowl");

        let (status, _) = call(&app, "POST", "/import", Some(json!([dal(), dal()]))).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = call(&app, "GET", "/recipes", None).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_extract_and_sitemap() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;

        let text = "Rezept: Hummus\nZutaten:\n200 g Kichererbsen\n2 EL Tahin\n";
        let (status, body) = call(&app, "POST", "/extract", Some(json!({"text": text}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["method"]["kind"], "regex");
        assert_eq!(body["recipe"]["title"], "Hummus");

        let (status, _) = call(&app, "POST", "/extract", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = call(&app, "POST", "/extract", Some(json!({"url": "kein link"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        call(&app, "POST", "/recipes", Some(dal())).await;
        let (status, body) = call(&app, "POST", "/sitemap", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recipes"], 1);
        assert!(dir.path().join("public/sitemap.xml").exists());
    }

    async fn raw(app: &Router, method: &str, uri: &str, content_type: Option<&str>, body: &str) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header("content-type", content_type);
        }
        let response = app
            .clone()
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_rejected_requests_answer_with_json_status() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;

        let (status, body) = raw(&app, "POST", "/recipes", Some("application/json"), "{kein json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body["status"].as_str().unwrap().is_empty());

        let (status, body) = raw(&app, "POST", "/recipes", Some("application/json"), r#"{"title": 5}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["status"].is_string());

        let (status, body) = raw(&app, "POST", "/recipes", None, "{}").await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(body["status"].is_string());

        let (status, body) = call(&app, "GET", "/recipes/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["status"].is_string());

        let (status, body) = call(&app, "POST", "/recipes/0/nutrition?apply=vielleicht", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["status"].is_string());
    }

    #[tokio::test]
    async fn test_bulk_routes() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;
        call(&app, "POST", "/import", Some(json!([dal(), dal(), dal()]))).await;

        let (status, body) = call(
            &app,
            "POST",
            "/bulk/category",
            Some(json!({"indices": [0, 2], "category": "Suppen"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["affected"], 2);
        let (_, body) = call(&app, "GET", "/recipes?category=Suppen", None).await;
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (status, body) = call(&app, "POST", "/bulk/delete", Some(json!({"indices": [1, 2, 8]}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["affected"], 2);
        assert_eq!(body["invalid"], json!([8]));
        let (_, body) = call(&app, "GET", "/export", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, _) = call(&app, "POST", "/bulk/delete", Some(json!({"indices": []}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_assistant_needs_a_key() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;
        let (status, body) = call(
            &app,
            "POST",
            "/assistant/generate",
            Some(json!({"description": "Schnelles Curry"})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["status"].as_str().unwrap().contains("GEMINI_API_KEY"));
    }

    #[tokio::test]
    async fn test_assistant_nutrition_and_tags_apply() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::answering("KCAL: 380\nPROTEIN: 19\nCARBS: 48\nFAT: 9\nFIBER: 11");
        let app = app_with_assistant(&dir, Some(provider)).await;
        call(&app, "POST", "/recipes", Some(dal())).await;

        let (status, body) = call(&app, "POST", "/recipes/0/assistant/nutrition", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kcal"], 380);
        let (_, recipe) = call(&app, "GET", "/recipes/0", None).await;
        assert!(recipe["nutrition"].is_null());

        call(&app, "POST", "/recipes/0/assistant/nutrition?apply=true", None).await;
        let (_, recipe) = call(&app, "GET", "/recipes/0", None).await;
        assert_eq!(recipe["nutrition"]["fiber"], 11);

        let (status, _) = call(&app, "POST", "/recipes/7/assistant/nutrition", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let dir = tempfile::tempdir().unwrap();
        let app = app_with_assistant(&dir, Some(ScriptedProvider::answering("schnell, Winter"))).await;
        call(&app, "POST", "/recipes", Some(dal())).await;
        let (status, body) = call(&app, "POST", "/recipes/0/assistant/tags?apply=true", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(["schnell", "Winter"]));
        let (_, recipe) = call(&app, "GET", "/recipes/0", None).await;
        assert_eq!(recipe["tags"], json!(["schnell", "Winter"]));
    }

    #[tokio::test]
    async fn test_assistant_variant_saved() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::answering(
            "TITEL: Linsen-Dal Low-Carb\nZUTATEN:\n- 100 g Linsen\n- 300 g Blumenkohl\n\nZUBEREITUNG:\n1. Alles garen\n",
        );
        let app = app_with_assistant(&dir, Some(provider)).await;
        call(&app, "POST", "/recipes", Some(dal())).await;

        let (status, body) = call(
            &app,
            "POST",
            "/recipes/0/assistant/variant",
            Some(json!({"kind": "Low-Carb"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["index"].is_null());
        assert_eq!(body["recipe"]["title"], "Linsen-Dal Low-Carb");

        let (status, body) = call(
            &app,
            "POST",
            "/recipes/0/assistant/variant",
            Some(json!({"kind": "Low-Carb", "save": true})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["index"], 1);
        let (_, saved) = call(&app, "GET", "/recipes/1", None).await;
        assert_eq!(saved["ingredients"][0]["items"][1]["name"], "Blumenkohl");
        assert_eq!(saved["version"], 1);

        let (status, body) = call(&app, "POST", "/recipes/0/assistant/seo", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Linsen-Dal Low-Carb");
    }

    #[tokio::test]
    async fn test_image_upload() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;

        let (status, _) = call(&app, "POST", "/images/dal", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let request = Request::builder()
            .method("POST")
            .uri("/images/dal")
            .body(Body::from("kein bild"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = call(&app, "GET", "/images", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["files"].as_array().unwrap().is_empty());
    }
}
