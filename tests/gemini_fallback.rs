use recipe_admin::extract::{ExtractionMethod, RecipeExtractor};
use recipe_admin::providers::{CompletionProvider, GeminiProvider};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn answer(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{"content": {"parts": [{"text": text}]}}]
    }))
}

#[tokio::test]
async fn test_falls_through_failing_models() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:generateContent"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash-latest:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:generateContent"))
        .and(header("X-goog-api-key", "secret"))
        .respond_with(answer("  Hallo  "))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiProvider::with_base_url("secret".to_string(), &server.uri());
    assert_eq!(provider.complete("Sag hallo").await.unwrap(), "Hallo");
    assert_eq!(provider.get_model_info().await.unwrap(), "gemini-1.5-flash");
}

#[tokio::test]
async fn test_all_models_failing_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .expect(5)
        .mount(&server)
        .await;

    let provider = GeminiProvider::with_base_url("secret".to_string(), &server.uri());
    let error = provider.complete("x").await.unwrap_err().to_string();
    assert!(error.contains("gemini-1.5-pro"));
}

#[tokio::test]
async fn test_extractor_uses_model_answer() {
    let server = MockServer::start().await;
    let recipe = json!({
        "title": "Kichererbsen-Curry",
        "category": "Hauptgerichte",
        "portion": 4,
        "ingredients": [{"group": "Curry", "items": [{"amount": "400", "unit": "g", "name": "Kichererbsen"}]}],
        "steps": [{"time": "20 Min", "needed": [], "substeps": ["Alles köcheln lassen"]}]
    });
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:generateContent"))
        .respond_with(answer(&format!("```json\n{}\n```", recipe)))
        .mount(&server)
        .await;

    let provider = GeminiProvider::with_base_url("secret".to_string(), &server.uri());
    let extractor = RecipeExtractor::new(Some(Box::new(provider)));
    let extraction = extractor
        .extract("Ein Curry mit Kichererbsen, Kokosmilch und Spinat für vier Personen.")
        .await
        .unwrap();

    assert_eq!(extraction.method, ExtractionMethod::Llm("gemini-2.0-flash".to_string()));
    assert_eq!(extraction.recipe.title, "Kichererbsen-Curry");
    assert_eq!(extraction.recipe.portion, 4);
}
