use recipe_admin::translate::{
    DeepLClient, DeepLConfig, Language, QuotaLevel, RecipeTranslator, TranslateError, Translator,
};
use recipe_admin::Recipe;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> DeepLClient {
    DeepLClient::new(DeepLConfig::with_base_url("test-key:fx", &server.uri()))
}

fn translated(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "translations": [{"detected_source_language": "DE", "text": text}]
    }))
}

#[tokio::test]
async fn test_translate_sends_auth_and_languages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate"))
        .and(header("Authorization", "DeepL-Auth-Key test-key:fx"))
        .and(body_partial_json(json!({"target_lang": "EN", "source_lang": "DE", "text": ["Linsen"]})))
        .respond_with(translated("Lentils"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server).translate("Linsen", &Language::new("en")).await.unwrap();
    assert_eq!(result, "Lentils");
}

#[tokio::test]
async fn test_blank_text_is_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(translated("x"))
        .expect(0)
        .mount(&server)
        .await;

    assert_eq!(client(&server).translate("  ", &Language::new("fr")).await.unwrap(), "  ");
}

#[tokio::test]
async fn test_rate_limit_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/translate"))
        .respond_with(translated("Soupe"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server).translate("Suppe", &Language::new("fr")).await.unwrap();
    assert_eq!(result, "Soupe");
}

#[tokio::test]
async fn test_persistent_rate_limit_keeps_original() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let result = client(&server).translate("Suppe", &Language::new("fr")).await.unwrap();
    assert_eq!(result, "Suppe");
}

#[tokio::test]
async fn test_other_errors_keep_original() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server).translate("Suppe", &Language::new("es")).await.unwrap();
    assert_eq!(result, "Suppe");
}

#[tokio::test]
async fn test_quota_exceeded_aborts_recipe_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(456))
        .mount(&server)
        .await;

    let client = client(&server);
    let source = vec![Recipe {
        title: "Linsen-Dal".to_string(),
        ..Default::default()
    }];
    let result = RecipeTranslator::new(&client)
        .translate_all(&source, Vec::new(), &Language::new("en"))
        .await;
    assert!(matches!(result, Err(TranslateError::QuotaExceeded)));
}

#[tokio::test]
async fn test_usage_levels() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/usage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "character_count": 480000,
            "character_limit": 500000
        })))
        .mount(&server)
        .await;

    let usage = client(&server).usage().await.unwrap();
    assert_eq!(usage.available, 20000);
    assert_eq!(usage.level, QuotaLevel::Critical);
}

#[tokio::test]
async fn test_usage_defaults_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/usage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"character_count": 1000})))
        .mount(&server)
        .await;

    let usage = client(&server).usage().await.unwrap();
    assert_eq!(usage.limit, 500_000);
    assert_eq!(usage.level, QuotaLevel::Ok);
}

#[tokio::test]
async fn test_usage_rejected_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/usage"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    assert!(matches!(client(&server).usage().await, Err(TranslateError::Unauthorized)));
}
