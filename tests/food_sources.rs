use recipe_admin::food::api::{OpenFoodFactsClient, SwissFoodClient, UsdaClient};
use recipe_admin::food::{FoodConfig, NutritionCalculator, NutritionSource};
use recipe_admin::recipe::{Ingredient, IngredientGroup};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_swiss_lentils(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/swiss/foods"))
        .and(query_param("search", "Linsen"))
        .and(query_param("lang", "de"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 42, "names": [{"term": "Linse, rot, getrocknet"}]}
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/swiss/fooddbid/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["DB-7"])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/swiss/values"))
        .and(query_param("DBID", "DB-7"))
        .and(query_param("componentsetid", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"component": {"code": "ENER1"}, "value": "340,5"},
            {"component": {"code": "PROT"}, "value": 24.6},
            {"component": {"code": "CHO"}, "value": "48"},
            {"component": {"code": "FAT"}, "value": 1.5},
            {"component": {"code": "FIBC"}, "value": 11},
            {"component": {"code": "NA"}, "value": 5}
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_swiss_food_db_lookup() {
    let server = MockServer::start().await;
    mount_swiss_lentils(&server).await;

    let client = SwissFoodClient::new(&FoodConfig::with_base_url(&server.uri()));
    let found = client.lookup("Linsen").await.unwrap().unwrap();
    assert_eq!(found.matched_name, "Linse, rot, getrocknet");
    assert_eq!(found.source, "Swiss Food DB");
    assert_eq!(found.profile.kcal, 340.5);
    assert_eq!(found.profile.carbs, 48.0);
    assert_eq!(found.profile.fiber, 11.0);
}

#[tokio::test]
async fn test_swiss_food_db_no_hit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/swiss/foods"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = SwissFoodClient::new(&FoodConfig::with_base_url(&server.uri()));
    assert!(client.lookup("Drachenfrucht").await.unwrap().is_none());
}

#[tokio::test]
async fn test_open_food_facts_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/off/cgi/search.pl"))
        .and(query_param("search_terms", "Tofu"))
        .and(query_param("page_size", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [{
                "product_name": "Bio Tofu Natur",
                "nutriments": {
                    "energy-kcal_100g": 145,
                    "proteins_100g": 15.5,
                    "carbohydrates_100g": 1.2,
                    "fat_100g": 8.7,
                    "fiber_100g": 0.9
                }
            }]
        })))
        .mount(&server)
        .await;

    let client = OpenFoodFactsClient::new(&FoodConfig::with_base_url(&server.uri()));
    let found = client.lookup("Tofu").await.unwrap().unwrap();
    assert_eq!(found.matched_name, "Bio Tofu Natur");
    assert_eq!(found.profile.protein, 15.5);
}

#[tokio::test]
async fn test_open_food_facts_rejects_zero_energy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/off/cgi/search.pl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [{"product_name": "Wasser", "nutriments": {"energy-kcal_100g": 0}}]
        })))
        .mount(&server)
        .await;

    let client = OpenFoodFactsClient::new(&FoodConfig::with_base_url(&server.uri()));
    assert!(client.lookup("Wasser").await.unwrap().is_none());
}

#[tokio::test]
async fn test_usda_picks_best_description() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/usda/foods/search"))
        .and(query_param("query", "chickpeas cooked"))
        .and(query_param("api_key", "DEMO_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "foods": [
                {"description": "Hummus, commercial", "foodNutrients": [{"nutrientId": 1008, "value": 166}]},
                {"description": "Chickpeas, mature seeds, cooked", "foodNutrients": [
                    {"nutrientId": 1008, "value": 164},
                    {"nutrientId": 1003, "value": 8.9},
                    {"nutrientId": 1005, "value": 27.4},
                    {"nutrientId": 1004, "value": 2.6},
                    {"nutrientId": 1079, "value": 7.6}
                ]}
            ]
        })))
        .mount(&server)
        .await;

    let client = UsdaClient::new(&FoodConfig::with_base_url(&server.uri()));
    let found = client.lookup("chickpeas cooked").await.unwrap().unwrap();
    assert_eq!(found.matched_name, "Chickpeas, mature seeds, cooked");
    assert_eq!(found.profile.kcal, 164.0);
    assert_eq!(found.profile.fiber, 7.6);
}

#[tokio::test]
async fn test_calculator_walks_the_chain() {
    let server = MockServer::start().await;
    // Swiss has nothing, Open Food Facts knows the lentils
    Mock::given(method("GET"))
        .and(path("/off/cgi/search.pl"))
        .and(query_param("search_terms", "Linsen"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [{"product_name": "Rote Linsen", "nutriments": {
                "energy-kcal_100g": 350, "proteins_100g": 25, "carbohydrates_100g": 50,
                "fat_100g": 2, "fiber_100g": 11
            }}]
        })))
        .mount(&server)
        .await;

    let calculator = NutritionCalculator::from_config(&FoodConfig::with_base_url(&server.uri()));
    let groups = vec![IngredientGroup {
        group: "Basis".to_string(),
        items: vec![
            Ingredient::new("200", "g", "Linsen"),
            Ingredient::new("1", "EL", "Zimt"),
        ],
    }];

    let report = calculator.compute(&groups, 2).await;
    assert_eq!(report.lines.len(), 2);
    assert_eq!(report.lines[0].matched_name.as_deref(), Some("Rote Linsen"));
    assert_eq!(report.lines[0].added.kcal, 700);
    assert_eq!(report.total.kcal, report.lines[0].added.kcal + report.lines[1].added.kcal);
    assert_eq!(report.per_portion.kcal, report.total.kcal / 2);
}
