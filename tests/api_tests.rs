use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use rental_recs_api::api::{create_router, AppState};
use rental_recs_api::config::Config;

fn create_test_server() -> TestServer {
    let config = Config {
        rng_seed: Some(7),
        ..Config::default()
    };
    let state = AppState::in_memory(&config);
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

async fn create_item(server: &TestServer, title: &str, year: i32) -> i64 {
    let response = server
        .post("/api/v1/items")
        .json(&json!({ "title": title, "year": year }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["id"].as_i64().unwrap()
}

async fn import_games(server: &TestServer) {
    let response = server
        .post("/api/v1/games")
        .json(&json!([
            { "title": "Mario Kart 8", "genres": ["Racing"], "user_score": 8.0, "platform": "Switch" },
            { "title": "F-Zero 99", "genres": ["Racing"], "user_score": 7.1, "platform": "Switch" },
            { "title": "Super Mario Galaxy", "genres": ["Platformer"], "user_score": 9.1, "platform": "Wii" },
            { "title": "Metroid Prime", "genres": ["Action", "Adventure"], "user_score": 9.2, "platform": "GameCube" }
        ]))
        .await;
    response.assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server();
    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("trace-me-42"),
        )
        .await;
    assert_eq!(response.header("x-request-id"), "trace-me-42");
}

#[tokio::test]
async fn test_item_lifecycle() {
    let server = create_test_server();
    let id = create_item(&server, "Alien", 1979).await;

    let response = server.get(&format!("/api/v1/items/{}", id)).await;
    response.assert_status_ok();
    let item: Value = response.json();
    assert_eq!(item["title"], "Alien");
    assert_eq!(item["derived_length"], 5);

    let response = server
        .put(&format!("/api/v1/items/{}", id))
        .json(&json!({ "title": "Alien: Romulus" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["derived_length"], 14);

    server
        .delete(&format!("/api/v1/items/{}", id))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .get(&format!("/api/v1/items/{}", id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blank_title_rejected() {
    let server = create_test_server();
    let response = server
        .post("/api/v1/items")
        .json(&json!({ "title": "  ", "year": 2000 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_list_items_with_limit() {
    let server = create_test_server();
    for (title, year) in [("Heat", 1995), ("Ronin", 1998), ("Collateral", 2004)] {
        create_item(&server, title, year).await;
    }

    let items: Vec<Value> = server.get("/api/v1/items").await.json();
    assert_eq!(items.len(), 3);

    let items: Vec<Value> = server
        .get("/api/v1/items")
        .add_query_param("limit", 2)
        .await
        .json();
    let titles: Vec<&str> = items.iter().filter_map(|i| i["title"].as_str()).collect();
    assert_eq!(titles, vec!["Heat", "Ronin"]);
}

#[tokio::test]
async fn test_build_and_query_similarity() {
    let server = create_test_server();
    let a = create_item(&server, "Alien", 1979).await;
    create_item(&server, "Aliens", 1986).await;
    create_item(&server, "Prometheus", 2012).await;

    let response = server.post("/api/v1/similarity/build").await;
    response.assert_status_ok();
    let report: Value = response.json();
    assert_eq!(report["pairs"], 3);
    assert_eq!(report["failed"], 0);

    // Year span is 33: Aliens scores 1 - 7/33, Prometheus 0
    let response = server
        .get(&format!("/api/v1/items/{}/similar", a))
        .add_query_param("min_score", 0.0)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let similar = body["similar"].as_array().unwrap();
    assert_eq!(similar.len(), 2);
    assert_eq!(similar[0]["title"], "Prometheus");
    assert_eq!(similar[1]["title"], "Aliens");

    let body: Value = server
        .get(&format!("/api/v1/items/{}/similar", a))
        .await
        .json();
    assert_eq!(body["min_score"], 0.25);
    assert_eq!(body["similar"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_similarity_rejects_out_of_range_threshold() {
    let server = create_test_server();
    let id = create_item(&server, "Alien", 1979).await;
    server
        .get(&format!("/api/v1/items/{}/similar", id))
        .add_query_param("min_score", 1.5)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_view_history_and_title_length() {
    let server = create_test_server();
    let alien = create_item(&server, "Alien", 1979).await;
    let heat = create_item(&server, "Heat", 1995).await;

    for item_id in [alien, heat] {
        server
            .post("/api/v1/users/ripley/history")
            .json(&json!({ "item_id": item_id }))
            .await
            .assert_status(StatusCode::CREATED);
    }
    server
        .post("/api/v1/users/ripley/history")
        .json(&json!({ "item_id": 999 }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let body: Value = server.get("/api/v1/users/ripley/title-length").await.json();
    assert_eq!(body["total_title_length"], 9);

    let body: Value = server.get("/api/v1/users/nobody/title-length").await.json();
    assert_eq!(body["total_title_length"], 0);
}

#[tokio::test]
async fn test_rent_and_return() {
    let server = create_test_server();
    import_games(&server).await;

    let response = server
        .post("/api/v1/users/alice/rentals")
        .json(&json!({ "title": "Mario Kart 8" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["outcome"], "rented");
    assert_eq!(body["message"], "Mario Kart 8 rented successfully");

    let response = server
        .post("/api/v1/users/bob/rentals")
        .json(&json!({ "title": "Mario Kart 8" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["outcome"], "already_rented");

    server
        .delete("/api/v1/users/bob/rentals/Mario%20Kart%208")
        .await
        .assert_status(StatusCode::CONFLICT);

    let response = server.delete("/api/v1/users/alice/rentals/Mario%20Kart%208").await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["message"],
        "Mario Kart 8 returned successfully"
    );

    server
        .post("/api/v1/users/alice/rentals")
        .json(&json!({ "title": "Missing Game" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recommendations_without_rentals() {
    let server = create_test_server();
    import_games(&server).await;

    for kind in ["genre", "name"] {
        let response = server
            .get(&format!("/api/v1/users/carol/recommendations/{}", kind))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "no_history");
        assert_eq!(body["message"], "No games rented");
    }
}

#[tokio::test]
async fn test_recommendations_after_renting() {
    let server = create_test_server();
    import_games(&server).await;
    server
        .post("/api/v1/users/alice/rentals")
        .json(&json!({ "title": "Mario Kart 8" }))
        .await
        .assert_status_ok();

    let body: Value = server
        .get("/api/v1/users/alice/recommendations/genre")
        .await
        .json();
    assert_eq!(body["status"], "titles");
    assert_eq!(body["category"], "Racing");
    assert_eq!(body["titles"], json!(["Mario Kart 8", "F-Zero 99"]));

    let body: Value = server
        .get("/api/v1/users/alice/recommendations/name")
        .await
        .json();
    assert_eq!(body["status"], "titles");
    let titles = body["titles"].as_array().unwrap();
    assert_eq!(titles.len(), 3);
    assert_eq!(titles[0], "Super Mario Galaxy");
    assert!(!titles.contains(&json!("Mario Kart 8")));
}

#[tokio::test]
async fn test_game_statistics() {
    let server = create_test_server();
    import_games(&server).await;

    let top: Vec<Value> = server
        .get("/api/v1/games/top-rated")
        .add_query_param("min_score", 9.0)
        .await
        .json();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0]["title"], "Metroid Prime");

    let body: Value = server
        .post("/api/v1/platforms/Switch/decrement")
        .await
        .json();
    assert_eq!(body["updated"], 2);

    let averages: Value = server.get("/api/v1/platforms/average-scores").await.json();
    assert_eq!(averages["Switch"], 6.55);
    assert_eq!(averages["Wii"], 9.1);

    let distribution: Value = server.get("/api/v1/genres/distribution").await.json();
    assert_eq!(distribution["Racing"], 2);
    assert_eq!(distribution["Adventure"], 1);
}

#[tokio::test]
async fn test_import_skips_duplicate_titles() {
    let server = create_test_server();
    import_games(&server).await;

    let response = server
        .post("/api/v1/games")
        .json(&json!([
            { "title": "Mario Kart 8", "user_score": 1.0, "platform": "Switch" },
            { "title": "Pikmin 4", "genres": ["Strategy"], "user_score": 8.9, "platform": "Switch" }
        ]))
        .await;
    let body: Value = response.json();
    assert_eq!(body["submitted"], 2);
    assert_eq!(body["inserted"], 1);

    let games: Vec<Value> = server.get("/api/v1/games").await.json();
    assert_eq!(games.len(), 5);
}
