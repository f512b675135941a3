mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::TestApp;

fn service(name: &str, price: f64) -> Value {
    json!({
        "name": name,
        "description": format!("{name} examination"),
        "price": price
    })
}

#[tokio::test]
async fn test_create_service_defaults() {
    let app = TestApp::new().await;

    let (status, created) = app.post("/api/services", service("ECG", 15000.0)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["duration_minutes"], 30);
    assert_eq!(created["is_available"], true);
    assert_eq!(created["price"], 15000.0);
}

#[tokio::test]
async fn test_service_name_unique_ignoring_case() {
    let app = TestApp::new().await;
    app.post("/api/services", service("Blood test", 5000.0)).await;

    let (status, body) = app.post("/api/services", service("BLOOD TEST", 4000.0)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "DUPLICATE_NAME");
    assert_eq!(app.count("services").await, 1);
}

#[tokio::test]
async fn test_cyrillic_service_name_unique_ignoring_case() {
    let app = TestApp::new().await;
    let (status, _) = app.post("/api/services", service("УЗИ", 12000.0)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.post("/api/services", service("узи", 11000.0)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "DUPLICATE_NAME");
    assert_eq!(app.count("services").await, 1);

    let (_, found) = app.get("/api/services?search=Узи").await;
    assert_eq!(found.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_price_and_duration_validation() {
    let app = TestApp::new().await;

    let (status, _) = app.post("/api/services", service("X-ray", -1.0)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut zero = service("X-ray", 8000.0);
    zero["duration_minutes"] = json!(0);
    let (status, _) = app.post("/api/services", zero).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, free) = app.post("/api/services", service("Consultation", 0.0)).await;
    assert_eq!(status, StatusCode::CREATED);

    let id = free["id"].as_i64().unwrap();
    let (status, _) = app
        .put(&format!("/api/services/{id}"), json!({ "price": -5.0 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .put(&format!("/api/services/{id}"), json!({ "duration_minutes": -10 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rename_service() {
    let app = TestApp::new().await;
    let (_, ecg) = app.post("/api/services", service("ECG", 15000.0)).await;
    app.post("/api/services", service("Ultrasound", 12000.0)).await;
    let id = ecg["id"].as_i64().unwrap();

    // case-only rename of the same row is allowed
    let (status, renamed) = app
        .put(&format!("/api/services/{id}"), json!({ "name": "ecg" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "ecg");
    assert_eq!(renamed["price"], 15000.0);

    let (status, _) = app
        .put(&format!("/api/services/{id}"), json!({ "name": "ultrasound" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_available_all_ignores_pagination() {
    let app = TestApp::new().await;
    for (i, name) in ["ECG", "X-ray", "Ultrasound", "CT scan"].iter().enumerate() {
        let mut body = service(name, 1000.0 * (i as f64 + 1.0));
        body["is_available"] = json!(i != 1);
        app.post("/api/services", body).await;
    }

    let (_, page) = app.get("/api/services?limit=1").await;
    assert_eq!(page.as_array().unwrap().len(), 1);

    let (status, available) = app.get("/api/services/available/all").await;
    assert_eq!(status, StatusCode::OK);
    let available = available.as_array().unwrap();
    assert_eq!(available.len(), 3);
    assert!(available.iter().all(|s| s["is_available"] == true));

    let (_, unavailable) = app.get("/api/services?is_available=false").await;
    let unavailable = unavailable.as_array().unwrap();
    assert_eq!(unavailable.len(), 1);
    assert_eq!(unavailable[0]["name"], "X-ray");

    let (_, searched) = app.get("/api/services?search=ULTRA").await;
    assert_eq!(searched.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_service() {
    let app = TestApp::new().await;
    let (_, ecg) = app.post("/api/services", service("ECG", 15000.0)).await;
    let id = ecg["id"].as_i64().unwrap();

    let (status, _) = app.delete("/api/services/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.count("services").await, 1);

    let (status, _) = app.delete(&format!("/api/services/{id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.count("services").await, 0);
}
