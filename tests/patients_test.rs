mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{patient_body, TestApp};

#[tokio::test]
async fn test_create_patient_defaults() {
    let app = TestApp::new().await;

    let (status, created) = app.post("/api/patients", patient_body("nurlan@example.com")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["date_of_birth"], "1985-03-15");
    assert_eq!(created["is_active"], true);
    assert!(created["medical_history"].is_null());
    assert_eq!(created["allergies"], "Penicillin");
}

#[tokio::test]
async fn test_duplicate_patient_email_rejected() {
    let app = TestApp::new().await;
    app.create_patient("nurlan@example.com").await;

    let (status, body) = app.post("/api/patients", patient_body("nurlan@example.com")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "DUPLICATE_EMAIL");
    assert_eq!(app.count("patients").await, 1);
}

#[tokio::test]
async fn test_update_patient_partial_and_email_change() {
    let app = TestApp::new().await;
    let id = app.create_patient("nurlan@example.com").await;
    app.create_patient("ainara@example.com").await;

    let (status, updated) = app
        .put(
            &format!("/api/patients/{id}"),
            json!({ "address": "Astana", "is_active": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["address"], "Astana");
    assert_eq!(updated["is_active"], false);
    assert_eq!(updated["first_name"], "Nurlan");
    assert_eq!(updated["allergies"], "Penicillin");

    let (status, _) = app
        .put(&format!("/api/patients/{id}"), json!({ "email": "ainara@example.com" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, moved) = app
        .put(&format!("/api/patients/{id}"), json!({ "email": "nurlan@new.kz" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["email"], "nurlan@new.kz");
}

#[tokio::test]
async fn test_search_patients_by_name_and_email() {
    let app = TestApp::new().await;
    app.create_patient("nurlan@example.com").await;
    let mut other = patient_body("ainara@example.com");
    other["first_name"] = json!("Ainara");
    other["last_name"] = json!("Dosova");
    app.post("/api/patients", other).await;

    let (_, by_last) = app.get("/api/patients?search=dosova").await;
    assert_eq!(by_last.as_array().unwrap().len(), 1);

    let (_, by_email) = app.get("/api/patients?search=NURLAN@").await;
    let by_email = by_email.as_array().unwrap();
    assert_eq!(by_email.len(), 1);
    assert_eq!(by_email[0]["email"], "nurlan@example.com");

    let (_, none) = app.get("/api/patients?search=zzz").await;
    assert!(none.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_patients_in_cyrillic() {
    let app = TestApp::new().await;
    let mut kz = patient_body("nurlan@example.com");
    kz["first_name"] = json!("Нұрлан");
    kz["last_name"] = json!("Сәрсембаев");
    app.post("/api/patients", kz).await;
    app.create_patient("other@example.com").await;

    for term in ["Нұрлан", "нұрлан", "СӘРСЕМБАЕВ"] {
        let (_, found) = app.get(&format!("/api/patients?search={term}")).await;
        let found = found.as_array().unwrap();
        assert_eq!(found.len(), 1, "{term}");
        assert_eq!(found[0]["email"], "nurlan@example.com");
    }
}

#[tokio::test]
async fn test_delete_patient_rules() {
    let app = TestApp::new().await;
    let free = app.create_patient("free@example.com").await;
    let booked = app.create_patient("booked@example.com").await;
    let doctor = app.create_doctor("doc@x.com", "L1").await;
    app.create_appointment(booked, doctor, 1).await;

    let (status, _) = app.delete("/api/patients/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&format!("/api/patients/{booked}")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app.delete(&format!("/api/patients/{free}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.count("patients").await, 1);
}
