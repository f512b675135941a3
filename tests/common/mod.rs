#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use medical_center_api::{app, db, models::AppState};

pub struct TestApp {
    pub router: Router,
    pub pool: sqlx::SqlitePool,
}

impl TestApp {
    /// Fresh in-memory database with the schema applied. One connection, so
    /// every request sees the same database.
    pub async fn new() -> Self {
        let pool = db::connect_sqlite("sqlite::memory:", 1).await.unwrap();
        db::create_schema(&pool).await.unwrap();
        let origins = vec!["http://localhost:3000".to_string()];
        let router = app(AppState { db: pool.clone() }, &origins).unwrap();
        Self { router, pool }
    }

    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(encode_uri(uri));
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        self.dispatch(builder.body(body).unwrap()).await
    }

    /// Sends `raw` as a JSON body without checking that it parses.
    pub async fn send_raw(&self, method: &str, uri: &str, raw: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(encode_uri(uri))
            .header("content-type", "application/json")
            .body(Body::from(raw.to_string()))
            .unwrap();
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("PUT", uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send("DELETE", uri, None).await
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn create_doctor(&self, email: &str, license: &str) -> i64 {
        let (status, body) = self.post("/api/doctors", doctor_body(email, license)).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn create_patient(&self, email: &str) -> i64 {
        let (status, body) = self.post("/api/patients", patient_body(email)).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn create_appointment(&self, patient_id: i64, doctor_id: i64, days_ahead: i64) -> Value {
        let (status, body) = self
            .post(
                "/api/appointments",
                json!({
                    "patient_id": patient_id,
                    "doctor_id": doctor_id,
                    "appointment_date": in_days(days_ahead),
                    "notes": "initial consultation"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

pub fn doctor_body(email: &str, license: &str) -> Value {
    json!({
        "name": "Dr. Test",
        "specialization": "Cardiologist",
        "email": email,
        "phone": "+7 (701) 000-0000",
        "license_number": license,
        "bio": "Test doctor"
    })
}

pub fn patient_body(email: &str) -> Value {
    json!({
        "first_name": "Nurlan",
        "last_name": "Sarsembayev",
        "email": email,
        "phone": "+7 (701) 111-2222",
        "date_of_birth": "1985-03-15",
        "address": "Almaty",
        "allergies": "Penicillin"
    })
}

pub fn in_days(days: i64) -> String {
    (Utc::now() + Duration::days(days)).to_rfc3339()
}

/// Percent-encodes every non-ASCII byte so Cyrillic query values form a valid URI.
pub fn encode_uri(uri: &str) -> String {
    uri.bytes()
        .map(|b| {
            if b.is_ascii() {
                (b as char).to_string()
            } else {
                format!("%{b:02X}")
            }
        })
        .collect()
}
