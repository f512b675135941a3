// src/routes/patient_routes.rs

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::SqliteConnection;

use super::search_term;
use crate::{
    error::ApiError,
    extract::{AppJson, AppPath, AppQuery},
    models::{deserialize_double_option, AppState, PatientRow},
    validation,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_patients).post(create_patient))
        .route(
            "/{patient_id}",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
}

#[derive(Debug, Deserialize)]
pub struct PatientListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePatientRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub medical_history: Option<String>,
    pub allergies: Option<String>,
    pub is_active: Option<bool>, // default true
}

#[derive(Debug, Deserialize)]
pub struct UpdatePatientRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub medical_history: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub allergies: Option<Option<String>>,
    pub is_active: Option<bool>,
}

pub(crate) async fn fetch_patient(conn: &mut SqliteConnection, patient_id: i64) -> Result<PatientRow, ApiError> {
    sqlx::query_as::<_, PatientRow>(
        r#"
        SELECT id, first_name, last_name, email, phone, date_of_birth, address,
               medical_history, allergies, is_active
        FROM patients
        WHERE id = $1
        "#,
    )
    .bind(patient_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| ApiError::not_found("patient"))
}

pub async fn list_patients(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<PatientListQuery>,
) -> Result<Json<Vec<PatientRow>>, ApiError> {
    let (skip, limit) = validation::page(q.skip, q.limit)?;

    let rows: Vec<PatientRow> = sqlx::query_as::<_, PatientRow>(
        r#"
        SELECT id, first_name, last_name, email, phone, date_of_birth, address,
               medical_history, allergies, is_active
        FROM patients
        WHERE $1 IS NULL
           OR instr(first_name_lc, $1) > 0
           OR instr(last_name_lc, $1) > 0
           OR instr(email_lc, $1) > 0
        ORDER BY id ASC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(search_term(q.search.as_deref()))
    .bind(limit)
    .bind(skip)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

pub async fn get_patient(
    State(state): State<AppState>,
    AppPath(patient_id): AppPath<i64>,
) -> Result<Json<PatientRow>, ApiError> {
    let mut conn = state.db.acquire().await?;
    let row = fetch_patient(&mut conn, patient_id).await?;
    Ok(Json(row))
}

pub async fn create_patient(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreatePatientRequest>,
) -> Result<(StatusCode, Json<PatientRow>), ApiError> {
    let first_name = validation::required("first_name", &req.first_name)?;
    let last_name = validation::required("last_name", &req.last_name)?;
    let email = validation::email(&req.email)?;
    let phone = validation::required("phone", &req.phone)?;
    let address = validation::required("address", &req.address)?;

    let mut tx = state.db.begin().await?;

    validation::ensure_patient_email_free(&mut tx, &email).await?;

    let row: PatientRow = sqlx::query_as::<_, PatientRow>(
        r#"
        INSERT INTO patients (first_name, last_name, email, phone, date_of_birth, address,
                              medical_history, allergies, is_active,
                              first_name_lc, last_name_lc, email_lc)
        VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
        RETURNING id, first_name, last_name, email, phone, date_of_birth, address,
                  medical_history, allergies, is_active
        "#,
    )
    .bind(&first_name)
    .bind(&last_name)
    .bind(&email)
    .bind(phone)
    .bind(req.date_of_birth)
    .bind(address)
    .bind(req.medical_history)
    .bind(req.allergies)
    .bind(req.is_active.unwrap_or(true))
    .bind(validation::fold_case(&first_name))
    .bind(validation::fold_case(&last_name))
    .bind(validation::fold_case(&email))
    .fetch_one(&mut *tx)
    .await
    .map_err(validation::map_unique(
        "DUPLICATE_EMAIL",
        "a patient with this email already exists",
    ))?;

    tx.commit().await?;

    tracing::info!(patient_id = row.id, "patient created");
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn update_patient(
    State(state): State<AppState>,
    AppPath(patient_id): AppPath<i64>,
    AppJson(req): AppJson<UpdatePatientRequest>,
) -> Result<Json<PatientRow>, ApiError> {
    let mut tx = state.db.begin().await?;

    // Load existing
    let existing = fetch_patient(&mut tx, patient_id).await?;

    let first_name = match req.first_name.as_deref() {
        Some(s) => validation::required("first_name", s)?,
        None => existing.first_name,
    };
    let last_name = match req.last_name.as_deref() {
        Some(s) => validation::required("last_name", s)?,
        None => existing.last_name,
    };
    let phone = match req.phone.as_deref() {
        Some(s) => validation::required("phone", s)?,
        None => existing.phone,
    };
    let address = match req.address.as_deref() {
        Some(s) => validation::required("address", s)?,
        None => existing.address,
    };

    let email = match req.email.as_deref() {
        Some(e) => {
            let e = validation::email(e)?;
            if e != existing.email {
                validation::ensure_patient_email_free(&mut tx, &e).await?;
            }
            e
        }
        None => existing.email,
    };

    let date_of_birth = req.date_of_birth.unwrap_or(existing.date_of_birth);
    let medical_history = req.medical_history.unwrap_or(existing.medical_history);
    let allergies = req.allergies.unwrap_or(existing.allergies);
    let is_active = req.is_active.unwrap_or(existing.is_active);

    let updated: PatientRow = sqlx::query_as::<_, PatientRow>(
        r#"
        UPDATE patients
        SET first_name = $1,
            last_name = $2,
            email = $3,
            phone = $4,
            date_of_birth = $5,
            address = $6,
            medical_history = $7,
            allergies = $8,
            is_active = $9,
            first_name_lc = $10,
            last_name_lc = $11,
            email_lc = $12
        WHERE id = $13
        RETURNING id, first_name, last_name, email, phone, date_of_birth, address,
                  medical_history, allergies, is_active
        "#,
    )
    .bind(&first_name)
    .bind(&last_name)
    .bind(&email)
    .bind(phone)
    .bind(date_of_birth)
    .bind(address)
    .bind(medical_history)
    .bind(allergies)
    .bind(is_active)
    .bind(validation::fold_case(&first_name))
    .bind(validation::fold_case(&last_name))
    .bind(validation::fold_case(&email))
    .bind(patient_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(validation::map_unique(
        "DUPLICATE_EMAIL",
        "a patient with this email already exists",
    ))?;

    tx.commit().await?;

    tracing::info!(patient_id, "patient updated");
    Ok(Json(updated))
}

pub async fn delete_patient(
    State(state): State<AppState>,
    AppPath(patient_id): AppPath<i64>,
) -> Result<StatusCode, ApiError> {
    let mut tx = state.db.begin().await?;

    fetch_patient(&mut tx, patient_id).await?;

    let booked: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM appointments WHERE patient_id = $1")
        .bind(patient_id)
        .fetch_one(&mut *tx)
        .await?;
    if booked > 0 {
        tracing::warn!(patient_id, booked, "refusing to delete patient with appointments");
        return Err(ApiError::Conflict(
            "HAS_APPOINTMENTS",
            format!("patient still has {booked} appointment(s)"),
        ));
    }

    sqlx::query("DELETE FROM patients WHERE id = $1")
        .bind(patient_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(patient_id, "patient deleted");
    Ok(StatusCode::NO_CONTENT)
}
