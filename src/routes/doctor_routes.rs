// src/routes/doctor_routes.rs

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use sqlx::SqliteConnection;

use super::search_term;
use crate::{
    error::ApiError,
    extract::{AppJson, AppPath, AppQuery},
    models::{deserialize_double_option, AppState, DoctorRow},
    validation,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_doctors).post(create_doctor))
        .route("/specialization/list", get(list_specializations))
        .route(
            "/{doctor_id}",
            get(get_doctor).put(update_doctor).delete(delete_doctor),
        )
}

#[derive(Debug, Deserialize)]
pub struct DoctorListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub specialization: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDoctorRequest {
    pub name: String,
    pub specialization: String,
    pub email: String,
    pub phone: String,
    pub license_number: String,
    pub bio: Option<String>,
    pub is_active: Option<bool>, // default true
}

#[derive(Debug, Deserialize)]
pub struct UpdateDoctorRequest {
    pub name: Option<String>,
    pub specialization: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub bio: Option<Option<String>>,
    pub is_active: Option<bool>,
}

pub(crate) async fn fetch_doctor(conn: &mut SqliteConnection, doctor_id: i64) -> Result<DoctorRow, ApiError> {
    sqlx::query_as::<_, DoctorRow>(
        r#"
        SELECT id, name, specialization, email, phone, license_number, bio, is_active
        FROM doctors
        WHERE id = $1
        "#,
    )
    .bind(doctor_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| ApiError::not_found("doctor"))
}

pub async fn list_doctors(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<DoctorListQuery>,
) -> Result<Json<Vec<DoctorRow>>, ApiError> {
    let (skip, limit) = validation::page(q.skip, q.limit)?;

    let rows: Vec<DoctorRow> = sqlx::query_as::<_, DoctorRow>(
        r#"
        SELECT id, name, specialization, email, phone, license_number, bio, is_active
        FROM doctors
        WHERE ($1 IS NULL OR instr(name_lc, $1) > 0 OR instr(email_lc, $1) > 0)
          AND ($2 IS NULL OR instr(specialization_lc, $2) > 0)
        ORDER BY id ASC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(search_term(q.search.as_deref()))
    .bind(search_term(q.specialization.as_deref()))
    .bind(limit)
    .bind(skip)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

pub async fn list_specializations(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    let specializations: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT DISTINCT specialization
        FROM doctors
        WHERE specialization IS NOT NULL AND specialization <> ''
        ORDER BY specialization ASC
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(specializations))
}

pub async fn get_doctor(
    State(state): State<AppState>,
    AppPath(doctor_id): AppPath<i64>,
) -> Result<Json<DoctorRow>, ApiError> {
    let mut conn = state.db.acquire().await?;
    let row = fetch_doctor(&mut conn, doctor_id).await?;
    Ok(Json(row))
}

pub async fn create_doctor(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<DoctorRow>), ApiError> {
    let name = validation::required("name", &req.name)?;
    let specialization = validation::required("specialization", &req.specialization)?;
    let email = validation::email(&req.email)?;
    let phone = validation::required("phone", &req.phone)?;
    let license_number = validation::required("license_number", &req.license_number)?;

    let mut tx = state.db.begin().await?;

    validation::ensure_doctor_email_free(&mut tx, &email).await?;
    validation::ensure_license_free(&mut tx, &license_number).await?;

    let row: DoctorRow = sqlx::query_as::<_, DoctorRow>(
        r#"
        INSERT INTO doctors (name, specialization, email, phone, license_number, bio, is_active,
                             name_lc, specialization_lc, email_lc)
        VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
        RETURNING id, name, specialization, email, phone, license_number, bio, is_active
        "#,
    )
    .bind(&name)
    .bind(&specialization)
    .bind(&email)
    .bind(phone)
    .bind(license_number)
    .bind(req.bio)
    .bind(req.is_active.unwrap_or(true))
    .bind(validation::fold_case(&name))
    .bind(validation::fold_case(&specialization))
    .bind(validation::fold_case(&email))
    .fetch_one(&mut *tx)
    .await
    .map_err(validation::map_unique(
        "DUPLICATE_DOCTOR",
        "a doctor with this email or license number already exists",
    ))?;

    tx.commit().await?;

    tracing::info!(doctor_id = row.id, "doctor created");
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn update_doctor(
    State(state): State<AppState>,
    AppPath(doctor_id): AppPath<i64>,
    AppJson(req): AppJson<UpdateDoctorRequest>,
) -> Result<Json<DoctorRow>, ApiError> {
    let mut tx = state.db.begin().await?;

    let existing = fetch_doctor(&mut tx, doctor_id).await?;

    let name = match req.name.as_deref() {
        Some(n) => validation::required("name", n)?,
        None => existing.name,
    };
    let specialization = match req.specialization.as_deref() {
        Some(s) => validation::required("specialization", s)?,
        None => existing.specialization,
    };
    let phone = match req.phone.as_deref() {
        Some(p) => validation::required("phone", p)?,
        None => existing.phone,
    };

    let email = match req.email.as_deref() {
        Some(e) => {
            let e = validation::email(e)?;
            if e != existing.email {
                validation::ensure_doctor_email_free(&mut tx, &e).await?;
            }
            e
        }
        None => existing.email,
    };
    let license_number = match req.license_number.as_deref() {
        Some(l) => {
            let l = validation::required("license_number", l)?;
            if l != existing.license_number {
                validation::ensure_license_free(&mut tx, &l).await?;
            }
            l
        }
        None => existing.license_number,
    };

    let bio = match req.bio {
        None => existing.bio,
        Some(b) => b,
    };
    let is_active = req.is_active.unwrap_or(existing.is_active);

    let updated: DoctorRow = sqlx::query_as::<_, DoctorRow>(
        r#"
        UPDATE doctors
        SET name = $1,
            specialization = $2,
            email = $3,
            phone = $4,
            license_number = $5,
            bio = $6,
            is_active = $7,
            name_lc = $8,
            specialization_lc = $9,
            email_lc = $10
        WHERE id = $11
        RETURNING id, name, specialization, email, phone, license_number, bio, is_active
        "#,
    )
    .bind(&name)
    .bind(&specialization)
    .bind(&email)
    .bind(phone)
    .bind(license_number)
    .bind(bio)
    .bind(is_active)
    .bind(validation::fold_case(&name))
    .bind(validation::fold_case(&specialization))
    .bind(validation::fold_case(&email))
    .bind(doctor_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(validation::map_unique(
        "DUPLICATE_DOCTOR",
        "a doctor with this email or license number already exists",
    ))?;

    tx.commit().await?;

    tracing::info!(doctor_id, "doctor updated");
    Ok(Json(updated))
}

pub async fn delete_doctor(
    State(state): State<AppState>,
    AppPath(doctor_id): AppPath<i64>,
) -> Result<StatusCode, ApiError> {
    let mut tx = state.db.begin().await?;

    fetch_doctor(&mut tx, doctor_id).await?;

    let booked: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM appointments WHERE doctor_id = $1")
        .bind(doctor_id)
        .fetch_one(&mut *tx)
        .await?;
    if booked > 0 {
        tracing::warn!(doctor_id, booked, "refusing to delete doctor with appointments");
        return Err(ApiError::Conflict(
            "HAS_APPOINTMENTS",
            format!("doctor still has {booked} appointment(s)"),
        ));
    }

    sqlx::query("DELETE FROM doctors WHERE id = $1")
        .bind(doctor_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(doctor_id, "doctor deleted");
    Ok(StatusCode::NO_CONTENT)
}
