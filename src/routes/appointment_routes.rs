// src/routes/appointment_routes.rs

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqliteConnection;

use crate::{
    error::ApiError,
    extract::{AppJson, AppPath, AppQuery},
    models::{
        deserialize_double_option, deserialize_opt_utc, deserialize_utc, AppState,
        AppointmentRow, AppointmentStatus,
    },
    validation,
};

const DEFAULT_DURATION_MINUTES: i64 = 30;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_appointments).post(create_appointment))
        .route("/doctor/{doctor_id}", get(list_doctor_appointments))
        .route("/patient/{patient_id}", get(list_patient_appointments))
        .route(
            "/{appointment_id}",
            get(get_appointment)
                .put(update_appointment)
                .delete(delete_appointment),
        )
}

/* ============================================================
   Query params / request bodies
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct AppointmentListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
    pub patient_id: i64,
    pub doctor_id: i64,
    #[serde(deserialize_with = "deserialize_utc")]
    pub appointment_date: DateTime<Utc>,
    pub duration_minutes: Option<i64>, // default 30
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub patient_id: Option<i64>,
    pub doctor_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_opt_utc")]
    pub appointment_date: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub status: Option<AppointmentStatus>,
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub notes: Option<Option<String>>,
}

async fn fetch_appointment(
    conn: &mut SqliteConnection,
    appointment_id: i64,
) -> Result<AppointmentRow, ApiError> {
    sqlx::query_as::<_, AppointmentRow>(
        r#"
        SELECT id, patient_id, doctor_id, appointment_date, duration_minutes, status, notes, created_at
        FROM appointments
        WHERE id = $1
        "#,
    )
    .bind(appointment_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| ApiError::not_found("appointment"))
}

/* ============================================================
   GET /api/appointments
   ============================================================ */

pub async fn list_appointments(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<AppointmentListQuery>,
) -> Result<Json<Vec<AppointmentRow>>, ApiError> {
    let (skip, limit) = validation::page(q.skip, q.limit)?;

    let rows: Vec<AppointmentRow> = sqlx::query_as::<_, AppointmentRow>(
        r#"
        SELECT id, patient_id, doctor_id, appointment_date, duration_minutes, status, notes, created_at
        FROM appointments
        WHERE $1 IS NULL OR status = $1
        ORDER BY appointment_date ASC, id ASC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(q.status)
    .bind(limit)
    .bind(skip)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

/* ============================================================
   GET /api/appointments/doctor/{id}, /patient/{id}
   ============================================================ */

pub async fn list_doctor_appointments(
    State(state): State<AppState>,
    AppPath(doctor_id): AppPath<i64>,
) -> Result<Json<Vec<AppointmentRow>>, ApiError> {
    let rows: Vec<AppointmentRow> = sqlx::query_as::<_, AppointmentRow>(
        r#"
        SELECT id, patient_id, doctor_id, appointment_date, duration_minutes, status, notes, created_at
        FROM appointments
        WHERE doctor_id = $1
        ORDER BY appointment_date ASC, id ASC
        "#,
    )
    .bind(doctor_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

pub async fn list_patient_appointments(
    State(state): State<AppState>,
    AppPath(patient_id): AppPath<i64>,
) -> Result<Json<Vec<AppointmentRow>>, ApiError> {
    let rows: Vec<AppointmentRow> = sqlx::query_as::<_, AppointmentRow>(
        r#"
        SELECT id, patient_id, doctor_id, appointment_date, duration_minutes, status, notes, created_at
        FROM appointments
        WHERE patient_id = $1
        ORDER BY appointment_date ASC, id ASC
        "#,
    )
    .bind(patient_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

/* ============================================================
   GET /api/appointments/{id}
   ============================================================ */

pub async fn get_appointment(
    State(state): State<AppState>,
    AppPath(appointment_id): AppPath<i64>,
) -> Result<Json<AppointmentRow>, ApiError> {
    let mut conn = state.db.acquire().await?;
    let row = fetch_appointment(&mut conn, appointment_id).await?;
    Ok(Json(row))
}

/* ============================================================
   POST /api/appointments (create)
   ============================================================ */

pub async fn create_appointment(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentRow>), ApiError> {
    let mut tx = state.db.begin().await?;

    // order matters: patient, then doctor, then date
    validation::ensure_patient_exists(&mut tx, req.patient_id).await?;
    validation::ensure_doctor_exists(&mut tx, req.doctor_id).await?;

    let now = Utc::now();
    validation::future_date(req.appointment_date, now)?;

    let duration_minutes = req.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
    validation::duration(duration_minutes)?;

    let row: AppointmentRow = sqlx::query_as::<_, AppointmentRow>(
        r#"
        INSERT INTO appointments (patient_id, doctor_id, appointment_date, duration_minutes,
                                  status, notes, created_at)
        VALUES ($1,$2,$3,$4,$5,$6,$7)
        RETURNING id, patient_id, doctor_id, appointment_date, duration_minutes, status, notes, created_at
        "#,
    )
    .bind(req.patient_id)
    .bind(req.doctor_id)
    .bind(req.appointment_date)
    .bind(duration_minutes)
    .bind(AppointmentStatus::Scheduled)
    .bind(req.notes)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        appointment_id = row.id,
        patient_id = row.patient_id,
        doctor_id = row.doctor_id,
        "appointment booked"
    );
    Ok((StatusCode::CREATED, Json(row)))
}

/* ============================================================
   PUT /api/appointments/{id}
   ============================================================ */

pub async fn update_appointment(
    State(state): State<AppState>,
    AppPath(appointment_id): AppPath<i64>,
    AppJson(req): AppJson<UpdateAppointmentRequest>,
) -> Result<Json<AppointmentRow>, ApiError> {
    let mut tx = state.db.begin().await?;

    let existing = fetch_appointment(&mut tx, appointment_id).await?;

    if let Some(patient_id) = req.patient_id {
        validation::ensure_patient_exists(&mut tx, patient_id).await?;
    }
    if let Some(doctor_id) = req.doctor_id {
        validation::ensure_doctor_exists(&mut tx, doctor_id).await?;
    }
    if let Some(d) = req.duration_minutes {
        validation::duration(d)?;
    }

    // appointment_date is deliberately not checked against "now" here;
    // only booking enforces a future date.
    let updated: AppointmentRow = sqlx::query_as::<_, AppointmentRow>(
        r#"
        UPDATE appointments
        SET patient_id = $1,
            doctor_id = $2,
            appointment_date = $3,
            duration_minutes = $4,
            status = $5,
            notes = $6
        WHERE id = $7
        RETURNING id, patient_id, doctor_id, appointment_date, duration_minutes, status, notes, created_at
        "#,
    )
    .bind(req.patient_id.unwrap_or(existing.patient_id))
    .bind(req.doctor_id.unwrap_or(existing.doctor_id))
    .bind(req.appointment_date.unwrap_or(existing.appointment_date))
    .bind(req.duration_minutes.unwrap_or(existing.duration_minutes))
    .bind(req.status.unwrap_or(existing.status))
    .bind(req.notes.unwrap_or(existing.notes))
    .bind(appointment_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(appointment_id, status = updated.status.as_str(), "appointment updated");
    Ok(Json(updated))
}

/* ============================================================
   DELETE /api/appointments/{id}
   ============================================================ */

pub async fn delete_appointment(
    State(state): State<AppState>,
    AppPath(appointment_id): AppPath<i64>,
) -> Result<StatusCode, ApiError> {
    let mut tx = state.db.begin().await?;

    let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
        .bind(appointment_id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("appointment"));
    }

    tx.commit().await?;

    tracing::info!(appointment_id, "appointment deleted");
    Ok(StatusCode::NO_CONTENT)
}
