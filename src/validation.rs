// src/validation.rs
//
// Business rules checked before any write. Pure checks take plain values;
// store-backed checks run on the caller's transaction connection.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use sqlx::SqliteConnection;

use crate::error::ApiError;

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 1000;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap()
});

/// Resolves `skip`/`limit` query values into an `(offset, limit)` pair.
pub fn page(skip: Option<i64>, limit: Option<i64>) -> Result<(i64, i64), ApiError> {
    let skip = skip.unwrap_or(0);
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    if skip < 0 {
        return Err(ApiError::validation("skip must be >= 0"));
    }
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::validation(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )));
    }
    Ok((skip, limit))
}

/// Trims `value` and rejects it when nothing is left.
pub fn required(field: &str, value: &str) -> Result<String, ApiError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(v.to_string())
}

/// Unicode lowercase used for every `*_lc` column and search needle.
pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

pub fn email(value: &str) -> Result<String, ApiError> {
    let v = value.trim();
    if !EMAIL_RE.is_match(v) {
        return Err(ApiError::validation("email is not a valid address"));
    }
    Ok(v.to_string())
}

pub fn future_date(date: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), ApiError> {
    if date <= now {
        return Err(ApiError::validation("appointment_date must be in the future"));
    }
    Ok(())
}

pub fn price(value: f64) -> Result<(), ApiError> {
    if value.is_nan() || value < 0.0 {
        return Err(ApiError::validation("price must be >= 0"));
    }
    Ok(())
}

pub fn duration(minutes: i64) -> Result<(), ApiError> {
    if minutes <= 0 {
        return Err(ApiError::validation("duration_minutes must be > 0"));
    }
    Ok(())
}

/// Maps a unique-constraint violation that slipped past the pre-checks to the
/// same 400 the pre-check would have produced.
pub fn map_unique<'a>(
    code: &'static str,
    message: &'a str,
) -> impl FnOnce(sqlx::Error) -> ApiError + 'a {
    move |e| {
        let unique = e
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if unique {
            ApiError::BadRequest(code, message.to_string())
        } else {
            ApiError::from(e)
        }
    }
}

/* ============================================================
   Store-backed checks
   ============================================================ */

async fn row_exists(conn: &mut SqliteConnection, sql: &str, id: i64) -> Result<bool, ApiError> {
    let found: Option<i64> = sqlx::query_scalar(sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(found.is_some())
}

async fn value_taken(conn: &mut SqliteConnection, sql: &str, value: &str) -> Result<bool, ApiError> {
    let found: Option<i64> = sqlx::query_scalar(sql)
        .bind(value)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(found.is_some())
}

pub async fn ensure_patient_exists(conn: &mut SqliteConnection, patient_id: i64) -> Result<(), ApiError> {
    if !row_exists(conn, "SELECT id FROM patients WHERE id = $1", patient_id).await? {
        return Err(ApiError::not_found("patient"));
    }
    Ok(())
}

pub async fn ensure_doctor_exists(conn: &mut SqliteConnection, doctor_id: i64) -> Result<(), ApiError> {
    if !row_exists(conn, "SELECT id FROM doctors WHERE id = $1", doctor_id).await? {
        return Err(ApiError::not_found("doctor"));
    }
    Ok(())
}

pub async fn ensure_doctor_email_free(conn: &mut SqliteConnection, email: &str) -> Result<(), ApiError> {
    if value_taken(conn, "SELECT id FROM doctors WHERE email = $1", email).await? {
        return Err(ApiError::BadRequest(
            "DUPLICATE_EMAIL",
            "a doctor with this email already exists".into(),
        ));
    }
    Ok(())
}

pub async fn ensure_license_free(conn: &mut SqliteConnection, license_number: &str) -> Result<(), ApiError> {
    if value_taken(
        conn,
        "SELECT id FROM doctors WHERE license_number = $1",
        license_number,
    )
    .await?
    {
        return Err(ApiError::BadRequest(
            "DUPLICATE_LICENSE",
            "a doctor with this license number already exists".into(),
        ));
    }
    Ok(())
}

pub async fn ensure_patient_email_free(conn: &mut SqliteConnection, email: &str) -> Result<(), ApiError> {
    if value_taken(conn, "SELECT id FROM patients WHERE email = $1", email).await? {
        return Err(ApiError::BadRequest(
            "DUPLICATE_EMAIL",
            "a patient with this email already exists".into(),
        ));
    }
    Ok(())
}

/// Service names compare on their folded form. `except_id` keeps a row from
/// colliding with itself on a case-only rename.
pub async fn ensure_service_name_free(
    conn: &mut SqliteConnection,
    name: &str,
    except_id: Option<i64>,
) -> Result<(), ApiError> {
    let found: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT id
        FROM services
        WHERE name_lc = $1
          AND ($2 IS NULL OR id <> $2)
        "#,
    )
    .bind(fold_case(name))
    .bind(except_id)
    .fetch_optional(&mut *conn)
    .await?;

    if found.is_some() {
        return Err(ApiError::BadRequest(
            "DUPLICATE_NAME",
            "a service with this name already exists".into(),
        ));
    }
    Ok(())
}
