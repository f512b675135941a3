// src/routes/service_routes.rs

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
    models::{AppState, ServiceRow},
    validation,
};

const DEFAULT_DURATION_MINUTES: i64 = 30;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_services).post(create_service))
        .route("/available/all", get(list_available_services))
        .route(
            "/{service_id}",
            get(get_service).put(update_service).delete(delete_service),
        )
}

#[derive(Debug, Deserialize)]
pub struct ServiceListQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub duration_minutes: Option<i64>, // default 30
    pub is_available: Option<bool>,    // default true
}

#[derive(Debug, Deserialize)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub duration_minutes: Option<i64>,
    pub is_available: Option<bool>,
}

async fn fetch_service(conn: &mut SqliteConnection, service_id: i64) -> Result<ServiceRow, ApiError> {
    sqlx::query_as::<_, ServiceRow>(
        r#"
        SELECT id, name, description, price, duration_minutes, is_available
        FROM services
        WHERE id = $1
        "#,
    )
    .bind(service_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| ApiError::not_found("service"))
}

pub async fn list_services(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<ServiceListQuery>,
) -> Result<Json<Vec<ServiceRow>>, ApiError> {
    let (skip, limit) = validation::page(q.skip, q.limit)?;

    let rows: Vec<ServiceRow> = sqlx::query_as::<_, ServiceRow>(
        r#"
        SELECT id, name, description, price, duration_minutes, is_available
        FROM services
        WHERE ($1 IS NULL OR instr(name_lc, $1) > 0 OR instr(description_lc, $1) > 0)
          AND ($2 IS NULL OR is_available = $2)
        ORDER BY id ASC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(search_term(q.search.as_deref()))
    .bind(q.is_available)
    .bind(limit)
    .bind(skip)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

/// Every bookable service, unpaginated.
pub async fn list_available_services(
    State(state): State<AppState>,
) -> Result<Json<Vec<ServiceRow>>, ApiError> {
    let rows: Vec<ServiceRow> = sqlx::query_as::<_, ServiceRow>(
        r#"
        SELECT id, name, description, price, duration_minutes, is_available
        FROM services
        WHERE is_available = 1
        ORDER BY id ASC
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

pub async fn get_service(
    State(state): State<AppState>,
    AppPath(service_id): AppPath<i64>,
) -> Result<Json<ServiceRow>, ApiError> {
    let mut conn = state.db.acquire().await?;
    let row = fetch_service(&mut conn, service_id).await?;
    Ok(Json(row))
}

pub async fn create_service(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateServiceRequest>,
) -> Result<(StatusCode, Json<ServiceRow>), ApiError> {
    let name = validation::required("name", &req.name)?;
    validation::price(req.price)?;
    let duration_minutes = req.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
    validation::duration(duration_minutes)?;

    let mut tx = state.db.begin().await?;

    validation::ensure_service_name_free(&mut tx, &name, None).await?;

    let description = req.description.trim();

    let row: ServiceRow = sqlx::query_as::<_, ServiceRow>(
        r#"
        INSERT INTO services (name, description, price, duration_minutes, is_available,
                              name_lc, description_lc)
        VALUES ($1,$2,$3,$4,$5,$6,$7)
        RETURNING id, name, description, price, duration_minutes, is_available
        "#,
    )
    .bind(&name)
    .bind(description)
    .bind(req.price)
    .bind(duration_minutes)
    .bind(req.is_available.unwrap_or(true))
    .bind(validation::fold_case(&name))
    .bind(validation::fold_case(description))
    .fetch_one(&mut *tx)
    .await
    .map_err(validation::map_unique(
        "DUPLICATE_NAME",
        "a service with this name already exists",
    ))?;

    tx.commit().await?;

    tracing::info!(service_id = row.id, "service created");
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn update_service(
    State(state): State<AppState>,
    AppPath(service_id): AppPath<i64>,
    AppJson(req): AppJson<UpdateServiceRequest>,
) -> Result<Json<ServiceRow>, ApiError> {
    let mut tx = state.db.begin().await?;

    let existing = fetch_service(&mut tx, service_id).await?;

    let name = match req.name.as_deref() {
        Some(n) => {
            let n = validation::required("name", n)?;
            if validation::fold_case(&n) != validation::fold_case(&existing.name) {
                validation::ensure_service_name_free(&mut tx, &n, Some(service_id)).await?;
            }
            n
        }
        None => existing.name,
    };

    let price = match req.price {
        Some(p) => {
            validation::price(p)?;
            p
        }
        None => existing.price,
    };
    let duration_minutes = match req.duration_minutes {
        Some(d) => {
            validation::duration(d)?;
            d
        }
        None => existing.duration_minutes,
    };

    let description = req
        .description
        .map(|d| d.trim().to_string())
        .unwrap_or(existing.description);
    let is_available = req.is_available.unwrap_or(existing.is_available);

    let updated: ServiceRow = sqlx::query_as::<_, ServiceRow>(
        r#"
        UPDATE services
        SET name = $1,
            description = $2,
            price = $3,
            duration_minutes = $4,
            is_available = $5,
            name_lc = $6,
            description_lc = $7
        WHERE id = $8
        RETURNING id, name, description, price, duration_minutes, is_available
        "#,
    )
    .bind(&name)
    .bind(&description)
    .bind(price)
    .bind(duration_minutes)
    .bind(is_available)
    .bind(validation::fold_case(&name))
    .bind(validation::fold_case(&description))
    .bind(service_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(validation::map_unique(
        "DUPLICATE_NAME",
        "a service with this name already exists",
    ))?;

    tx.commit().await?;

    tracing::info!(service_id, "service updated");
    Ok(Json(updated))
}

pub async fn delete_service(
    State(state): State<AppState>,
    AppPath(service_id): AppPath<i64>,
) -> Result<StatusCode, ApiError> {
    let mut tx = state.db.begin().await?;

    let result = sqlx::query("DELETE FROM services WHERE id = $1")
        .bind(service_id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("service"));
    }

    tx.commit().await?;

    tracing::info!(service_id, "service deleted");
    Ok(StatusCode::NO_CONTENT)
}
