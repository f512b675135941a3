use crate::{models::AppState, validation};
use axum::Router;

pub mod appointment_routes;
pub mod doctor_routes;
pub mod home_routes;
pub mod patient_routes;
pub mod service_routes;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/doctors", doctor_routes::router())
        .nest("/api/patients", patient_routes::router())
        .nest("/api/appointments", appointment_routes::router())
        .nest("/api/services", service_routes::router())
        .merge(home_routes::router())
        .with_state(state)
}

/// Case-folded needle matched with `instr()` against the `*_lc` columns, or
/// `None` when the filter is blank.
pub(crate) fn search_term(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(validation::fold_case)
}
