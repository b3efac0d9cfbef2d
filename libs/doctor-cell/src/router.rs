use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_doctors).post(handlers::create_doctor))
        .route("/seed", post(handlers::seed_clinic_data))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .route("/{doctor_id}/working-hours", get(handlers::get_working_hours))
        .route("/{doctor_id}/availability", get(handlers::check_availability))
        .route("/{doctor_id}/next-slots", get(handlers::find_next_slots))
        .route("/{doctor_id}/alternatives", get(handlers::find_alternative_doctors))
        .with_state(state)
}
