use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/day-slots", get(handlers::day_slots))
        .route("/schedule", get(handlers::clinic_schedule))
        .route("/{appointment_id}/status", patch(handlers::update_status))
        .with_state(state)
}
