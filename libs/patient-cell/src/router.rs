use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn patient_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_patients).post(handlers::create_patient))
        .route("/stats", get(handlers::dashboard_stats))
        .route("/{patient_id}", get(handlers::get_patient).delete(handlers::delete_patient))
        .route("/{patient_id}/medical-history", post(handlers::add_medical_history))
        .with_state(state)
}
