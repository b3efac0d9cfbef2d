use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{AddMedicalHistoryRequest, CreatePatientRequest, PatientError};
use crate::services::patient::PatientService;

#[derive(Debug, Deserialize)]
pub struct PatientListQuery {
    pub search: Option<String>,
}

#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<PatientListQuery>,
) -> Result<Json<Value>, AppError> {
    let patient_service = PatientService::new(&state);

    let patients = patient_service
        .search_patients(query.search.as_deref())
        .await
        .map_err(patient_error)?;

    Ok(Json(json!({
        "patients": patients,
        "total": patients.len()
    })))
}

#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let patient_service = PatientService::new(&state);

    let patient = patient_service
        .create_patient(request)
        .await
        .map_err(patient_error)?;

    Ok((StatusCode::CREATED, Json(json!(patient))))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let patient_service = PatientService::new(&state);

    let detail = patient_service
        .get_patient_detail(patient_id)
        .await
        .map_err(patient_error)?;

    Ok(Json(json!(detail)))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let patient_service = PatientService::new(&state);

    patient_service
        .delete_patient(patient_id)
        .await
        .map_err(patient_error)?;

    Ok(Json(json!({ "message": "Patient deleted successfully" })))
}

#[axum::debug_handler]
pub async fn add_medical_history(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<Uuid>,
    Json(request): Json<AddMedicalHistoryRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let patient_service = PatientService::new(&state);

    let entry = patient_service
        .add_medical_history(patient_id, request)
        .await
        .map_err(patient_error)?;

    Ok((StatusCode::CREATED, Json(json!(entry))))
}

#[axum::debug_handler]
pub async fn dashboard_stats(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let patient_service = PatientService::new(&state);

    let stats = patient_service
        .dashboard_stats()
        .await
        .map_err(patient_error)?;

    Ok(Json(json!(stats)))
}

fn patient_error(err: PatientError) -> AppError {
    match err {
        PatientError::NotFound => AppError::NotFound("Patient not found".to_string()),
        PatientError::Validation(errors) => AppError::Validation(errors),
        PatientError::DuplicatePatientNumber(number) => {
            AppError::Conflict(format!("Patient with number {} already exists", number))
        }
        PatientError::DatabaseError(msg) => AppError::Database(msg),
    }
}
