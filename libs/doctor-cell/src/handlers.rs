use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{CreateDoctorRequest, DoctorError};
use crate::services::{availability::AvailabilityService, doctor::DoctorService};

#[derive(Debug, Deserialize)]
pub struct DoctorListQuery {
    pub specialty: Option<String>,
}

/// External-format slot request: `YYYY-MM-DD` date plus `HH:MM` 24-hour time.
#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: String,
    pub time: String,
}

#[derive(Debug, Deserialize)]
pub struct NextSlotsQuery {
    pub date: String,
    pub time: String,
    pub limit: Option<usize>,
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let doctor_service = DoctorService::new(&state);

    let doctor = doctor_service
        .create_doctor(request)
        .await
        .map_err(doctor_error)?;

    Ok((StatusCode::CREATED, Json(json!(doctor))))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<DoctorListQuery>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);

    let doctors = doctor_service
        .list_doctors(query.specialty.as_deref())
        .await
        .map_err(doctor_error)?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);

    let doctor = doctor_service
        .get_doctor(doctor_id)
        .await
        .map_err(doctor_error)?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn get_working_hours(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let availability_service = AvailabilityService::new(&state);

    let working_hours = availability_service
        .working_hours(doctor_id)
        .await
        .map_err(doctor_error)?;

    Ok(Json(json!({ "working_hours": working_hours })))
}

#[axum::debug_handler]
pub async fn check_availability(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let requested = parse_timestamp(&query.date, &query.time)?;
    let availability_service = AvailabilityService::new(&state);

    let check = availability_service
        .check_availability(doctor_id, requested)
        .await
        .map_err(doctor_error)?;

    Ok(Json(json!(check)))
}

#[axum::debug_handler]
pub async fn find_next_slots(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<NextSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let requested = parse_timestamp(&query.date, &query.time)?;
    let availability_service = AvailabilityService::new(&state);

    let slots = availability_service
        .find_next_available_slots(doctor_id, requested, query.limit.unwrap_or(3))
        .await
        .map_err(doctor_error)?;

    let formatted: Vec<String> = slots
        .iter()
        .map(|slot| slot.format("%Y-%m-%d %I:%M %p").to_string())
        .collect();

    Ok(Json(json!({ "next_available_slots": formatted })))
}

#[axum::debug_handler]
pub async fn find_alternative_doctors(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let requested = parse_timestamp(&query.date, &query.time)?;
    let availability_service = AvailabilityService::new(&state);

    let alternatives = availability_service
        .find_alternative_doctors(doctor_id, requested)
        .await
        .map_err(doctor_error)?;

    Ok(Json(json!({ "alternative_doctors": alternatives })))
}

#[axum::debug_handler]
pub async fn seed_clinic_data(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);

    let report = doctor_service
        .seed_clinic_data()
        .await
        .map_err(doctor_error)?;

    Ok(Json(json!(report)))
}

pub(crate) fn parse_timestamp(date: &str, time: &str) -> Result<DateTime<Utc>, AppError> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Invalid date, expected YYYY-MM-DD".to_string()))?;
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|_| AppError::BadRequest("Invalid time, expected HH:MM".to_string()))?;

    Ok(date.and_time(time).and_utc())
}

fn doctor_error(err: DoctorError) -> AppError {
    match err {
        DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
        DoctorError::ValidationError(msg) => AppError::BadRequest(msg),
        DoctorError::DatabaseError(msg) => AppError::Database(msg),
    }
}
