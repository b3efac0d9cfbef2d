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

use crate::models::{AppointmentError, BookAppointmentRequest, BookingOutcome, UpdateStatusRequest};
use crate::services::{booking::BookingService, schedule::ScheduleService};

#[derive(Debug, Deserialize)]
pub struct DaySlotsQuery {
    pub doctor_id: Uuid,
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    pub date: Option<String>,
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let requested = parse_timestamp(&request.date, &request.time)?;
    let booking_service = BookingService::new(&state);

    let outcome = booking_service
        .book_appointment(request.patient_id, request.doctor_id, requested, request.reason)
        .await
        .map_err(appointment_error)?;

    match outcome {
        BookingOutcome::Booked(appointment) => Ok((
            StatusCode::CREATED,
            Json(json!({
                "message": "Appointment scheduled successfully",
                "appointment": appointment
            })),
        )),
        BookingOutcome::Unavailable {
            reason,
            next_available_slots,
            alternative_doctors,
        } => Ok((
            StatusCode::CONFLICT,
            Json(json!({
                "message": reason,
                "next_available_slots": next_available_slots,
                "alternative_doctors": alternative_doctors
            })),
        )),
    }
}

#[axum::debug_handler]
pub async fn update_status(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .update_status(appointment_id, request.status)
        .await
        .map_err(appointment_error)?;

    Ok(Json(json!({
        "message": "Appointment status updated",
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn day_slots(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<DaySlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let date = parse_date(&query.date)?;
    let schedule_service = ScheduleService::new(&state);

    let slots = schedule_service
        .day_slots(query.doctor_id, date)
        .await
        .map_err(appointment_error)?;

    Ok(Json(json!({
        "doctor_id": query.doctor_id,
        "slots": slots
    })))
}

#[axum::debug_handler]
pub async fn clinic_schedule(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<Value>, AppError> {
    let date = match query.date {
        Some(raw) => parse_date(&raw)?,
        None => Utc::now().date_naive(),
    };
    let schedule_service = ScheduleService::new(&state);

    let doctors = schedule_service
        .clinic_schedule(date)
        .await
        .map_err(appointment_error)?;

    Ok(Json(json!({
        "date": date.format("%Y-%m-%d").to_string(),
        "doctors": doctors
    })))
}

fn parse_date(date: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("Invalid date, expected YYYY-MM-DD".to_string()))
}

fn parse_timestamp(date: &str, time: &str) -> Result<DateTime<Utc>, AppError> {
    let date = parse_date(date)?;
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|_| AppError::BadRequest("Invalid time, expected HH:MM".to_string()))?;

    Ok(date.and_time(time).and_utc())
}

fn appointment_error(err: AppointmentError) -> AppError {
    match err {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::PatientNotFound => AppError::NotFound("Patient not found".to_string()),
        AppointmentError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        AppointmentError::InvalidStatusTransition(status) => AppError::Conflict(format!(
            "Appointment cannot be modified in current status: {}",
            status
        )),
        AppointmentError::ValidationError(msg) => AppError::BadRequest(msg),
        AppointmentError::DatabaseError(msg) => AppError::Database(msg),
    }
}
