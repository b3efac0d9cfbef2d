use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use doctor_cell::models::DoctorSummary;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: DateTime<Utc>,
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Booking submission. Date and time arrive in the external string formats
/// (`YYYY-MM-DD`, `HH:MM`) and are combined by the handler before the
/// resolver sees them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: String,
    pub time: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

/// Result of a booking attempt. An occupied slot is a normal outcome that
/// carries suggestions, not an error.
#[derive(Debug, Clone)]
pub enum BookingOutcome {
    Booked(Appointment),
    Unavailable {
        reason: String,
        next_available_slots: Vec<String>,
        alternative_doctors: Vec<DoctorSummary>,
    },
}

/// One cell of the fixed day grid shown for a doctor and date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySlot {
    pub time: String,
    pub datetime: String,
    pub is_booked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientBrief {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub time: DateTime<Utc>,
    pub is_booked: bool,
    pub patient: Option<PatientBrief>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorDaySchedule {
    pub doctor: DoctorSummary,
    pub slots: Vec<ScheduleSlot>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
