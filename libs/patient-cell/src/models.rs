use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    /// External patient identifier handed out by the clinic front desk.
    pub patient_number: String,
    pub age: i32,
    pub gender: Option<String>,
    pub contact: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalHistoryEntry {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub condition: String,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Intake form as submitted by the caller. Age arrives as a string so the
/// validation layer can report a non-numeric value together with the other
/// field failures instead of rejecting the request at deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePatientRequest {
    pub name: String,
    pub patient_number: String,
    pub age: String,
    pub gender: Option<String>,
    pub contact: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMedicalHistoryRequest {
    pub condition: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientDetail {
    pub patient: Patient,
    pub medical_history: Vec<MedicalHistoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_patients: usize,
    pub total_appointments: usize,
    pub upcoming_appointments: usize,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Patient validation failed")]
    Validation(Vec<String>),

    #[error("Patient with number {0} already exists")]
    DuplicatePatientNumber(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
