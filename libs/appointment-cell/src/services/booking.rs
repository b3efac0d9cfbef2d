use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use doctor_cell::models::DoctorError;
use doctor_cell::services::availability::AvailabilityService;

use crate::models::{Appointment, AppointmentError, AppointmentStatus, BookingOutcome};
use crate::services::lifecycle::AppointmentLifecycle;

/// How many follow-up slots a rejected booking suggests.
const SUGGESTED_SLOT_LIMIT: usize = 3;

pub struct BookingService {
    supabase: Arc<SupabaseClient>,
    availability: AvailabilityService,
    lifecycle: AppointmentLifecycle,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));

        Self {
            availability: AvailabilityService::with_client(Arc::clone(&supabase)),
            lifecycle: AppointmentLifecycle::new(),
            supabase,
        }
    }

    /// Attempt to book the requested slot. When the slot is taken the
    /// outcome carries the reason plus suggested follow-up slots and
    /// same-specialty alternatives so the caller can offer a retry.
    pub async fn book_appointment(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        requested: DateTime<Utc>,
        reason: Option<String>,
    ) -> Result<BookingOutcome, AppointmentError> {
        info!("Booking appointment for patient {} with doctor {}", patient_id, doctor_id);

        self.verify_patient_exists(patient_id).await?;

        let check = self
            .availability
            .check_availability(doctor_id, requested)
            .await
            .map_err(from_doctor_error)?;

        if !check.is_available {
            warn!("Requested slot rejected for doctor {} at {}: {}", doctor_id, requested, check.reason);

            let next_slots = self
                .availability
                .find_next_available_slots(doctor_id, requested, SUGGESTED_SLOT_LIMIT)
                .await
                .map_err(from_doctor_error)?;
            let alternative_doctors = self
                .availability
                .find_alternative_doctors(doctor_id, requested)
                .await
                .map_err(from_doctor_error)?;

            return Ok(BookingOutcome::Unavailable {
                reason: check.reason,
                next_available_slots: next_slots
                    .iter()
                    .map(|slot| slot.format("%Y-%m-%d %I:%M %p").to_string())
                    .collect(),
                alternative_doctors,
            });
        }

        // The slot check above and this insert are separate store calls, so
        // two racing bookings can both pass the check. Single-writer callers
        // get the 30-minute spacing guarantee; see DESIGN.md.
        let now = Utc::now();
        let appointment_data = json!({
            "patient_id": patient_id.to_string(),
            "doctor_id": doctor_id.to_string(),
            "appointment_date": requested.to_rfc3339(),
            "reason": reason,
            "status": AppointmentStatus::Scheduled.to_string(),
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let result: Vec<Value> = self
            .supabase
            .insert("/rest/v1/appointments", appointment_data)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::DatabaseError(
                "Failed to create appointment".to_string(),
            ));
        }

        let appointment: Appointment = serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))?;

        info!("Appointment {} booked for {}", appointment.id, requested);
        Ok(BookingOutcome::Booked(appointment))
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    /// Move an appointment through its lifecycle. Only scheduled
    /// appointments can change state; completed and cancelled are terminal.
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get_appointment(appointment_id).await?;

        self.lifecycle
            .validate_status_transition(&current.status, &new_status)?;

        let update_data = json!({
            "status": new_status.to_string(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self
            .supabase
            .update(&path, update_data)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::DatabaseError(
                "Failed to update appointment".to_string(),
            ));
        }

        let updated: Appointment = serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))?;

        info!("Appointment {} moved to {}", appointment_id, updated.status);
        Ok(updated)
    }

    async fn verify_patient_exists(&self, patient_id: Uuid) -> Result<(), AppointmentError> {
        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::PatientNotFound);
        }

        Ok(())
    }
}

fn from_doctor_error(err: DoctorError) -> AppointmentError {
    match err {
        DoctorError::NotFound => AppointmentError::DoctorNotFound,
        DoctorError::ValidationError(msg) => AppointmentError::ValidationError(msg),
        DoctorError::DatabaseError(msg) => AppointmentError::DatabaseError(msg),
    }
}
