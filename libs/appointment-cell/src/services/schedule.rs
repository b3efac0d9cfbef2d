use chrono::{Datelike, Duration, NaiveDate};
use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use doctor_cell::models::{AvailabilityWindow, Doctor, DoctorSummary};

use crate::models::{
    Appointment, AppointmentError, DaySlot, DoctorDaySchedule, PatientBrief, ScheduleSlot,
};

const SLOT_MINUTES: i64 = 30;

pub struct ScheduleService {
    supabase: Arc<SupabaseClient>,
}

impl ScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    /// Booking grid for one doctor and date: the fixed 9 AM - 5 PM clinic
    /// day in 30-minute cells, each flagged when a scheduled appointment
    /// overlaps it.
    pub async fn day_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<DaySlot>, AppointmentError> {
        self.verify_doctor_exists(doctor_id).await?;

        let appointments = self.scheduled_appointments_for_date(doctor_id, date).await?;

        let mut slots = Vec::new();
        let mut current = date.and_hms_opt(9, 0, 0).unwrap().and_utc();
        let close = date.and_hms_opt(17, 0, 0).unwrap().and_utc();

        while current < close {
            let slot_end = current + Duration::minutes(SLOT_MINUTES);
            let is_booked = appointments.iter().any(|apt| {
                apt.appointment_date < slot_end
                    && apt.appointment_date + Duration::minutes(SLOT_MINUTES) > current
            });

            slots.push(DaySlot {
                time: current.format("%H:%M").to_string(),
                datetime: current.format("%Y-%m-%dT%H:%M").to_string(),
                is_booked,
            });

            current = slot_end;
        }

        Ok(slots)
    }

    /// The whole clinic's day at a glance: every doctor with their window
    /// slots and, for booked slots, who is coming in. Sundays render empty.
    pub async fn clinic_schedule(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<DoctorDaySchedule>, AppointmentError> {
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, "/rest/v1/doctors?order=created_at.asc", None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let doctors: Vec<Doctor> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Doctor>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse doctors: {}", e)))?;

        let day_of_week = date.weekday().num_days_from_monday() as i32;
        let mut schedules = Vec::new();

        for doctor in &doctors {
            let window = self.window_for_day(doctor.id, day_of_week).await?;
            let slots = match window {
                Some(window) if day_of_week != 6 => {
                    self.build_doctor_day(doctor.id, date, &window).await?
                }
                _ => Vec::new(),
            };

            schedules.push(DoctorDaySchedule {
                doctor: DoctorSummary::from(doctor),
                slots,
            });
        }

        debug!("Built clinic schedule for {} doctors on {}", schedules.len(), date);
        Ok(schedules)
    }

    // Private helper methods

    async fn build_doctor_day(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        window: &AvailabilityWindow,
    ) -> Result<Vec<ScheduleSlot>, AppointmentError> {
        let appointments = self.scheduled_appointments_for_date(doctor_id, date).await?;
        let patients = self.patients_for(&appointments).await?;

        let mut slots = Vec::new();
        let mut current = date.and_time(window.start_time).and_utc();
        let close = date.and_time(window.end_time).and_utc();

        while current < close {
            let slot_end = current + Duration::minutes(SLOT_MINUTES);
            let booked = appointments.iter().find(|apt| {
                apt.appointment_date < slot_end
                    && apt.appointment_date + Duration::minutes(SLOT_MINUTES) > current
            });

            slots.push(ScheduleSlot {
                time: current,
                is_booked: booked.is_some(),
                patient: booked.and_then(|apt| patients.get(&apt.patient_id).cloned()),
            });

            current = slot_end;
        }

        Ok(slots)
    }

    async fn patients_for(
        &self,
        appointments: &[Appointment],
    ) -> Result<HashMap<Uuid, PatientBrief>, AppointmentError> {
        let mut patients = HashMap::new();

        for appointment in appointments {
            if patients.contains_key(&appointment.patient_id) {
                continue;
            }

            let path = format!(
                "/rest/v1/patients?id=eq.{}&select=id,name",
                appointment.patient_id
            );
            let result: Vec<Value> = self
                .supabase
                .request(Method::GET, &path, None)
                .await
                .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

            if let Some(row) = result.first() {
                let brief: PatientBrief = serde_json::from_value(row.clone()).map_err(|e| {
                    AppointmentError::DatabaseError(format!("Failed to parse patient: {}", e))
                })?;
                patients.insert(appointment.patient_id, brief);
            }
        }

        Ok(patients)
    }

    async fn scheduled_appointments_for_date(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let start_of_day = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let end_of_day = date.and_hms_opt(23, 59, 59).unwrap().and_utc();

        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=gte.{}&appointment_date=lte.{}&status=eq.scheduled&order=appointment_date.asc",
            doctor_id,
            urlencoding::encode(&start_of_day.to_rfc3339()),
            urlencoding::encode(&end_of_day.to_rfc3339()),
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointments: {}", e)))
    }

    async fn window_for_day(
        &self,
        doctor_id: Uuid,
        day_of_week: i32,
    ) -> Result<Option<AvailabilityWindow>, AppointmentError> {
        let path = format!(
            "/rest/v1/doctor_availability?doctor_id=eq.{}&day_of_week=eq.{}&is_available=eq.true",
            doctor_id, day_of_week
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => {
                let window = serde_json::from_value(row).map_err(|e| {
                    AppointmentError::DatabaseError(format!("Failed to parse window: {}", e))
                })?;
                Ok(Some(window))
            }
            None => Ok(None),
        }
    }

    async fn verify_doctor_exists(&self, doctor_id: Uuid) -> Result<(), AppointmentError> {
        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::DoctorNotFound);
        }

        Ok(())
    }
}
