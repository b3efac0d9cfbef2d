use chrono::{DateTime, Datelike, Duration, Utc};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AvailabilityCheck, AvailabilityWindow, Doctor, DoctorError, DoctorSummary, WorkingHours, day_name};

/// Appointments sit on a fixed 30-minute grid.
pub const SLOT_MINUTES: i64 = 30;
/// Margin on each side of a requested time used for collision detection,
/// which makes 30 minutes the effective minimum spacing between bookings.
pub const CONFLICT_BUFFER_MINUTES: i64 = 15;
/// How many calendar days ahead the slot search scans, requested day included.
const SEARCH_HORIZON_DAYS: i64 = 7;

pub struct AvailabilityService {
    supabase: Arc<SupabaseClient>,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Decide whether `requested` is a bookable time for the doctor.
    ///
    /// A missing doctor is an error; every other negative outcome is a
    /// normal `AvailabilityCheck` with the reason spelled out.
    pub async fn check_availability(
        &self,
        doctor_id: Uuid,
        requested: DateTime<Utc>,
    ) -> Result<AvailabilityCheck, DoctorError> {
        self.require_doctor(doctor_id).await?;

        let day_of_week = requested.weekday().num_days_from_monday() as i32;
        let window = match self.window_for_day(doctor_id, day_of_week).await? {
            Some(window) => window,
            None => {
                debug!("Doctor {} has no availability window on day {}", doctor_id, day_of_week);
                return Ok(AvailabilityCheck::unavailable(
                    "Doctor is not available on this day",
                ));
            }
        };

        let time_of_day = requested.time();
        if time_of_day < window.start_time || time_of_day > window.end_time {
            return Ok(AvailabilityCheck::unavailable(format!(
                "Doctor is only available between {} and {}",
                window.start_time.format("%I:%M %p"),
                window.end_time.format("%I:%M %p"),
            )));
        }

        let slot_start = requested - Duration::minutes(CONFLICT_BUFFER_MINUTES);
        let slot_end = requested + Duration::minutes(CONFLICT_BUFFER_MINUTES);
        if self
            .has_conflicting_appointment(doctor_id, slot_start, slot_end)
            .await?
        {
            warn!("Conflict detected for doctor {} at {}", doctor_id, requested);
            return Ok(AvailabilityCheck::unavailable(
                "Doctor is busy with another patient at this time",
            ));
        }

        Ok(AvailabilityCheck::available())
    }

    /// Scan forward from `requested` for up to 7 calendar days and collect
    /// the first `limit` bookable 30-minute slots in chronological order.
    /// An empty result means the horizon is fully booked, not an error.
    pub async fn find_next_available_slots(
        &self,
        doctor_id: Uuid,
        requested: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<DateTime<Utc>>, DoctorError> {
        self.require_doctor(doctor_id).await?;

        let mut slots = Vec::new();

        for day_offset in 0..SEARCH_HORIZON_DAYS {
            let check_date = requested + Duration::days(day_offset);
            let day_of_week = check_date.weekday().num_days_from_monday() as i32;

            let window = match self.window_for_day(doctor_id, day_of_week).await? {
                Some(window) => window,
                None => continue,
            };

            let window_open = check_date.date_naive().and_time(window.start_time).and_utc();
            let window_close = check_date.date_naive().and_time(window.end_time).and_utc();

            // On the requested day the scan begins one slot after the
            // requested time; on later days it begins at the window start.
            let mut current = if day_offset == 0 {
                window_open.max(requested + Duration::minutes(SLOT_MINUTES))
            } else {
                window_open
            };

            while current <= window_close {
                let check = self.check_availability(doctor_id, current).await?;
                if check.is_available {
                    slots.push(current);
                    if slots.len() >= limit {
                        return Ok(slots);
                    }
                }
                current += Duration::minutes(SLOT_MINUTES);
            }
        }

        debug!("Found {} open slots for doctor {}", slots.len(), doctor_id);
        Ok(slots)
    }

    /// Every other doctor of the same specialty who is free at exactly
    /// `requested`, in creation order. No slot search is performed for them.
    pub async fn find_alternative_doctors(
        &self,
        doctor_id: Uuid,
        requested: DateTime<Utc>,
    ) -> Result<Vec<DoctorSummary>, DoctorError> {
        let reference = self.require_doctor(doctor_id).await?;

        let path = format!(
            "/rest/v1/doctors?specialty=eq.{}&id=neq.{}&order=created_at.asc",
            urlencoding::encode(&reference.specialty),
            doctor_id,
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let candidates: Vec<Doctor> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Doctor>, _>>()
            .map_err(|e| DoctorError::DatabaseError(format!("Failed to parse doctors: {}", e)))?;

        let mut alternatives = Vec::new();
        for candidate in &candidates {
            let check = self.check_availability(candidate.id, requested).await?;
            if check.is_available {
                alternatives.push(DoctorSummary::from(candidate));
            }
        }

        debug!(
            "Found {} alternative {} doctors for {}",
            alternatives.len(),
            reference.specialty,
            requested
        );
        Ok(alternatives)
    }

    /// The doctor's weekly schedule in display form, one entry per
    /// available window, ordered by day-of-week.
    pub async fn working_hours(&self, doctor_id: Uuid) -> Result<Vec<WorkingHours>, DoctorError> {
        self.require_doctor(doctor_id).await?;

        let path = format!(
            "/rest/v1/doctor_availability?doctor_id=eq.{}&is_available=eq.true&order=day_of_week.asc",
            doctor_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let windows: Vec<AvailabilityWindow> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<AvailabilityWindow>, _>>()
            .map_err(|e| DoctorError::DatabaseError(format!("Failed to parse windows: {}", e)))?;

        Ok(windows
            .iter()
            .map(|window| WorkingHours {
                day: day_name(window.day_of_week).to_string(),
                start_time: window.start_time.format("%I:%M %p").to_string(),
                end_time: window.end_time.format("%I:%M %p").to_string(),
            })
            .collect())
    }

    // Private helper methods

    async fn require_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(DoctorError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| DoctorError::DatabaseError(format!("Failed to parse doctor: {}", e)))
    }

    /// First available window for the given day. A second window on the same
    /// day is never consulted, so a split schedule (e.g. a lunch break) is
    /// not representable to the resolver.
    async fn window_for_day(
        &self,
        doctor_id: Uuid,
        day_of_week: i32,
    ) -> Result<Option<AvailabilityWindow>, DoctorError> {
        let path = format!(
            "/rest/v1/doctor_availability?doctor_id=eq.{}&day_of_week=eq.{}&is_available=eq.true",
            doctor_id, day_of_week
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => {
                let window = serde_json::from_value(row).map_err(|e| {
                    DoctorError::DatabaseError(format!("Failed to parse window: {}", e))
                })?;
                Ok(Some(window))
            }
            None => Ok(None),
        }
    }

    async fn has_conflicting_appointment(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<bool, DoctorError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=gte.{}&appointment_date=lte.{}&status=neq.cancelled&limit=1",
            doctor_id,
            urlencoding::encode(&from.to_rfc3339()),
            urlencoding::encode(&to.to_rfc3339()),
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        Ok(!result.is_empty())
    }
}
