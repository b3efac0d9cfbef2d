use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{CreateDoctorRequest, Doctor, DoctorError, SeedReport};

pub struct DoctorService {
    supabase: Arc<SupabaseClient>,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn create_doctor(&self, request: CreateDoctorRequest) -> Result<Doctor, DoctorError> {
        debug!("Creating doctor: {}", request.name);

        if request.name.trim().is_empty() {
            return Err(DoctorError::ValidationError("Doctor name is required".to_string()));
        }
        if request.specialty.trim().is_empty() {
            return Err(DoctorError::ValidationError("Doctor specialty is required".to_string()));
        }

        let now = Utc::now();
        let doctor_data = json!({
            "name": request.name,
            "specialty": request.specialty,
            "qualification": request.qualification,
            "experience_years": request.experience_years,
            "consultation_fee": request.consultation_fee,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let result: Vec<Value> = self
            .supabase
            .insert("/rest/v1/doctors", doctor_data)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(DoctorError::DatabaseError("Failed to create doctor".to_string()));
        }

        let doctor: Doctor = serde_json::from_value(result[0].clone())
            .map_err(|e| DoctorError::DatabaseError(format!("Failed to parse doctor: {}", e)))?;
        debug!("Doctor created with ID: {}", doctor.id);

        Ok(doctor)
    }

    pub async fn get_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        debug!("Fetching doctor: {}", doctor_id);

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

    /// List doctors in creation order, optionally filtered to one specialty.
    pub async fn list_doctors(&self, specialty: Option<&str>) -> Result<Vec<Doctor>, DoctorError> {
        let path = match specialty {
            Some(specialty) => format!(
                "/rest/v1/doctors?specialty=eq.{}&order=created_at.asc",
                urlencoding::encode(specialty)
            ),
            None => "/rest/v1/doctors?order=created_at.asc".to_string(),
        };

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Doctor>, _>>()
            .map_err(|e| DoctorError::DatabaseError(format!("Failed to parse doctors: {}", e)))
    }

    /// Idempotent seed for deployment tooling and test setup. Does nothing
    /// when any doctor row already exists; otherwise inserts the initial
    /// roster with Monday-Saturday 09:00-17:00 windows. Sunday is never
    /// seeded, so every doctor is uniformly unavailable on Sundays.
    pub async fn seed_clinic_data(&self) -> Result<SeedReport, DoctorError> {
        let existing: Vec<Value> = self
            .supabase
            .request(Method::GET, "/rest/v1/doctors?limit=1", None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        if !existing.is_empty() {
            info!("Clinic data already seeded, leaving the store untouched");
            return Ok(SeedReport {
                seeded: false,
                doctors_created: 0,
            });
        }

        let mut created = 0;
        for entry in initial_roster() {
            let doctor = self.create_doctor(entry).await?;

            // Monday (0) through Saturday (5), 9 AM to 5 PM.
            for day in 0..6 {
                let window_data = json!({
                    "doctor_id": doctor.id.to_string(),
                    "day_of_week": day,
                    "start_time": "09:00:00",
                    "end_time": "17:00:00",
                    "is_available": true
                });

                let _: Vec<Value> = self
                    .supabase
                    .insert("/rest/v1/doctor_availability", window_data)
                    .await
                    .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;
            }

            created += 1;
        }

        info!("Seeded {} doctors with weekly availability", created);
        Ok(SeedReport {
            seeded: true,
            doctors_created: created,
        })
    }
}

fn initial_roster() -> Vec<CreateDoctorRequest> {
    vec![
        CreateDoctorRequest {
            name: "Janmejaya Panda".to_string(),
            specialty: "General Medicine".to_string(),
            qualification: Some("MBBS, MD (Internal Medicine)".to_string()),
            experience_years: Some(15),
            consultation_fee: Some(500.0),
        },
        CreateDoctorRequest {
            name: "Subham Khandual".to_string(),
            specialty: "General Medicine".to_string(),
            qualification: Some("MBBS, MD (Internal Medicine), DNB".to_string()),
            experience_years: Some(12),
            consultation_fee: Some(600.0),
        },
        CreateDoctorRequest {
            name: "Subhendra Sahoo".to_string(),
            specialty: "Oncology".to_string(),
            qualification: Some("MBBS, MD (Oncology), DM".to_string()),
            experience_years: Some(18),
            consultation_fee: Some(1000.0),
        },
        CreateDoctorRequest {
            name: "Rati Bhusan Dash".to_string(),
            specialty: "Oncology".to_string(),
            qualification: Some("MBBS, MD (Radiation Oncology)".to_string()),
            experience_years: Some(14),
            consultation_fee: Some(900.0),
        },
    ]
}
