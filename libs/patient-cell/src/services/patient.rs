use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    AddMedicalHistoryRequest, CreatePatientRequest, DashboardStats, MedicalHistoryEntry, Patient,
    PatientDetail, PatientError,
};
use crate::services::validation::{parse_age, validate_patient_fields};

pub struct PatientService {
    supabase: Arc<SupabaseClient>,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn create_patient(&self, request: CreatePatientRequest) -> Result<Patient, PatientError> {
        debug!("Creating patient record: {}", request.patient_number);

        let errors = validate_patient_fields(&request.name, &request.age, &request.contact);
        if !errors.is_empty() {
            return Err(PatientError::Validation(errors));
        }
        let age = parse_age(&request.age)
            .ok_or_else(|| PatientError::Validation(vec!["Invalid age value".to_string()]))?;

        // The patient number is the front-desk identifier and must be unique.
        let existing_path = format!(
            "/rest/v1/patients?patient_number=eq.{}",
            urlencoding::encode(&request.patient_number)
        );
        let existing: Vec<Value> = self
            .supabase
            .request(Method::GET, &existing_path, None)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        if !existing.is_empty() {
            return Err(PatientError::DuplicatePatientNumber(request.patient_number));
        }

        let patient_data = json!({
            "name": request.name,
            "patient_number": request.patient_number,
            "age": age,
            "gender": request.gender,
            "contact": request.contact,
            "created_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self
            .supabase
            .insert("/rest/v1/patients", patient_data)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(PatientError::DatabaseError("Failed to create patient".to_string()));
        }

        let patient: Patient = serde_json::from_value(result[0].clone())
            .map_err(|e| PatientError::DatabaseError(format!("Failed to parse patient: {}", e)))?;
        debug!("Patient created with ID: {}", patient.id);

        Ok(patient)
    }

    pub async fn get_patient(&self, patient_id: Uuid) -> Result<Patient, PatientError> {
        let path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(PatientError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| PatientError::DatabaseError(format!("Failed to parse patient: {}", e)))
    }

    /// Patient record together with the medical history, newest entry first.
    pub async fn get_patient_detail(&self, patient_id: Uuid) -> Result<PatientDetail, PatientError> {
        let patient = self.get_patient(patient_id).await?;

        let path = format!(
            "/rest/v1/medical_history?patient_id=eq.{}&order=recorded_at.desc",
            patient_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        let medical_history = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<MedicalHistoryEntry>, _>>()
            .map_err(|e| PatientError::DatabaseError(format!("Failed to parse history: {}", e)))?;

        Ok(PatientDetail {
            patient,
            medical_history,
        })
    }

    /// List patients, optionally narrowed by a case-insensitive substring
    /// match over name or patient number.
    pub async fn search_patients(&self, search: Option<&str>) -> Result<Vec<Patient>, PatientError> {
        let path = match search {
            Some(query) if !query.is_empty() => {
                let pattern = urlencoding::encode(query).into_owned();
                format!(
                    "/rest/v1/patients?or=(name.ilike.*{}*,patient_number.ilike.*{}*)&order=created_at.asc",
                    pattern, pattern
                )
            }
            _ => "/rest/v1/patients?order=created_at.asc".to_string(),
        };

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Patient>, _>>()
            .map_err(|e| PatientError::DatabaseError(format!("Failed to parse patients: {}", e)))
    }

    /// Remove a patient along with their history and appointments. Children
    /// are deleted before the patient row so a mid-sequence failure never
    /// leaves entries pointing at a missing patient.
    pub async fn delete_patient(&self, patient_id: Uuid) -> Result<(), PatientError> {
        self.get_patient(patient_id).await?;

        let history_path = format!("/rest/v1/medical_history?patient_id=eq.{}", patient_id);
        self.supabase
            .delete(&history_path)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        let appointments_path = format!("/rest/v1/appointments?patient_id=eq.{}", patient_id);
        self.supabase
            .delete(&appointments_path)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        let patient_path = format!("/rest/v1/patients?id=eq.{}", patient_id);
        self.supabase
            .delete(&patient_path)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        info!("Patient {} deleted with history and appointments", patient_id);
        Ok(())
    }

    pub async fn add_medical_history(
        &self,
        patient_id: Uuid,
        request: AddMedicalHistoryRequest,
    ) -> Result<MedicalHistoryEntry, PatientError> {
        self.get_patient(patient_id).await?;

        if request.condition.trim().is_empty() {
            return Err(PatientError::Validation(vec![
                "Condition is required".to_string(),
            ]));
        }

        let entry_data = json!({
            "patient_id": patient_id.to_string(),
            "condition": request.condition,
            "notes": request.notes,
            "recorded_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self
            .supabase
            .insert("/rest/v1/medical_history", entry_data)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(PatientError::DatabaseError(
                "Failed to record medical history".to_string(),
            ));
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| PatientError::DatabaseError(format!("Failed to parse history: {}", e)))
    }

    /// Headline numbers for the clinic dashboard.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, PatientError> {
        let patients: Vec<Value> = self
            .supabase
            .request(Method::GET, "/rest/v1/patients?select=id", None)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        let appointments: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/appointments?select=appointment_date,status",
                None,
            )
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        let now = Utc::now();
        let upcoming_appointments = appointments
            .iter()
            .filter(|apt| {
                let scheduled = apt["status"].as_str() == Some("scheduled");
                let in_future = apt["appointment_date"]
                    .as_str()
                    .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                    .map(|when| when.with_timezone(&Utc) > now)
                    .unwrap_or(false);
                scheduled && in_future
            })
            .count();

        Ok(DashboardStats {
            total_patients: patients.len(),
            total_appointments: appointments.len(),
            upcoming_appointments,
        })
    }
}
