//! Helpers for tests that stand up a wiremock double of the PostgREST store.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;

/// Config pointing at a mock store (usually a wiremock `MockServer` uri).
pub fn test_config(store_url: &str) -> AppConfig {
    AppConfig {
        supabase_url: store_url.to_string(),
        supabase_service_key: "test-service-key".to_string(),
    }
}

/// Canned store rows matching the shapes the services deserialize.
pub struct MockStoreRows;

impl MockStoreRows {
    pub fn doctor(id: Uuid, name: &str, specialty: &str, consultation_fee: f64) -> Value {
        json!({
            "id": id.to_string(),
            "name": name,
            "specialty": specialty,
            "qualification": "MBBS, MD",
            "experience_years": 10,
            "consultation_fee": consultation_fee,
            "created_at": "2025-01-06T08:00:00+00:00",
            "updated_at": "2025-01-06T08:00:00+00:00"
        })
    }

    pub fn availability_window(
        doctor_id: Uuid,
        day_of_week: i32,
        start_time: &str,
        end_time: &str,
    ) -> Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "doctor_id": doctor_id.to_string(),
            "day_of_week": day_of_week,
            "start_time": start_time,
            "end_time": end_time,
            "is_available": true
        })
    }

    pub fn patient(id: Uuid, name: &str, patient_number: &str) -> Value {
        json!({
            "id": id.to_string(),
            "name": name,
            "patient_number": patient_number,
            "age": 34,
            "gender": "female",
            "contact": "5551234567",
            "created_at": "2025-01-06T08:00:00+00:00"
        })
    }

    pub fn appointment(
        id: Uuid,
        patient_id: Uuid,
        doctor_id: Uuid,
        appointment_date: DateTime<Utc>,
        status: &str,
    ) -> Value {
        json!({
            "id": id.to_string(),
            "patient_id": patient_id.to_string(),
            "doctor_id": doctor_id.to_string(),
            "appointment_date": appointment_date.to_rfc3339(),
            "reason": "Checkup",
            "status": status,
            "created_at": "2025-01-06T08:00:00+00:00",
            "updated_at": "2025-01-06T08:00:00+00:00"
        })
    }

    pub fn medical_history(patient_id: Uuid, condition: &str) -> Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "patient_id": patient_id.to_string(),
            "condition": condition,
            "notes": "Stable, reviewed at last visit",
            "recorded_at": "2025-01-06T08:00:00+00:00"
        })
    }
}
