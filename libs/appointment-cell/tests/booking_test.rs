use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::appointment_routes;
use shared_utils::test_utils::{test_config, MockStoreRows};

fn create_test_app(store_url: &str) -> Router {
    appointment_routes(Arc::new(test_config(store_url)))
}

// 2025-06-02 is a Monday.
fn monday(hour: u32, minute: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2025, 6, 2)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
        .and_utc()
}

async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn booking_body(patient_id: Uuid, doctor_id: Uuid, date: &str, time: &str) -> String {
    json!({
        "patient_id": patient_id,
        "doctor_id": doctor_id,
        "date": date,
        "time": time,
        "reason": "Checkup"
    })
    .to_string()
}

#[tokio::test]
async fn booking_a_free_slot_creates_a_scheduled_appointment() {
    let server = MockServer::start().await;
    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::patient(patient_id, "Asha Mohanty", "P-1001")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::doctor(doctor_id, "Janmejaya Panda", "General Medicine", 500.0)
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::availability_window(doctor_id, 0, "09:00:00", "17:00:00")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreRows::appointment(Uuid::new_v4(), patient_id, doctor_id, monday(10, 0), "scheduled")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let app = create_test_app(&server.uri());
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(booking_body(patient_id, doctor_id, "2025-06-02", "10:00")))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = read_json(response).await;
    assert_eq!(body["message"], "Appointment scheduled successfully");
    assert_eq!(body["appointment"]["status"], "scheduled");
}

#[tokio::test]
async fn booking_an_occupied_slot_returns_suggestions() {
    let server = MockServer::start().await;
    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();
    let alternative_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::patient(patient_id, "Asha Mohanty", "P-1001")
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::doctor(doctor_id, "Janmejaya Panda", "General Medicine", 500.0)
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", alternative_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::doctor(alternative_id, "Subham Khandual", "General Medicine", 600.0)
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("specialty", "eq.General Medicine"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::doctor(alternative_id, "Subham Khandual", "General Medicine", 600.0)
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::availability_window(doctor_id, 0, "09:00:00", "17:00:00")
        ])))
        .mount(&server)
        .await;

    // The requested 10:00 slot is taken; every other conflict range is clear.
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param(
            "appointment_date",
            format!("gte.{}", monday(9, 45).to_rfc3339()),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::appointment(Uuid::new_v4(), patient_id, doctor_id, monday(10, 0), "scheduled")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    // A rejected booking must not write anything.
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let app = create_test_app(&server.uri());
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(booking_body(patient_id, doctor_id, "2025-06-02", "10:00")))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = read_json(response).await;
    assert_eq!(body["message"], "Doctor is busy with another patient at this time");
    assert_eq!(
        body["next_available_slots"],
        json!([
            "2025-06-02 10:30 AM",
            "2025-06-02 11:00 AM",
            "2025-06-02 11:30 AM"
        ])
    );
    assert_eq!(
        body["alternative_doctors"][0]["id"],
        alternative_id.to_string()
    );
    assert_eq!(
        body["alternative_doctors"][0]["specialty"],
        "General Medicine"
    );
}

#[tokio::test]
async fn booking_for_an_unknown_patient_is_a_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let app = create_test_app(&server.uri());
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(booking_body(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "2025-06-02",
            "10:00",
        )))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_booking_time_is_a_bad_request() {
    let server = MockServer::start().await;
    let app = create_test_app(&server.uri());

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(booking_body(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "2025-06-02",
            "25:99",
        )))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn scheduled_appointment_can_be_completed() {
    let server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::appointment(appointment_id, patient_id, doctor_id, monday(10, 0), "scheduled")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::appointment(appointment_id, patient_id, doctor_id, monday(10, 0), "completed")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let app = create_test_app(&server.uri());
    let request = Request::builder()
        .method("PATCH")
        .uri(format!("/{}/status", appointment_id))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "status": "completed" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["appointment"]["status"], "completed");
}

#[tokio::test]
async fn terminal_appointment_status_cannot_change() {
    let server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::appointment(
                appointment_id,
                Uuid::new_v4(),
                Uuid::new_v4(),
                monday(10, 0),
                "completed",
            )
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let app = create_test_app(&server.uri());
    let request = Request::builder()
        .method("PATCH")
        .uri(format!("/{}/status", appointment_id))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "status": "cancelled" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
