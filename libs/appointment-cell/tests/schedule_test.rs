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

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2025, 6, day)
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

#[tokio::test]
async fn day_slots_flag_only_the_booked_cell() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::doctor(doctor_id, "Janmejaya Panda", "General Medicine", 500.0)
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::appointment(Uuid::new_v4(), patient_id, doctor_id, at(2, 10, 0), "scheduled")
        ])))
        .mount(&server)
        .await;

    let app = create_test_app(&server.uri());
    let request = Request::builder()
        .method("GET")
        .uri(format!("/day-slots?doctor_id={}&date=2025-06-02", doctor_id))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    let slots = body["slots"].as_array().unwrap();

    // 9 AM - 5 PM in half-hour cells.
    assert_eq!(slots.len(), 16);
    assert_eq!(slots[0]["time"], "09:00");
    assert_eq!(slots[15]["time"], "16:30");

    let booked: Vec<_> = slots
        .iter()
        .filter(|slot| slot["is_booked"] == true)
        .collect();
    assert_eq!(booked.len(), 1);
    assert_eq!(booked[0]["time"], "10:00");
    assert_eq!(booked[0]["datetime"], "2025-06-02T10:00");
}

#[tokio::test]
async fn clinic_schedule_names_the_patient_in_booked_slots() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();

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
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::appointment(Uuid::new_v4(), patient_id, doctor_id, at(2, 9, 30), "scheduled")
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("select", "id,name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": patient_id.to_string(), "name": "Asha Mohanty" }
        ])))
        .mount(&server)
        .await;

    let app = create_test_app(&server.uri());
    let request = Request::builder()
        .method("GET")
        .uri("/schedule?date=2025-06-02")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["date"], "2025-06-02");

    let slots = body["doctors"][0]["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 16);
    assert_eq!(slots[1]["is_booked"], true);
    assert_eq!(slots[1]["patient"]["name"], "Asha Mohanty");
    assert_eq!(slots[0]["is_booked"], false);
    assert_eq!(slots[0]["patient"], serde_json::Value::Null);
}

#[tokio::test]
async fn clinic_schedule_is_empty_on_sundays() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::doctor(doctor_id, "Janmejaya Panda", "General Medicine", 500.0)
        ])))
        .mount(&server)
        .await;
    // Even a stray Sunday window row must not produce slots.
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreRows::availability_window(doctor_id, 6, "09:00:00", "17:00:00")
        ])))
        .mount(&server)
        .await;

    let app = create_test_app(&server.uri());
    // 2025-06-08 is a Sunday.
    let request = Request::builder()
        .method("GET")
        .uri("/schedule?date=2025-06-08")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    let slots = body["doctors"][0]["slots"].as_array().unwrap();
    assert!(slots.is_empty());
}
