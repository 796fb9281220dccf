use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use doctor_cell::router::doctor_routes;

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, body)
}

#[tokio::test]
async fn test_list_doctors_returns_directory() {
    let (status, body) = get_json(doctor_routes(), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["doctors"][0]["id"], "dr-marshall");
    assert_eq!(body["doctors"][1]["name"], "Catherine Loflin");
}

#[tokio::test]
async fn test_get_unknown_doctor_is_not_found() {
    let (status, body) = get_json(doctor_routes(), "/dr-nobody").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("dr-nobody"));
}

#[tokio::test]
async fn test_slots_cover_working_hours() {
    let (status, body) = get_json(doctor_routes(), "/dr-loflin/slots?date=2024-06-01").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["doctorId"], "dr-loflin");
    assert_eq!(body["date"], "2024-06-01");
    assert_eq!(body["totalSlots"], 18);
    assert_eq!(body["simulated"], false);
    assert_eq!(body["slots"][0], "09:00");
}

#[tokio::test]
async fn test_availability_is_flagged_as_simulated() {
    let (status, body) = get_json(doctor_routes(), "/dr-marshall/availability?date=2024-06-01").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["simulated"], true);
    assert!(body["slots"].as_array().unwrap().len() <= 18);
}

#[tokio::test]
async fn test_slots_reject_malformed_date() {
    let (status, _) = get_json(doctor_routes(), "/dr-loflin/slots?date=June-first").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
