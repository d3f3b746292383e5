use axum::body::to_bytes;

use super::*;
use crate::state::test_helpers;

#[tokio::test]
async fn healthz_is_ok() {
    assert_eq!(healthz().await, StatusCode::OK);
}

#[tokio::test]
async fn app_builds_with_lazy_pool() {
    let _router = app(test_helpers::test_app_state());
}

#[tokio::test]
async fn error_response_has_message_body() {
    let response = error_response(StatusCode::CONFLICT, "email is already registered");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["message"], "email is already registered");
}

#[tokio::test]
async fn internal_error_hides_details() {
    let response = internal_error("lookup failed", &"connection refused to 10.0.0.5");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(!text.contains("10.0.0.5"));
}
